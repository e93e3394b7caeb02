pub mod change;
pub mod clip;
pub mod colorize;
pub mod index;
pub mod mask;
pub mod mosaic;
pub mod ops;
pub mod pipeline;
pub mod select;
