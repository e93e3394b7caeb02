//! I/O layer: the manifest-backed tile archive and the `writers` for
//! GeoTIFF/JPEG outputs with world files and metadata sidecars.
pub mod archive;
pub use archive::ManifestArchive;

pub mod writers;
pub use writers::{WrittenFiles, export_to_path};
