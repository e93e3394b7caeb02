//! Query and clipping regions: bounding boxes, date ranges and validated
//! region-of-interest polygons.
use chrono::NaiveDate;
use geo::line_intersection::{LineIntersection, line_intersection};
use geo::{
    Area, BoundingRect, Contains, Coord, GeodesicArea, Intersects, Line, LineString, MultiPolygon,
    Polygon, Rect,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::CoordinateSpace;

/// Axis-aligned lon/lat box used to scope an archive query.
///
/// Corners may be given in any order; they are normalized so that
/// `min_x < max_x` and `min_y < max_y`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl BoundingBox {
    pub fn new(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidRegion { reason };
        if ![lon1, lat1, lon2, lat2].iter().all(|v| v.is_finite()) {
            return Err(invalid(format!(
                "non-finite corner ({lon1}, {lat1}), ({lon2}, {lat2})"
            )));
        }
        for lon in [lon1, lon2] {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(invalid(format!("longitude {lon} outside [-180, 180]")));
            }
        }
        for lat in [lat1, lat2] {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(invalid(format!("latitude {lat} outside [-90, 90]")));
            }
        }
        let (min_x, max_x) = (lon1.min(lon2), lon1.max(lon2));
        let (min_y, max_y) = (lat1.min(lat2), lat1.max(lat2));
        if min_x == max_x || min_y == max_y {
            return Err(invalid(format!(
                "degenerate box ({lon1}, {lat1}), ({lon2}, {lat2})"
            )));
        }
        Ok(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    pub fn min_x(&self) -> f64 {
        self.min_x
    }

    pub fn min_y(&self) -> f64 {
        self.min_y
    }

    pub fn max_x(&self) -> f64 {
        self.max_x
    }

    pub fn max_y(&self) -> f64 {
        self.max_y
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.min_x,
                y: self.min_y,
            },
            Coord {
                x: self.max_x,
                y: self.max_y,
            },
        )
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        self.to_rect().to_polygon()
    }

    /// True when the footprint shares at least one point with the box.
    pub fn intersects(&self, footprint: &Polygon<f64>) -> bool {
        self.to_rect().intersects(footprint)
    }
}

impl TryFrom<[f64; 4]> for BoundingBox {
    type Error = Error;

    fn try_from(c: [f64; 4]) -> Result<Self> {
        Self::new(c[0], c[1], c[2], c[3])
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.min_x, b.min_y, b.max_x, b.max_y]
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {})-({}, {})",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

/// Half-open calendar interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawDateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = Error;

    fn try_from(raw: RawDateRange) -> Result<Self> {
        Self::new(raw.start, raw.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start >= end {
            return Err(Error::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse two `YYYY-MM-DD` dates.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| Error::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            })
        };
        Self::new(parse(start)?, parse(end)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Validated clipping region: one or more simple polygons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RoiRings", into = "RoiRings")]
pub struct RegionOfInterest {
    space: CoordinateSpace,
    shape: MultiPolygon<f64>,
    bounds: Rect<f64>,
}

/// Plain-coordinate form of a region: polygons of rings of `[x, y]` pairs,
/// exterior ring first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoiRings {
    #[serde(default)]
    pub space: CoordinateSpace,
    pub polygons: Vec<Vec<Vec<[f64; 2]>>>,
}

impl TryFrom<RoiRings> for RegionOfInterest {
    type Error = Error;

    fn try_from(raw: RoiRings) -> Result<Self> {
        let polygons = raw
            .polygons
            .into_iter()
            .map(|rings| {
                let mut rings = rings.into_iter().map(|ring| {
                    LineString::from(
                        ring.into_iter()
                            .map(|[x, y]| Coord { x, y })
                            .collect::<Vec<_>>(),
                    )
                });
                let exterior = rings.next().unwrap_or_else(|| LineString::new(vec![]));
                Polygon::new(exterior, rings.collect())
            })
            .collect::<Vec<_>>();
        Self::new(MultiPolygon::new(polygons), raw.space)
    }
}

impl From<RegionOfInterest> for RoiRings {
    fn from(roi: RegionOfInterest) -> Self {
        let ring = |ls: &LineString<f64>| ls.coords().map(|c| [c.x, c.y]).collect::<Vec<_>>();
        RoiRings {
            space: roi.space,
            polygons: roi
                .shape
                .iter()
                .map(|p| {
                    std::iter::once(ring(p.exterior()))
                        .chain(p.interiors().iter().map(&ring))
                        .collect()
                })
                .collect(),
        }
    }
}

impl RegionOfInterest {
    pub fn new(shape: MultiPolygon<f64>, space: CoordinateSpace) -> Result<Self> {
        if shape.0.is_empty() {
            return Err(Error::GeometryInvalid {
                reason: "region has no polygons".to_string(),
            });
        }
        let mut exteriors = Vec::with_capacity(shape.0.len());
        for (i, polygon) in shape.iter().enumerate() {
            exteriors.push(validate_polygon(polygon, i)?);
        }
        for (i, a) in shape.iter().enumerate() {
            for (j, b) in shape.iter().enumerate().skip(i + 1) {
                let nested = a.exterior().coords().any(|c| b.contains(c))
                    || b.exterior().coords().any(|c| a.contains(c));
                if nested || rings_cross(&exteriors[i], &exteriors[j]) {
                    return Err(Error::GeometryInvalid {
                        reason: format!("polygons {i} and {j} overlap"),
                    });
                }
            }
        }
        let bounds = shape.bounding_rect().ok_or_else(|| Error::GeometryInvalid {
            reason: "region has no coordinates".to_string(),
        })?;
        Ok(Self {
            space,
            shape,
            bounds,
        })
    }

    pub fn from_polygon(polygon: Polygon<f64>, space: CoordinateSpace) -> Result<Self> {
        Self::new(MultiPolygon::new(vec![polygon]), space)
    }

    pub fn from_bbox(bbox: &BoundingBox) -> Self {
        let shape = MultiPolygon::new(vec![bbox.to_polygon()]);
        Self {
            space: CoordinateSpace::Geographic,
            bounds: bbox.to_rect(),
            shape,
        }
    }

    pub fn space(&self) -> CoordinateSpace {
        self.space
    }

    pub fn shape(&self) -> &MultiPolygon<f64> {
        &self.shape
    }

    pub fn bounds(&self) -> Rect<f64> {
        self.bounds
    }

    /// Points on the boundary count as inside.
    #[inline]
    pub fn contains(&self, point: Coord<f64>) -> bool {
        self.bounds.intersects(&point) && self.shape.iter().any(|p| p.intersects(&point))
    }

    /// Planar area for planar regions, geodesic square metres for lon/lat regions.
    pub fn area(&self) -> f64 {
        match self.space {
            CoordinateSpace::Planar => self.shape.iter().map(|p| p.unsigned_area()).sum(),
            CoordinateSpace::Geographic => {
                self.shape.iter().map(|p| p.geodesic_area_unsigned()).sum()
            }
        }
    }
}

/// Checks each ring on its own, then holes against the shell and each other.
/// Rings may touch at single points but not cross or share edges. Returns the
/// exterior's segments.
fn validate_polygon(polygon: &Polygon<f64>, i: usize) -> Result<Vec<Line<f64>>> {
    let invalid = |reason: String| Error::GeometryInvalid { reason };
    let exterior = validate_ring(polygon.exterior(), i, "exterior")?;
    let shell = Polygon::new(polygon.exterior().clone(), vec![]);
    if shell.unsigned_area() == 0.0 {
        return Err(invalid(format!("polygon {i} has zero area")));
    }

    let mut holes: Vec<(Polygon<f64>, Vec<Line<f64>>)> = Vec::new();
    for (k, interior) in polygon.interiors().iter().enumerate() {
        let segments = validate_ring(interior, i, "interior")?;
        if rings_cross(&exterior, &segments) {
            return Err(invalid(format!(
                "polygon {i} interior ring {k} crosses the exterior"
            )));
        }
        if !interior.coords().all(|c| shell.intersects(c)) {
            return Err(invalid(format!(
                "polygon {i} interior ring {k} lies outside the exterior"
            )));
        }
        let hole = Polygon::new(interior.clone(), vec![]);
        for (m, (other, other_segments)) in holes.iter().enumerate() {
            let nested = interior.coords().any(|c| other.contains(c))
                || other.exterior().coords().any(|c| hole.contains(c));
            if nested || rings_cross(other_segments, &segments) {
                return Err(invalid(format!(
                    "polygon {i} interior rings {m} and {k} overlap"
                )));
            }
        }
        holes.push((hole, segments));
    }
    Ok(exterior)
}

/// Crossing or shared-edge contact between two rings' segments.
fn rings_cross(a: &[Line<f64>], b: &[Line<f64>]) -> bool {
    a.iter().any(|sa| {
        b.iter().any(|sb| {
            matches!(
                line_intersection(*sa, *sb),
                Some(LineIntersection::Collinear { .. })
                    | Some(LineIntersection::SinglePoint {
                        is_proper: true,
                        ..
                    })
            )
        })
    })
}

fn validate_ring(ring: &LineString<f64>, polygon: usize, kind: &str) -> Result<Vec<Line<f64>>> {
    let invalid = |what: String| Error::GeometryInvalid {
        reason: format!("polygon {polygon} {kind} ring {what}"),
    };
    if ring.coords().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(invalid("has non-finite coordinates".to_string()));
    }

    let mut pts: Vec<Coord<f64>> = Vec::with_capacity(ring.0.len());
    for c in ring.coords() {
        if pts.last() != Some(c) {
            pts.push(*c);
        }
    }
    if pts.len() > 1 && pts.first() == pts.last() {
        pts.pop();
    }
    if pts.len() < 3 {
        return Err(invalid(format!("has {} distinct vertices", pts.len())));
    }

    let n = pts.len();
    let segments: Vec<Line<f64>> = (0..n).map(|i| Line::new(pts[i], pts[(i + 1) % n])).collect();
    for i in 0..n {
        for j in (i + 1)..n {
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            match line_intersection(segments[i], segments[j]) {
                None => {}
                Some(LineIntersection::SinglePoint { .. }) if adjacent => {}
                Some(_) => {
                    return Err(invalid(format!("self-intersects at segments {i} and {j}")));
                }
            }
        }
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use geo::polygon;

    #[test]
    fn bbox_normalizes_swapped_corners() {
        let b = BoundingBox::new(-74.96, 40.14, -75.28, 39.87).unwrap();
        assert_eq!(b.min_x(), -75.28);
        assert_eq!(b.max_y(), 40.14);
        assert!(b.width() > 0.0 && b.height() > 0.0);
    }

    #[test]
    fn bbox_rejects_malformed_input() {
        for (a, b, c, d) in [
            (1.0, 1.0, 1.0, 2.0),
            (f64::NAN, 0.0, 1.0, 1.0),
            (-190.0, 0.0, 1.0, 1.0),
            (0.0, 0.0, 1.0, 95.0),
        ] {
            assert!(matches!(
                BoundingBox::new(a, b, c, d),
                Err(Error::InvalidRegion { .. })
            ));
        }
    }

    #[test]
    fn bbox_serde_uses_corner_array() {
        let b: BoundingBox = serde_json::from_str("[-75.28, 39.87, -74.96, 40.14]").unwrap();
        assert_eq!(b.min_y(), 39.87);
        assert!(serde_json::from_str::<BoundingBox>("[0, 0, 0, 1]").is_err());
    }

    #[test]
    fn date_range_is_half_open() {
        let r = DateRange::parse("2017-01-01", "2018-01-01").unwrap();
        assert!(r.contains(NaiveDate::from_ymd_opt(2017, 1, 1).unwrap()));
        assert!(r.contains(NaiveDate::from_ymd_opt(2017, 12, 31).unwrap()));
        assert!(!r.contains(NaiveDate::from_ymd_opt(2018, 1, 1).unwrap()));
    }

    #[test]
    fn date_range_rejects_inverted_and_empty() {
        assert!(matches!(
            DateRange::parse("2018-01-01", "2017-01-01"),
            Err(Error::InvalidDateRange { .. })
        ));
        assert!(matches!(
            DateRange::parse("2018-01-01", "2018-01-01"),
            Err(Error::InvalidDateRange { .. })
        ));
        assert!(DateRange::parse("2018-13-01", "2019-01-01").is_err());
        assert!(serde_json::from_str::<DateRange>(r#"{"start":"2020-01-01","end":"2019-01-01"}"#).is_err());
    }

    #[test]
    fn roi_rejects_bowtie() {
        let bowtie = polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 2.0), (x: 2.0, y: 0.0), (x: 0.0, y: 2.0)];
        let err = RegionOfInterest::from_polygon(bowtie, CoordinateSpace::Planar).unwrap_err();
        assert!(matches!(err, Error::GeometryInvalid { .. }));
    }

    #[test]
    fn roi_rejects_empty_and_degenerate() {
        assert!(RegionOfInterest::new(MultiPolygon::new(vec![]), CoordinateSpace::Planar).is_err());
        let line = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0), (x: 2.0, y: 2.0)];
        assert!(RegionOfInterest::from_polygon(line, CoordinateSpace::Planar).is_err());
        let two = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)];
        assert!(RegionOfInterest::from_polygon(two, CoordinateSpace::Planar).is_err());
    }

    #[test]
    fn roi_rejects_hole_crossing_or_outside_shell() {
        let crossing = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)],
            interiors: [[(x: 5.0, y: 5.0), (x: 15.0, y: 5.0), (x: 15.0, y: 15.0), (x: 5.0, y: 15.0)]]
        );
        assert!(matches!(
            RegionOfInterest::from_polygon(crossing, CoordinateSpace::Planar),
            Err(Error::GeometryInvalid { .. })
        ));

        let outside = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)],
            interiors: [[(x: 20.0, y: 20.0), (x: 22.0, y: 20.0), (x: 22.0, y: 22.0)]]
        );
        assert!(RegionOfInterest::from_polygon(outside, CoordinateSpace::Planar).is_err());

        let overlapping_holes = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)],
            interiors: [
                [(x: 1.0, y: 1.0), (x: 5.0, y: 1.0), (x: 5.0, y: 5.0), (x: 1.0, y: 5.0)],
                [(x: 2.0, y: 2.0), (x: 3.0, y: 2.0), (x: 3.0, y: 3.0), (x: 2.0, y: 3.0)],
            ]
        );
        assert!(RegionOfInterest::from_polygon(overlapping_holes, CoordinateSpace::Planar).is_err());
    }

    #[test]
    fn roi_allows_hole_touching_shell_at_a_point() {
        let touching = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)],
            interiors: [[(x: 0.0, y: 5.0), (x: 4.0, y: 3.0), (x: 4.0, y: 7.0)]]
        );
        let roi = RegionOfInterest::from_polygon(touching, CoordinateSpace::Planar).unwrap();
        assert_abs_diff_eq!(roi.area(), 92.0);
    }

    #[test]
    fn roi_rejects_overlapping_members() {
        let a = polygon![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 4.0)];
        let b = polygon![(x: 2.0, y: 2.0), (x: 6.0, y: 2.0), (x: 6.0, y: 6.0), (x: 2.0, y: 6.0)];
        let far = polygon![(x: 10.0, y: 0.0), (x: 12.0, y: 0.0), (x: 12.0, y: 2.0)];
        assert!(matches!(
            RegionOfInterest::new(MultiPolygon::new(vec![a.clone(), b]), CoordinateSpace::Planar),
            Err(Error::GeometryInvalid { .. })
        ));
        let roi =
            RegionOfInterest::new(MultiPolygon::new(vec![a, far]), CoordinateSpace::Planar).unwrap();
        assert_abs_diff_eq!(roi.area(), 18.0);
    }

    #[test]
    fn roi_contains_boundary_and_respects_holes() {
        let ring = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)],
            interiors: [[(x: 4.0, y: 4.0), (x: 6.0, y: 4.0), (x: 6.0, y: 6.0), (x: 4.0, y: 6.0)]]
        );
        let roi = RegionOfInterest::from_polygon(ring, CoordinateSpace::Planar).unwrap();
        assert!(roi.contains(Coord { x: 1.0, y: 1.0 }));
        assert!(roi.contains(Coord { x: 0.0, y: 5.0 }));
        assert!(!roi.contains(Coord { x: 5.0, y: 5.0 }));
        assert!(!roi.contains(Coord { x: 11.0, y: 5.0 }));
        assert_abs_diff_eq!(roi.area(), 96.0);
    }

    #[test]
    fn geographic_area_is_in_square_metres() {
        let bbox = BoundingBox::new(0.0, 0.0, 0.01, 0.01).unwrap();
        let area = RegionOfInterest::from_bbox(&bbox).area();
        // ~1.11 km on a side at the equator
        assert!(area > 1.2e6 && area < 1.3e6, "area = {area}");
    }

    #[test]
    fn roi_deserializes_from_rings() {
        let json = r#"{"space":"planar","polygons":[[[[0,0],[4,0],[4,4],[0,4],[0,0]]]]}"#;
        let roi: RegionOfInterest = serde_json::from_str(json).unwrap();
        assert_eq!(roi.space(), CoordinateSpace::Planar);
        assert_abs_diff_eq!(roi.area(), 16.0);
        let bad = r#"{"space":"planar","polygons":[]}"#;
        assert!(serde_json::from_str::<RegionOfInterest>(bad).is_err());
    }
}
