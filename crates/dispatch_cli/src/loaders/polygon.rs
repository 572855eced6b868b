//! KML bounding polygon: crops the map to the simulated area.

use std::fs;
use std::path::Path;

use super::SetupError;

/// A closed lat/lon ring taken from the first `<coordinates>` block of a
/// KML file.
#[derive(Debug, Clone)]
pub struct BoundingPolygon {
    /// (latitude, longitude) vertices.
    vertices: Vec<(f64, f64)>,
}

pub fn load_polygon(path: &Path) -> Result<BoundingPolygon, SetupError> {
    parse_polygon(&fs::read_to_string(path)?)
}

/// KML stores tuples as `longitude,latitude[,altitude]` separated by
/// whitespace.
pub fn parse_polygon(text: &str) -> Result<BoundingPolygon, SetupError> {
    let Some(start) = text.find("<coordinates>") else {
        return Err(SetupError::Parse("KML file has no <coordinates> block".into()));
    };
    let body = &text[start + "<coordinates>".len()..];
    let Some(end) = body.find("</coordinates>") else {
        return Err(SetupError::Parse("unclosed <coordinates> block".into()));
    };

    let mut vertices = Vec::new();
    for tuple in body[..end].split_whitespace() {
        let mut parts = tuple.split(',');
        let (Some(longitude), Some(latitude)) = (parts.next(), parts.next()) else {
            return Err(SetupError::Parse(format!("malformed coordinate tuple {tuple:?}")));
        };
        let longitude: f64 = longitude
            .parse()
            .map_err(|_| SetupError::Parse(format!("bad longitude in {tuple:?}")))?;
        let latitude: f64 = latitude
            .parse()
            .map_err(|_| SetupError::Parse(format!("bad latitude in {tuple:?}")))?;
        vertices.push((latitude, longitude));
    }
    if vertices.len() < 3 {
        return Err(SetupError::Parse(
            "bounding polygon needs at least three vertices".into(),
        ));
    }
    Ok(BoundingPolygon { vertices })
}

impl BoundingPolygon {
    /// Ray-casting point-in-polygon test.
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        let mut inside = false;
        let count = self.vertices.len();
        let mut previous = count - 1;
        for current in 0..count {
            let (lat_a, lon_a) = self.vertices[current];
            let (lat_b, lon_b) = self.vertices[previous];
            if (lat_a > latitude) != (lat_b > latitude) {
                let crossing = (lon_b - lon_a) * (latitude - lat_a) / (lat_b - lat_a) + lon_a;
                if longitude < crossing {
                    inside = !inside;
                }
            }
            previous = current;
        }
        inside
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE_KML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml><Document><Placemark><Polygon><outerBoundaryIs><LinearRing>
<coordinates>
13.0,52.0,0 14.0,52.0,0 14.0,53.0,0 13.0,53.0,0 13.0,52.0,0
</coordinates>
</LinearRing></outerBoundaryIs></Polygon></Placemark></Document></kml>"#;

    #[test]
    fn parses_a_kml_ring_and_classifies_points() {
        let polygon = parse_polygon(SQUARE_KML).expect("polygon");
        assert!(polygon.contains(52.5, 13.5));
        assert!(!polygon.contains(51.9, 13.5));
        assert!(!polygon.contains(52.5, 14.1));
    }

    #[test]
    fn missing_coordinates_block_is_a_parse_error() {
        assert!(matches!(
            parse_polygon("<kml></kml>"),
            Err(SetupError::Parse(_))
        ));
    }

    #[test]
    fn two_vertices_are_rejected() {
        let text = "<coordinates>13.0,52.0 14.0,52.0</coordinates>";
        assert!(matches!(parse_polygon(text), Err(SetupError::Parse(_))));
    }
}
