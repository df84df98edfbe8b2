//! GeoJSON conversions shared by the landmass, partition and cache modules.
//!
//! Reading is done by hand so that individual bad members can be skipped
//! instead of failing a whole collection. Writing goes through the
//! `geojson` crate's `geo-types` conversions.

use geo::{Area, Coord, LineString, MultiPolygon, Polygon};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};
use thiserror::Error;

/// Errors raised while decoding GeoJSON documents.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// The bytes are not valid GeoJSON.
    #[error("invalid GeoJSON: {0}")]
    Parse(#[from] geojson::Error),

    /// The bytes are not UTF-8.
    #[error("GeoJSON is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// Valid GeoJSON of the wrong kind.
    #[error("expected a {expected}, found a {found}")]
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
    },
}

/// Parse bytes as any GeoJSON object.
pub fn parse_geojson(bytes: &[u8]) -> Result<GeoJson, GeometryError> {
    let text = std::str::from_utf8(bytes)?;
    Ok(text.parse::<GeoJson>()?)
}

/// Parse bytes that must hold a FeatureCollection.
pub fn parse_feature_collection(bytes: &[u8]) -> Result<FeatureCollection, GeometryError> {
    match parse_geojson(bytes)? {
        GeoJson::FeatureCollection(fc) => Ok(fc),
        other => Err(GeometryError::UnexpectedType {
            expected: "FeatureCollection",
            found: kind(&other),
        }),
    }
}

/// Parse bytes that must hold a single Feature.
pub fn parse_feature(bytes: &[u8]) -> Result<Feature, GeometryError> {
    match parse_geojson(bytes)? {
        GeoJson::Feature(feature) => Ok(feature),
        other => Err(GeometryError::UnexpectedType {
            expected: "Feature",
            found: kind(&other),
        }),
    }
}

fn kind(value: &GeoJson) -> &'static str {
    match value {
        GeoJson::Geometry(_) => "Geometry",
        GeoJson::Feature(_) => "Feature",
        GeoJson::FeatureCollection(_) => "FeatureCollection",
    }
}

/// Areal content of a feature, if any.
pub fn feature_multi_polygon(feature: &Feature) -> Option<MultiPolygon<f64>> {
    feature
        .geometry
        .as_ref()
        .and_then(|g| value_multi_polygon(&g.value))
}

/// Collect every polygon in a geometry value.
///
/// GeometryCollections are flattened. Non-areal members are ignored and
/// `None` is returned when nothing areal remains.
pub fn value_multi_polygon(value: &Value) -> Option<MultiPolygon<f64>> {
    let mut polygons = Vec::new();
    collect_polygons(value, &mut polygons);
    if polygons.is_empty() {
        None
    } else {
        Some(MultiPolygon::new(polygons))
    }
}

fn collect_polygons(value: &Value, out: &mut Vec<Polygon<f64>>) {
    match value {
        Value::Polygon(rings) => out.extend(rings_to_polygon(rings)),
        Value::MultiPolygon(polys) => out.extend(polys.iter().filter_map(|r| rings_to_polygon(r))),
        Value::GeometryCollection(members) => {
            for member in members {
                collect_polygons(&member.value, out);
            }
        }
        _ => {}
    }
}

/// An invalid exterior rejects the polygon; invalid holes are dropped.
fn rings_to_polygon(rings: &[Vec<Vec<f64>>]) -> Option<Polygon<f64>> {
    let (exterior, interiors) = rings.split_first()?;
    let exterior = ring_to_line_string(exterior)?;
    let interiors = interiors
        .iter()
        .filter_map(|ring| ring_to_line_string(ring))
        .collect();
    Some(Polygon::new(exterior, interiors))
}

fn ring_to_line_string(ring: &[Vec<f64>]) -> Option<LineString<f64>> {
    let coords: Option<Vec<Coord<f64>>> = ring
        .iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] if x.is_finite() && y.is_finite() => Some(Coord { x: *x, y: *y }),
            _ => None,
        })
        .collect();
    // A closed ring needs at least four positions.
    coords.filter(|c| c.len() >= 4).map(LineString::new)
}

/// Build a Feature carrying a multipolygon and the given properties.
pub fn multi_polygon_feature(geometry: &MultiPolygon<f64>, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::from(geometry))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Wrap features in a FeatureCollection.
pub fn feature_collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// True when the geometry has no polygons or no area.
pub fn is_empty_area(geometry: &MultiPolygon<f64>) -> bool {
    geometry.0.is_empty() || geometry.unsigned_area() <= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn square() -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ]])
    }

    #[test]
    fn test_feature_collection_roundtrip_keeps_properties() {
        let mut props = JsonObject::new();
        props.insert("targetId".into(), 7.into());
        let fc = feature_collection(vec![multi_polygon_feature(&square(), props)]);

        let bytes = serde_json::to_vec(&fc).unwrap();
        let parsed = parse_feature_collection(&bytes).unwrap();

        assert_eq!(parsed.features.len(), 1);
        let feature = &parsed.features[0];
        assert_eq!(feature.property("targetId"), Some(&7.into()));
        let geometry = feature_multi_polygon(feature).unwrap();
        assert!((geometry.unsigned_area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_wrong_kind() {
        let bytes = br#"{"type":"Point","coordinates":[1.0,2.0]}"#;
        let err = parse_feature_collection(bytes).unwrap_err();
        assert!(matches!(
            err,
            GeometryError::UnexpectedType {
                expected: "FeatureCollection",
                found: "Geometry"
            }
        ));
        assert!(parse_feature(b"not json").is_err());
    }

    #[test]
    fn test_non_areal_and_collections() {
        let point = Value::Point(vec![1.0, 2.0]);
        assert!(value_multi_polygon(&point).is_none());

        let poly = Value::from(&square());
        let collection =
            Value::GeometryCollection(vec![Geometry::new(point), Geometry::new(poly)]);
        assert_eq!(value_multi_polygon(&collection).unwrap().0.len(), 1);
    }

    #[test]
    fn test_short_ring_is_dropped() {
        let value = Value::Polygon(vec![vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 0.0]]]);
        assert!(value_multi_polygon(&value).is_none());
    }

    #[test]
    fn test_invalid_exterior_does_not_promote_hole() {
        let hole = vec![
            vec![1.0, 1.0],
            vec![2.0, 1.0],
            vec![2.0, 2.0],
            vec![1.0, 2.0],
            vec![1.0, 1.0],
        ];
        let short_exterior = vec![vec![0.0, 0.0], vec![4.0, 0.0], vec![0.0, 0.0]];
        let value = Value::Polygon(vec![short_exterior, hole.clone()]);
        assert!(value_multi_polygon(&value).is_none());

        let exterior = vec![
            vec![0.0, 0.0],
            vec![4.0, 0.0],
            vec![4.0, 4.0],
            vec![0.0, 4.0],
            vec![0.0, 0.0],
        ];
        let bad_hole = vec![vec![1.0, 1.0], vec![f64::NAN, 1.0]];
        let value = Value::Polygon(vec![exterior, bad_hole, hole]);
        let parsed = value_multi_polygon(&value).unwrap();
        assert_eq!(parsed.0[0].interiors().len(), 1);
        assert!((parsed.unsigned_area() - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_is_empty_area() {
        assert!(is_empty_area(&MultiPolygon::new(vec![])));
        assert!(!is_empty_area(&square()));
    }
}
