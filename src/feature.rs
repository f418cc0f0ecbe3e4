use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::geometry::{Extent, Point, Polygon, extent_of};
use crate::painter::Coord;
use crate::properties::param_str;

/// GeoJSON-shaped geometry in map units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Coord),
    LineString(Vec<Coord>),
    Polygon(Vec<Vec<Coord>>),
}

fn point(c: &Coord) -> Point {
    Point::new(c[0], c[1])
}

impl Geometry {
    /// Bounding box in map units, `None` without coordinates.
    pub fn bounds(&self) -> Option<Extent> {
        match self {
            Geometry::Point(c) => {
                let p = point(c);
                Some(Extent::new(p, p))
            }
            Geometry::LineString(coords) => {
                extent_of(&coords.iter().map(point).collect::<Vec<_>>())
            }
            Geometry::Polygon(rings) => Polygon::from(rings).extent(),
        }
    }
}

impl From<&Vec<Vec<Coord>>> for Polygon {
    fn from(rings: &Vec<Vec<Coord>>) -> Self {
        Polygon::new(
            rings
                .iter()
                .map(|ring| ring.iter().map(point).collect())
                .collect(),
        )
    }
}

/// A feature as the host sends it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelData {
    pub id: String,
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: Value,
}

/// A stored feature with its bounds computed once.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub id: String,
    pub geometry: Geometry,
    pub properties: Value,
    bounds: Option<Extent>,
}

impl Feature {
    /// Builds a feature and computes its bounds.
    pub fn new(id: impl Into<String>, geometry: Geometry, properties: Value) -> Self {
        let bounds = geometry.bounds();
        Self {
            id: id.into(),
            geometry,
            properties,
            bounds,
        }
    }

    /// `None` for a geometry without coordinates.
    pub fn bounds(&self) -> Option<Extent> {
        self.bounds
    }

    /// Font named by `params.fontUrl`, if any.
    pub fn font_url(&self) -> Option<&str> {
        param_str(&self.properties, "fontUrl").filter(|url| !url.is_empty())
    }

    /// Line vertices, empty unless this is a line string.
    pub fn line_points(&self) -> Vec<Point> {
        match &self.geometry {
            Geometry::LineString(coords) => coords.iter().map(point).collect(),
            _ => Vec::new(),
        }
    }

    /// The rings as a [`Polygon`], unless this is not a polygon.
    pub fn polygon(&self) -> Option<Polygon> {
        match &self.geometry {
            Geometry::Polygon(rings) => Some(Polygon::from(rings)),
            _ => None,
        }
    }
}

impl From<ModelData> for Feature {
    fn from(model: ModelData) -> Self {
        Feature::new(model.id, model.geometry, model.properties)
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn model_data_from_geojson_shape() {
        let model: ModelData = serde_json::from_value(json!({
            "id": "a",
            "geometry": { "type": "LineString", "coordinates": [[0, 0], [4, 2]] },
            "properties": { "params": { "fontUrl": "fonts/serif" } }
        }))
        .unwrap();
        let feature = Feature::from(model);

        assert_eq!(feature.font_url(), Some("fonts/serif"));
        let b = feature.bounds().unwrap();
        assert_eq!((b.min, b.max), (Point::new(0.0, 0.0), Point::new(4.0, 2.0)));
        assert_eq!(feature.line_points().len(), 2);
        assert!(feature.polygon().is_none());
    }

    #[test]
    fn missing_properties_default_to_null() {
        let model: ModelData = serde_json::from_value(json!({
            "id": "p",
            "geometry": { "type": "Point", "coordinates": [1, 1] }
        }))
        .unwrap();
        assert!(model.properties.is_null());
        assert!(Feature::from(model).font_url().is_none());
    }

    #[test]
    fn empty_polygon_has_no_bounds() {
        let feature = Feature::new("e", Geometry::Polygon(vec![]), Value::Null);
        assert!(feature.bounds().is_none());
        assert!(feature.polygon().unwrap().rings.is_empty());
    }
}
