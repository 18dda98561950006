use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::mapper::Point;

/// Circle radius in normalized units when the producer omits it or sends 0.
pub const DEFAULT_RADIUS: f32 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnnotationType {
    Arrow,
    Circle,
    Box,
    Highlight,
}

impl AnnotationType {
    pub const ALL: [AnnotationType; 4] = [Self::Arrow, Self::Circle, Self::Box, Self::Highlight];

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "arrow" => Some(Self::Arrow),
            "circle" => Some(Self::Circle),
            "box" => Some(Self::Box),
            "highlight" => Some(Self::Highlight),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::Arrow => "arrow",
            Self::Circle => "circle",
            Self::Box => "box",
            Self::Highlight => "highlight",
        }
    }
}

impl fmt::Display for AnnotationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// `box_2d` in producer order: `[ymin, xmin, ymax, xmax]`.
///
/// Min/max ordering is not checked; an inverted box keeps its negative
/// extent all the way to the drawing primitive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxCoords {
    pub ymin: f32,
    pub xmin: f32,
    pub ymax: f32,
    pub xmax: f32,
}

impl BoxCoords {
    pub fn new(ymin: f32, xmin: f32, ymax: f32, xmax: f32) -> Self {
        Self {
            ymin,
            xmin,
            ymax,
            xmax,
        }
    }

    pub fn width(self) -> f32 {
        self.xmax - self.xmin
    }

    pub fn height(self) -> f32 {
        self.ymax - self.ymin
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    Arrow { start: Point, end: Point },
    Circle { center: Point, radius: f32 },
    Box(BoxCoords),
    Highlight(BoxCoords),
}

impl Shape {
    pub fn kind(&self) -> AnnotationType {
        match self {
            Self::Arrow { .. } => AnnotationType::Arrow,
            Self::Circle { .. } => AnnotationType::Circle,
            Self::Box(_) => AnnotationType::Box,
            Self::Highlight(_) => AnnotationType::Highlight,
        }
    }
}

/// One validated marker, all coordinates still in the normalized grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub label: String,
    pub shape: Shape,
}

/// Why a descriptor from the vision model was dropped.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum Rejection {
    #[error("annotation descriptor is malformed: {0}")]
    Malformed(String),
    #[error("unknown annotation type {0:?}")]
    UnknownType(Option<String>),
    #[error("{kind} annotation is missing `{field}`")]
    MissingField {
        kind: AnnotationType,
        field: &'static str,
    },
    #[error("{kind} annotation field `{field}` has {found} values, expected {expected}")]
    BadLength {
        kind: AnnotationType,
        field: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("circle radius {0} is not a usable length")]
    BadRadius(f32),
}

/// Wire shape of one entry in the diagnosis `annotations` list. Every field
/// is optional here; requirements are enforced per variant in `validate`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AnnotationDescriptor {
    #[serde(rename = "type")]
    kind: Option<String>,
    label: Option<Value>,
    start: Option<Vec<f32>>,
    end: Option<Vec<f32>>,
    center: Option<Vec<f32>>,
    radius: Option<f32>,
    box_2d: Option<Vec<f32>>,
}

impl AnnotationDescriptor {
    fn validate(self) -> Result<Annotation, Rejection> {
        let Some(kind) = self.kind.as_deref().and_then(AnnotationType::from_tag) else {
            return Err(Rejection::UnknownType(self.kind));
        };

        let shape = match kind {
            AnnotationType::Arrow => Shape::Arrow {
                start: point_field(kind, "start", self.start)?,
                end: point_field(kind, "end", self.end)?,
            },
            AnnotationType::Circle => Shape::Circle {
                center: point_field(kind, "center", self.center)?,
                radius: radius_or_default(self.radius)?,
            },
            AnnotationType::Box => Shape::Box(box_field(kind, self.box_2d)?),
            AnnotationType::Highlight => Shape::Highlight(box_field(kind, self.box_2d)?),
        };

        Ok(Annotation {
            label: label_text(self.label),
            shape,
        })
    }
}

fn fixed_len<const N: usize>(
    kind: AnnotationType,
    field: &'static str,
    values: Option<Vec<f32>>,
) -> Result<[f32; N], Rejection> {
    let values = values.ok_or(Rejection::MissingField { kind, field })?;
    let found = values.len();
    values.try_into().map_err(|_| Rejection::BadLength {
        kind,
        field,
        expected: N,
        found,
    })
}

fn point_field(
    kind: AnnotationType,
    field: &'static str,
    values: Option<Vec<f32>>,
) -> Result<Point, Rejection> {
    let [x, y] = fixed_len::<2>(kind, field, values)?;
    Ok(Point::new(x, y))
}

fn box_field(kind: AnnotationType, values: Option<Vec<f32>>) -> Result<BoxCoords, Rejection> {
    let [ymin, xmin, ymax, xmax] = fixed_len::<4>(kind, "box_2d", values)?;
    Ok(BoxCoords::new(ymin, xmin, ymax, xmax))
}

fn radius_or_default(radius: Option<f32>) -> Result<f32, Rejection> {
    match radius {
        None => Ok(DEFAULT_RADIUS),
        Some(value) if value == 0.0 => Ok(DEFAULT_RADIUS),
        Some(value) if value.is_finite() && value > 0.0 => Ok(value),
        Some(value) => Err(Rejection::BadRadius(value)),
    }
}

fn label_text(label: Option<Value>) -> String {
    match label {
        Some(Value::String(text)) => text,
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        _ => String::new(),
    }
}

impl Annotation {
    pub fn new(label: impl Into<String>, shape: Shape) -> Self {
        Self {
            label: label.into(),
            shape,
        }
    }

    pub fn kind(&self) -> AnnotationType {
        self.shape.kind()
    }

    pub fn from_value(value: &Value) -> Result<Self, Rejection> {
        AnnotationDescriptor::deserialize(value)
            .map_err(|err| Rejection::Malformed(err.to_string()))?
            .validate()
    }
}

/// The decoded `annotations` list of one analysis, in producer order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnnotationSet {
    annotations: Vec<Annotation>,
    rejected: usize,
}

impl AnnotationSet {
    pub fn new(annotations: Vec<Annotation>) -> Self {
        Self {
            annotations,
            rejected: 0,
        }
    }

    /// Returns `None` when `value` is not a list. Entries that fail validation
    /// are dropped individually and counted.
    pub fn from_value(value: &Value) -> Option<Self> {
        let items = value.as_array()?;
        let mut set = Self::default();
        for (index, item) in items.iter().enumerate() {
            match Annotation::from_value(item) {
                Ok(annotation) => set.annotations.push(annotation),
                Err(rejection) => {
                    log::debug!("dropping annotation #{index}: {rejection}");
                    set.rejected += 1;
                }
            }
        }
        Some(set)
    }

    pub fn from_json_str(raw: &str) -> Option<Self> {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::from_value(&value),
            Err(err) => {
                log::warn!("annotation list is not valid JSON: {err}");
                None
            }
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Annotation> {
        self.annotations.iter()
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn rejected(&self) -> usize {
        self.rejected
    }
}

impl<'a> IntoIterator for &'a AnnotationSet {
    type Item = &'a Annotation;
    type IntoIter = std::slice::Iter<'a, Annotation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        Annotation, AnnotationSet, AnnotationType, BoxCoords, Rejection, Shape, DEFAULT_RADIUS,
    };
    use crate::mapper::Point;

    #[test]
    fn decodes_every_variant() {
        let arrow = Annotation::from_value(&json!({
            "type": "arrow", "label": "Loosen", "start": [100, 200], "end": [300, 400]
        }))
        .expect("arrow");
        assert_eq!(
            arrow.shape,
            Shape::Arrow {
                start: Point::new(100.0, 200.0),
                end: Point::new(300.0, 400.0),
            }
        );
        assert_eq!(arrow.label, "Loosen");

        let circle = Annotation::from_value(&json!({
            "type": "circle", "label": "Crack", "center": [500, 500], "radius": 80
        }))
        .expect("circle");
        assert_eq!(
            circle.shape,
            Shape::Circle {
                center: Point::new(500.0, 500.0),
                radius: 80.0,
            }
        );

        let boxed = Annotation::from_value(&json!({
            "type": "box", "label": "Hinge", "box_2d": [100, 200, 300, 400]
        }))
        .expect("box");
        assert_eq!(
            boxed.shape,
            Shape::Box(BoxCoords::new(100.0, 200.0, 300.0, 400.0))
        );

        let highlight = Annotation::from_value(&json!({
            "type": "highlight", "box_2d": [0, 0, 1000, 1000]
        }))
        .expect("highlight");
        assert_eq!(highlight.kind(), AnnotationType::Highlight);
        assert_eq!(highlight.label, "");
    }

    #[test]
    fn circle_radius_defaults_when_absent_or_zero() {
        for descriptor in [
            json!({"type": "circle", "center": [10, 10]}),
            json!({"type": "circle", "center": [10, 10], "radius": 0}),
            json!({"type": "circle", "center": [10, 10], "radius": null}),
        ] {
            let annotation = Annotation::from_value(&descriptor).expect("circle");
            assert!(matches!(
                annotation.shape,
                Shape::Circle { radius, .. } if radius == DEFAULT_RADIUS
            ));
        }
    }

    #[test]
    fn negative_radius_is_rejected() {
        let result = Annotation::from_value(&json!({
            "type": "circle", "center": [10, 10], "radius": -5
        }));
        assert_eq!(result, Err(Rejection::BadRadius(-5.0)));
    }

    #[test]
    fn unknown_and_missing_tags_are_rejected() {
        assert_eq!(
            Annotation::from_value(&json!({"type": "polygon", "box_2d": [1, 2, 3, 4]})),
            Err(Rejection::UnknownType(Some("polygon".to_string())))
        );
        assert_eq!(
            Annotation::from_value(&json!({"label": "no type"})),
            Err(Rejection::UnknownType(None))
        );
        assert_eq!(
            Annotation::from_value(&json!({"type": "Box", "box_2d": [1, 2, 3, 4]})),
            Err(Rejection::UnknownType(Some("Box".to_string())))
        );
    }

    #[test]
    fn wrong_length_coordinates_are_rejected() {
        assert_eq!(
            Annotation::from_value(&json!({"type": "box", "box_2d": [1, 2, 3]})),
            Err(Rejection::BadLength {
                kind: AnnotationType::Box,
                field: "box_2d",
                expected: 4,
                found: 3,
            })
        );
        assert_eq!(
            Annotation::from_value(&json!({"type": "circle", "center": [1]})),
            Err(Rejection::BadLength {
                kind: AnnotationType::Circle,
                field: "center",
                expected: 2,
                found: 1,
            })
        );
        assert_eq!(
            Annotation::from_value(&json!({"type": "arrow", "start": [1, 2]})),
            Err(Rejection::MissingField {
                kind: AnnotationType::Arrow,
                field: "end",
            })
        );
    }

    #[test]
    fn wrong_field_types_are_malformed() {
        let result = Annotation::from_value(&json!({"type": "box", "box_2d": "100,200,300,400"}));
        assert!(matches!(result, Err(Rejection::Malformed(_))));

        let result = Annotation::from_value(&json!("box"));
        assert!(matches!(result, Err(Rejection::Malformed(_))));
    }

    #[test]
    fn inverted_box_is_kept_as_is() {
        let annotation = Annotation::from_value(&json!({
            "type": "box", "box_2d": [300, 400, 100, 200]
        }))
        .expect("inverted box");
        let Shape::Box(coords) = annotation.shape else {
            panic!("expected box");
        };
        assert_eq!(coords.width(), -200.0);
        assert_eq!(coords.height(), -200.0);
    }

    #[test]
    fn non_string_labels_are_stringified() {
        let annotation = Annotation::from_value(&json!({
            "type": "box", "label": 7, "box_2d": [1, 2, 3, 4]
        }))
        .expect("box");
        assert_eq!(annotation.label, "7");
    }

    #[test]
    fn set_keeps_order_and_counts_rejections() {
        let set = AnnotationSet::from_value(&json!([
            {"type": "box", "label": "first", "box_2d": [1, 2, 3, 4]},
            {"type": "box", "label": "broken", "box_2d": [1, 2, 3]},
            {"type": "sparkle", "label": "unknown"},
            {"type": "arrow", "label": "last", "start": [0, 0], "end": [10, 10]}
        ]))
        .expect("list");

        let labels: Vec<&str> = set.iter().map(|item| item.label.as_str()).collect();
        assert_eq!(labels, vec!["first", "last"]);
        assert_eq!(set.rejected(), 2);
    }

    #[test]
    fn non_list_values_yield_no_set() {
        assert!(AnnotationSet::from_value(&json!(null)).is_none());
        assert!(AnnotationSet::from_value(&json!({"type": "box"})).is_none());
        assert!(AnnotationSet::from_json_str("not json").is_none());
        let empty = AnnotationSet::from_json_str("[]").expect("empty list");
        assert!(empty.is_empty());
    }
}
