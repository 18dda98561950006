use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::annotation::AnnotationSet;

/// Result of one vision-model round trip. Only `annotations` feeds the
/// overlay; the rest is shown as text next to the photo.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Diagnosis {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub diagnosis: String,
    #[serde(deserialize_with = "null_as_default")]
    pub steps: Vec<String>,
    pub annotations: Value,
}

/// Model output sometimes sends `null` for fields it has nothing to say about.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Diagnosis {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("diagnosis is not valid JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read diagnosis {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("cannot parse {}", path.display()))
    }

    /// `None` when the result carries no annotation list at all.
    pub fn annotation_set(&self) -> Option<AnnotationSet> {
        AnnotationSet::from_value(&self.annotations)
    }
}

#[cfg(test)]
mod tests {
    use super::Diagnosis;

    #[test]
    fn parses_full_result() {
        let diagnosis = Diagnosis::from_json_str(
            r#"{
                "title": "Loose cabinet hinge",
                "diagnosis": "The upper hinge screw is stripped.",
                "steps": ["Remove the screw", "Fill the hole", "Re-drill and fasten"],
                "annotations": [
                    {"type": "circle", "label": "Stripped screw", "center": [420, 310], "radius": 40},
                    {"type": "arrow", "label": "Door sag", "start": [600, 500], "end": [600, 700]}
                ]
            }"#,
        )
        .expect("diagnosis");

        assert_eq!(diagnosis.steps.len(), 3);
        let set = diagnosis.annotation_set().expect("annotations");
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn missing_annotations_yield_no_set() {
        let diagnosis =
            Diagnosis::from_json_str(r#"{"title": "Nothing to mark"}"#).expect("diagnosis");
        assert!(diagnosis.annotation_set().is_none());
        assert!(diagnosis.steps.is_empty());
    }

    #[test]
    fn annotations_of_wrong_shape_yield_no_set() {
        let diagnosis = Diagnosis::from_json_str(r#"{"annotations": {"type": "box"}}"#)
            .expect("diagnosis");
        assert!(diagnosis.annotation_set().is_none());
    }

    #[test]
    fn loads_demo_file() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/hinge.json");
        let diagnosis = Diagnosis::load(&path).expect("demo diagnosis");
        let set = diagnosis.annotation_set().expect("annotations");
        assert_eq!(set.len(), 4);
        assert_eq!(set.rejected(), 0);
    }

    #[test]
    fn null_text_fields_keep_the_overlay() {
        let diagnosis = Diagnosis::from_json_str(
            r#"{
                "title": null,
                "diagnosis": null,
                "steps": null,
                "annotations": [{"type": "box", "label": "Latch", "box_2d": [100, 100, 200, 200]}]
            }"#,
        )
        .expect("diagnosis");

        assert!(diagnosis.title.is_empty());
        assert!(diagnosis.steps.is_empty());
        assert_eq!(diagnosis.annotation_set().map(|set| set.len()), Some(1));
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(Diagnosis::from_json_str("{").is_err());
    }
}
