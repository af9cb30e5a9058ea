use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Description used when the service omits one (or sends an empty string).
pub const DEFAULT_IMAGE_DESCRIPTION: &str = "No description available";

/// How thoroughly the service should analyze a video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    #[default]
    Detailed,
    Overview,
    InteractionTracking,
}

impl AnalysisMode {
    /// Wire value of the `analysis_type` form field.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMode::Detailed => "detailed",
            AnalysisMode::Overview => "overview",
            AnalysisMode::InteractionTracking => "interaction_tracking",
        }
    }
}

impl Display for AnalysisMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "detailed" => Ok(AnalysisMode::Detailed),
            "overview" => Ok(AnalysisMode::Overview),
            "interaction_tracking" | "interactions" => Ok(AnalysisMode::InteractionTracking),
            other => Err(format!(
                "Unknown analysis mode '{}' (expected detailed, overview or interaction_tracking)",
                other
            )),
        }
    }
}

/// Image analysis with every optional field filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResult {
    pub description: String,
    pub technical_details: Map<String, JsonValue>,
    pub objects: Vec<JsonValue>,
    pub text: Vec<JsonValue>,
}

impl ImageResult {
    /// Normalize a `/image/analyze` response body.
    ///
    /// Only an empty body is an error. Absent, null or falsy fields get
    /// defaults; a scalar where a list is expected becomes a one-element list,
    /// and a non-object `technical_details` is dropped.
    pub fn from_payload(payload: JsonValue) -> Result<Self, serde_json::Error> {
        if present(Some(&payload)).is_none() {
            return Err(serde_json::Error::custom("No response received from server"));
        }

        Ok(Self {
            description: present(payload.get("description"))
                .map(text_of)
                .unwrap_or_else(|| DEFAULT_IMAGE_DESCRIPTION.to_string()),
            technical_details: present(payload.get("technical_details"))
                .and_then(JsonValue::as_object)
                .cloned()
                .unwrap_or_default(),
            objects: list_of(payload.get("objects")),
            text: list_of(payload.get("text")),
        })
    }
}

/// `value` unless it is absent or falsy (`null`, `false`, `0`, `""`).
fn present(value: Option<&JsonValue>) -> Option<&JsonValue> {
    value.filter(|v| match v {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64() != Some(0.0),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    })
}

fn text_of(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn list_of(value: Option<&JsonValue>) -> Vec<JsonValue> {
    match present(value) {
        Some(JsonValue::Array(items)) => items.clone(),
        Some(other) => vec![other.clone()],
        None => Vec::new(),
    }
}

/// One blank-line separated block of a video narrative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSection {
    Header(String),
    Body(String),
}

/// Raw narrative returned by `/video/analyze`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoResult {
    pub output: String,
}

impl VideoResult {
    /// Normalize a `/video/analyze` response body.
    ///
    /// A list `output` is joined line by line; any other non-string value is
    /// rendered as JSON.
    pub fn from_payload(payload: JsonValue) -> Result<Self, serde_json::Error> {
        if payload.is_null() {
            return Err(serde_json::Error::custom("No response received from server"));
        }

        let output = match present(payload.get("output")) {
            Some(JsonValue::Array(lines)) => {
                lines.iter().map(text_of).collect::<Vec<_>>().join("\n")
            }
            Some(other) => text_of(other),
            None => String::new(),
        };

        Ok(Self { output })
    }

    /// Split the narrative into header and body sections.
    ///
    /// `Timeline:` and `Summary:` blocks are headers; empty blocks are skipped.
    pub fn sections(&self) -> Vec<VideoSection> {
        self.output
            .split("\n\n")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                let lowered = s.to_lowercase();
                if lowered == "timeline:" || lowered == "summary:" {
                    VideoSection::Header(s.to_string())
                } else {
                    VideoSection::Body(s.to_string())
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AnalysisResult {
    Image(ImageResult),
    Video(VideoResult),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_analysis_mode_wire_values() {
        assert_eq!(AnalysisMode::Detailed.as_str(), "detailed");
        assert_eq!(AnalysisMode::Overview.as_str(), "overview");
        assert_eq!(
            AnalysisMode::InteractionTracking.as_str(),
            "interaction_tracking"
        );
        assert_eq!(AnalysisMode::default(), AnalysisMode::Detailed);
    }

    #[test]
    fn test_analysis_mode_from_str() {
        assert_eq!(
            "overview".parse::<AnalysisMode>(),
            Ok(AnalysisMode::Overview)
        );
        assert_eq!(
            "interaction-tracking".parse::<AnalysisMode>(),
            Ok(AnalysisMode::InteractionTracking)
        );
        assert_eq!(
            " DETAILED ".parse::<AnalysisMode>(),
            Ok(AnalysisMode::Detailed)
        );
        assert!("fast".parse::<AnalysisMode>().is_err());
    }

    #[test]
    fn test_image_result_fills_defaults() {
        let result = ImageResult::from_payload(json!({"description": "a cat"})).unwrap();
        assert_eq!(result.description, "a cat");
        assert!(result.technical_details.is_empty());
        assert!(result.objects.is_empty());
        assert!(result.text.is_empty());
    }

    #[test]
    fn test_image_result_default_description() {
        let result = ImageResult::from_payload(json!({})).unwrap();
        assert_eq!(result.description, DEFAULT_IMAGE_DESCRIPTION);

        let result = ImageResult::from_payload(json!({"description": ""})).unwrap();
        assert_eq!(result.description, DEFAULT_IMAGE_DESCRIPTION);

        let result = ImageResult::from_payload(json!({"description": null})).unwrap();
        assert_eq!(result.description, DEFAULT_IMAGE_DESCRIPTION);
    }

    #[test]
    fn test_image_result_keeps_all_fields() {
        let result = ImageResult::from_payload(json!({
            "description": "street at night",
            "technical_details": {"width": 1920, "format": "png"},
            "objects": ["car", "lamp"],
            "text": ["STOP"],
            "unexpected": true
        }))
        .unwrap();
        assert_eq!(result.technical_details["width"], json!(1920));
        assert_eq!(result.objects, vec![json!("car"), json!("lamp")]);
        assert_eq!(result.text, vec![json!("STOP")]);
    }

    #[test]
    fn test_image_result_rejects_null_body() {
        assert!(ImageResult::from_payload(JsonValue::Null).is_err());
    }

    #[test]
    fn test_image_result_tolerates_unexpected_field_types() {
        let result = ImageResult::from_payload(json!({
            "description": "a cat",
            "text": "HELLO",
            "objects": 0,
            "technical_details": ["not", "a", "map"]
        }))
        .unwrap();
        assert_eq!(result.description, "a cat");
        assert_eq!(result.text, vec![json!("HELLO")]);
        assert!(result.objects.is_empty());
        assert!(result.technical_details.is_empty());
    }

    #[test]
    fn test_image_result_non_object_body_gets_defaults() {
        let result = ImageResult::from_payload(json!(["unexpected"])).unwrap();
        assert_eq!(result.description, DEFAULT_IMAGE_DESCRIPTION);
        assert!(ImageResult::from_payload(json!("")).is_err());
    }

    #[test]
    fn test_video_result_defaults_output() {
        let result = VideoResult::from_payload(json!({})).unwrap();
        assert_eq!(result.output, "");
        let result = VideoResult::from_payload(json!({"output": "Summary:"})).unwrap();
        assert_eq!(result.output, "Summary:");
    }

    #[test]
    fn test_video_result_joins_list_output() {
        let result = VideoResult::from_payload(json!({"output": ["line1", "line2"]})).unwrap();
        assert_eq!(result.output, "line1\nline2");

        let result = VideoResult::from_payload(json!({"output": {"summary": "ok"}})).unwrap();
        assert_eq!(result.output, r#"{"summary":"ok"}"#);
    }

    #[test]
    fn test_video_sections() {
        let result = VideoResult {
            output: "Timeline:\n\n00:01 A door opens\n00:05 Someone enters\n\n\n\nSUMMARY: \n\nA visitor arrives."
                .to_string(),
        };
        assert_eq!(
            result.sections(),
            vec![
                VideoSection::Header("Timeline:".to_string()),
                VideoSection::Body("00:01 A door opens\n00:05 Someone enters".to_string()),
                VideoSection::Header("SUMMARY:".to_string()),
                VideoSection::Body("A visitor arrives.".to_string()),
            ]
        );
    }

    #[test]
    fn test_analysis_result_serializes_with_kind_tag() {
        let result = AnalysisResult::Video(VideoResult {
            output: "done".to_string(),
        });
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["kind"], "video");
        assert_eq!(value["output"], "done");
    }
}
