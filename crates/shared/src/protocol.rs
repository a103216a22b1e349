use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    domain::{
        FormData, ImageSlot, Measurements, StylePreference, SubmissionResult, TryOnId,
        TryOnStatus,
    },
    error::ValidationError,
    validation::validate_submission,
};

pub const GENERATE_PATH: &str = "/api/tryon/generate";
pub const HEALTH_PATH: &str = "/api/";
pub const LIST_PATH: &str = "/api/tryons";

pub fn record_path(id: &TryOnId) -> String {
    format!("/api/tryon/{}", id.0)
}

pub fn record_image_path(id: &TryOnId) -> String {
    format!("/api/tryon/{}/base64", id.0)
}

/// Body of `POST /api/tryon/generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TryOnRequest {
    pub name: String,
    pub user_image: String,
    pub clothing_image: String,
    pub measurements: Measurements,
    #[serde(default)]
    pub style: StylePreference,
}

impl TryOnRequest {
    /// Validates the form and builds the wire payload from it.
    pub fn from_form(data: &FormData) -> Result<Self, ValidationError> {
        validate_submission(data)?;
        let user_image = data
            .user_image
            .as_ref()
            .ok_or(ValidationError::MissingImage(ImageSlot::User))?;
        let clothing_image = data
            .clothing_image
            .as_ref()
            .ok_or(ValidationError::MissingImage(ImageSlot::Clothing))?;
        Ok(Self {
            name: data.name.clone(),
            user_image: user_image.as_str().to_string(),
            clothing_image: clothing_image.as_str().to_string(),
            measurements: data.measurements.clone(),
            style: data.style,
        })
    }
}

/// Any 2xx body from the generate endpoint. Fields beyond `success` are
/// optional on both the success and the failure shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TryOnResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TryOnId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tryon_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TryOnStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<TryOnResponse> for SubmissionResult {
    fn from(value: TryOnResponse) -> Self {
        Self {
            success: value.success,
            id: value.id,
            result_image: value.tryon_image,
            feedback: value.feedback,
            status: value.status,
        }
    }
}

/// Error body attached to non-2xx responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub message: String,
}

/// Stored try-on as returned by `GET /api/tryon/{id}` and `GET /api/tryons`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TryOnRecord {
    pub id: TryOnId,
    pub name: String,
    #[serde(default)]
    pub user_image_url: Option<String>,
    #[serde(default)]
    pub clothing_image_url: Option<String>,
    #[serde(default)]
    pub tryon_image: Option<String>,
    pub measurements: serde_json::Value,
    pub style: String,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(deserialize_with = "deserialize_created_at")]
    pub created_at: DateTime<Utc>,
    pub status: TryOnStatus,
}

/// Accepts RFC 3339 as well as the offset-less timestamps the backend writes,
/// which are UTC.
fn deserialize_created_at<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|err| format!("invalid timestamp {raw:?}: {err}"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TryOnImageResponse {
    #[serde(default)]
    pub success: bool,
    pub image_base64: String,
    pub id: TryOnId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DataUrl;

    #[test]
    fn request_serializes_with_backend_field_names() {
        let data = FormData {
            user_image: Some(DataUrl::from_bytes("image/png", b"u")),
            clothing_image: Some(DataUrl::from_bytes("image/png", b"c")),
            name: "Ada".into(),
            measurements: Measurements {
                height: "170".into(),
                weight: "65".into(),
                chest: "90".into(),
                waist: "75".into(),
                hips: "95".into(),
            },
            style: StylePreference::Trendy,
        };
        let request = TryOnRequest::from_form(&data).expect("complete form");
        let json = serde_json::to_value(&request).expect("serialize");

        assert_eq!(json["name"], "Ada");
        assert_eq!(json["style"], "trendy");
        assert_eq!(json["measurements"]["hips"], "95");
        assert!(json["user_image"]
            .as_str()
            .is_some_and(|s| s.starts_with("data:image/png;base64,")));
    }

    #[test]
    fn request_from_incomplete_form_is_rejected() {
        assert_eq!(
            TryOnRequest::from_form(&FormData::default()),
            Err(ValidationError::MissingImage(ImageSlot::User))
        );
    }

    #[test]
    fn failure_body_without_optional_fields_parses() {
        let parsed: TryOnResponse =
            serde_json::from_str(r#"{"success":false}"#).expect("parse");
        assert!(!parsed.success);
        assert!(parsed.error.is_none());

        let parsed: TryOnResponse = serde_json::from_str(
            r#"{"success":true,"id":"abc","tryon_image":"X","feedback":"Y","status":"completed"}"#,
        )
        .expect("parse");
        let result = SubmissionResult::from(parsed);
        assert_eq!(result.result_image.as_deref(), Some("X"));
        assert_eq!(result.status, Some(TryOnStatus::Completed));
    }

    fn record_body(created_at: &str) -> String {
        format!(
            r#"{{"id":"abc","name":"Ada","tryon_image":null,
                "measurements":{{"height":"170"}},"style":"casual",
                "created_at":"{created_at}","status":"completed"}}"#
        )
    }

    #[test]
    fn record_accepts_offsetless_backend_timestamp() {
        let record: TryOnRecord =
            serde_json::from_str(&record_body("2024-05-01T12:00:00.123000")).expect("parse");
        assert_eq!(
            record.created_at.to_rfc3339(),
            "2024-05-01T12:00:00.123+00:00"
        );

        let whole_seconds: TryOnRecord =
            serde_json::from_str(&record_body("2024-05-01T12:00:00")).expect("parse");
        assert_eq!(whole_seconds.created_at.timestamp(), 1_714_564_800);
    }

    #[test]
    fn record_accepts_rfc3339_timestamp_with_offset() {
        let record: TryOnRecord =
            serde_json::from_str(&record_body("2024-05-01T14:00:00+02:00")).expect("parse");
        assert_eq!(record.created_at.timestamp(), 1_714_564_800);
    }

    #[test]
    fn record_with_garbage_timestamp_is_rejected() {
        assert!(serde_json::from_str::<TryOnRecord>(&record_body("yesterday")).is_err());
    }
}
