use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TryOnId(pub String);

impl fmt::Display for TryOnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which of the two uploaded images a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSlot {
    User,
    Clothing,
}

impl ImageSlot {
    pub const ALL: [ImageSlot; 2] = [ImageSlot::User, ImageSlot::Clothing];

    pub fn label(self) -> &'static str {
        match self {
            Self::User => "Your photo",
            Self::Clothing => "Clothing item",
        }
    }
}

impl fmt::Display for ImageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Clothing => f.write_str("clothing"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StylePreference {
    #[default]
    Casual,
    Formal,
    Sporty,
    Trendy,
}

impl StylePreference {
    pub const ALL: [StylePreference; 4] = [
        StylePreference::Casual,
        StylePreference::Formal,
        StylePreference::Sporty,
        StylePreference::Trendy,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Casual => "Casual",
            Self::Formal => "Formal",
            Self::Sporty => "Sporty",
            Self::Trendy => "Trendy",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Casual => "casual",
            Self::Formal => "formal",
            Self::Sporty => "sporty",
            Self::Trendy => "trendy",
        }
    }
}

impl std::str::FromStr for StylePreference {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|style| style.as_str() == value)
            .ok_or_else(|| format!("unknown style '{value}' (expected casual, formal, sporty or trendy)"))
    }
}

/// Body measurements exactly as typed. Values are numeric strings by
/// convention only; nothing here parses them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Measurements {
    pub height: String,
    pub weight: String,
    pub chest: String,
    pub waist: String,
    pub hips: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasurementField {
    Height,
    Weight,
    Chest,
    Waist,
    Hips,
}

impl MeasurementField {
    pub const ALL: [MeasurementField; 5] = [
        MeasurementField::Height,
        MeasurementField::Weight,
        MeasurementField::Chest,
        MeasurementField::Waist,
        MeasurementField::Hips,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Height => "height",
            Self::Weight => "weight",
            Self::Chest => "chest",
            Self::Waist => "waist",
            Self::Hips => "hips",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Height => "Height (cm)",
            Self::Weight => "Weight (kg)",
            Self::Chest => "Chest (cm)",
            Self::Waist => "Waist (cm)",
            Self::Hips => "Hips (cm)",
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            Self::Height => "170",
            Self::Weight => "65",
            Self::Chest => "90",
            Self::Waist => "75",
            Self::Hips => "95",
        }
    }
}

impl Measurements {
    pub fn get(&self, field: MeasurementField) -> &str {
        match field {
            MeasurementField::Height => &self.height,
            MeasurementField::Weight => &self.weight,
            MeasurementField::Chest => &self.chest,
            MeasurementField::Waist => &self.waist,
            MeasurementField::Hips => &self.hips,
        }
    }

    pub fn get_mut(&mut self, field: MeasurementField) -> &mut String {
        match field {
            MeasurementField::Height => &mut self.height,
            MeasurementField::Weight => &mut self.weight,
            MeasurementField::Chest => &mut self.chest,
            MeasurementField::Waist => &mut self.waist,
            MeasurementField::Hips => &mut self.hips,
        }
    }

    pub fn first_missing(&self) -> Option<MeasurementField> {
        MeasurementField::ALL
            .into_iter()
            .find(|field| self.get(*field).is_empty())
    }
}

/// A `data:<mime>;base64,<payload>` string.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataUrl(String);

impl DataUrl {
    pub const FALLBACK_MIME: &'static str = "application/octet-stream";

    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        let mime = if mime.trim().is_empty() {
            Self::FALLBACK_MIME
        } else {
            mime.trim()
        };
        Self(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
    }

    /// Accepts any string that carries the `data:` scheme and a comma
    /// separating the header from the payload.
    pub fn parse(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.starts_with("data:") && raw.contains(',') {
            Some(Self(raw))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn mime(&self) -> &str {
        let header = self.header();
        header
            .split(';')
            .next()
            .filter(|mime| !mime.is_empty())
            .unwrap_or(Self::FALLBACK_MIME)
    }

    pub fn is_image(&self) -> bool {
        self.mime().starts_with("image/")
    }

    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        let payload = self.0.split_once(',').map(|(_, p)| p).unwrap_or_default();
        STANDARD.decode(payload)
    }

    fn header(&self) -> &str {
        self.0
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(','))
            .map(|(header, _)| header)
            .unwrap_or_default()
    }
}

// Payloads run to megabytes; keep them out of debug output and logs.
impl fmt::Debug for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataUrl({}, {} bytes)", self.mime(), self.0.len())
    }
}

/// Everything the wizard collects before submission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormData {
    pub user_image: Option<DataUrl>,
    pub clothing_image: Option<DataUrl>,
    pub name: String,
    pub measurements: Measurements,
    pub style: StylePreference,
}

impl FormData {
    pub fn image(&self, slot: ImageSlot) -> Option<&DataUrl> {
        match slot {
            ImageSlot::User => self.user_image.as_ref(),
            ImageSlot::Clothing => self.clothing_image.as_ref(),
        }
    }

    pub fn set_image(&mut self, slot: ImageSlot, image: Option<DataUrl>) {
        match slot {
            ImageSlot::User => self.user_image = image,
            ImageSlot::Clothing => self.clothing_image = image,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    Details = 1,
    Measurements = 2,
    Result = 3,
}

impl WizardStep {
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Details => "Upload photos",
            Self::Measurements => "Measurements & style",
            Self::Result => "Your try-on",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TryOnStatus {
    Processing,
    Completed,
    Failed,
}

/// Outcome of a successful generation call, as shown on step 3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    pub success: bool,
    pub id: Option<TryOnId>,
    /// Either a data URL or an `http(s)` URL, depending on the backend.
    pub result_image: Option<String>,
    pub feedback: Option<String>,
    pub status: Option<TryOnStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_round_trips_mime_and_payload() {
        let url = DataUrl::from_bytes("image/png", b"\x89PNG");
        assert!(url.as_str().starts_with("data:image/png;base64,"));
        assert_eq!(url.mime(), "image/png");
        assert!(url.is_image());
        assert_eq!(url.decode().expect("decode"), b"\x89PNG");
    }

    #[test]
    fn data_url_rejects_plain_urls() {
        assert!(DataUrl::parse("https://cdn.example.com/a.png").is_none());
        assert!(DataUrl::parse("data:image/png;base64,AAAA").is_some());
    }

    #[test]
    fn data_url_debug_does_not_leak_payload() {
        let url = DataUrl::from_bytes("image/jpeg", &[7u8; 64]);
        let rendered = format!("{url:?}");
        assert!(rendered.starts_with("DataUrl(image/jpeg"));
        assert!(!rendered.contains("base64"));
    }

    #[test]
    fn style_parses_case_insensitively_and_defaults_to_casual() {
        assert_eq!("Sporty".parse::<StylePreference>(), Ok(StylePreference::Sporty));
        assert!("grunge".parse::<StylePreference>().is_err());
        assert_eq!(StylePreference::default(), StylePreference::Casual);
    }

    #[test]
    fn first_missing_measurement_follows_field_order() {
        let mut measurements = Measurements {
            height: "170".into(),
            ..Default::default()
        };
        assert_eq!(measurements.first_missing(), Some(MeasurementField::Weight));
        for field in MeasurementField::ALL {
            *measurements.get_mut(field) = "1".into();
        }
        assert_eq!(measurements.first_missing(), None);
    }
}
