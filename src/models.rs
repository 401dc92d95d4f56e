use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

pub const HEIGHT_RANGE_CM: (f64, f64) = (140.0, 200.0);
pub const WEIGHT_RANGE_KG: (f64, f64) = (20.0, 150.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeLabel {
    S,
    M,
    L,
}

impl SizeLabel {
    pub const ALL: [SizeLabel; 3] = [SizeLabel::S, SizeLabel::M, SizeLabel::L];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::S => "S",
            Self::M => "M",
            Self::L => "L",
        }
    }

    /// Maps a select-box value to a label. The empty selection is `Ok(None)`.
    pub fn from_selection(value: &str) -> Result<Option<Self>, UnknownSizeLabel> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }
        value.parse().map(Some)
    }
}

impl fmt::Display for SizeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown size label {0:?}")]
pub struct UnknownSizeLabel(pub String);

impl FromStr for SizeLabel {
    type Err = UnknownSizeLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| UnknownSizeLabel(s.to_string()))
    }
}

/// Raw form values exactly as the user typed or selected them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementForm {
    pub height: String,
    pub weight: String,
    pub chest_size: String,
    pub waist_size: String,
}

impl MeasurementForm {
    pub fn normalize(&self) -> MeasurementInput {
        MeasurementInput {
            height: parse_measurement(&self.height),
            weight: parse_measurement(&self.weight),
            chest_size: normalize_selection("chest_size", &self.chest_size),
            waist_size: normalize_selection("waist_size", &self.waist_size),
        }
    }
}

/// Partial form update; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FormPatch {
    pub height: Option<String>,
    pub weight: Option<String>,
    pub chest_size: Option<String>,
    pub waist_size: Option<String>,
}

impl FormPatch {
    pub fn apply_to(self, form: &mut MeasurementForm) {
        let slots = [
            (&mut form.height, self.height),
            (&mut form.weight, self.weight),
            (&mut form.chest_size, self.chest_size),
            (&mut form.waist_size, self.waist_size),
        ];
        for (slot, value) in slots {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

fn parse_measurement(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn normalize_selection(field: &'static str, raw: &str) -> Option<SizeLabel> {
    match SizeLabel::from_selection(raw) {
        Ok(label) => label,
        Err(err) => {
            tracing::warn!(field, %err, "ignoring unrecognised size selection");
            None
        }
    }
}

/// Normalized payload sent to the predictor. Numbers that failed to parse
/// are `None` and go out as JSON `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasurementInput {
    #[serde(serialize_with = "serialize_measurement")]
    pub height: Option<f64>,
    #[serde(serialize_with = "serialize_measurement")]
    pub weight: Option<f64>,
    pub chest_size: Option<SizeLabel>,
    pub waist_size: Option<SizeLabel>,
}

impl MeasurementInput {
    /// Advisory range checks mirroring the form's declared bounds. Nothing
    /// here blocks a submission.
    pub fn advisories(&self) -> Vec<String> {
        let mut notes = Vec::new();
        check_range(&mut notes, "height", "cm", self.height, HEIGHT_RANGE_CM);
        check_range(&mut notes, "weight", "kg", self.weight, WEIGHT_RANGE_KG);
        notes
    }
}

// Whole numbers go out as JSON integers (`175`, not `175.0`).
fn serialize_measurement<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
            serializer.serialize_some(&(*v as i64))
        }
        Some(v) => serializer.serialize_some(v),
        None => serializer.serialize_none(),
    }
}

fn check_range(
    notes: &mut Vec<String>,
    field: &str,
    unit: &str,
    value: Option<f64>,
    (min, max): (f64, f64),
) {
    match value {
        None => notes.push(format!("{field} is not a number")),
        Some(v) if v < min || v > max => {
            notes.push(format!("{field} {v} {unit} is outside {min}-{max} {unit}"))
        }
        Some(_) => {}
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub predicted_size: String,
    pub confidence: f64,
    pub message: String,
    /// Label to percentage, in the order the predictor sent them.
    pub all_probabilities: serde_json::Map<String, serde_json::Value>,
    pub input_data: InputEcho,
}

/// The predictor's echo of the input it used. Sizes stay free text so an
/// unexpected label is shown rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputEcho {
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub chest_size: Option<String>,
    #[serde(default)]
    pub waist_size: Option<String>,
}

/// Error body returned by the predictor on a non-success status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub detail: Option<String>,
}
