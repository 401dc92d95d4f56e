//! Display text for a prediction outcome.

use std::fmt;

use serde_json::Value;

use crate::models::PredictionResult;

const NOT_PROVIDED: &str = "Not provided";

/// Renders a [`PredictionResult`] the way the result panel reads.
pub struct ResultDisplay<'a>(pub &'a PredictionResult);

impl fmt::Display for ResultDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;
        writeln!(f, "Recommended size: {}", result.predicted_size)?;
        writeln!(f, "Confidence: {:.2}%", result.confidence)?;
        writeln!(f, "{}", result.message)?;

        f.write_str("\nAll probabilities\n")?;
        for (size, prob) in &result.all_probabilities {
            writeln!(f, "- {size}: {}%", plain_value(prob))?;
        }

        let input = &result.input_data;
        f.write_str("\nInput used\n")?;
        writeln!(f, "- Height: {} cm", number_or_blank(input.height))?;
        writeln!(f, "- Weight: {} kg", number_or_blank(input.weight))?;
        writeln!(f, "- Chest size: {}", label_or_not_provided(input.chest_size.as_deref()))?;
        writeln!(f, "- Waist size: {}", label_or_not_provided(input.waist_size.as_deref()))
    }
}

pub fn render_result(result: &PredictionResult) -> String {
    ResultDisplay(result).to_string()
}

pub fn render_error(message: &str) -> String {
    format!("Error: {message}\n")
}

// Strings print bare; numbers as the predictor wrote them.
fn plain_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn number_or_blank(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn label_or_not_provided(label: Option<&str>) -> &str {
    label.filter(|l| !l.is_empty()).unwrap_or(NOT_PROVIDED)
}
