use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use tokio::time::timeout;

use crate::models::{ErrorDetail, MeasurementInput, PredictionResult};

pub const DEFAULT_PREDICT_URL: &str =
    "https://cloth-size-recommendation-system.onrender.com/predict";
pub const PREDICTION_FAILED: &str = "Prediction failed";
pub const SOMETHING_WENT_WRONG: &str = "Something went wrong";

/// Failure of a single prediction request. `Display` is the message shown
/// to the user, nothing more.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// The call never produced a response.
    #[error("{0}")]
    Transport(String),
    /// The predictor answered with a non-success status.
    #[error("{0}")]
    Rejected(String),
    /// A success status with a body that is not a prediction.
    #[error("{0}")]
    Malformed(String),
}

impl RequestError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Rejected(_) => "rejected",
            Self::Malformed(_) => "malformed",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Transport(msg) | Self::Rejected(msg) | Self::Malformed(msg) => msg,
        }
    }

    fn transport(err: impl ToString) -> Self {
        Self::Transport(non_empty_or(err.to_string(), SOMETHING_WENT_WRONG))
    }

    fn malformed(err: impl ToString) -> Self {
        Self::Malformed(non_empty_or(err.to_string(), SOMETHING_WENT_WRONG))
    }
}

fn non_empty_or(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

#[derive(Debug, Clone)]
pub struct PredictorClient {
    client: Client,
    predict_url: String,
    timeout: Option<Duration>,
}

impl PredictorClient {
    pub fn new(predict_url: impl Into<String>) -> Result<Self, RequestError> {
        let client = Client::builder().build().map_err(RequestError::transport)?;
        Ok(Self::with_client(client, predict_url))
    }

    /// Use an already configured `reqwest::Client`, e.g. one pointed at a
    /// mock server in tests.
    pub fn with_client(client: Client, predict_url: impl Into<String>) -> Self {
        Self {
            client,
            predict_url: predict_url.into(),
            timeout: None,
        }
    }

    /// Bound the whole exchange. Without it the transport default applies.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn predict_url(&self) -> &str {
        &self.predict_url
    }

    /// Issues exactly one `POST` with the normalized input and maps the
    /// outcome. Never retries.
    pub async fn submit(&self, input: &MeasurementInput) -> Result<PredictionResult, RequestError> {
        match self.timeout {
            Some(limit) => timeout(limit, self.exchange(input))
                .await
                .map_err(|_| RequestError::Transport("prediction request timed out".to_string()))?,
            None => self.exchange(input).await,
        }
    }

    async fn exchange(&self, input: &MeasurementInput) -> Result<PredictionResult, RequestError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let response = self
            .client
            .post(&self.predict_url)
            .headers(headers)
            .json(input)
            .send()
            .await
            .map_err(RequestError::transport)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ErrorDetail>()
                .await
                .ok()
                .and_then(|body| body.detail)
                .filter(|detail| !detail.trim().is_empty());
            tracing::debug!(%status, has_detail = detail.is_some(), "predictor rejected request");
            return Err(RequestError::Rejected(
                detail.unwrap_or_else(|| PREDICTION_FAILED.to_string()),
            ));
        }

        response
            .json::<PredictionResult>()
            .await
            .map_err(RequestError::malformed)
    }
}
