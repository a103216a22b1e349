use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use shared::{
    domain::{DataUrl, FormData, SubmissionResult, TryOnId},
    error::TryOnError,
    protocol::{
        record_image_path, record_path, ErrorDetail, HealthResponse, TryOnImageResponse,
        TryOnRecord, TryOnRequest, TryOnResponse, GENERATE_PATH, HEALTH_PATH, LIST_PATH,
    },
};
use tracing::{error, info, warn};

pub mod config;
pub mod image_loader;
pub mod submission;
pub mod wizard;

pub use config::{load_settings, ClientSettings, SettingsError};
pub use image_loader::{ImageLoadError, ImageLoadOutcome, ImageLoader};
pub use submission::SubmissionController;
pub use wizard::{
    EditStep, ImageApplied, PendingSubmission, SubmissionTicket, TransitionError, Wizard,
    WizardState, PROGRESS_MESSAGES,
};

/// Anything that can turn a validated request into a try-on result.
#[async_trait]
pub trait TryOnBackend: Send + Sync {
    async fn generate(&self, request: &TryOnRequest) -> Result<SubmissionResult, TryOnError>;
}

/// Maps one response of the generate endpoint onto the error taxonomy.
pub fn interpret_generate_response(
    status: StatusCode,
    body: &[u8],
) -> Result<SubmissionResult, TryOnError> {
    if !status.is_success() {
        let detail = serde_json::from_slice::<ErrorDetail>(body)
            .ok()
            .and_then(|body| body.detail);
        return Err(TryOnError::http(status.as_u16(), detail));
    }

    let parsed: TryOnResponse =
        serde_json::from_slice(body).map_err(|err| TryOnError::Decode(err.to_string()))?;
    if !parsed.success {
        return Err(TryOnError::application(parsed.error));
    }
    Ok(parsed.into())
}

#[derive(Clone)]
pub struct TryOnClient {
    http: Client,
    settings: ClientSettings,
}

impl TryOnClient {
    pub fn new(settings: ClientSettings) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("failed to build http client")?;
        Ok(Self { http, settings })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Validates `data` and submits it. Nothing is sent when validation fails.
    pub async fn generate_try_on(&self, data: &FormData) -> Result<SubmissionResult, TryOnError> {
        let request = TryOnRequest::from_form(data)?;
        self.submit(&request).await
    }

    pub async fn submit(&self, request: &TryOnRequest) -> Result<SubmissionResult, TryOnError> {
        let url = self.settings.endpoint(GENERATE_PATH);
        info!(
            style = request.style.as_str(),
            user_image_bytes = request.user_image.len(),
            clothing_image_bytes = request.clothing_image.len(),
            "tryon: posting generation request"
        );

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|err| {
                error!("tryon: request to {url} failed: {err}");
                TryOnError::Network(err.to_string())
            })?;
        let status = response.status();
        let body = response.bytes().await.map_err(|err| {
            error!("tryon: reading response body failed: {err}");
            TryOnError::Network(err.to_string())
        })?;

        let outcome = interpret_generate_response(status, &body);
        match &outcome {
            Ok(result) => info!(
                status = status.as_u16(),
                id = result.id.as_ref().map(|id| id.0.as_str()),
                "tryon: generation succeeded"
            ),
            Err(err @ TryOnError::Application(_)) => {
                warn!(status = status.as_u16(), "tryon: backend reported failure: {err}")
            }
            Err(err) => warn!(status = status.as_u16(), "tryon: generation failed: {err}"),
        }
        outcome
    }

    pub async fn health(&self) -> Result<String> {
        let body: HealthResponse = self
            .http
            .get(self.settings.endpoint(HEALTH_PATH))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body.message)
    }

    pub async fn fetch_result(&self, id: &TryOnId) -> Result<TryOnRecord> {
        let response = self
            .http
            .get(self.settings.endpoint(&record_path(id)))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(anyhow!("try-on result {id} not found"));
        }
        Ok(response.error_for_status()?.json().await?)
    }

    pub async fn fetch_result_image(&self, id: &TryOnId) -> Result<String> {
        let response = self
            .http
            .get(self.settings.endpoint(&record_image_path(id)))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(anyhow!("no try-on image available for {id}"));
        }
        let body: TryOnImageResponse = response.error_for_status()?.json().await?;
        Ok(body.image_base64)
    }

    pub async fn list_results(&self) -> Result<Vec<TryOnRecord>> {
        Ok(self
            .http
            .get(self.settings.endpoint(LIST_PATH))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    /// Bytes of a result image, which the backend hands out either inline as
    /// a data URL or as a link to a hosted file.
    pub async fn result_image_bytes(&self, image: &str) -> Result<Vec<u8>> {
        if let Some(data_url) = DataUrl::parse(image) {
            return data_url
                .decode()
                .context("result image is not valid base64");
        }
        if !(image.starts_with("http://") || image.starts_with("https://")) {
            return Err(anyhow!("unsupported result image reference"));
        }
        let bytes = self
            .http
            .get(image)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        info!(bytes = bytes.len(), "tryon: downloaded result image");
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl TryOnBackend for TryOnClient {
    async fn generate(&self, request: &TryOnRequest) -> Result<SubmissionResult, TryOnError> {
        self.submit(request).await
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
