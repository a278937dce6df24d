//! HTTP client for the body-measurement inference service.

use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use reqwest::multipart::{Form, Part};
use tracing::{info, warn};
use url::Url;

use crate::config::MeasureConfig;
use crate::error::RemoteServiceError;
use crate::measurement::MeasurementResult;
use crate::slots::{CandidateFile, SlotRole};

/// Everything sent in one measurement request.
#[derive(Debug, Clone)]
pub struct MeasurementRequest {
    pub front: CandidateFile,
    pub side: CandidateFile,
    pub standing: CandidateFile,
    /// Sent as `height_cm` only when height hints are enabled.
    pub height_cm: Option<f64>,
}

impl MeasurementRequest {
    pub fn file(&self, role: SlotRole) -> &CandidateFile {
        match role {
            SlotRole::Front => &self.front,
            SlotRole::Side => &self.side,
            SlotRole::Standing => &self.standing,
        }
    }
}

/// The remote inference service, as seen by the submission controller.
pub trait MeasurementService: Send + Sync {
    fn measure(
        &self,
        request: MeasurementRequest,
    ) -> impl Future<Output = Result<MeasurementResult, RemoteServiceError>> + Send;
}

/// Multipart-over-HTTP implementation of [`MeasurementService`].
pub struct HttpMeasurementClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpMeasurementClient {
    pub fn new(endpoint: Url, timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, endpoint })
    }

    pub fn from_config(config: &MeasureConfig) -> anyhow::Result<Self> {
        Self::new(config.endpoint_url()?, config.request_timeout(), &config.user_agent)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Build the multipart body: `front`, `side`, `stand`, and optionally `height_cm`.
pub fn build_form(request: &MeasurementRequest) -> Result<Form, reqwest::Error> {
    let mut form = Form::new();
    for role in SlotRole::ALL {
        form = form.part(role.form_field(), file_part(request.file(role))?);
    }
    if let Some(height) = request.height_cm {
        form = form.text("height_cm", height.to_string());
    }
    Ok(form)
}

fn file_part(file: &CandidateFile) -> Result<Part, reqwest::Error> {
    Part::bytes(file.bytes.to_vec())
        .file_name(file.name.clone())
        .mime_str(file.media_type.trim())
}

impl MeasurementService for HttpMeasurementClient {
    async fn measure(
        &self,
        request: MeasurementRequest,
    ) -> Result<MeasurementResult, RemoteServiceError> {
        let form = build_form(&request)?;
        info!(
            "Submitting measurement request to {} ({} + {} + {} bytes, height hint: {})",
            self.endpoint,
            request.front.len(),
            request.side.len(),
            request.standing.len(),
            request.height_cm.is_some()
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Measurement service returned {}", status);
            return Err(RemoteServiceError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        MeasurementResult::from_response_body(&body)
    }
}
