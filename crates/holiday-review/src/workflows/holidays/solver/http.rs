use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use tracing::{debug, info};

use super::{AssignmentSolver, ComputeRequest, TransportError};
use crate::config::SolverConfig;
use crate::workflows::holidays::domain::{format_calendar_date, InputFile, XLSX_CONTENT_TYPE};

/// Solver reached over HTTP: `POST {base}/{mode}` with a multipart form and
/// `GET {base}/template`.
#[derive(Debug, Clone)]
pub struct HttpSolver {
    client: Client,
    base_url: String,
}

impl HttpSolver {
    pub fn new(config: &SolverConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| TransportError::Request(err.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

impl AssignmentSolver for HttpSolver {
    async fn compute(
        &self,
        request: &ComputeRequest,
        input: &InputFile,
    ) -> Result<Vec<u8>, TransportError> {
        let file = Part::bytes(input.bytes().to_vec())
            .file_name(input.name().to_string())
            .mime_str(XLSX_CONTENT_TYPE)
            .map_err(|err| TransportError::Request(err.to_string()))?;

        let form = Form::new()
            .part("file", file)
            .text("startDate", format_calendar_date(request.start_date))
            .text("endDate", format_calendar_date(request.end_date))
            .text("minProximityDays", request.min_proximity_days.to_string());

        let url = self.endpoint(request.mode.as_str());
        info!(%url, input = input.name(), "requesting assignment computation");

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|err| TransportError::Request(err.to_string()))?;

        read_body(response).await
    }

    async fn template(&self) -> Result<Vec<u8>, TransportError> {
        let url = self.endpoint("template");
        debug!(%url, "downloading input template");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| TransportError::Request(err.to_string()))?;

        read_body(response).await
    }
}

async fn read_body(response: Response) -> Result<Vec<u8>, TransportError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(TransportError::Status {
            status: status.as_u16(),
            message,
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|err| TransportError::Request(err.to_string()))?;
    Ok(bytes.to_vec())
}
