use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::wire::{
    decode_list, decode_optional, JobSnapshot, JobTicket, PageDescriptor, RecordFilters,
    ReportFilters, StatusUpdateBody, SubmitBody, SubmitOptions,
};
use super::{ApiError, ScreeningApi};
use crate::config::BackendConfig;
use crate::domain::{Record, RecordId, RecordStatus, Report, ReportId};
use crate::items::QueryItem;

/// reqwest-backed implementation of [`ScreeningApi`].
#[derive(Debug, Clone)]
pub struct HttpScreeningClient {
    client: Client,
    base_url: Url,
}

impl HttpScreeningClient {
    pub fn new(config: &BackendConfig) -> Self {
        Self::with_client(Client::new(), config.base_url.clone())
    }

    pub fn with_client(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|err| ApiError::Network(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        Err(ApiError::Http {
            status: status.as_u16(),
            body: parse_lenient(&text),
        })
    }

    /// Send and parse the body as JSON; a body that does not parse is `Null`.
    async fn send_json(&self, request: RequestBuilder) -> Result<Value, ApiError> {
        let response = self.send(request).await?;
        let text = response
            .text()
            .await
            .map_err(|err| ApiError::Network(err.to_string()))?;
        Ok(parse_lenient(&text))
    }
}

fn parse_lenient(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

#[async_trait]
impl ScreeningApi for HttpScreeningClient {
    async fn submit_job(
        &self,
        items: &[QueryItem],
        options: &SubmitOptions,
    ) -> Result<JobTicket, ApiError> {
        let url = self.endpoint(&["consultas"])?;
        let body = SubmitBody {
            items,
            mode: "async",
            options,
        };
        debug!(items = items.len(), "submitting job");
        let payload = self.send_json(self.client.post(url).json(&body)).await?;
        Ok(decode_optional(payload).unwrap_or_default())
    }

    async fn job_status(&self, job_id: &str) -> Result<JobSnapshot, ApiError> {
        let url = self.endpoint(&["consultas", job_id, "status"])?;
        let payload = self.send_json(self.client.get(url)).await?;
        Ok(JobSnapshot::from_payload(payload))
    }

    async fn list_records(&self, filters: &RecordFilters) -> Result<Vec<Record>, ApiError> {
        let url = self.endpoint(&["records"])?;
        let request = self.client.get(url).query(&filters.query_pairs());
        let payload = self.send_json(request).await?;
        Ok(decode_list("list_records", payload))
    }

    async fn update_record_status(
        &self,
        id: &RecordId,
        status: RecordStatus,
        error_message: Option<&str>,
    ) -> Result<Option<Record>, ApiError> {
        let url = self.endpoint(&["records", &id.0, "estado"])?;
        let body = StatusUpdateBody {
            estado: status,
            mensaje_error: error_message,
        };
        let payload = self.send_json(self.client.put(url).json(&body)).await?;
        Ok(decode_optional(payload))
    }

    async fn list_reports(&self, filters: &ReportFilters) -> Result<Vec<Report>, ApiError> {
        let url = self.endpoint(&["reports"])?;
        let request = self.client.get(url).query(&filters.query_pairs());
        let payload = self.send_json(request).await?;
        Ok(decode_list("list_reports", payload))
    }

    async fn report_by_job(&self, job_id: &str) -> Result<Option<Report>, ApiError> {
        let url = self.endpoint(&["reports", "by-job", job_id])?;
        let payload = self.send_json(self.client.get(url)).await?;
        Ok(decode_optional(payload))
    }

    async fn list_record_reports(&self, id: &RecordId) -> Result<Vec<Report>, ApiError> {
        let url = self.endpoint(&["records", &id.0, "reports"])?;
        let payload = self.send_json(self.client.get(url)).await?;
        Ok(decode_list("list_record_reports", payload))
    }

    async fn list_pages(&self) -> Result<Vec<PageDescriptor>, ApiError> {
        let url = self.endpoint(&["paginas"])?;
        let payload = self.send_json(self.client.get(url)).await?;
        Ok(decode_list("list_pages", payload))
    }

    async fn download_report(&self, id: &ReportId) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint(&["reports", &id.0, "download"])?;
        let response = self.send(self.client.get(url)).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ApiError::Network(err.to_string()))?;
        Ok(bytes.to_vec())
    }

    fn download_report_url(&self, id: &ReportId) -> String {
        match self.endpoint(&["reports", &id.0, "download"]) {
            Ok(url) => url.to_string(),
            Err(_) => format!(
                "{}/reports/{}/download",
                self.base_url.as_str().trim_end_matches('/'),
                id
            ),
        }
    }
}
