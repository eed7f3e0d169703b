use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::ScheduleApi;
use crate::error::ApiError;
use crate::models::{
    BulkWriteRequest, BulkWriteResponse, Employee, OperationResult, Schedule, ScheduleId,
    ScheduleShifts, ShiftType,
};
use crate::services::RequestContext;

/// Error body returned by the backend when it rejects a bulk write.
#[derive(Debug, Deserialize)]
struct RejectionBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    results: Vec<OperationResult>,
}

/// JSON-over-HTTP client for the external Schedule API.
#[derive(Debug, Clone)]
pub struct HttpScheduleApi {
    client: Client,
    base_url: String,
}

impl HttpScheduleApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Joins path segments onto the base URL, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::Transport(format!("Invalid base URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Transport(format!("Base URL {} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, builder: RequestBuilder, ctx: &RequestContext) -> RequestBuilder {
        let builder = builder
            .bearer_auth(ctx.credential.expose())
            .header(reqwest::header::ACCEPT_LANGUAGE, ctx.locale.as_str());

        match &ctx.correlation_id {
            Some(correlation_id) => builder.header("X-Correlation-ID", correlation_id.as_str()),
            None => builder,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        ctx: &RequestContext,
    ) -> Result<T, ApiError> {
        let url = self.url(segments)?;
        log::debug!("GET {}", url);

        let response = self.authorize(self.client.get(url), ctx).send().await?;
        let status = response.status();
        let body = response.text().await?;
        read_response(status, &body)
    }

    async fn post_bulk(
        &self,
        schedule_id: &ScheduleId,
        request: &BulkWriteRequest,
        ctx: &RequestContext,
    ) -> Result<BulkWriteResponse, ApiError> {
        let url = self.url(&["schedules", schedule_id.as_str(), "shifts", "bulk"])?;
        log::debug!("POST {} ({} operations)", url, request.operations.len());

        let response = self
            .authorize(self.client.post(url), ctx)
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        read_bulk_response(status, &body)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Maps a read endpoint's answer: 401 is `Unauthorized`, any other non-2xx
/// is `Status`.
fn read_response<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, ApiError> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            message: body.to_string(),
        });
    }
    decode(body)
}

/// Maps the bulk endpoint's answer. 2xx (including 207 multi-status) carries
/// per-operation results and the new shift list; other statuses become
/// `Rejected`, keeping any per-operation results found in the body.
fn read_bulk_response(status: StatusCode, body: &str) -> Result<BulkWriteResponse, ApiError> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }
    if status.is_success() {
        return decode(body);
    }

    let rejection = serde_json::from_str::<RejectionBody>(body).ok();
    let message = rejection
        .as_ref()
        .and_then(|r| r.message.clone())
        .unwrap_or_else(|| format!("status {}: {}", status.as_u16(), body));
    Err(ApiError::Rejected {
        message,
        results: rejection.map(|r| r.results).unwrap_or_default(),
    })
}

impl ScheduleApi for HttpScheduleApi {
    fn get_schedules<'a>(
        &'a self,
        ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<Vec<Schedule>, ApiError>> {
        self.get_json(&["schedules"], ctx).boxed()
    }

    fn get_shift_types<'a>(
        &'a self,
        ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<Vec<ShiftType>, ApiError>> {
        self.get_json(&["shift-types"], ctx).boxed()
    }

    fn get_shifts_for_schedule<'a>(
        &'a self,
        schedule_id: &'a ScheduleId,
        ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<ScheduleShifts, ApiError>> {
        async move {
            self.get_json(&["schedules", schedule_id.as_str(), "shifts"], ctx)
                .await
        }
        .boxed()
    }

    fn bulk_write_shifts<'a>(
        &'a self,
        schedule_id: &'a ScheduleId,
        request: &'a BulkWriteRequest,
        ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<BulkWriteResponse, ApiError>> {
        self.post_bulk(schedule_id, request, ctx).boxed()
    }

    fn get_all_employees<'a>(
        &'a self,
        ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<Vec<Employee>, ApiError>> {
        self.get_json(&["employees"], ctx).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScheduleStatus;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_urls_are_joined_and_encoded() {
        let api = HttpScheduleApi::new("http://localhost:5000/api/");
        assert_eq!(api.base_url(), "http://localhost:5000/api");
        assert_eq!(
            api.url(&["schedules", "s-1", "shifts"]).unwrap().as_str(),
            "http://localhost:5000/api/schedules/s-1/shifts"
        );
        assert_eq!(
            api.url(&["schedules", "a/b?c", "shifts"]).unwrap().as_str(),
            "http://localhost:5000/api/schedules/a%2Fb%3Fc/shifts"
        );
    }

    #[test]
    fn test_read_response_statuses() {
        let schedules: Vec<Schedule> = read_response(
            StatusCode::OK,
            &json!([{
                "id": "sched-1",
                "name": "Week 3",
                "startDate": "2024-01-15",
                "endDate": "2024-01-21",
                "status": "published"
            }])
            .to_string(),
        )
        .unwrap();
        assert_eq!(schedules[0].status, ScheduleStatus::Published);

        assert!(matches!(
            read_response::<Vec<Schedule>>(StatusCode::UNAUTHORIZED, ""),
            Err(ApiError::Unauthorized)
        ));
        assert!(matches!(
            read_response::<Vec<Schedule>>(StatusCode::SERVICE_UNAVAILABLE, "down"),
            Err(ApiError::Status { status: 503, .. })
        ));
        assert!(matches!(
            read_response::<Vec<Schedule>>(StatusCode::OK, "<html>"),
            Err(ApiError::Decode(_))
        ));
    }

    #[test]
    fn test_bulk_multi_status_keeps_results() {
        let body = json!({
            "results": [
                { "index": 0, "success": true, "shiftId": "s-9", "correlationId": "c-1" },
                { "index": 1, "success": false, "error": "slot taken" }
            ],
            "shifts": { "assigned": [], "unassigned": [] }
        });

        let response = read_bulk_response(StatusCode::MULTI_STATUS, &body.to_string()).unwrap();
        assert_eq!(response.results.len(), 2);
        let failed: Vec<_> = response.failed().map(|r| r.index).collect();
        assert_eq!(failed, vec![1]);
    }

    #[test]
    fn test_bulk_rejection_carries_operation_results() {
        let body = json!({
            "message": "Validation failed",
            "results": [{ "index": 2, "success": false, "error": "unknown employee" }]
        });

        match read_bulk_response(StatusCode::UNPROCESSABLE_ENTITY, &body.to_string()) {
            Err(ApiError::Rejected { message, results }) => {
                assert_eq!(message, "Validation failed");
                assert_eq!(results.len(), 1);
                assert_eq!(results[0].index, 2);
                assert_eq!(results[0].error.as_deref(), Some("unknown employee"));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_bulk_plain_failures() {
        assert!(matches!(
            read_bulk_response(StatusCode::UNAUTHORIZED, ""),
            Err(ApiError::Unauthorized)
        ));

        match read_bulk_response(StatusCode::BAD_GATEWAY, "upstream timeout") {
            Err(ApiError::Rejected { message, results }) => {
                assert_eq!(message, "status 502: upstream timeout");
                assert!(results.is_empty());
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }
}
