use serde::de::DeserializeOwned;
use url::Url;

use super::form::SubmissionPayload;
use super::score::ScoreReport;
use super::types::{MessageBody, RunRequest, RunResponse, ScoreboardEntry};
use crate::config::{join_segments, Settings};
use crate::error::AppError;

// ============================================================================
// Trait
// ============================================================================

/// Every backend endpoint the page talks to. Components hold an
/// `Arc<dyn GradingApi>` so tests can substitute an in-memory backend.
#[async_trait::async_trait]
pub trait GradingApi: Send + Sync + 'static {
    /// `POST /tests/run/{email}` -- run one test on the student's machine.
    async fn run_test(&self, email: &str, task_id: &str, test: &str)
        -> Result<RunResponse, AppError>;

    /// `POST /api/score/{launch_id}/{percentage}` -- pass the grade to the LMS.
    async fn report_score(&self, launch_id: &str, report: ScoreReport) -> Result<(), AppError>;

    /// `POST /tests` -- create or replace the task's test set.
    async fn create_tests(&self, payload: SubmissionPayload) -> Result<(), AppError>;

    /// `GET /api/scoreboard/{launch_id}/` -- grades of every member.
    async fn scoreboard(&self, launch_id: &str) -> Result<Vec<ScoreboardEntry>, AppError>;
}

// ============================================================================
// GradingClient
// ============================================================================

/// HTTP client for the LTI backend.
pub struct GradingClient {
    http: reqwest::Client,
    base_url: Url,
}

impl GradingClient {
    /// Build a client from settings. A configured request timeout applies to
    /// every call; without one requests are unbounded.
    pub fn new(settings: &Settings) -> Result<Self, AppError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: settings.http_base()?,
        })
    }

    /// Client against an explicit base URL.
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    // --------------------------------------------------------------------
    // Private HTTP helpers
    // --------------------------------------------------------------------

    fn url(&self, segments: &[&str]) -> Result<Url, AppError> {
        join_segments(&self.base_url, segments)
    }

    /// Send a request, check the status code, and deserialize the JSON response.
    async fn send_json<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, AppError> {
        Ok(req.send().await?.error_for_status()?.json().await?)
    }

    /// Send a request, check the status code, and discard the response body.
    async fn send_ok(&self, req: reqwest::RequestBuilder) -> Result<(), AppError> {
        req.send().await?.error_for_status()?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl GradingApi for GradingClient {
    async fn run_test(
        &self,
        email: &str,
        task_id: &str,
        test: &str,
    ) -> Result<RunResponse, AppError> {
        let url = self.url(&["tests", "run", email])?;
        let resp = self
            .http
            .post(url)
            .json(&RunRequest { task_id, test })
            .send()
            .await?;

        // The backend answers 400 with `{message}` when the student's machine
        // is not connected. Any other 400 is a plain HTTP failure.
        if resp.status() == reqwest::StatusCode::BAD_REQUEST {
            let rejected = resp
                .error_for_status_ref()
                .err()
                .map(AppError::from)
                .unwrap_or_else(|| AppError::Http("400 Bad Request".into()));
            return Err(match resp.json::<MessageBody>().await {
                Ok(body) => AppError::ServerOffline(body.message),
                Err(_) => rejected,
            });
        }

        Ok(resp.error_for_status()?.json().await?)
    }

    async fn report_score(&self, launch_id: &str, report: ScoreReport) -> Result<(), AppError> {
        let percentage = report.percentage.to_string();
        let url = self.url(&["api", "score", launch_id, &percentage])?;
        self.send_ok(self.http.post(url)).await
    }

    async fn create_tests(&self, payload: SubmissionPayload) -> Result<(), AppError> {
        let url = self.url(&["tests"])?;
        let form = payload.into_multipart()?;
        self.send_ok(self.http.post(url).multipart(form)).await
    }

    async fn scoreboard(&self, launch_id: &str) -> Result<Vec<ScoreboardEntry>, AppError> {
        let url = self.url(&["api", "scoreboard", launch_id, ""])?;
        self.send_json(self.http.get(url)).await
    }
}
