//! Test runner: one run request per test, all in flight at once, then a
//! single score report for the batch.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::join_all;

use crate::config::PageContext;
use crate::error::AppError;
use crate::grading::{GradingApi, ScoreReport, TestResult};
use crate::page::render::{render_loader, render_request_error, render_result};
use crate::page::Page;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub attempted: usize,
    /// Requests that produced a result.
    pub responses: usize,
    pub successes: usize,
    /// Tests whose request was rejected.
    pub failed_requests: Vec<String>,
    pub score: Option<ScoreReport>,
    /// Whether the score POST went through.
    pub reported: bool,
}

pub struct TestRunner {
    api: Arc<dyn GradingApi>,
    page: Arc<Page>,
    context: PageContext,
    tests: Vec<String>,
    batch_timeout: Option<Duration>,
}

impl TestRunner {
    /// The test list is captured from the page now and never refreshed.
    pub fn new(api: Arc<dyn GradingApi>, page: Arc<Page>, context: PageContext) -> Self {
        let tests = page.test_names();
        Self {
            api,
            page,
            context,
            tests,
            batch_timeout: None,
        }
    }

    /// Abandon the batch after `limit`. Without a limit one request that
    /// never settles keeps the batch, and its score, pending forever.
    pub fn with_batch_timeout(mut self, limit: Option<Duration>) -> Self {
        self.batch_timeout = limit;
        self
    }

    pub fn tests(&self) -> &[String] {
        &self.tests
    }

    /// Run every test and report the batch score.
    ///
    /// Rejects a second run while one is in flight. Rejected requests are
    /// logged and shown in their row; the score covers the responses that
    /// did arrive. A failed score POST is logged and shown as a notice.
    pub async fn run_all(&self) -> Result<RunSummary, AppError> {
        let Some(_run) = self.page.begin_run() else {
            return Err(AppError::Validation("a test run is already in progress".into()));
        };
        self.run_batch().await
    }

    async fn run_batch(&self) -> Result<RunSummary, AppError> {
        tracing::info!(tests = self.tests.len(), task_id = %self.context.task_id, "Starting test run");

        for name in &self.tests {
            if let Err(e) = self.page.set_result(name, render_loader(name)) {
                tracing::warn!(test = %name, "Cannot show loader: {}", e);
            }
        }

        let settled_names = Mutex::new(HashSet::new());
        let joined = join_all(self.tests.iter().map(|name| self.run_one(name, &settled_names)));

        let settled = match self.batch_timeout {
            Some(limit) => match tokio::time::timeout(limit, joined).await {
                Ok(settled) => settled,
                Err(_) => {
                    let done = settled_names.lock().unwrap_or_else(|e| e.into_inner());
                    let err = AppError::Timeout(format!(
                        "test run did not finish within {}s",
                        limit.as_secs()
                    ));
                    for name in self.tests.iter().filter(|n| !done.contains(n.as_str())) {
                        if let Err(e) = self.page.set_result(name, render_request_error(name, &err)) {
                            tracing::warn!(test = %name, "Cannot show timeout: {}", e);
                        }
                    }
                    tracing::warn!(pending = self.tests.len() - done.len(), "{}", err);
                    self.page.show_notice("Test run timed out; no score was reported");
                    return Err(err);
                }
            },
            None => joined.await,
        };

        let mut summary = RunSummary {
            attempted: self.tests.len(),
            ..RunSummary::default()
        };
        let mut results = Vec::with_capacity(settled.len());
        for (name, outcome) in self.tests.iter().zip(settled) {
            match outcome {
                Some(result) => results.push(result),
                None => summary.failed_requests.push(name.clone()),
            }
        }
        summary.responses = results.len();
        summary.successes = results.iter().filter(|r| r.is_success()).count();
        summary.score = ScoreReport::from_results(&results);

        let Some(report) = summary.score else {
            tracing::warn!("No test responses arrived; score not reported");
            return Ok(summary);
        };

        match self.api.report_score(&self.context.launch_id, report).await {
            Ok(()) => {
                tracing::info!(percentage = report.percentage, "Score reported");
                summary.reported = true;
            }
            Err(e) => {
                tracing::error!(percentage = report.percentage, "Failed to report score: {}", e);
                self.page.show_notice("Could not report the score to the LMS");
            }
        }
        Ok(summary)
    }

    /// Run one test and render whatever comes back, as soon as it does.
    async fn run_one(&self, name: &str, settled: &Mutex<HashSet<String>>) -> Option<TestResult> {
        let response = self
            .api
            .run_test(&self.context.email, &self.context.task_id, name)
            .await;
        settled
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string());

        let (fragment, result) = match response {
            Ok(resp) => {
                if let Some(echoed) = resp.name.as_deref().filter(|n| *n != name) {
                    tracing::warn!(test = %name, echoed = %echoed, "Run response names another test");
                }
                (render_result(name, &resp.result), Some(resp.result))
            }
            Err(e) => {
                tracing::error!(test = %name, "Run request failed: {}", e);
                (render_request_error(name, &e), None)
            }
        };

        if let Err(e) = self.page.set_result(name, fragment) {
            tracing::warn!(test = %name, "Cannot render result: {}", e);
        }
        result
    }
}
