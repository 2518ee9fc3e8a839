//! In-memory backend for component tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::client::GradingApi;
use super::form::SubmissionPayload;
use super::score::ScoreReport;
use super::types::{RunResponse, ScoreboardEntry, TestResult};
use crate::error::AppError;

pub enum Scripted {
    Result(TestResult),
    Delayed(Duration, TestResult),
    Error(fn() -> AppError),
    Hang,
}

#[derive(Default)]
pub struct FakeApi {
    pub runs: Mutex<HashMap<String, Scripted>>,
    pub run_calls: Mutex<Vec<(String, String, String)>>,
    pub scores: Mutex<Vec<(String, u8)>>,
    pub payloads: Mutex<Vec<SubmissionPayload>>,
    pub fail_scores: bool,
    pub fail_create: bool,
}

impl FakeApi {
    pub fn script(self, test: &str, scripted: Scripted) -> Self {
        self.runs.lock().unwrap().insert(test.to_string(), scripted);
        self
    }

    pub fn scores(&self) -> Vec<(String, u8)> {
        self.scores.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl GradingApi for FakeApi {
    async fn run_test(&self, email: &str, task_id: &str, test: &str) -> Result<RunResponse, AppError> {
        self.run_calls
            .lock()
            .unwrap()
            .push((email.to_string(), task_id.to_string(), test.to_string()));

        let scripted = self.runs.lock().unwrap().remove(test);
        let result = match scripted {
            Some(Scripted::Result(r)) => r,
            Some(Scripted::Delayed(d, r)) => {
                tokio::time::sleep(d).await;
                r
            }
            Some(Scripted::Error(make)) => return Err(make()),
            Some(Scripted::Hang) => std::future::pending().await,
            None => TestResult::success(),
        };
        Ok(RunResponse {
            name: Some(test.to_string()),
            result,
        })
    }

    async fn report_score(&self, launch_id: &str, report: ScoreReport) -> Result<(), AppError> {
        if self.fail_scores {
            return Err(AppError::Http("score endpoint returned 500".into()));
        }
        self.scores
            .lock()
            .unwrap()
            .push((launch_id.to_string(), report.percentage));
        Ok(())
    }

    async fn create_tests(&self, payload: SubmissionPayload) -> Result<(), AppError> {
        self.payloads.lock().unwrap().push(payload);
        if self.fail_create {
            return Err(AppError::Http("connection refused".into()));
        }
        Ok(())
    }

    async fn scoreboard(&self, _launch_id: &str) -> Result<Vec<ScoreboardEntry>, AppError> {
        Ok(Vec::new())
    }
}
