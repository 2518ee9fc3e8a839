use serde::{Deserialize, Serialize};

use crate::error::AppError;

// ============================================================================
// Test results
// ============================================================================

/// Outcome reported by the grading worker. Anything other than the two known
/// values is kept verbatim so it can be logged and rendered as unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TestStatus {
    Success,
    Failed,
    Other(String),
}

impl From<String> for TestStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "success" => TestStatus::Success,
            "failed" => TestStatus::Failed,
            _ => TestStatus::Other(s),
        }
    }
}

impl From<TestStatus> for String {
    fn from(status: TestStatus) -> Self {
        match status {
            TestStatus::Success => "success".into(),
            TestStatus::Failed => "failed".into(),
            TestStatus::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub status: TestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestResult {
    pub fn success() -> Self {
        Self {
            status: TestStatus::Success,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: TestStatus::Failed,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TestStatus::Success
    }
}

/// One named result: an element of a `test_result` push, and the body the
/// worker produces for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub name: String,
    pub result: TestResult,
}

// ============================================================================
// HTTP bodies
// ============================================================================

#[derive(Debug, Serialize)]
pub struct RunRequest<'a> {
    pub task_id: &'a str,
    pub test: &'a str,
}

/// `POST /tests/run/{email}` response. The worker echoes the test name, older
/// backends only send `result`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunResponse {
    #[serde(default)]
    pub name: Option<String>,
    pub result: TestResult,
}

/// Body of the backend's `400` when the student's machine is not connected.
#[derive(Debug, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreboardEntry {
    pub score: f64,
    #[serde(default)]
    pub time: Option<f64>,
    #[serde(default)]
    pub name: Option<String>,
}

// ============================================================================
// Socket events
// ============================================================================

/// Server → client push, decoded from `{ "event": ..., "args": ... }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// The student's grading machine joined the backend.
    Connected,
    /// The student's grading machine left the backend.
    Disconnected,
    TestResult(Vec<TestOutcome>),
    Unrecognized { event: String },
}

#[derive(Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    args: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TestResultArgs {
    Many(Vec<TestOutcome>),
    One(TestOutcome),
}

impl SocketEvent {
    pub fn parse(text: &str) -> Result<Self, AppError> {
        let envelope: Envelope = serde_json::from_str(text)?;
        match envelope.event.as_str() {
            "connected" => Ok(SocketEvent::Connected),
            "disconnected" => Ok(SocketEvent::Disconnected),
            "test_result" => {
                let outcomes = match serde_json::from_value(envelope.args) {
                    Ok(TestResultArgs::Many(v)) => v,
                    Ok(TestResultArgs::One(o)) => vec![o],
                    Err(e) => {
                        return Err(AppError::Validation(format!(
                            "malformed test_result payload: {e}"
                        )))
                    }
                };
                Ok(SocketEvent::TestResult(outcomes))
            }
            _ => Ok(SocketEvent::Unrecognized {
                event: envelope.event,
            }),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SocketEvent::Connected => "connected",
            SocketEvent::Disconnected => "disconnected",
            SocketEvent::TestResult(_) => "test_result",
            SocketEvent::Unrecognized { event } => event,
        }
    }
}
