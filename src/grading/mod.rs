//! Wire contract with the LTI backend: HTTP endpoints, socket envelope,
//! multipart body and score arithmetic.

pub mod client;
#[cfg(test)]
pub(crate) mod fake;
pub mod form;
pub mod score;
pub mod types;

pub use client::{GradingApi, GradingClient};
pub use form::{FormField, SubmissionPayload};
pub use score::ScoreReport;
pub use types::{
    RunResponse, ScoreboardEntry, SocketEvent, TestOutcome, TestResult, TestStatus,
};
