//! Result renderer and the other small fragments placed into the page.
//!
//! All builders are pure; server-provided strings only ever become text nodes.

use super::markup::Element;
use super::ServerState;
use crate::error::AppError;
use crate::grading::{TestResult, TestStatus};

/// Placeholder the Go worker prints for a nil error value.
pub const NULL_SENTINEL: &str = "<nil>";

pub fn result_id(name: &str) -> String {
    format!("result-{name}")
}

/// Render one test result. The root carries `result-<name>`.
pub fn render_result(name: &str, result: &TestResult) -> Element {
    match &result.status {
        TestStatus::Success => Element::new("span")
            .with_id(result_id(name))
            .with_classes(&["alert", "alert-success"])
            .with_text("Success"),
        TestStatus::Failed => {
            let message = result
                .error
                .as_deref()
                .map(|e| e.replace(NULL_SENTINEL, "null"))
                .unwrap_or_default();
            Element::new("details")
                .with_id(result_id(name))
                .with_classes(&["alert", "alert-danger"])
                .with_child(Element::new("summary").with_text("Error"))
                .with_child(Element::new("pre").with_text(message))
        }
        TestStatus::Other(status) => {
            tracing::debug!(test = %name, status = %status, "Unknown test status");
            unknown_error(name)
        }
    }
}

fn unknown_error(name: &str) -> Element {
    Element::new("span")
        .with_id(result_id(name))
        .with_classes(&["alert", "alert-danger"])
        .with_text("Unknown error happened!")
}

/// Spinner shown while a run request is outstanding.
pub fn render_loader(name: &str) -> Element {
    Element::new("div")
        .with_id(result_id(name))
        .with_class("spinner-border")
}

/// Badge for a run request that never produced a result.
pub fn render_request_error(name: &str, err: &AppError) -> Element {
    Element::new("span")
        .with_id(result_id(name))
        .with_classes(&["alert", "alert-danger"])
        .with_attr("data-error-kind", err.kind())
        .with_text(err.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Failure,
}

/// Transient upload banner.
pub fn render_banner(kind: BannerKind) -> Element {
    let (class, text) = match kind {
        BannerKind::Success => ("alert-success", "Success!"),
        BannerKind::Failure => ("alert-danger", "Failed!"),
    };
    Element::new("span")
        .with_classes(&["alert", class])
        .with_text(text)
}

pub fn render_server_state(state: ServerState) -> Element {
    Element::new("span")
        .with_id("server-state")
        .with_attr("style", format!("color: {}", state.color()))
        .with_text(state.label())
}

pub fn render_notice(text: &str) -> Element {
    Element::new("div")
        .with_id("notice")
        .with_classes(&["alert", "alert-warning"])
        .with_text(text)
}
