//! Socket dispatcher: one websocket per page, each frame decoded into a
//! [`SocketEvent`] and applied to the page.
//!
//! There is no reconnection. When the connection closes the loop ends, the
//! reason is logged and the page notice says so.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use crate::config::PageContext;
use crate::error::AppError;
use crate::grading::{GradingApi, ScoreReport, SocketEvent, TestOutcome};
use crate::page::render::render_result;
use crate::page::{Page, ServerState};

/// What a single event did to the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub rendered: usize,
    /// Results naming a row the page does not have.
    pub missing: Vec<String>,
    pub reported: Option<ScoreReport>,
}

pub struct SocketDispatcher {
    page: Arc<Page>,
    api: Arc<dyn GradingApi>,
    context: PageContext,
    score_on_push: bool,
}

impl SocketDispatcher {
    pub fn new(page: Arc<Page>, api: Arc<dyn GradingApi>, context: PageContext) -> Self {
        Self {
            page,
            api,
            context,
            score_on_push: false,
        }
    }

    /// Also score and report every pushed `test_result` batch.
    pub fn with_score_on_push(mut self, enabled: bool) -> Self {
        self.score_on_push = enabled;
        self
    }

    /// Decode one text frame and apply it.
    pub async fn handle_text(&self, text: &str) -> Result<DispatchOutcome, AppError> {
        let event = SocketEvent::parse(text)?;
        Ok(self.handle_event(event).await)
    }

    pub async fn handle_event(&self, event: SocketEvent) -> DispatchOutcome {
        tracing::debug!(event = event.name(), "Socket event");
        match event {
            SocketEvent::Connected => {
                self.page.set_server_state(ServerState::On);
                DispatchOutcome::default()
            }
            SocketEvent::Disconnected => {
                self.page.set_server_state(ServerState::Off);
                DispatchOutcome::default()
            }
            SocketEvent::TestResult(outcomes) => self.apply_results(outcomes).await,
            SocketEvent::Unrecognized { event } => {
                tracing::debug!(event = %event, "Ignoring unrecognized socket event");
                DispatchOutcome::default()
            }
        }
    }

    async fn apply_results(&self, outcomes: Vec<TestOutcome>) -> DispatchOutcome {
        let mut out = DispatchOutcome::default();

        for outcome in &outcomes {
            let fragment = render_result(&outcome.name, &outcome.result);
            match self.page.set_result(&outcome.name, fragment) {
                Ok(()) => out.rendered += 1,
                Err(e) => {
                    tracing::warn!(test = %outcome.name, "Dropping pushed result: {}", e);
                    out.missing.push(outcome.name.clone());
                }
            }
        }

        if !self.score_on_push {
            return out;
        }

        let Some(report) = ScoreReport::from_results(outcomes.iter().map(|o| &o.result)) else {
            return out;
        };
        match self.api.report_score(&self.context.launch_id, report).await {
            Ok(()) => {
                tracing::info!(percentage = report.percentage, "Score reported from push");
                out.reported = Some(report);
            }
            Err(e) => {
                tracing::error!("Failed to report score: {}", e);
                self.page.show_notice("Could not report the score to the LMS");
            }
        }
        out
    }

    /// Connect and dispatch until the server closes the connection.
    ///
    /// Undecodable frames are logged and skipped. Returns `Ok` on a close
    /// frame or end of stream, `ConnectionLost` on a transport error.
    pub async fn run(&self, url: &Url) -> Result<(), AppError> {
        let (mut stream, _) = tokio_tungstenite::connect_async(url.as_str()).await?;
        tracing::info!(email = %self.context.email, "Websocket connected");

        while let Some(frame) = stream.next().await {
            let msg = match frame {
                Ok(m) => m,
                Err(e) => {
                    tracing::error!("Websocket error: {}", e);
                    self.page.show_notice("Connection to the grading server was lost");
                    return Err(AppError::ConnectionLost(e.to_string()));
                }
            };

            let text = match msg {
                Message::Text(t) => t.as_str().to_owned(),
                Message::Binary(b) => match String::from_utf8(b.to_vec()) {
                    Ok(t) => t,
                    Err(_) => {
                        tracing::warn!("Ignoring non-UTF-8 binary frame");
                        continue;
                    }
                },
                Message::Close(frame) => {
                    let reason = frame.map(|f| f.reason.as_str().to_owned()).unwrap_or_default();
                    tracing::info!(reason = %reason, "websocket closed");
                    self.page.show_notice("Connection to the grading server was closed");
                    return Ok(());
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            };

            if let Err(e) = self.handle_text(&text).await {
                tracing::warn!("Skipping socket message: {}", e);
            }
        }

        tracing::info!("websocket stream ended");
        self.page.show_notice("Connection to the grading server was closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::fake::FakeApi;
    use crate::grading::TestResult;

    fn dispatcher(api: Arc<FakeApi>, tests: &[&str]) -> (SocketDispatcher, Arc<Page>) {
        let page = Arc::new(Page::new(tests.iter().copied()));
        let ctx = PageContext::new("s@example.net", "task-1", "launch-1");
        (SocketDispatcher::new(page.clone(), api, ctx), page)
    }

    #[tokio::test]
    async fn test_connected_and_disconnected_toggle_indicator() {
        let (d, page) = dispatcher(Arc::new(FakeApi::default()), &["a"]);
        d.handle_text(r#"{"event":"connected","args":[]}"#).await.unwrap();
        assert_eq!(page.server_state(), ServerState::On);
        d.handle_text(r#"{"event":"disconnected","args":[]}"#).await.unwrap();
        assert_eq!(page.server_state(), ServerState::Off);
    }

    #[tokio::test]
    async fn test_results_rendered_and_missing_rows_reported() {
        let (d, page) = dispatcher(Arc::new(FakeApi::default()), &["build", "lint"]);
        let out = d
            .handle_event(SocketEvent::TestResult(vec![
                TestOutcome {
                    name: "build".into(),
                    result: TestResult::success(),
                },
                TestOutcome {
                    name: "ghost".into(),
                    result: TestResult::failed("x"),
                },
            ]))
            .await;
        assert_eq!(out.rendered, 1);
        assert_eq!(out.missing, vec!["ghost".to_string()]);
        assert_eq!(out.reported, None);
        assert_eq!(page.result("build").unwrap().text_content(), "Success");
    }

    #[tokio::test]
    async fn test_push_without_score_on_push_reports_nothing() {
        let api = Arc::new(FakeApi::default());
        let (d, _) = dispatcher(api.clone(), &["a"]);
        d.handle_text(r#"{"event":"test_result","args":[{"name":"a","result":{"status":"success"}}]}"#)
            .await
            .unwrap();
        assert!(api.scores().is_empty());
    }

    #[tokio::test]
    async fn test_unrecognized_event_changes_nothing() {
        let (d, page) = dispatcher(Arc::new(FakeApi::default()), &["a"]);
        let before = page.snapshot();
        let out = d.handle_text(r#"{"event":"ping","args":[]}"#).await.unwrap();
        assert_eq!(out, DispatchOutcome::default());
        assert_eq!(page.snapshot(), before);
    }

    #[tokio::test]
    async fn test_malformed_frame_is_an_error() {
        let (d, _) = dispatcher(Arc::new(FakeApi::default()), &["a"]);
        assert!(d.handle_text("{").await.is_err());
    }

    #[tokio::test]
    async fn test_score_on_push_reports_batch() {
        let api = Arc::new(FakeApi::default());
        let (d, _) = dispatcher(api.clone(), &["a", "b", "c"]);
        let d = d.with_score_on_push(true);
        let raw = r#"{"event":"test_result","args":[
            {"name":"a","result":{"status":"success"}},
            {"name":"b","result":{"status":"success"}},
            {"name":"c","result":{"status":"failed","error":"e"}}
        ]}"#;
        let out = d.handle_text(raw).await.unwrap();
        assert_eq!(out.reported, Some(ScoreReport { percentage: 66 }));
        assert_eq!(api.scores(), vec![("launch-1".to_string(), 66)]);
    }

    #[tokio::test]
    async fn test_score_failure_shows_notice() {
        let api = Arc::new(FakeApi {
            fail_scores: true,
            ..Default::default()
        });
        let (d, page) = dispatcher(api, &["a"]);
        let d = d.with_score_on_push(true);
        let out = d
            .handle_text(r#"{"event":"test_result","args":[{"name":"a","result":{"status":"success"}}]}"#)
            .await
            .unwrap();
        assert_eq!(out.reported, None);
        assert_eq!(out.rendered, 1);
        assert!(page.notice().is_some());
    }
}
