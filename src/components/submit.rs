//! Submission form handler: serialize the editor rows and post them.

use std::sync::Arc;
use std::time::Duration;

use super::editor::TestListEditor;
use crate::error::AppError;
use crate::grading::{GradingApi, SubmissionPayload};
use crate::page::render::{render_banner, BannerKind};
use crate::page::Page;
use crate::validation::require_non_empty;

/// Build the `POST /tests` body: shared description, task id, then each
/// row's description and file in row order.
///
/// Enforces the form's required fields; nothing else is validated.
pub fn build_payload(
    description: &str,
    task_id: &str,
    editor: &TestListEditor,
) -> Result<SubmissionPayload, AppError> {
    require_non_empty("description", description)?;
    require_non_empty("task_id", task_id)?;

    let mut payload = SubmissionPayload::new();
    payload.push_text("description", description);
    payload.push_text("task_id", task_id);

    for row in editor.rows() {
        require_non_empty(&row.description_field(), &row.description)?;
        let file = row.file.as_ref().ok_or_else(|| {
            AppError::Validation(format!("{} requires a file", row.file_field()))
        })?;
        payload.push_text(row.description_field(), row.description.clone());
        payload.push_file(row.file_field(), file.file_name.clone(), file.bytes.clone());
    }
    Ok(payload)
}

pub struct SubmissionHandler {
    api: Arc<dyn GradingApi>,
    page: Arc<Page>,
    task_id: String,
    banner_duration: Duration,
}

impl SubmissionHandler {
    pub fn new(
        api: Arc<dyn GradingApi>,
        page: Arc<Page>,
        task_id: impl Into<String>,
        banner_duration: Duration,
    ) -> Self {
        Self {
            api,
            page,
            task_id: task_id.into(),
            banner_duration,
        }
    }

    /// Submit the form. The upload banner shows the outcome and clears
    /// itself after the banner duration. The POST error, if any, is also
    /// returned to the caller.
    pub async fn submit(&self, description: &str, editor: &TestListEditor) -> Result<(), AppError> {
        let payload = build_payload(description, &self.task_id, editor)?;
        tracing::info!(rows = editor.len(), task_id = %self.task_id, "Submitting tests");

        let result = self.api.create_tests(payload).await;
        let kind = match &result {
            Ok(()) => BannerKind::Success,
            Err(e) => {
                tracing::error!("Test submission failed: {}", e);
                BannerKind::Failure
            }
        };
        self.flash(kind);
        result
    }

    fn flash(&self, kind: BannerKind) {
        let generation = self.page.show_upload_banner(render_banner(kind));
        let page = self.page.clone();
        let after = self.banner_duration;
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            page.clear_upload_banner(generation);
        });
    }
}
