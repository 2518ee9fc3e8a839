use std::sync::Arc;

use crate::cli::TestSpec;
use crate::components::{FileSelection, SubmissionHandler, TestListEditor};
use crate::error::AppError;
use crate::page::Page;
use crate::AppState;

/// Build the editor rows from `--test` arguments and submit them.
pub async fn submit(state: &AppState, description: &str, tests: &[TestSpec]) -> Result<(), AppError> {
    let mut editor = TestListEditor::new();
    for spec in tests {
        let file = FileSelection::from_path(&spec.path)?;
        editor.push_test(spec.description.clone(), file)?;
    }

    let page = Arc::new(Page::new(Vec::<String>::new()));
    let handler = SubmissionHandler::new(
        state.api.clone(),
        page.clone(),
        state.config.page.task_id.clone(),
        state.config.settings.banner_duration,
    );

    let result = handler.submit(description, &editor).await;
    if let Some(banner) = page.upload_banner() {
        println!("{}", banner.text_content());
    }
    result
}
