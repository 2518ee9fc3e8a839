use std::sync::Arc;

use crate::components::{RunSummary, TestRunner};
use crate::error::AppError;
use crate::page::Page;
use crate::validation::require_test_name;
use crate::AppState;

pub async fn run_tests(state: &AppState, tests: Vec<String>) -> Result<RunSummary, AppError> {
    for name in &tests {
        require_test_name(name)?;
    }

    let page = Arc::new(Page::new(tests));
    let runner = TestRunner::new(state.api.clone(), page.clone(), state.config.page.clone())
        .with_batch_timeout(state.config.settings.run_timeout);

    let summary = runner.run_all().await?;

    println!("{}", page.snapshot().to_html());
    match summary.score {
        Some(score) => println!(
            "{}/{} passed, score {}%{}",
            summary.successes,
            summary.responses,
            score.percentage,
            if summary.reported { "" } else { " (not reported)" }
        ),
        None => println!("no results received; score not reported"),
    }
    if !summary.failed_requests.is_empty() {
        println!("failed requests: {}", summary.failed_requests.join(", "));
    }
    Ok(summary)
}
