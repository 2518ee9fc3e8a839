use std::sync::Arc;

use crate::components::SocketDispatcher;
use crate::error::AppError;
use crate::page::Page;
use crate::AppState;

/// Follow pushed events until the connection closes or Ctrl-C.
pub async fn watch(state: &AppState, tests: Vec<String>) -> Result<(), AppError> {
    let page = Arc::new(Page::new(tests));
    let url = state.config.settings.client_socket_url(&state.config.page.email)?;
    let dispatcher = SocketDispatcher::new(page.clone(), state.api.clone(), state.config.page.clone())
        .with_score_on_push(state.config.settings.score_on_push);

    tracing::info!(url = %url, "Watching for test results");
    let result = tokio::select! {
        r = dispatcher.run(&url) => r,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted");
            Ok(())
        }
    };

    println!("{}", page.snapshot().to_html());
    result
}
