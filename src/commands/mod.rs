//! One function per CLI command. Each takes the shared [`AppState`] and
//! returns `Result<_, AppError>`; only `main` turns errors into exit codes.
//!
//! [`AppState`]: crate::AppState

pub mod run;
pub mod scoreboard;
pub mod submit;
pub mod watch;
