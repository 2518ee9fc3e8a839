//! Page components. Each one owns its state and receives the page, the
//! backend and its configuration at construction.

pub mod editor;
pub mod runner;
pub mod socket;
pub mod submit;

pub use editor::{FileSelection, TestListEditor, TestRow};
pub use runner::{RunSummary, TestRunner};
pub use socket::{DispatchOutcome, SocketDispatcher};
pub use submit::{build_payload, SubmissionHandler};
