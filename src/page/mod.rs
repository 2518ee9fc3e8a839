//! In-process model of the student/teacher page.
//!
//! Every component mutates the page through a shared `Arc<Page>`. Each call
//! holds the lock for one short update; concurrent writers to the same row
//! resolve as last write wins.

pub mod markup;
pub mod render;

use std::sync::{Mutex, MutexGuard};

use markup::Element;

use crate::error::AppError;

/// Connection state of the student's grading machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerState {
    #[default]
    Unknown,
    On,
    Off,
}

impl ServerState {
    pub fn label(&self) -> &'static str {
        match self {
            ServerState::Unknown => "unknown",
            ServerState::On => "on",
            ServerState::Off => "off",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            ServerState::Unknown => "gray",
            ServerState::On => "green",
            ServerState::Off => "red",
        }
    }
}

#[derive(Debug, Clone)]
struct TestSlot {
    name: String,
    result: Option<Element>,
}

#[derive(Debug)]
struct PageState {
    server: ServerState,
    rows: Vec<TestSlot>,
    upload_banner: Option<Element>,
    banner_generation: u64,
    notice: Option<Element>,
    run_enabled: bool,
}

pub struct Page {
    state: Mutex<PageState>,
}

impl Page {
    /// Build the page from the test names rendered at load time.
    pub fn new<I, S>(test_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rows = test_names
            .into_iter()
            .map(|name| TestSlot {
                name: name.into(),
                result: None,
            })
            .collect();
        Self {
            state: Mutex::new(PageState {
                server: ServerState::Unknown,
                rows,
                upload_banner: None,
                banner_generation: 0,
                notice: None,
                run_enabled: true,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn test_names(&self) -> Vec<String> {
        self.lock().rows.iter().map(|r| r.name.clone()).collect()
    }

    pub fn has_test(&self, name: &str) -> bool {
        self.lock().rows.iter().any(|r| r.name == name)
    }

    // ── Server indicator ────────────────────────────────────────────────

    pub fn server_state(&self) -> ServerState {
        self.lock().server
    }

    pub fn set_server_state(&self, state: ServerState) {
        self.lock().server = state;
    }

    // ── Result slots ────────────────────────────────────────────────────

    /// Replace the content of `test-<name>`'s result slot.
    pub fn set_result(&self, name: &str, content: Element) -> Result<(), AppError> {
        let mut state = self.lock();
        let slot = state
            .rows
            .iter_mut()
            .find(|r| r.name == name)
            .ok_or_else(|| AppError::NotFound(format!("no element with id test-{name}")))?;
        slot.result = Some(content);
        Ok(())
    }

    pub fn result(&self, name: &str) -> Option<Element> {
        self.lock()
            .rows
            .iter()
            .find(|r| r.name == name)
            .and_then(|r| r.result.clone())
    }

    // ── Upload banner ───────────────────────────────────────────────────

    /// Show a banner and return its generation, used to clear exactly it.
    pub fn show_upload_banner(&self, banner: Element) -> u64 {
        let mut state = self.lock();
        state.banner_generation += 1;
        state.upload_banner = Some(banner);
        state.banner_generation
    }

    /// Clear the banner if it is still the one shown at `generation`.
    pub fn clear_upload_banner(&self, generation: u64) -> bool {
        let mut state = self.lock();
        if state.banner_generation != generation || state.upload_banner.is_none() {
            return false;
        }
        state.upload_banner = None;
        true
    }

    pub fn upload_banner(&self) -> Option<Element> {
        self.lock().upload_banner.clone()
    }

    // ── Notice line ─────────────────────────────────────────────────────

    pub fn show_notice(&self, text: &str) {
        self.lock().notice = Some(render::render_notice(text));
    }

    pub fn notice(&self) -> Option<Element> {
        self.lock().notice.clone()
    }

    // ── Run control ─────────────────────────────────────────────────────

    /// Disable the run control until the returned guard is dropped.
    /// `None` if a run is already in flight.
    pub fn begin_run(&self) -> Option<RunGuard<'_>> {
        let mut state = self.lock();
        if !state.run_enabled {
            return None;
        }
        state.run_enabled = false;
        Some(RunGuard { page: self })
    }

    fn end_run(&self) {
        self.lock().run_enabled = true;
    }

    pub fn run_enabled(&self) -> bool {
        self.lock().run_enabled
    }

    // ── Snapshot ────────────────────────────────────────────────────────

    /// Current page as a markup tree.
    pub fn snapshot(&self) -> Element {
        let state = self.lock();

        let mut tests = Element::new("div").with_id("tests");
        for row in &state.rows {
            let mut slot = Element::new("div").with_class("result");
            if let Some(result) = &row.result {
                slot = slot.with_child(result.clone());
            }
            tests = tests.with_child(
                Element::new("div")
                    .with_id(format!("test-{}", row.name))
                    .with_attr("data-test-name", row.name.clone())
                    .with_child(Element::new("span").with_class("name").with_text(row.name.clone()))
                    .with_child(slot),
            );
        }

        let mut run_btn = Element::new("button")
            .with_id("btn-run")
            .with_classes(&["btn", "btn-primary"])
            .with_text("Run");
        if !state.run_enabled {
            run_btn = run_btn.with_attr("disabled", "disabled");
        }

        let mut upload = Element::new("div").with_id("upload-result");
        if let Some(banner) = &state.upload_banner {
            upload = upload.with_child(banner.clone());
        }

        let mut page = Element::new("main")
            .with_child(render::render_server_state(state.server))
            .with_child(tests)
            .with_child(run_btn)
            .with_child(upload);
        if let Some(notice) = &state.notice {
            page = page.with_child(notice.clone());
        }
        page
    }
}

/// Keeps the run control disabled while alive, including when the run
/// future holding it is dropped before finishing.
#[must_use = "the run control is re-enabled as soon as the guard is dropped"]
pub struct RunGuard<'a> {
    page: &'a Page,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.page.end_run();
    }
}
