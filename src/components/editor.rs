//! Test-list editor for the instructor form.
//!
//! Rows carry a numeric suffix used in field names. Suffixes only grow and
//! are never reused, so removing a row leaves a gap. The single add control
//! always sits in the last row, which is why the last row cannot be removed.

use std::path::Path;

use crate::error::AppError;
use crate::page::markup::Element;

/// A file picked for a row's file input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSelection {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl FileSelection {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| AppError::Validation(format!("{} is not a file", path.display())))?;
        let bytes = std::fs::read(path)?;
        Ok(Self { file_name, bytes })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestRow {
    pub index: u32,
    pub description: String,
    pub file: Option<FileSelection>,
}

impl TestRow {
    fn empty(index: u32) -> Self {
        Self {
            index,
            description: String::new(),
            file: None,
        }
    }

    pub fn element_id(&self) -> String {
        format!("test-{}", self.index)
    }

    pub fn description_field(&self) -> String {
        format!("test-description-{}", self.index)
    }

    pub fn file_field(&self) -> String {
        format!("test-file-{}", self.index)
    }
}

#[derive(Debug, Clone)]
pub struct TestListEditor {
    rows: Vec<TestRow>,
    data_index: u32,
}

impl Default for TestListEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl TestListEditor {
    /// One empty row with suffix 0.
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// One empty row with the given suffix, for forms rendered with rows
    /// already numbered by the server.
    pub fn starting_at(index: u32) -> Self {
        Self {
            rows: vec![TestRow::empty(index)],
            data_index: index,
        }
    }

    pub fn rows(&self) -> &[TestRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Suffix of the row that holds the add control.
    pub fn add_control_row(&self) -> u32 {
        self.data_index
    }

    pub fn is_removable(&self, index: u32) -> bool {
        index != self.data_index && self.rows.iter().any(|r| r.index == index)
    }

    /// Turn the last row into a removable one and append a fresh row.
    /// Returns the new row's suffix.
    pub fn add(&mut self) -> Result<u32, AppError> {
        let next = self
            .data_index
            .checked_add(1)
            .ok_or_else(|| AppError::Validation("test row index overflow".into()))?;
        self.data_index = next;
        self.rows.push(TestRow::empty(next));
        Ok(next)
    }

    pub fn remove(&mut self, index: u32) -> Result<TestRow, AppError> {
        let pos = self
            .rows
            .iter()
            .position(|r| r.index == index)
            .ok_or_else(|| AppError::NotFound(format!("no test row {index}")))?;
        if index == self.data_index {
            return Err(AppError::Validation(
                "the row holding the add control cannot be removed".into(),
            ));
        }
        Ok(self.rows.remove(pos))
    }

    fn row_mut(&mut self, index: u32) -> Result<&mut TestRow, AppError> {
        self.rows
            .iter_mut()
            .find(|r| r.index == index)
            .ok_or_else(|| AppError::NotFound(format!("no test row {index}")))
    }

    pub fn set_description(&mut self, index: u32, description: impl Into<String>) -> Result<(), AppError> {
        self.row_mut(index)?.description = description.into();
        Ok(())
    }

    pub fn attach_file(&mut self, index: u32, file: FileSelection) -> Result<(), AppError> {
        self.row_mut(index)?.file = Some(file);
        Ok(())
    }

    /// Fill the add-control row, then add a new row after it. Returns the
    /// suffix of the row that was filled.
    pub fn push_test(&mut self, description: impl Into<String>, file: FileSelection) -> Result<u32, AppError> {
        let index = self.data_index;
        let has_content = self
            .rows
            .last()
            .map(|r| !r.description.is_empty() || r.file.is_some())
            .unwrap_or(false);
        let index = if has_content { self.add()? } else { index };
        self.set_description(index, description)?;
        self.attach_file(index, file)?;
        Ok(index)
    }

    /// `div#tests` with one `div#test-{n}` per row.
    pub fn render(&self) -> Element {
        let mut tests = Element::new("div").with_id("tests");
        for row in &self.rows {
            let control = if row.index == self.data_index {
                Element::new("button")
                    .with_id("add-btn")
                    .with_classes(&["btn", "btn-success"])
                    .with_text("+")
            } else {
                Element::new("button")
                    .with_classes(&["btn", "btn-danger"])
                    .with_attr("data-remove", row.index.to_string())
                    .with_text("-")
            };

            let mut file_input = Element::new("input")
                .with_id(row.file_field())
                .with_classes(&["form-control", "mx-2"])
                .with_attr("type", "file")
                .with_attr("name", row.file_field())
                .with_attr("required", "required");
            if let Some(file) = &row.file {
                file_input = file_input.with_attr("data-file-name", file.file_name.clone());
            }

            tests = tests.with_child(
                Element::new("div")
                    .with_id(row.element_id())
                    .with_classes(&["d-flex", "flex-row", "justify-content-between", "mb-3"])
                    .with_child(
                        Element::new("input")
                            .with_classes(&["form-control", "mx-2"])
                            .with_attr("name", row.description_field())
                            .with_attr("placeholder", "Test description")
                            .with_attr("value", row.description.clone())
                            .with_attr("required", "required"),
                    )
                    .with_child(file_input)
                    .with_child(control),
            );
        }
        tests
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_editor_has_one_row_with_add_control() {
        let editor = TestListEditor::new();
        assert_eq!(editor.len(), 1);
        assert_eq!(editor.add_control_row(), 0);
        assert!(!editor.is_removable(0));
    }

    #[test]
    fn test_add_appends_incrementing_rows() {
        let mut editor = TestListEditor::starting_at(3);
        assert_eq!(editor.add().unwrap(), 4);
        assert_eq!(editor.add().unwrap(), 5);
        let indices: Vec<u32> = editor.rows().iter().map(|r| r.index).collect();
        assert_eq!(indices, [3, 4, 5]);
        assert!(editor.is_removable(3));
        assert!(editor.is_removable(4));
        assert!(!editor.is_removable(5));
    }

    #[test]
    fn test_remove_leaves_gap_without_renumbering() {
        let mut editor = TestListEditor::new();
        editor.add().unwrap();
        editor.add().unwrap();
        let removed = editor.remove(1).unwrap();
        assert_eq!(removed.index, 1);
        let indices: Vec<u32> = editor.rows().iter().map(|r| r.index).collect();
        assert_eq!(indices, [0, 2]);
        assert_eq!(editor.add().unwrap(), 3);
    }

    #[test]
    fn test_last_row_cannot_be_removed() {
        let mut editor = TestListEditor::new();
        editor.add().unwrap();
        assert_eq!(editor.remove(1).unwrap_err().kind(), "validation");
        assert_eq!(editor.remove(9).unwrap_err().kind(), "not_found");
    }

    #[test]
    fn test_field_names() {
        let row = TestRow::empty(7);
        assert_eq!(row.element_id(), "test-7");
        assert_eq!(row.description_field(), "test-description-7");
        assert_eq!(row.file_field(), "test-file-7");
    }

    #[test]
    fn test_render_has_single_add_control_in_last_row() {
        let mut editor = TestListEditor::new();
        editor.add().unwrap();
        editor.add().unwrap();
        let tree = editor.render();
        assert_eq!(tree.count(&|e| e.id.as_deref() == Some("add-btn")), 1);
        let last = tree.child_elements().last().unwrap();
        assert_eq!(last.id.as_deref(), Some("test-2"));
        assert!(last.find_by_id("add-btn").is_some());
        assert_eq!(tree.count(&|e| e.attr("data-remove").is_some()), 2);
    }

    #[test]
    fn test_push_test_fills_then_grows() {
        let mut editor = TestListEditor::new();
        let first = editor
            .push_test("compiles", FileSelection::new("build.sh", b"make".to_vec()))
            .unwrap();
        let second = editor
            .push_test("passes lint", FileSelection::new("lint.sh", b"lint".to_vec()))
            .unwrap();
        assert_eq!((first, second), (0, 1));
        assert_eq!(editor.len(), 2);
        assert_eq!(editor.rows()[1].description, "passes lint");
    }

    #[test]
    fn test_file_selection_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("check.sh");
        std::fs::write(&path, b"#!/bin/sh\nexit 0\n").unwrap();
        let file = FileSelection::from_path(&path).unwrap();
        assert_eq!(file.file_name, "check.sh");
        assert_eq!(file.bytes, b"#!/bin/sh\nexit 0\n");
        assert_eq!(
            FileSelection::from_path(&dir.path().join("missing")).unwrap_err().kind(),
            "io"
        );
    }
}
