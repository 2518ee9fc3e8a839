use reqwest::multipart::{Form, Part};

use crate::error::AppError;

/// One multipart field, in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormField {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        bytes: Vec<u8>,
    },
}

impl FormField {
    pub fn name(&self) -> &str {
        match self {
            FormField::Text { name, .. } | FormField::File { name, .. } => name,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, FormField::File { .. })
    }
}

/// Ordered body of `POST /tests`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionPayload {
    fields: Vec<FormField>,
}

impl SubmissionPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push(FormField::Text {
            name: name.into(),
            value: value.into(),
        });
    }

    pub fn push_file(
        &mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) {
        self.fields.push(FormField::File {
            name: name.into(),
            file_name: file_name.into(),
            bytes,
        });
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.iter().find_map(|f| match f {
            FormField::Text { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }

    /// Number of fields whose name starts with `prefix`.
    pub fn count_prefixed(&self, prefix: &str) -> usize {
        self.fields
            .iter()
            .filter(|f| f.name().starts_with(prefix))
            .count()
    }

    pub fn into_multipart(self) -> Result<Form, AppError> {
        let mut form = Form::new();
        for field in self.fields {
            form = match field {
                FormField::Text { name, value } => form.text(name, value),
                FormField::File {
                    name,
                    file_name,
                    bytes,
                } => {
                    let part = Part::bytes(bytes)
                        .file_name(file_name)
                        .mime_str("application/octet-stream")?;
                    form.part(name, part)
                }
            };
        }
        Ok(form)
    }
}
