//! Form bodies for the browser-facing endpoints.
//!
//! The front end posts `multipart/form-data` when files are attached and
//! `application/x-www-form-urlencoded` otherwise; both land in [`FormData`].

use std::collections::HashMap;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Form,
};
use database_layer::parse_flag;

use crate::error::ApiError;

/// One uploaded file part
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Text fields (last value wins) and file parts (all kept, in order)
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, Vec<UploadedFile>>,
}

impl FormData {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await?;
                    // Browsers submit an empty part for an untouched file input
                    if filename.is_empty() && data.is_empty() {
                        continue;
                    }
                    form.files.entry(name).or_default().push(UploadedFile {
                        filename,
                        content_type,
                        data,
                    });
                }
                None => {
                    let value = field.text().await?;
                    form.fields.insert(name, value);
                }
            }
        }
        Ok(form)
    }

    /// Trimmed text value; blank counts as absent
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// First non-blank value among `names`
    pub fn first_text(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|name| self.text(name))
    }

    /// Required text value, a 400 naming the field otherwise
    pub fn require(&self, name: &str) -> Result<&str, ApiError> {
        self.text(name)
            .ok_or_else(|| ApiError::validation(format!("Field '{}' is required", name)))
    }

    /// Boolean flag; absent or unparseable is false
    pub fn flag(&self, name: &str) -> bool {
        self.text(name).and_then(parse_flag).unwrap_or(false)
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name).and_then(|files| files.first())
    }

    pub fn files(&self, name: &str) -> &[UploadedFile] {
        self.files.get(name).map(Vec::as_slice).unwrap_or_default()
    }
}

#[async_trait]
impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(e.body_text()))?;
            Self::from_multipart(multipart).await
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(e.body_text()))?;
            Ok(Self {
                fields,
                files: HashMap::new(),
            })
        } else {
            Err(ApiError::bad_request(
                "Expected a multipart/form-data or application/x-www-form-urlencoded body",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(fields: &[(&str, &str)]) -> FormData {
        FormData {
            fields: fields
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            files: HashMap::new(),
        }
    }

    #[test]
    fn test_text_treats_blank_as_absent() {
        let form = form(&[("name", "  Hanako "), ("breed", "   ")]);
        assert_eq!(form.text("name"), Some("Hanako"));
        assert_eq!(form.text("breed"), None);
        assert!(form.require("breed").is_err());
        assert_eq!(form.first_text(&["breed", "name"]), Some("Hanako"));
    }

    #[test]
    fn test_flag() {
        let form = form(&[("auto_transcribe", "true"), ("other", "nope")]);
        assert!(form.flag("auto_transcribe"));
        assert!(!form.flag("other"));
        assert!(!form.flag("missing"));
    }
}
