//! Artifact delivery: remote record lookup, multipart upload of the PDF,
//! and patching the attachment field on an existing record.
//!
//! The trait seam exists so the pipeline can be exercised against test
//! doubles; [`AirtableClient`] is the production implementation against an
//! Airtable v0-compatible API.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode, Url};
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::RecordStoreConfig;
use crate::invoice::models::{AmountInput, RemoteFields, RenderedArtifact};

// Remote column names supplying invoice fields.
const CLIENT_FIELD: &str = "Email";
const AMOUNT_FIELD: &str = "payment";
const DATE_FIELD: &str = "Date";

/// A record lookup failure aborts the pipeline before any rendering work.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("record store URL could not be built: {0}")]
    BadUrl(String),
    #[error("record lookup request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("record {record_id} lookup returned status {status}")]
    Status {
        record_id: String,
        status: StatusCode,
    },
    #[error("record lookup response was not valid JSON: {0}")]
    Decode(#[source] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("file store URL could not be built: {0}")]
    BadUrl(String),
    #[error("artifact upload request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("artifact upload returned status {0}")]
    Status(StatusCode),
    #[error("upload response was not valid JSON: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("upload response did not contain a file URL")]
    MissingUrl,
}

/// Non-fatal: an attach failure degrades the delivery result instead of
/// failing the pipeline.
#[derive(Debug, Error)]
pub enum AttachError {
    #[error("record store URL could not be built: {0}")]
    BadUrl(String),
    #[error("attachment patch request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("attachment patch returned status {0}")]
    Status(StatusCode),
}

#[async_trait]
pub trait RecordStore {
    /// Fetch one record by identifier; its present fields override request
    /// fields during document-model building.
    async fn get_record(&self, record_id: &str) -> Result<RemoteFields, LookupError>;

    /// Multipart upload of the finished PDF; returns the stored file URL.
    async fn upload(&self, artifact: RenderedArtifact) -> Result<String, UploadError>;

    /// Set the attachment field of `record_id` to the single file reference
    /// `{url, filename}`. Replaces any previous attachments.
    async fn attach(&self, record_id: &str, url: &str, filename: &str) -> Result<(), AttachError>;
}

pub struct AirtableClient {
    http: Client,
    config: RecordStoreConfig,
}

impl AirtableClient {
    pub fn new(config: RecordStoreConfig, http: Client) -> Self {
        Self { http, config }
    }

    /// `{api}/v0/{base}/{table}/{record}`, with the table name
    /// percent-encoded by the URL builder.
    fn record_url(&self, record_id: &str) -> Result<Url, String> {
        let mut url = Url::parse(&self.config.api_base).map_err(|e| e.to_string())?;
        url.path_segments_mut()
            .map_err(|_| "api base cannot carry a path".to_string())?
            .push("v0")
            .push(&self.config.base_id)
            .push(&self.config.table_name)
            .push(record_id);
        Ok(url)
    }

    fn files_url(&self) -> Result<Url, String> {
        let mut url = Url::parse(&self.config.api_base).map_err(|e| e.to_string())?;
        url.path_segments_mut()
            .map_err(|_| "api base cannot carry a path".to_string())?
            .push("v0")
            .push("files");
        Ok(url)
    }
}

fn value_to_amount(value: &Value) -> Option<AmountInput> {
    match value {
        Value::Number(n) => n.as_f64().map(AmountInput::Number),
        Value::String(s) => Some(AmountInput::Text(s.clone())),
        _ => None,
    }
}

/// The files endpoint answers either with an array of uploaded files or a
/// single `{file: {...}}` object; tolerate both.
fn extract_file_url(body: &Value) -> Option<String> {
    let first = body
        .as_array()
        .and_then(|files| files.first())
        .or_else(|| body.get("file"));
    first
        .and_then(|file| file.get("url"))
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl RecordStore for AirtableClient {
    async fn get_record(&self, record_id: &str) -> Result<RemoteFields, LookupError> {
        let url = self.record_url(record_id).map_err(LookupError::BadUrl)?;
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.config.token)
            .send()
            .await
            .map_err(LookupError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status {
                record_id: record_id.to_string(),
                status,
            });
        }

        let body: Value = response.json().await.map_err(LookupError::Decode)?;
        let fields = body.get("fields").cloned().unwrap_or(Value::Null);
        Ok(RemoteFields {
            client_identifier: fields
                .get(CLIENT_FIELD)
                .and_then(Value::as_str)
                .map(str::to_string),
            amount: fields.get(AMOUNT_FIELD).and_then(value_to_amount),
            issue_date: fields
                .get(DATE_FIELD)
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    async fn upload(&self, artifact: RenderedArtifact) -> Result<String, UploadError> {
        let url = self.files_url().map_err(UploadError::BadUrl)?;
        let part = Part::bytes(artifact.bytes)
            .file_name(artifact.filename)
            .mime_str("application/pdf")
            .map_err(UploadError::Request)?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.config.token)
            .multipart(form)
            .send()
            .await
            .map_err(UploadError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Status(status));
        }

        let body: Value = response.json().await.map_err(UploadError::Decode)?;
        extract_file_url(&body).ok_or(UploadError::MissingUrl)
    }

    async fn attach(&self, record_id: &str, url: &str, filename: &str) -> Result<(), AttachError> {
        let patch_url = self.record_url(record_id).map_err(AttachError::BadUrl)?;

        let mut fields = serde_json::Map::new();
        fields.insert(
            self.config.attachment_field.clone(),
            json!([{ "url": url, "filename": filename }]),
        );

        let response = self
            .http
            .patch(patch_url)
            .bearer_auth(&self.config.token)
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .map_err(AttachError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttachError::Status(status));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> AirtableClient {
        AirtableClient::new(
            RecordStoreConfig {
                token: "pat-test".to_string(),
                base_id: "appONFSmSkZsRk7zk".to_string(),
                table_name: "Table 13".to_string(),
                attachment_field: "Invoice File".to_string(),
                api_base: "https://api.airtable.com".to_string(),
            },
            Client::new(),
        )
    }

    #[test]
    fn record_url_percent_encodes_the_table_name() {
        let url = client().record_url("rec123").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.airtable.com/v0/appONFSmSkZsRk7zk/Table%2013/rec123"
        );
    }

    #[test]
    fn files_url_targets_the_v0_files_endpoint() {
        let url = client().files_url().unwrap();
        assert_eq!(url.as_str(), "https://api.airtable.com/v0/files");
    }

    #[test]
    fn extract_file_url_accepts_both_response_shapes() {
        let as_array = json!([{ "url": "https://files/a.pdf" }]);
        assert_eq!(
            extract_file_url(&as_array).as_deref(),
            Some("https://files/a.pdf")
        );

        let as_object = json!({ "file": { "url": "https://files/b.pdf" } });
        assert_eq!(
            extract_file_url(&as_object).as_deref(),
            Some("https://files/b.pdf")
        );
    }

    #[test]
    fn empty_or_missing_url_is_not_a_success() {
        assert_eq!(extract_file_url(&json!([{ "url": "" }])), None);
        assert_eq!(extract_file_url(&json!([{}])), None);
        assert_eq!(extract_file_url(&json!({})), None);
    }

    #[test]
    fn remote_amounts_keep_their_wire_shape() {
        assert_eq!(
            value_to_amount(&json!(49.5)),
            Some(AmountInput::Number(49.5))
        );
        assert_eq!(
            value_to_amount(&json!("49.5")),
            Some(AmountInput::Text("49.5".to_string()))
        );
        assert_eq!(value_to_amount(&json!({})), None);
    }
}
