use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request payload accepted by both pipeline variants.
///
/// The inline variant needs `clientIdentifier` and `amount`; the delivering
/// variant accepts those or a `recordId` referencing a remote record whose
/// fields take precedence over the ones given here.
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct InvoiceRequest {
    #[schema(example = "Acme Co")]
    pub client_identifier: Option<String>,
    pub amount: Option<AmountInput>,
    #[schema(example = "rec123")]
    pub record_id: Option<String>,
    /// ISO date, e.g. "2026-08-01".
    #[schema(example = "2026-08-01")]
    pub issue_date: Option<String>,
    #[schema(example = "Consulting retainer")]
    pub description: Option<String>,
    pub company_name: Option<String>,
}

/// Amounts arrive as JSON numbers or strings depending on the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum AmountInput {
    Number(f64),
    Text(String),
}

/// Invoice fields read back from a remote record. Present fields override
/// the request payload during document-model building.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteFields {
    pub client_identifier: Option<String>,
    pub amount: Option<AmountInput>,
    pub issue_date: Option<String>,
}

/// Canonical invoice built once per pipeline invocation. The invoice number
/// is generated during building and reused unchanged by the render and
/// delivery stages.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceRecord {
    pub invoice_number: String,
    pub client_identifier: String,
    pub amount: f64,
    pub issue_date: NaiveDate,
    pub description: String,
    pub company_name: String,
    pub company_address: String,
}

impl InvoiceRecord {
    /// Amounts are always rendered with exactly two decimal places.
    pub fn formatted_amount(&self) -> String {
        format!("{:.2}", self.amount)
    }

    pub fn filename(&self) -> String {
        format!("Invoice_{}.pdf", self.invoice_number)
    }
}

/// Finished PDF plus its derived filename. Consumed by value exactly once.
#[derive(Debug)]
pub struct RenderedArtifact {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Outcome of the delivery stage. `attachment_succeeded == false` alongside
/// a URL is a first-class partial success, not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryResult {
    pub artifact_url: String,
    pub attached_record_id: Option<String>,
    pub attachment_succeeded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InlineInvoiceResponse {
    pub success: bool,
    #[schema(example = "INV-34567890")]
    pub invoice_number: String,
    /// The whole PDF as a `data:application/pdf;base64,...` URL.
    pub pdf_data_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredInvoiceResponse {
    pub success: bool,
    #[schema(example = "INV-34567890")]
    pub invoice_number: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_succeeded: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}
