//! Pipeline orchestrator: validating -> rendering -> uploading ->
//! attaching (optional) -> done.
//!
//! Each remote call is attempted exactly once; there are no retries
//! anywhere. A failed attach does not fail the pipeline — it produces a
//! success carrying `attachment_succeeded = false`.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::{info, warn};
use thiserror::Error;

use crate::config::CompanyConfig;
use crate::delivery::{LookupError, RecordStore, UploadError};
use crate::invoice::builder::{self, AmountPolicy, ValidationError};
use crate::invoice::models::{DeliveryResult, InvoiceRequest};
use crate::render::{RenderError, RenderStrategy};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Upload(#[from] UploadError),
}

impl PipelineError {
    /// Stage at which the pipeline failed, for logging.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) | PipelineError::Lookup(_) => "validating",
            PipelineError::Render(_) => "rendering",
            PipelineError::Upload(_) => "uploading",
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, PipelineError::Validation(_))
    }
}

#[derive(Debug)]
pub enum PipelineOutcome {
    /// Inline variant: the PDF travels back to the caller as a data URL.
    Inline {
        invoice_number: String,
        pdf_data_url: String,
    },
    /// Delivering variant: the PDF was uploaded and possibly attached.
    Delivered {
        invoice_number: String,
        delivery: DeliveryResult,
    },
}

/// One deployable pipeline variant. The rendering strategy and the delivery
/// mode are fixed at construction; requests cannot change them.
pub struct InvoicePipeline {
    renderer: Arc<dyn RenderStrategy + Send + Sync>,
    store: Option<Arc<dyn RecordStore + Send + Sync>>,
    amount_policy: AmountPolicy,
    company: CompanyConfig,
}

impl InvoicePipeline {
    /// Presentational variant: renders and returns the PDF inline, never
    /// touches the record store, formats unparseable amounts as 0.00.
    pub fn inline(renderer: Arc<dyn RenderStrategy + Send + Sync>, company: CompanyConfig) -> Self {
        Self {
            renderer,
            store: None,
            amount_policy: AmountPolicy::Lenient,
            company,
        }
    }

    /// Billing variant: uploads the PDF to the record store and attaches it
    /// to the target record when one is known; refuses unparseable amounts.
    pub fn delivering(
        renderer: Arc<dyn RenderStrategy + Send + Sync>,
        store: Arc<dyn RecordStore + Send + Sync>,
        company: CompanyConfig,
    ) -> Self {
        Self {
            renderer,
            store: Some(store),
            amount_policy: AmountPolicy::Strict,
            company,
        }
    }

    pub async fn run(&self, request: &InvoiceRequest) -> Result<PipelineOutcome, PipelineError> {
        // Validating: resolve the remote record first so no rendering work
        // is wasted on an invalid target.
        let remote = match (&self.store, request.record_id.as_deref()) {
            (Some(store), Some(record_id)) => {
                info!("resolving record {record_id} before rendering");
                Some(store.get_record(record_id).await?)
            }
            _ => None,
        };
        let record = builder::build(request, remote.as_ref(), self.amount_policy, &self.company)?;
        info!(
            "built invoice {} for '{}'",
            record.invoice_number, record.client_identifier
        );

        // Rendering.
        let artifact = self.renderer.render(&record).await?;

        // Delivery.
        let Some(store) = &self.store else {
            let encoded = BASE64.encode(&artifact.bytes);
            return Ok(PipelineOutcome::Inline {
                invoice_number: record.invoice_number,
                pdf_data_url: format!("data:application/pdf;base64,{encoded}"),
            });
        };

        let filename = artifact.filename.clone();
        let artifact_url = store.upload(artifact).await?;
        info!("uploaded {filename} -> {artifact_url}");

        let mut delivery = DeliveryResult {
            artifact_url,
            attached_record_id: None,
            attachment_succeeded: false,
        };
        if let Some(record_id) = request.record_id.as_deref() {
            delivery.attached_record_id = Some(record_id.to_string());
            match store
                .attach(record_id, &delivery.artifact_url, &filename)
                .await
            {
                Ok(()) => {
                    delivery.attachment_succeeded = true;
                    info!("attached {filename} to record {record_id}");
                }
                Err(err) => {
                    // Upload is neither retried nor rolled back.
                    warn!(
                        "invoice {} uploaded but attaching to {record_id} failed: {err}",
                        record.invoice_number
                    );
                }
            }
        }

        Ok(PipelineOutcome::Delivered {
            invoice_number: record.invoice_number,
            delivery,
        })
    }
}
