//! Invoice domain: request/response models, the document model builder, and
//! the HTTP handlers for the two pipeline variants.

pub mod builder;
pub mod handlers;
pub mod models;

pub use builder::{AmountPolicy, ValidationError};
pub use models::{DeliveryResult, InvoiceRecord, InvoiceRequest, RenderedArtifact};
