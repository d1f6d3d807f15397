//! Rendering strategies: turn a canonical [`InvoiceRecord`] into PDF bytes.
//!
//! Two variants exist — direct vector drawing and HTML printed through a
//! headless browser — behind one rendering interface. A pipeline fixes its
//! strategy at construction time; there is no per-request selection.

pub mod markup;
pub mod vector;

pub use markup::MarkupRenderer;
pub use vector::VectorRenderer;

use async_trait::async_trait;
use thiserror::Error;

use crate::invoice::models::{InvoiceRecord, RenderedArtifact};

/// Errors from either rendering strategy. Whatever happens, no partial
/// buffer is ever returned.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to assemble PDF document: {0}")]
    Document(String),
    #[error("render task did not complete: {0}")]
    Cancelled(#[source] tokio::task::JoinError),
    #[error("failed to create render working directory: {0}")]
    TempDir(#[source] std::io::Error),
    #[error("failed to write invoice markup: {0}")]
    WriteMarkup(#[source] std::io::Error),
    #[error("failed to launch browser process: {0}")]
    BrowserLaunch(#[source] std::io::Error),
    #[error("browser process exited with status {0}")]
    BrowserExit(i32),
    #[error("browser produced no readable PDF output: {0}")]
    ReadPdf(#[source] std::io::Error),
}

#[async_trait]
pub trait RenderStrategy {
    async fn render(&self, record: &InvoiceRecord) -> Result<RenderedArtifact, RenderError>;
}

/// The closed set of renderers a pipeline can be built with.
pub enum Renderer {
    Vector(VectorRenderer),
    Markup(MarkupRenderer),
}

#[async_trait]
impl RenderStrategy for Renderer {
    async fn render(&self, record: &InvoiceRecord) -> Result<RenderedArtifact, RenderError> {
        match self {
            Renderer::Vector(renderer) => renderer.render(record).await,
            Renderer::Markup(renderer) => renderer.render(record).await,
        }
    }
}
