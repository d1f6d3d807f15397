//! Markup renderer: fills a fixed HTML/CSS invoice template by plain string
//! interpolation, then prints it to PDF through a headless Chromium process.
//!
//! The browser is scoped to exactly one render call: the markup lives in a
//! temporary directory removed on drop, and the child process is killed on
//! drop, so neither survives an error path. Page size and print margins are
//! declared in the template's `@page` rule since the one-shot CLI carries no
//! per-call print options.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tempfile::tempdir;
use tokio::process::Command;

use crate::invoice::models::{InvoiceRecord, RenderedArtifact};

use super::{RenderError, RenderStrategy};

/// Escape a value for interpolation into HTML text content.
fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Fill the invoice template. Every interpolated value comes from an
/// already defaults-resolved record, so no missing-field marker can leak
/// into the output.
fn render_invoice_html(record: &InvoiceRecord) -> String {
    let company = escape_html(&record.company_name);
    let address = escape_html(&record.company_address);
    let client = escape_html(&record.client_identifier);
    let description = escape_html(&record.description);
    let invoice_number = escape_html(&record.invoice_number);
    let amount = record.formatted_amount();
    let date = record.issue_date.format("%Y-%m-%d");

    format!(
        r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8" />
  <title>Invoice {invoice_number}</title>
  <style>
    @page {{ size: A4; margin: 20mm 15mm; }}
    body {{
      font-family: -apple-system, BlinkMacSystemFont, Segoe UI, Roboto, Arial, sans-serif;
      color: #111;
      -webkit-print-color-adjust: exact;
      print-color-adjust: exact;
    }}
    .top {{ display: flex; justify-content: space-between; align-items: flex-start; }}
    .brand h1 {{ margin: 0; font-size: 28px; letter-spacing: 0.3px; color: #2563eb; }}
    .brand .sub {{ color: #666; font-size: 12px; }}
    .meta {{ text-align: right; font-size: 12px; color: #444; }}
    .card {{ border: 1px solid #e5e7eb; border-radius: 12px; padding: 20px; margin-top: 24px; }}
    .row {{ margin: 6px 0; }}
    .label {{ color: #6b7280; display: block; font-size: 12px; }}
    .value {{ font-size: 16px; }}
    .total {{ font-size: 20px; font-weight: 600; margin-top: 12px; }}
    .footer {{ margin-top: 40px; color: #6b7280; font-size: 12px; }}
    .thank {{ margin-top: 28px; font-weight: 600; }}
  </style>
</head>
<body>
  <div class="top">
    <div class="brand">
      <h1>Invoice</h1>
      <div class="sub">{company}<br>{address}</div>
    </div>
    <div class="meta">
      <div><strong>Date:</strong> {date}</div>
      <div><strong>Invoice #:</strong> {invoice_number}</div>
    </div>
  </div>

  <div class="card">
    <div class="row"><span class="label">Client</span><span class="value">{client}</span></div>
    <div class="row"><span class="label">Description</span><span class="value">{description}</span></div>
    <div class="row"><span class="label">Billing Date</span><span class="value">{date}</span></div>
    <div class="total">Total: ${amount}</div>
  </div>

  <div class="thank">Thank you for your business!</div>
  <div class="footer">This is a system generated invoice.</div>
</body>
</html>"#
    )
}

/// Renders through a headless Chromium binary.
#[derive(Debug, Clone)]
pub struct MarkupRenderer {
    browser_bin: PathBuf,
}

impl MarkupRenderer {
    pub fn new(browser_bin: impl Into<PathBuf>) -> Self {
        Self {
            browser_bin: browser_bin.into(),
        }
    }
}

#[async_trait]
impl RenderStrategy for MarkupRenderer {
    async fn render(&self, record: &InvoiceRecord) -> Result<RenderedArtifact, RenderError> {
        let html = render_invoice_html(record);

        // Removed on drop, success or failure.
        let workdir = tempdir().map_err(RenderError::TempDir)?;
        let markup_path = workdir.path().join("invoice.html");
        let pdf_path = workdir.path().join("invoice.pdf");
        tokio::fs::write(&markup_path, html)
            .await
            .map_err(RenderError::WriteMarkup)?;

        let status = Command::new(&self.browser_bin)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--no-pdf-header-footer")
            // Lets in-flight resource loads settle before capture.
            .arg("--virtual-time-budget=10000")
            .arg(format!("--print-to-pdf={}", pdf_path.display()))
            .arg(format!("file://{}", markup_path.display()))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(RenderError::BrowserLaunch)?;

        if !status.success() {
            return Err(RenderError::BrowserExit(status.code().unwrap_or(-1)));
        }

        let bytes = tokio::fs::read(&pdf_path)
            .await
            .map_err(RenderError::ReadPdf)?;
        Ok(RenderedArtifact {
            filename: record.filename(),
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record() -> InvoiceRecord {
        InvoiceRecord {
            invoice_number: "INV-34567890".to_string(),
            client_identifier: "Acme & Sons".to_string(),
            amount: 49.5,
            issue_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            description: "Professional Services".to_string(),
            company_name: "Test Co".to_string(),
            company_address: "1 Test Street".to_string(),
        }
    }

    #[test]
    fn template_interpolates_resolved_values() {
        let html = render_invoice_html(&record());
        assert!(html.contains("Acme &amp; Sons"));
        assert!(html.contains("INV-34567890"));
        assert!(html.contains("Total: $49.50"));
        assert!(html.contains("2026-08-01"));
        assert!(html.contains("Test Co"));
    }

    #[test]
    fn template_declares_print_geometry() {
        let html = render_invoice_html(&record());
        assert!(html.contains("size: A4"));
        assert!(html.contains("margin: 20mm 15mm"));
        assert!(html.contains("print-color-adjust: exact"));
    }

    #[test]
    fn escape_html_neutralizes_markup() {
        assert_eq!(escape_html("<b>&\"x\""), "&lt;b&gt;&amp;&quot;x&quot;");
    }

    #[tokio::test]
    async fn missing_browser_binary_is_a_launch_error() {
        let renderer = MarkupRenderer::new("/nonexistent/chromium-bin");
        let err = renderer.render(&record()).await.unwrap_err();
        assert!(matches!(err, RenderError::BrowserLaunch(_)));
    }

    #[tokio::test]
    async fn failing_browser_process_is_an_exit_error() {
        let renderer = MarkupRenderer::new("false");
        let err = renderer.render(&record()).await.unwrap_err();
        assert!(matches!(err, RenderError::BrowserExit(_)));
    }
}
