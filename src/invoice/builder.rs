//! Document Model Builder: normalizes raw request fields, optionally merged
//! with fields fetched from a remote record, into a canonical
//! [`InvoiceRecord`].
//!
//! Resolution order per field: remote record (when fetched and present) >
//! request payload > documented default.

use chrono::{Local, NaiveDate, Utc};
use log::warn;
use thiserror::Error;

use crate::config::CompanyConfig;

use super::models::{AmountInput, InvoiceRecord, InvoiceRequest, RemoteFields};

pub const DEFAULT_DESCRIPTION: &str = "Professional Services";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("need either recordId or clientIdentifier/amount in the request body")]
    MissingBillingFields,
    #[error("amount '{0}' is not a number")]
    NonNumericAmount(String),
    #[error("amount {0} is negative")]
    NegativeAmount(f64),
}

/// How strictly the builder treats an amount that is present but not
/// parseable as a number. The two pipeline variants differ here: the inline
/// variant is purely presentational and formats garbage as 0.00, the
/// delivering variant refuses to bill an amount it cannot parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountPolicy {
    Lenient,
    Strict,
}

/// Derive an invoice number from the current clock: `INV-` plus the last
/// eight digits of the unix-epoch millisecond count. Collisions across
/// concurrent invocations are possible and accepted; uniqueness is
/// explicitly not guaranteed.
pub fn next_invoice_number() -> String {
    let millis = Utc::now().timestamp_millis().to_string();
    let tail = &millis[millis.len().saturating_sub(8)..];
    format!("INV-{tail}")
}

pub fn build(
    input: &InvoiceRequest,
    remote: Option<&RemoteFields>,
    policy: AmountPolicy,
    company: &CompanyConfig,
) -> Result<InvoiceRecord, ValidationError> {
    let client_identifier = remote
        .and_then(|r| r.client_identifier.clone())
        .or_else(|| input.client_identifier.clone())
        .filter(|v| !v.trim().is_empty());

    let amount_input = remote
        .and_then(|r| r.amount.clone())
        .or_else(|| input.amount.clone());

    // There has to be enough information for a non-empty invoice.
    if client_identifier.is_none() && amount_input.is_none() {
        return Err(ValidationError::MissingBillingFields);
    }

    let amount = resolve_amount(amount_input.as_ref(), policy)?;

    let issue_date = resolve_issue_date(
        remote
            .and_then(|r| r.issue_date.as_deref())
            .or(input.issue_date.as_deref()),
    );

    Ok(InvoiceRecord {
        invoice_number: next_invoice_number(),
        client_identifier: client_identifier.unwrap_or_else(|| "-".to_string()),
        amount,
        issue_date,
        description: input
            .description
            .clone()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        company_name: input
            .company_name
            .clone()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| company.name.clone()),
        company_address: company.address.clone(),
    })
}

fn resolve_amount(
    input: Option<&AmountInput>,
    policy: AmountPolicy,
) -> Result<f64, ValidationError> {
    // A missing amount with a known client resolves to zero.
    let Some(input) = input else {
        return Ok(0.0);
    };

    let parsed = match input {
        AmountInput::Number(n) => Some(*n),
        AmountInput::Text(s) => s.trim().parse::<f64>().ok(),
    };

    match parsed {
        Some(n) if !n.is_finite() || n < 0.0 => Err(ValidationError::NegativeAmount(n)),
        Some(n) => Ok(n),
        None => {
            let raw = match input {
                AmountInput::Text(s) => s.clone(),
                AmountInput::Number(n) => n.to_string(),
            };
            match policy {
                AmountPolicy::Lenient => {
                    warn!("amount '{raw}' is not numeric, formatting as 0.00");
                    Ok(0.0)
                }
                AmountPolicy::Strict => Err(ValidationError::NonNumericAmount(raw)),
            }
        }
    }
}

fn resolve_issue_date(input: Option<&str>) -> NaiveDate {
    let today = Local::now().date_naive();
    match input {
        None => today,
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").unwrap_or_else(|_| {
            warn!("issueDate '{raw}' is not an ISO date, using today");
            today
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company() -> CompanyConfig {
        CompanyConfig {
            name: "Test Co".to_string(),
            address: "1 Test Street".to_string(),
        }
    }

    fn request(client: Option<&str>, amount: Option<AmountInput>) -> InvoiceRequest {
        InvoiceRequest {
            client_identifier: client.map(str::to_string),
            amount,
            ..InvoiceRequest::default()
        }
    }

    #[test]
    fn amount_always_formats_to_two_decimal_places() {
        let record = build(
            &request(Some("Acme Co"), Some(AmountInput::Text("49.5".into()))),
            None,
            AmountPolicy::Strict,
            &company(),
        )
        .unwrap();
        assert_eq!(record.formatted_amount(), "49.50");

        let record = build(
            &request(Some("Acme Co"), Some(AmountInput::Number(1200.0))),
            None,
            AmountPolicy::Strict,
            &company(),
        )
        .unwrap();
        assert_eq!(record.formatted_amount(), "1200.00");
    }

    #[test]
    fn missing_client_and_amount_is_a_validation_error() {
        let err = build(
            &InvoiceRequest::default(),
            None,
            AmountPolicy::Strict,
            &company(),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::MissingBillingFields);
    }

    #[test]
    fn remote_fields_override_request_fields_only_where_present() {
        let remote = RemoteFields {
            client_identifier: Some("Remote Client".into()),
            amount: None,
            issue_date: None,
        };
        let record = build(
            &request(Some("Local Client"), Some(AmountInput::Number(10.0))),
            Some(&remote),
            AmountPolicy::Strict,
            &company(),
        )
        .unwrap();
        assert_eq!(record.client_identifier, "Remote Client");
        assert_eq!(record.amount, 10.0);
    }

    #[test]
    fn missing_amount_with_known_client_resolves_to_zero() {
        let record = build(
            &request(Some("Acme Co"), None),
            None,
            AmountPolicy::Strict,
            &company(),
        )
        .unwrap();
        assert_eq!(record.formatted_amount(), "0.00");
    }

    #[test]
    fn strict_policy_rejects_non_numeric_amounts() {
        let err = build(
            &request(Some("Acme Co"), Some(AmountInput::Text("a lot".into()))),
            None,
            AmountPolicy::Strict,
            &company(),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::NonNumericAmount("a lot".into()));
    }

    #[test]
    fn lenient_policy_formats_non_numeric_amounts_as_zero() {
        let record = build(
            &request(Some("Acme Co"), Some(AmountInput::Text("a lot".into()))),
            None,
            AmountPolicy::Lenient,
            &company(),
        )
        .unwrap();
        assert_eq!(record.formatted_amount(), "0.00");
    }

    #[test]
    fn negative_amounts_are_rejected_under_both_policies() {
        for policy in [AmountPolicy::Lenient, AmountPolicy::Strict] {
            let err = build(
                &request(Some("Acme Co"), Some(AmountInput::Number(-5.0))),
                None,
                policy,
                &company(),
            )
            .unwrap_err();
            assert_eq!(err, ValidationError::NegativeAmount(-5.0));
        }
    }

    #[test]
    fn defaults_fill_description_and_company() {
        let record = build(
            &request(Some("Acme Co"), Some(AmountInput::Number(1.0))),
            None,
            AmountPolicy::Strict,
            &company(),
        )
        .unwrap();
        assert_eq!(record.description, DEFAULT_DESCRIPTION);
        assert_eq!(record.company_name, "Test Co");
        assert_eq!(record.company_address, "1 Test Street");
    }

    #[test]
    fn invoice_number_matches_expected_pattern() {
        let number = next_invoice_number();
        let digits = number.strip_prefix("INV-").unwrap();
        assert_eq!(digits.len(), 8);
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn bad_issue_date_falls_back_to_today() {
        let record = build(
            &InvoiceRequest {
                issue_date: Some("next tuesday".into()),
                ..request(Some("Acme Co"), Some(AmountInput::Number(1.0)))
            },
            None,
            AmountPolicy::Strict,
            &company(),
        )
        .unwrap();
        assert_eq!(record.issue_date, Local::now().date_naive());
    }
}
