//! Process configuration, read once at startup and passed by reference into
//! the pipeline and delivery-client constructors. Nothing reads the
//! environment after `AppConfig::from_env` returns.

use anyhow::{bail, Context};
use std::env;

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Company identity printed on every invoice. `COMPANY_NAME` can be
/// overridden per request; the address cannot.
#[derive(Debug, Clone)]
pub struct CompanyConfig {
    pub name: String,
    pub address: String,
}

impl CompanyConfig {
    pub fn from_env() -> Self {
        Self {
            name: env_or("COMPANY_NAME", "Your Company"),
            address: env_or("COMPANY_ADDRESS", "Address line • City • Country"),
        }
    }
}

/// Remote record store (Airtable v0-compatible API) credentials and
/// addressing. Everything except the token has a documented default.
#[derive(Debug, Clone)]
pub struct RecordStoreConfig {
    pub token: String,
    pub base_id: String,
    pub table_name: String,
    pub attachment_field: String,
    pub api_base: String,
}

impl RecordStoreConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let token = env::var("AIRTABLE_TOKEN")
            .context("AIRTABLE_TOKEN must be set (PAT with data.records read+write)")?;
        if token.trim().is_empty() {
            bail!("AIRTABLE_TOKEN is set but empty");
        }
        Ok(Self {
            token,
            base_id: env_or("AIRTABLE_BASE_ID", "appONFSmSkZsRk7zk"),
            table_name: env_or("AIRTABLE_TABLE_NAME", "Table 13"),
            attachment_field: env_or("AIRTABLE_ATTACHMENT_FIELD", "Invoice File"),
            api_base: env_or("AIRTABLE_API_BASE", "https://api.airtable.com"),
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub chromium_bin: String,
    pub company: CompanyConfig,
    pub record_store: RecordStoreConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:8080"),
            chromium_bin: env_or("CHROMIUM_BIN", "chromium"),
            company: CompanyConfig::from_env(),
            record_store: RecordStoreConfig::from_env()?,
        })
    }
}
