//! `getProgramAccounts` over JSON-RPC

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::decoder::RawAccount;
use crate::error::IndexerError;

const METHOD: &str = "getProgramAccounts";

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<Vec<RpcKeyedAccount>>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    #[serde(default)]
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcKeyedAccount {
    pubkey: String,
    account: RpcAccount,
}

#[derive(Debug, Deserialize)]
struct RpcAccount {
    /// `[payload, encoding]`
    data: (String, String),
    #[serde(default)]
    lamports: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DataSizeFilter {
    data_size: u64,
}

/// Thin JSON-RPC client. No retries; callers own retry and backoff policy.
#[derive(Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    endpoint: String,
}

impl RpcClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, IndexerError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IndexerError::Configuration(format!("http client: {}", e)))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch every account owned by `program_id`, optionally only those of exactly `data_size` bytes.
    pub async fn get_program_accounts(
        &self,
        program_id: &str,
        data_size: Option<u64>,
    ) -> Result<Vec<RawAccount>, IndexerError> {
        let body = request_body(program_id, data_size);
        debug!(
            "POST {} {} program={} data_size={:?}",
            self.endpoint, METHOD, program_id, data_size
        );

        let resp = self.http.post(&self.endpoint).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(IndexerError::Network(format!(
                "RPC request failed: {}",
                status
            )));
        }

        let envelope: RpcEnvelope = resp.json().await?;
        let accounts = unwrap_envelope(envelope)?;
        debug!(
            "{} returned {} accounts for program {}",
            METHOD,
            accounts.len(),
            program_id
        );
        Ok(accounts)
    }
}

fn request_body(program_id: &str, data_size: Option<u64>) -> Value {
    let filters: Vec<DataSizeFilter> = data_size
        .map(|data_size| DataSizeFilter { data_size })
        .into_iter()
        .collect();
    json!({
        "jsonrpc": "2.0",
        "id": METHOD,
        "method": METHOD,
        "params": [
            program_id,
            {
                "commitment": "confirmed",
                "encoding": "base64",
                "filters": filters,
            }
        ]
    })
}

fn unwrap_envelope(envelope: RpcEnvelope) -> Result<Vec<RawAccount>, IndexerError> {
    if let Some(err) = envelope.error {
        return Err(IndexerError::Protocol(format!(
            "RPC error {}: {}",
            err.code, err.message
        )));
    }
    let result = envelope
        .result
        .ok_or_else(|| IndexerError::Protocol("response has neither result nor error".into()))?;
    result.into_iter().map(to_raw_account).collect()
}

fn to_raw_account(keyed: RpcKeyedAccount) -> Result<RawAccount, IndexerError> {
    let (payload, encoding) = keyed.account.data;
    if encoding != "base64" {
        return Err(IndexerError::Protocol(format!(
            "account {} returned in unexpected encoding '{}'",
            keyed.pubkey, encoding
        )));
    }
    let data = STANDARD.decode(payload.as_bytes()).map_err(|e| {
        IndexerError::Protocol(format!("account {} has invalid base64 data: {}", keyed.pubkey, e))
    })?;
    Ok(RawAccount {
        pubkey: keyed.pubkey,
        lamports: keyed.account.lamports,
        data,
    })
}
