#![allow(dead_code)]

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde_json::{json, Value};
use std::process::{Command, Stdio};
use std::{net::TcpListener, path::Path, time::Duration};
use tokio::time::sleep;

pub const PROJECT_PROGRAM: &str = "FundHub1111111111111111111111111111111111111";
pub const DAO_PROGRAM: &str = "DaoPass11111111111111111111111111111111111111";
pub const GOVERNANCE_PROGRAM: &str = "Govern1111111111111111111111111111111111111";
pub const VAULT_PROGRAM: &str = "Savings1111111111111111111111111111111111111";

/// Get an available ephemeral port on localhost.
pub fn find_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

/// Poll /health until the server responds OK or timeout.
pub async fn wait_ready(base: &str, timeout_ms: u64) -> anyhow::Result<()> {
    let client = Client::new();
    let mut waited = 0u64;
    loop {
        if waited >= timeout_ms {
            anyhow::bail!("server not ready after {}ms", timeout_ms);
        }
        if let Ok(resp) = client.get(format!("{}/health", base)).send().await {
            if resp.status().is_success() {
                return Ok(());
            }
        }
        sleep(Duration::from_millis(50)).await;
        waited += 50;
    }
}

// Struct that ensures the child process is killed on drop
pub struct ChildGuard(std::process::Child);
impl Drop for ChildGuard {
    fn drop(&mut self) {
        let _ = self.0.kill();
    }
}

/// Start the indexer binary against `rpc_url` with every program configured.
pub async fn setup_server(
    rpc_url: &str,
    extra_env: &[(&str, &str)],
) -> anyhow::Result<(String, ChildGuard)> {
    let bin = env!("CARGO_BIN_EXE_indexer-service");
    assert!(Path::new(bin).exists(), "binary not found at {}", bin);

    let port = find_free_port();
    let base_url = format!("http://127.0.0.1:{}", port);

    let mut cmd = Command::new(bin);
    cmd.env("RPC_ENDPOINT", rpc_url)
        .env("FUNDING_HUB_PROGRAM_ID", PROJECT_PROGRAM)
        .env("DAO_PASS_PROGRAM_ID", DAO_PROGRAM)
        .env("GOVERNANCE_PROGRAM_ID", GOVERNANCE_PROGRAM)
        .env("SAVINGS_VAULT_PROGRAM_ID", VAULT_PROGRAM)
        .env("PORT", port.to_string())
        .env("RUST_LOG", "info")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in extra_env {
        cmd.env(key, value);
    }

    // Ensure we always try to kill the child on exit
    let guard = ChildGuard(cmd.spawn()?);

    wait_ready(&base_url, 10_000).await?;

    Ok((base_url, guard))
}

/// Little-endian account buffer starting with an 8-byte discriminator
pub struct AccountBytes(Vec<u8>);

impl AccountBytes {
    pub fn new() -> Self {
        Self(vec![0xaa; 8])
    }

    pub fn u8(mut self, v: u8) -> Self {
        self.0.push(v);
        self
    }

    pub fn u16(mut self, v: u16) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u32(mut self, v: u32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u64(mut self, v: u64) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i64(mut self, v: i64) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn key(mut self, fill: u8) -> Self {
        self.0.extend_from_slice(&[fill; 32]);
        self
    }

    pub fn pad_to(mut self, len: usize) -> Vec<u8> {
        self.0.resize(len, 0);
        self.0
    }
}

/// Base58 rendering of a key filled with `fill`
pub fn key_b58(fill: u8) -> String {
    bs58::encode([fill; 32]).into_string()
}

/// getProgramAccounts response body for `(pubkey, data)` pairs
pub fn rpc_result(accounts: &[(&str, Vec<u8>)]) -> Value {
    let result: Vec<Value> = accounts
        .iter()
        .map(|(pubkey, data)| {
            json!({
                "pubkey": pubkey,
                "account": {
                    "data": [STANDARD.encode(data), "base64"],
                    "executable": false,
                    "lamports": 2_039_280,
                    "owner": "11111111111111111111111111111111",
                    "rentEpoch": 0
                }
            })
        })
        .collect();
    json!({ "jsonrpc": "2.0", "id": "getProgramAccounts", "result": result })
}
