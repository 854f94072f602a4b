//! Environment-driven service configuration

use std::time::Duration;

use crate::decoder::{AccountLayout, DaoSummary, ProjectSummary, ProposalSummary, VaultSummary};
use crate::error::IndexerError;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_FRESHNESS_SECS: u64 = 60;
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SNAPSHOT_TTL_SECS: u64 = 60;

/// Program whose accounts feed one record kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramTarget {
    pub program_id: String,
    /// Exact account size filter; `None` fetches every account of the program
    pub data_size: Option<u64>,
}

impl ProgramTarget {
    pub fn new(program_id: impl Into<String>, data_size: Option<u64>) -> Self {
        Self {
            program_id: program_id.into(),
            data_size,
        }
    }
}

/// Programs to index. Only the project program is mandatory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramSet {
    pub project: ProgramTarget,
    pub dao: Option<ProgramTarget>,
    pub proposal: Option<ProgramTarget>,
    pub vault: Option<ProgramTarget>,
}

impl ProgramSet {
    /// Project program only, with the default size filter
    pub fn projects_only(program_id: impl Into<String>) -> Self {
        Self {
            project: ProgramTarget::new(program_id, Some(ProjectSummary::ACCOUNT_LEN)),
            dao: None,
            proposal: None,
            vault: None,
        }
    }
}

/// What a refresh does when one record kind can't be fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPolicy {
    /// Fail the whole build and keep serving the previous snapshot
    #[default]
    FailFast,
    /// Reuse the failing kind's records from the previous snapshot
    KeepLastKnown,
}

#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub rpc_endpoint: String,
    pub programs: ProgramSet,
    pub port: u16,
    pub refresh_interval: Duration,
    pub freshness: Duration,
    pub rpc_timeout: Duration,
    pub policy: RefreshPolicy,
    pub snapshot_db_path: Option<String>,
    pub snapshot_ttl: Duration,
    pub metrics_token: Option<String>,
}

impl IndexerConfig {
    pub fn from_env() -> Result<Self, IndexerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IndexerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let parse = |key: &str, default: u64| get(key).and_then(|v| v.parse().ok()).unwrap_or(default);
        // 0 disables the filter
        let data_size = |key: &str, default: u64| Some(parse(key, default)).filter(|n| *n > 0);

        let rpc_endpoint = get("RPC_ENDPOINT")
            .ok_or_else(|| IndexerError::Configuration("RPC_ENDPOINT is required".into()))?;
        let project_program = get("FUNDING_HUB_PROGRAM_ID").ok_or_else(|| {
            IndexerError::Configuration("FUNDING_HUB_PROGRAM_ID is required".into())
        })?;

        let programs = ProgramSet {
            project: ProgramTarget::new(
                project_program,
                data_size("PROJECT_DATA_SIZE", ProjectSummary::ACCOUNT_LEN),
            ),
            dao: get("DAO_PASS_PROGRAM_ID").map(|id| {
                ProgramTarget::new(id, data_size("DAO_DATA_SIZE", DaoSummary::ACCOUNT_LEN))
            }),
            proposal: get("GOVERNANCE_PROGRAM_ID").map(|id| {
                ProgramTarget::new(
                    id,
                    data_size("PROPOSAL_DATA_SIZE", ProposalSummary::ACCOUNT_LEN),
                )
            }),
            vault: get("SAVINGS_VAULT_PROGRAM_ID").map(|id| {
                ProgramTarget::new(id, data_size("VAULT_DATA_SIZE", VaultSummary::ACCOUNT_LEN))
            }),
        };

        let policy = match get("PARTIAL_REFRESH").as_deref() {
            Some("1") | Some("true") | Some("yes") => RefreshPolicy::KeepLastKnown,
            _ => RefreshPolicy::FailFast,
        };

        Ok(Self {
            rpc_endpoint,
            programs,
            port: get("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            refresh_interval: Duration::from_secs(
                parse("REFRESH_INTERVAL_SECS", DEFAULT_REFRESH_INTERVAL_SECS).max(1),
            ),
            freshness: Duration::from_secs(parse("FRESHNESS_SECS", DEFAULT_FRESHNESS_SECS)),
            rpc_timeout: Duration::from_secs(
                parse("RPC_TIMEOUT_SECS", DEFAULT_RPC_TIMEOUT_SECS).max(1),
            ),
            policy,
            snapshot_db_path: get("SNAPSHOT_DB_PATH"),
            snapshot_ttl: Duration::from_secs(parse("SNAPSHOT_TTL_SECS", DEFAULT_SNAPSHOT_TTL_SECS)),
            metrics_token: get("METRICS_AUTH_TOKEN"),
        })
    }
}
