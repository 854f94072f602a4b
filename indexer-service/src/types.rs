//! Types for HTTP responses

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::decoder::{DaoSummary, ProjectSummary, ProposalSummary, VaultSummary};
use crate::snapshot::PlatformMetrics;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ProjectsView<'a> {
    pub projects: &'a [ProjectSummary],
    pub metrics: &'a PlatformMetrics,
}

#[derive(Debug, Serialize)]
pub struct DaosView<'a> {
    pub daos: &'a [DaoSummary],
}

#[derive(Debug, Serialize)]
pub struct ProposalsView<'a> {
    pub proposals: &'a [ProposalSummary],
}

#[derive(Debug, Serialize)]
pub struct VaultsView<'a> {
    pub vaults: &'a [VaultSummary],
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
