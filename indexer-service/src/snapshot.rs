//! Snapshot assembly: fetch every record kind, decode, aggregate

use chrono::{DateTime, Utc};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use tracing::{info, warn};

use crate::config::{ProgramSet, ProgramTarget, RefreshPolicy};
use crate::decoder::{
    decode_batch, AccountLayout, DaoSummary, ProjectSummary, ProposalSummary, RecordKind,
    VaultSummary,
};
use crate::error::IndexerError;
use crate::rpc::RpcClient;

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformMetrics {
    pub total_projects: usize,
    pub total_daos: usize,
    pub total_vaults: usize,
    /// Exact sum of every project's pledged amount
    #[serde_as(as = "DisplayFromStr")]
    pub total_pledged: BigUint,
}

impl PlatformMetrics {
    pub fn compute(projects: &[ProjectSummary], daos: &[DaoSummary], vaults: &[VaultSummary]) -> Self {
        let total_pledged = projects
            .iter()
            .fold(BigUint::default(), |acc, p| acc + p.pledged);
        Self {
            total_projects: projects.len(),
            total_daos: daos.len(),
            total_vaults: vaults.len(),
            total_pledged,
        }
    }
}

/// One immutable, fully assembled view of the indexed programs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub projects: Vec<ProjectSummary>,
    pub daos: Vec<DaoSummary>,
    pub proposals: Vec<ProposalSummary>,
    pub vaults: Vec<VaultSummary>,
    pub metrics: PlatformMetrics,
    pub generated_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn assemble(
        projects: Vec<ProjectSummary>,
        daos: Vec<DaoSummary>,
        proposals: Vec<ProposalSummary>,
        vaults: Vec<VaultSummary>,
    ) -> Self {
        let metrics = PlatformMetrics::compute(&projects, &daos, &vaults);
        Snapshot {
            projects,
            daos,
            proposals,
            vaults,
            metrics,
            generated_at: Utc::now(),
        }
    }
}

pub struct SnapshotBuilder {
    rpc: RpcClient,
    programs: ProgramSet,
    policy: RefreshPolicy,
}

impl SnapshotBuilder {
    pub fn new(rpc: RpcClient, programs: ProgramSet, policy: RefreshPolicy) -> Self {
        Self {
            rpc,
            programs,
            policy,
        }
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    /// Build a new snapshot.
    ///
    /// `previous` is only consulted under [`RefreshPolicy::KeepLastKnown`].
    pub async fn build(&self, previous: Option<&Snapshot>) -> Result<Snapshot, IndexerError> {
        let (projects, daos, proposals, vaults) = tokio::join!(
            self.fetch_kind::<ProjectSummary>(Some(&self.programs.project)),
            self.fetch_kind::<DaoSummary>(self.programs.dao.as_ref()),
            self.fetch_kind::<ProposalSummary>(self.programs.proposal.as_ref()),
            self.fetch_kind::<VaultSummary>(self.programs.vault.as_ref()),
        );

        let snapshot = Snapshot::assemble(
            self.settle(projects, previous.map(|s| &s.projects))?,
            self.settle(daos, previous.map(|s| &s.daos))?,
            self.settle(proposals, previous.map(|s| &s.proposals))?,
            self.settle(vaults, previous.map(|s| &s.vaults))?,
        );

        info!(
            "Built snapshot: {} projects, {} daos, {} proposals, {} vaults, total pledged {}",
            snapshot.projects.len(),
            snapshot.daos.len(),
            snapshot.proposals.len(),
            snapshot.vaults.len(),
            snapshot.metrics.total_pledged
        );
        Ok(snapshot)
    }

    async fn fetch_kind<T: AccountLayout>(
        &self,
        target: Option<&ProgramTarget>,
    ) -> Result<Vec<T>, (RecordKind, IndexerError)> {
        let Some(target) = target else {
            return Ok(Vec::new());
        };
        let accounts = self
            .rpc
            .get_program_accounts(&target.program_id, target.data_size)
            .await
            .map_err(|e| (T::KIND, e))?;
        Ok(decode_batch(&accounts))
    }

    fn settle<T: Clone>(
        &self,
        fetched: Result<Vec<T>, (RecordKind, IndexerError)>,
        last_known: Option<&Vec<T>>,
    ) -> Result<Vec<T>, IndexerError> {
        match (fetched, self.policy, last_known) {
            (Ok(records), _, _) => Ok(records),
            (Err((kind, e)), RefreshPolicy::KeepLastKnown, Some(last)) => {
                warn!(
                    "Fetching {} accounts failed ({}); keeping {} records from the previous snapshot",
                    kind,
                    e,
                    last.len()
                );
                Ok(last.clone())
            }
            (Err((kind, e)), _, _) => {
                warn!("Fetching {} accounts failed: {}", kind, e);
                Err(e)
            }
        }
    }
}
