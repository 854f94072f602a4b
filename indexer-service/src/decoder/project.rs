//! Funding-hub project accounts

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use super::{AccountLayout, RawAccount, RecordKind};
use crate::reader::{AccountCursor, ReadError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStatus {
    Active,
    Successful,
    Failed,
}

impl From<u8> for ProjectStatus {
    /// Unknown codes fall back to `Active`
    fn from(code: u8) -> Self {
        match code {
            1 => ProjectStatus::Successful,
            2 => ProjectStatus::Failed,
            _ => ProjectStatus::Active,
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    #[serde_as(as = "DisplayFromStr")]
    pub project_id: u64,
    pub authority: String,
    pub mint: String,
    pub badge_mint: String,
    pub vault: String,
    #[serde_as(as = "DisplayFromStr")]
    pub target_amount: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub pledged: u64,
    pub deadline_ts: i64,
    pub status: ProjectStatus,
}

impl AccountLayout for ProjectSummary {
    const KIND: RecordKind = RecordKind::Project;
    // discriminator + id + id seed + 4 keys + target + deadline + pledged + status
    const MIN_LEN: usize = 8 + 8 + 8 + 4 * 32 + 8 + 8 + 8 + 1;
    // + bump + 6 reserved
    const ACCOUNT_LEN: u64 = 184;

    fn decode_unchecked(account: &RawAccount) -> Result<Self, ReadError> {
        let mut cursor = AccountCursor::new(&account.data);
        let project_id = cursor.u64()?;
        cursor.skip(8)?;
        Ok(ProjectSummary {
            project_id,
            authority: cursor.key()?.to_base58(),
            mint: cursor.key()?.to_base58(),
            badge_mint: cursor.key()?.to_base58(),
            vault: cursor.key()?.to_base58(),
            target_amount: cursor.u64()?,
            deadline_ts: cursor.i64()?,
            pledged: cursor.u64()?,
            status: cursor.u8()?.into(),
        })
    }
}
