//! Governance proposal accounts

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use super::{AccountLayout, RawAccount, RecordKind};
use crate::reader::{AccountCursor, ReadError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    Pending,
    Succeeded,
    Defeated,
}

impl From<u8> for ProposalStatus {
    /// Unknown codes fall back to `Pending`
    fn from(code: u8) -> Self {
        match code {
            1 => ProposalStatus::Succeeded,
            2 => ProposalStatus::Defeated,
            _ => ProposalStatus::Pending,
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalSummary {
    pub proposal: String,
    pub realm: String,
    pub proposer: String,
    pub metadata: String,
    #[serde_as(as = "DisplayFromStr")]
    pub proposal_id: u64,
    pub voting_start_slot: u64,
    pub voting_end_slot: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub yes_votes: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub no_votes: u64,
    pub status: ProposalStatus,
}

impl AccountLayout for ProposalSummary {
    const KIND: RecordKind = RecordKind::Proposal;
    const MIN_LEN: usize = 8 + 3 * 32 + 5 * 8 + 1;
    // + bump + 6 reserved
    const ACCOUNT_LEN: u64 = 152;

    fn decode_unchecked(account: &RawAccount) -> Result<Self, ReadError> {
        let mut cursor = AccountCursor::new(&account.data);
        Ok(ProposalSummary {
            proposal: account.pubkey.clone(),
            realm: cursor.key()?.to_base58(),
            proposer: cursor.key()?.to_base58(),
            metadata: cursor.key()?.to_base58(),
            proposal_id: cursor.u64()?,
            voting_start_slot: cursor.u64()?,
            voting_end_slot: cursor.u64()?,
            yes_votes: cursor.u64()?,
            no_votes: cursor.u64()?,
            status: cursor.u8()?.into(),
        })
    }
}
