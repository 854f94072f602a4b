//! DAO pass accounts

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use super::{AccountLayout, RawAccount, RecordKind};
use crate::reader::{AccountCursor, ReadError};

/// Relay spend figures are reported as observed; `relay_spent <= max_relay_spend`
/// is the relayer's policy and is not checked here.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaoSummary {
    pub dao: String,
    pub authority: String,
    pub pass_mint: String,
    pub sponsor_mint: String,
    pub sponsor_vault: String,
    #[serde_as(as = "DisplayFromStr")]
    pub max_relay_spend: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub relay_spent: u64,
    pub total_members: u32,
}

impl AccountLayout for DaoSummary {
    const KIND: RecordKind = RecordKind::Dao;
    // discriminator + 4 keys + max spend + spent + relay epoch + members
    const MIN_LEN: usize = 8 + 4 * 32 + 8 + 8 + 8 + 4;
    // + bump + name seed + 7 reserved
    const ACCOUNT_LEN: u64 = 180;

    fn decode_unchecked(account: &RawAccount) -> Result<Self, ReadError> {
        let mut cursor = AccountCursor::new(&account.data);
        let authority = cursor.key()?.to_base58();
        let pass_mint = cursor.key()?.to_base58();
        let sponsor_mint = cursor.key()?.to_base58();
        let sponsor_vault = cursor.key()?.to_base58();
        let max_relay_spend = cursor.u64()?;
        let relay_spent = cursor.u64()?;
        cursor.skip(8)?;
        Ok(DaoSummary {
            dao: account.pubkey.clone(),
            authority,
            pass_mint,
            sponsor_mint,
            sponsor_vault,
            max_relay_spend,
            relay_spent,
            total_members: cursor.u32()?,
        })
    }
}
