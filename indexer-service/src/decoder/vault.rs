//! Savings vault accounts

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use super::{AccountLayout, RawAccount, RecordKind};
use crate::reader::{AccountCursor, ReadError};

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultSummary {
    pub vault: String,
    pub authority: String,
    pub deposit_mint: String,
    pub reward_mint: String,
    pub vault_token_account: String,
    pub reward_vault: String,
    pub term_slots: u64,
    pub apy_bps: u16,
    #[serde_as(as = "DisplayFromStr")]
    pub total_deposited: u64,
}

impl AccountLayout for VaultSummary {
    const KIND: RecordKind = RecordKind::Vault;
    // discriminator + authority + vault id + 4 keys + term + apy + deposited
    const MIN_LEN: usize = 8 + 32 + 8 + 4 * 32 + 8 + 2 + 8;
    // + bump + 5 reserved
    const ACCOUNT_LEN: u64 = 200;

    fn decode_unchecked(account: &RawAccount) -> Result<Self, ReadError> {
        let mut cursor = AccountCursor::new(&account.data);
        let authority = cursor.key()?.to_base58();
        cursor.skip(8)?;
        Ok(VaultSummary {
            vault: account.pubkey.clone(),
            authority,
            deposit_mint: cursor.key()?.to_base58(),
            reward_mint: cursor.key()?.to_base58(),
            vault_token_account: cursor.key()?.to_base58(),
            reward_vault: cursor.key()?.to_base58(),
            term_slots: cursor.u64()?,
            apy_bps: cursor.u16()?,
            total_deposited: cursor.u64()?,
        })
    }
}
