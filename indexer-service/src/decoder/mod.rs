//! Typed decoding of raw program accounts

pub mod dao;
pub mod project;
pub mod proposal;
pub mod vault;

use std::fmt;

use tracing::{debug, warn};

use crate::metrics;
use crate::reader::ReadError;

pub use dao::DaoSummary;
pub use project::{ProjectStatus, ProjectSummary};
pub use proposal::{ProposalStatus, ProposalSummary};
pub use vault::VaultSummary;

/// One program account as returned by the RPC endpoint, data already base64-decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAccount {
    pub pubkey: String,
    pub lamports: u64,
    pub data: Vec<u8>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum RecordKind {
    Project,
    Dao,
    Proposal,
    Vault,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Project,
        RecordKind::Dao,
        RecordKind::Proposal,
        RecordKind::Vault,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Project => "project",
            RecordKind::Dao => "dao",
            RecordKind::Proposal => "proposal",
            RecordKind::Vault => "vault",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why one account was left out of a decoded batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeSkip {
    TooShort { len: usize, min: usize },
    Read(ReadError),
}

impl fmt::Display for DecodeSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeSkip::TooShort { len, min } => {
                write!(f, "buffer of {} bytes is shorter than layout minimum {}", len, min)
            }
            DecodeSkip::Read(e) => write!(f, "{}", e),
        }
    }
}

impl From<ReadError> for DecodeSkip {
    fn from(e: ReadError) -> Self {
        DecodeSkip::Read(e)
    }
}

/// A fixed binary layout that maps one raw account onto a summary record
pub trait AccountLayout: Sized {
    const KIND: RecordKind;

    /// Discriminator plus every decoded field
    const MIN_LEN: usize;

    /// Full on-chain size, used as the default `dataSize` filter
    const ACCOUNT_LEN: u64;

    /// Decode a buffer already known to be at least `MIN_LEN` bytes
    fn decode_unchecked(account: &RawAccount) -> Result<Self, ReadError>;

    fn decode(account: &RawAccount) -> Result<Self, DecodeSkip> {
        if account.data.len() < Self::MIN_LEN {
            return Err(DecodeSkip::TooShort {
                len: account.data.len(),
                min: Self::MIN_LEN,
            });
        }
        Ok(Self::decode_unchecked(account)?)
    }
}

/// Decode every account of one kind, dropping the ones that don't fit the layout.
///
/// Output order follows input order.
pub fn decode_batch<T: AccountLayout>(accounts: &[RawAccount]) -> Vec<T> {
    let decoded: Vec<T> = accounts
        .iter()
        .filter_map(|account| match T::decode(account) {
            Ok(record) => Some(record),
            Err(skip) => {
                warn!(
                    "Skipping {} account {}: {}",
                    T::KIND,
                    account.pubkey,
                    skip
                );
                metrics::record_decode_skip(T::KIND);
                None
            }
        })
        .collect();

    debug!(
        "Decoded {} of {} {} accounts",
        decoded.len(),
        accounts.len(),
        T::KIND
    );
    decoded
}
