use chrono::{DateTime, Utc};
use data_encoding::BASE64;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::election::{CandidateIndex, ElectionId, VoteRecord};
use super::identity::Identity;

type HmacSha256 = Hmac<Sha256>;

/// Proof handed to a voter that the ledger accepted their vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub election_id: ElectionId,
    pub voter: Identity,
    pub candidate: CandidateIndex,
    /// Position of the vote in the election's audit log.
    pub seq: u64,
    pub cast_at: DateTime<Utc>,
    /// Base64 HMAC-SHA256 over the fields above.
    pub signature: String,
}

impl Receipt {
    /// Sign a committed vote.
    pub fn sign(record: VoteRecord, secret: &[u8]) -> Self {
        let mut receipt = Self {
            election_id: record.election_id,
            voter: record.voter,
            candidate: record.candidate,
            seq: record.seq,
            cast_at: record.cast_at,
            signature: String::new(),
        };
        receipt.signature = BASE64.encode(&receipt.mac(secret).finalize().into_bytes());
        receipt
    }

    /// Does the signature match the receipt's contents?
    pub fn verify(&self, secret: &[u8]) -> bool {
        match BASE64.decode(self.signature.as_bytes()) {
            Ok(signature) => self.mac(secret).verify_slice(&signature).is_ok(),
            Err(_) => false,
        }
    }

    fn mac(&self, secret: &[u8]) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
        mac.update(&self.election_id.to_le_bytes());
        mac.update(&(self.voter.as_str().len() as u64).to_le_bytes());
        mac.update(self.voter.as_str().as_bytes());
        mac.update(&(self.candidate as u64).to_le_bytes());
        mac.update(&self.seq.to_le_bytes());
        mac.update(&self.cast_at.timestamp().to_le_bytes());
        mac.update(&self.cast_at.timestamp_subsec_nanos().to_le_bytes());
        mac
    }
}
