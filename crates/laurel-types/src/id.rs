use crate::leaderboard::RewardKind;
use blake3::Hasher;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque user identity as handed out by the external directory.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LeaderboardId(String);

impl LeaderboardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for LeaderboardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LeaderboardId({})", self.0)
    }
}

impl fmt::Display for LeaderboardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LeaderboardId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Stable reward identity.
///
/// The same leaderboard, kind and rank must resolve to the same identity on
/// every call and in every session, so grants and revokes made by
/// independently running sessions converge on one reward record.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RewardId([u8; 32]);

impl RewardId {
    pub fn derive(leaderboard: &LeaderboardId, kind: RewardKind, rank: u8) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(b"laurel:reward");
        hasher.update(leaderboard.as_str().as_bytes());
        hasher.update(kind.as_str().as_bytes());
        hasher.update(&[rank]);
        Self(hasher.finalize().into())
    }

    /// Stable identity for an externally referenced inventory item, so item
    /// payouts converge the same way cosmetic grants do.
    pub fn for_item_ref(item: &str) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(b"laurel:item-ref");
        hasher.update(item.as_bytes());
        Self(hasher.finalize().into())
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for RewardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RewardId({}...)", &self.to_hex()[..8])
    }
}

impl fmt::Display for RewardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Idempotence-ledger key for an exactly-once payout event.
///
/// Day-granular for podium payouts, epoch-granular for group goals; a new
/// period deliberately derives a fresh key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClaimKey([u8; 32]);

impl ClaimKey {
    pub fn derive(
        leaderboard: &LeaderboardId,
        rank: u8,
        kind: RewardKind,
        amount: &str,
        period: &str,
    ) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(b"laurel:claim");
        hasher.update(leaderboard.as_str().as_bytes());
        hasher.update(&[rank]);
        hasher.update(kind.as_str().as_bytes());
        hasher.update(amount.as_bytes());
        hasher.update(period.as_bytes());
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ClaimKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClaimKey({}...)", &self.to_hex()[..8])
    }
}

impl fmt::Display for ClaimKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reward_id_determinism() {
        let board = LeaderboardId::new("weekly-quantity");
        let id1 = RewardId::derive(&board, RewardKind::Title, 1);
        let id2 = RewardId::derive(&board, RewardKind::Title, 1);
        assert_eq!(id1, id2);

        let hex = id1.to_hex();
        let id3 = RewardId::from_hex(&hex).unwrap();
        assert_eq!(id1, id3);
    }

    #[test]
    fn test_reward_id_distinct_per_rank_and_kind() {
        let board = LeaderboardId::new("weekly-quantity");
        let rank1 = RewardId::derive(&board, RewardKind::Title, 1);
        let rank2 = RewardId::derive(&board, RewardKind::Title, 2);
        let effect = RewardId::derive(&board, RewardKind::NameEffect, 1);
        assert_ne!(rank1, rank2);
        assert_ne!(rank1, effect);
    }

    #[test]
    fn test_claim_key_period_scoping() {
        let board = LeaderboardId::new("weekly-quantity");
        let monday = ClaimKey::derive(&board, 1, RewardKind::Podium, "50", "2026-08-03");
        let same = ClaimKey::derive(&board, 1, RewardKind::Podium, "50", "2026-08-03");
        let tuesday = ClaimKey::derive(&board, 1, RewardKind::Podium, "50", "2026-08-04");
        assert_eq!(monday, same);
        assert_ne!(monday, tuesday);
    }
}
