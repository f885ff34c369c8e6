//! Deterministic conversation identifiers.
//!
//! A conversation between two users is keyed by both user IDs sorted
//! ascending and joined with `_`, so either participant computes the same
//! key without a lookup.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::UserId;

const SEPARATOR: char = '_';

/// Errors building or parsing a [`ConversationId`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationError {
    /// Both sides of the conversation are the same user.
    #[error("cannot start a conversation with yourself")]
    SameParticipant,

    /// The string is not `<lower>_<higher>`.
    #[error("malformed conversation id: {0}")]
    Malformed(String),
}

/// Key of a two-party conversation, e.g. `"12_40"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConversationId {
    low: UserId,
    high: UserId,
}

impl ConversationId {
    /// Build the conversation key for two users.
    ///
    /// `between(a, b) == between(b, a)` for all `a != b`.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::SameParticipant`] when `a == b`.
    pub fn between(a: UserId, b: UserId) -> Result<Self, ConversationError> {
        if a == b {
            return Err(ConversationError::SameParticipant);
        }
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        Ok(Self { low, high })
    }

    /// Parse a key previously produced by [`ConversationId::between`].
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::Malformed`] unless the input is two
    /// distinct integers in ascending order separated by `_`.
    pub fn parse(s: &str) -> Result<Self, ConversationError> {
        let malformed = || ConversationError::Malformed(s.to_owned());

        let (low, high) = s.split_once(SEPARATOR).ok_or_else(malformed)?;
        let low: UserId = low.parse().map_err(|_| malformed())?;
        let high: UserId = high.parse().map_err(|_| malformed())?;

        if low >= high {
            return Err(malformed());
        }
        Ok(Self { low, high })
    }

    /// Both participants, lower ID first.
    #[must_use]
    pub const fn participants(&self) -> (UserId, UserId) {
        (self.low, self.high)
    }

    /// Whether `user` is one of the two participants.
    #[must_use]
    pub fn includes(&self, user: UserId) -> bool {
        self.low == user || self.high == user
    }

    /// The participant who is not `user`, if `user` takes part at all.
    #[must_use]
    pub fn other_participant(&self, user: UserId) -> Option<UserId> {
        if user == self.low {
            Some(self.high)
        } else if user == self.high {
            Some(self.low)
        } else {
            None
        }
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.low, self.high)
    }
}

impl std::str::FromStr for ConversationId {
    type Err = ConversationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ConversationId {
    type Error = ConversationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ConversationId> for String {
    fn from(id: ConversationId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn uid(n: i32) -> UserId {
        UserId::new(n)
    }

    #[test]
    fn test_between_is_symmetric() {
        let ab = ConversationId::between(uid(40), uid(12)).unwrap();
        let ba = ConversationId::between(uid(12), uid(40)).unwrap();
        assert_eq!(ab, ba);
        assert_eq!(ab.to_string(), "12_40");
    }

    #[test]
    fn test_sorts_numerically_not_lexically() {
        let id = ConversationId::between(uid(9), uid(10)).unwrap();
        assert_eq!(id.to_string(), "9_10");
    }

    #[test]
    fn test_rejects_self_conversation() {
        assert_eq!(
            ConversationId::between(uid(3), uid(3)),
            Err(ConversationError::SameParticipant)
        );
    }

    #[test]
    fn test_parse_roundtrip() {
        let id = ConversationId::between(uid(5), uid(77)).unwrap();
        assert_eq!(ConversationId::parse(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn test_parse_rejects_non_canonical() {
        for bad in ["40_12", "7_7", "12-40", "12_", "_40", "a_b", "1_2_3", ""] {
            assert!(
                matches!(ConversationId::parse(bad), Err(ConversationError::Malformed(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_other_participant() {
        let id = ConversationId::between(uid(1), uid(2)).unwrap();
        assert_eq!(id.other_participant(uid(1)), Some(uid(2)));
        assert_eq!(id.other_participant(uid(2)), Some(uid(1)));
        assert_eq!(id.other_participant(uid(3)), None);
        assert!(id.includes(uid(2)));
        assert!(!id.includes(uid(3)));
    }

    #[test]
    fn test_serde_as_string() {
        let id = ConversationId::between(uid(2), uid(1)).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"1_2\"");
        let back: ConversationId = serde_json::from_str("\"1_2\"").unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<ConversationId>("\"2_1\"").is_err());
    }
}
