//! Pithos Common - Shared types, errors, and utilities
//!
//! This crate provides the foundational types used across all Pithos components:
//! - Error types
//! - The delegation kind shared by storage and the voting core
//! - Mention parsing and message chunking helpers
//! - Common constants

pub mod error;
pub mod utils;

// Re-exports for convenience
pub use error::{PithosError, user_facing};
pub use utils::{DISCORD_MESSAGE_LIMIT, mention, parse_user_ref, split_message};

use serde::{Deserialize, Serialize};

/// Default prefix that marks a chat message as a bot command
pub const DEFAULT_COMMAND_PREFIX: &str = "!";

/// Default number of delegation hops followed before a vote is dropped
pub const DEFAULT_MAX_DELEGATION_DEPTH: usize = 10;

/// How a member's voting weight follows their delegate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelegationType {
    /// Follow the delegate's effective choice, including their own delegation
    #[default]
    Transitive,
    /// Follow only the delegate's direct vote
    Fixed,
}

impl DelegationType {
    pub fn as_str(self) -> &'static str {
        match self {
            DelegationType::Transitive => "transitive",
            DelegationType::Fixed => "fixed",
        }
    }

    /// Numeric code used in storage
    pub fn code(self) -> i32 {
        match self {
            DelegationType::Transitive => 0,
            DelegationType::Fixed => 1,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(DelegationType::Transitive),
            1 => Some(DelegationType::Fixed),
            _ => None,
        }
    }
}

impl std::fmt::Display for DelegationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DelegationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "transitive" => Ok(DelegationType::Transitive),
            "fixed" => Ok(DelegationType::Fixed),
            _ => Err(format!("Invalid delegation type: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delegation_type() {
        assert_eq!(DelegationType::default(), DelegationType::Transitive);
        assert_eq!(DelegationType::Fixed.as_str(), "fixed");
        assert_eq!(
            "Transitive".parse::<DelegationType>().unwrap(),
            DelegationType::Transitive
        );
        assert!("sideways".parse::<DelegationType>().is_err());
    }

    #[test]
    fn test_delegation_type_codes() {
        for kind in [DelegationType::Transitive, DelegationType::Fixed] {
            assert_eq!(DelegationType::from_code(kind.code()), Some(kind));
        }
        assert_eq!(DelegationType::from_code(7), None);
    }

    #[test]
    fn test_delegation_type_serde() {
        assert_eq!(
            serde_json::to_string(&DelegationType::Fixed).unwrap(),
            "\"fixed\""
        );
        let kind: DelegationType = serde_json::from_str("\"transitive\"").unwrap();
        assert_eq!(kind, DelegationType::Transitive);
    }
}
