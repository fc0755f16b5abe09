use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a string does not name a known enum variant.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Platform role attached to every user account.
///
/// Voting is gated on this: a `Competitor` may never cast a vote, not even
/// in categories they do not compete in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Spectator,
    Competitor,
    Promoter,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Spectator => "spectator",
            Role::Competitor => "competitor",
            Role::Promoter => "promoter",
            Role::Admin => "admin",
        }
    }

    /// Whether this role is allowed to cast votes.
    pub fn may_vote(&self) -> bool {
        !matches!(self, Role::Competitor)
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spectator" => Ok(Role::Spectator),
            "competitor" => Ok(Role::Competitor),
            "promoter" => Ok(Role::Promoter),
            "admin" => Ok(Role::Admin),
            other => Err(ParseEnumError {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of engagement interaction on a post.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EngagementKind {
    Like,
    Comment,
    Share,
}

impl EngagementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementKind::Like => "like",
            EngagementKind::Comment => "comment",
            EngagementKind::Share => "share",
        }
    }
}

impl FromStr for EngagementKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(EngagementKind::Like),
            "comment" => Ok(EngagementKind::Comment),
            "share" => Ok(EngagementKind::Share),
            other => Err(ParseEnumError {
                kind: "engagement kind",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for EngagementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Feed ordering mode.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Total engagement (likes + comments + shares) descending.
    #[default]
    Trending,
    /// Creation time descending.
    Latest,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Trending => "trending",
            SortBy::Latest => "latest",
        }
    }
}

impl FromStr for SortBy {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trending" => Ok(SortBy::Trending),
            "latest" => Ok(SortBy::Latest),
            other => Err(ParseEnumError {
                kind: "sort mode",
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trip() {
        for role in [Role::Spectator, Role::Competitor, Role::Promoter, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn competitor_may_not_vote() {
        assert!(!Role::Competitor.may_vote());
        assert!(Role::Spectator.may_vote());
        assert!(Role::Promoter.may_vote());
        assert!(Role::Admin.may_vote());
    }

    #[test]
    fn unknown_role_rejected() {
        let err = "judge".parse::<Role>().unwrap_err();
        assert_eq!(err.value, "judge");
    }

    #[test]
    fn serde_forms_are_lowercase() {
        assert_eq!(serde_json::to_string(&EngagementKind::Like).unwrap(), "\"like\"");
        assert_eq!(serde_json::to_string(&SortBy::Trending).unwrap(), "\"trending\"");
        let kind: EngagementKind = serde_json::from_str("\"share\"").unwrap();
        assert_eq!(kind, EngagementKind::Share);
    }
}
