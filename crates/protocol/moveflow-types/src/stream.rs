//! Normalized stream summaries.
//!
//! These are the output shapes of the aggregation pipeline. They are computed
//! fresh per request and never persisted.

use serde::{Deserialize, Serialize};

use crate::error::TypesError;
use crate::token::TokenInfo;

/// Lifecycle state of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StreamStatus {
    NotStarted,
    Active,
    Paused,
    Closed,
    Completed,
}

impl StreamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Closed => "closed",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which party may perform a privileged stream action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Permission {
    None = 0,
    Sender = 1,
    Recipient = 2,
    Both = 3,
}

impl Permission {
    /// On-chain encoding used by the stream module.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Decode the on-chain encoding.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Sender),
            2 => Some(Self::Recipient),
            3 => Some(Self::Both),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Sender => "sender",
            Self::Recipient => "recipient",
            Self::Both => "both",
        }
    }
}

impl std::str::FromStr for Permission {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "sender" => Ok(Self::Sender),
            "recipient" => Ok(Self::Recipient),
            "both" => Ok(Self::Both),
            other => Err(TypesError::InvalidPermission(other.to_string())),
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stream permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub pauseable: Permission,
    pub closeable: Permission,
    pub recipient_modifiable: Permission,
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            pauseable: Permission::Sender,
            closeable: Permission::Sender,
            recipient_modifiable: Permission::None,
        }
    }
}

/// Formatted amounts. A field is absent when it could not be derived.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamAmounts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub withdrawn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining: Option<String>,
}

/// Formatted timestamps. Zero or unresolved values are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamTimes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
}

/// Upstream shape a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    Sdk,
    View,
    Event,
    Transaction,
}

impl RecordSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sdk => "sdk",
            Self::View => "view",
            Self::Event => "event",
            Self::Transaction => "transaction",
        }
    }
}

/// Direction of an account's stream listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamDirection {
    Incoming,
    Outgoing,
}

impl StreamDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incoming => "incoming",
            Self::Outgoing => "outgoing",
        }
    }
}

/// One stream summary as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedStream {
    pub stream_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    pub amounts: StreamAmounts,
    pub token: TokenInfo,
    pub times: StreamTimes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StreamStatus>,
    pub permissions: Permissions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    pub source: RecordSource,
}
