//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use derive_new::new;
use netbgp_utils::ip::IpAddrExt;
use serde::{Deserialize, Serialize};

use crate::error::RecordError;

// Type aliases.
pub type SessionId = u32;
pub type PeerGroupId = u32;
pub type PasswordId = u32;

pub const SESSION_NAME_MAX_LEN: usize = 64;

// BGP session.
#[derive(Clone, Debug, Eq, PartialEq, new)]
#[derive(Deserialize, Serialize)]
pub struct Session {
    pub id: SessionId,
    pub name: String,
    #[new(default)]
    #[serde(default)]
    pub status: SessionStatus,
    #[new(default)]
    #[serde(default)]
    pub device: Option<String>,
    #[new(default)]
    #[serde(default)]
    pub vrf: Option<String>,
    #[new(default)]
    #[serde(default)]
    pub local_address: Option<IpAddr>,
    #[new(default)]
    #[serde(default)]
    pub local_as: Option<u32>,
    #[new(default)]
    #[serde(default)]
    pub remote_address: Option<IpAddr>,
    #[new(default)]
    #[serde(default)]
    pub remote_as: Option<u32>,
    // Template the session inherits its configuration from.
    #[new(default)]
    #[serde(default)]
    pub peer_group: Option<PeerGroupId>,
    #[new(default)]
    #[serde(default)]
    pub password: Option<PasswordId>,
    // Routing policies, by name, applied in order.
    #[new(default)]
    #[serde(default)]
    pub import_policies: Vec<String>,
    #[new(default)]
    #[serde(default)]
    pub export_policies: Vec<String>,
    #[new(default)]
    #[serde(default)]
    pub description: String,
    // Set by the record store on every write.
    #[new(default)]
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Offline,
    #[default]
    Active,
    Planned,
    Failed,
}

// Shared configuration template applied to multiple sessions.
#[derive(Clone, Debug, Eq, PartialEq, new)]
#[derive(Deserialize, Serialize)]
pub struct PeerGroup {
    pub id: PeerGroupId,
    pub name: String,
    #[new(default)]
    #[serde(default)]
    pub description: String,
    #[new(default)]
    #[serde(default)]
    pub import_policies: Vec<String>,
    #[new(default)]
    #[serde(default)]
    pub export_policies: Vec<String>,
    #[new(default)]
    #[serde(default)]
    pub password: Option<PasswordId>,
}

// Shared credential record.
#[derive(Clone, Eq, PartialEq, new)]
#[derive(Deserialize, Serialize)]
pub struct Password {
    pub id: PasswordId,
    pub value: String,
}

// ===== impl Session =====

impl Session {
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.name.is_empty() {
            return Err(RecordError::EmptyName);
        }
        let len = self.name.chars().count();
        if len > SESSION_NAME_MAX_LEN {
            return Err(RecordError::NameTooLong(len));
        }
        if let (Some(local), Some(remote)) =
            (self.local_address, self.remote_address)
            && local.address_family() != remote.address_family()
        {
            return Err(RecordError::AddressFamilyMismatch(
                local.address_family(),
                remote.address_family(),
            ));
        }

        Ok(())
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Offline => write!(f, "offline"),
            SessionStatus::Active => write!(f, "active"),
            SessionStatus::Planned => write!(f, "planned"),
            SessionStatus::Failed => write!(f, "failed"),
        }
    }
}

// ===== impl Password =====

impl Password {
    // Creates a password record from a value entered twice.
    pub fn new_confirmed(
        id: PasswordId,
        value: impl Into<String>,
        confirm: &str,
    ) -> Result<Password, RecordError> {
        let value = value.into();
        if value != confirm {
            return Err(RecordError::PasswordMismatch);
        }

        Ok(Password { id, value })
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

// The secret is kept out of debug output.
impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("id", &self.id)
            .field("value", &"<redacted>")
            .finish()
    }
}

// ===== unit tests =====
