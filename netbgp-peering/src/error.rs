//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use netbgp_utils::ip::AddressFamily;
use tracing::{warn, warn_span};

use crate::records::{PasswordId, PeerGroupId, SessionId};

// Record validation errors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RecordError {
    EmptyName,
    NameTooLong(usize),
    AddressFamilyMismatch(AddressFamily, AddressFamily),
    PasswordMismatch,
}

// Record store errors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StoreError {
    InvalidRecord(RecordError),
    UnknownPeerGroup(PeerGroupId),
    UnknownPassword(PasswordId),
    PasswordInUse(PasswordId),
    // The host rejected the write.
    WriteRejected(String),
    // The transaction was discarded without committing.
    RolledBack,
}

// Credential propagation errors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PropagationError {
    SessionNotFound(SessionId),
    PeerGroupNotFound(PeerGroupId),
    CorrectiveWrite(SessionId, StoreError),
}

// ===== impl RecordError =====

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordError::EmptyName => {
                write!(f, "name must not be empty")
            }
            RecordError::NameTooLong(len) => {
                write!(f, "name is too long ({len} characters)")
            }
            RecordError::AddressFamilyMismatch(local, remote) => {
                write!(
                    f,
                    "local address is {local} but remote address is {remote}"
                )
            }
            RecordError::PasswordMismatch => {
                write!(f, "passwords do not match")
            }
        }
    }
}

impl std::error::Error for RecordError {}

// ===== impl StoreError =====

impl StoreError {
    pub fn log(&self) {
        match self {
            StoreError::InvalidRecord(error) => {
                warn!(%error, "{}", self);
            }
            StoreError::UnknownPeerGroup(id) => {
                warn!(peer_group = %id, "{}", self);
            }
            StoreError::UnknownPassword(id) | StoreError::PasswordInUse(id) => {
                warn!(password = %id, "{}", self);
            }
            StoreError::WriteRejected(reason) => {
                warn!(%reason, "{}", self);
            }
            StoreError::RolledBack => {
                warn!("{}", self);
            }
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::InvalidRecord(..) => {
                write!(f, "invalid record")
            }
            StoreError::UnknownPeerGroup(..) => {
                write!(f, "peer group does not exist")
            }
            StoreError::UnknownPassword(..) => {
                write!(f, "password does not exist")
            }
            StoreError::PasswordInUse(..) => {
                write!(f, "password is still referenced")
            }
            StoreError::WriteRejected(..) => {
                write!(f, "write rejected by the record store")
            }
            StoreError::RolledBack => {
                write!(f, "transaction rolled back")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::InvalidRecord(error) => Some(error),
            _ => None,
        }
    }
}

impl From<RecordError> for StoreError {
    fn from(error: RecordError) -> StoreError {
        StoreError::InvalidRecord(error)
    }
}

// ===== impl PropagationError =====

impl PropagationError {
    pub fn log(&self) {
        match self {
            PropagationError::SessionNotFound(id) => {
                warn!(session = %id, "{}", self);
            }
            PropagationError::PeerGroupNotFound(id) => {
                warn!(peer_group = %id, "{}", self);
            }
            PropagationError::CorrectiveWrite(id, error) => {
                warn_span!("session", %id).in_scope(|| {
                    warn!(%error, "{}", self);
                });
            }
        }
    }
}

impl std::fmt::Display for PropagationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropagationError::SessionNotFound(..) => {
                write!(f, "session not found after write")
            }
            PropagationError::PeerGroupNotFound(..) => {
                write!(f, "peer group not found")
            }
            PropagationError::CorrectiveWrite(..) => {
                write!(f, "failed to persist inherited password")
            }
        }
    }
}

impl std::error::Error for PropagationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PropagationError::CorrectiveWrite(_, error) => Some(error),
            _ => None,
        }
    }
}
