//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::{debug, debug_span};

use crate::propagation::NoOpReason;
use crate::records::{PasswordId, PeerGroupId, SessionId};

// Credential propagation debug messages.
#[derive(Debug)]
pub enum Debug {
    SessionWrite(SessionId),
    PropagationSuppressed(SessionId),
    PropagationNoOp(SessionId, NoOpReason),
    PasswordInherited(SessionId, PeerGroupId, PasswordId),
    TxnCommit(SessionId),
    TxnRollback(SessionId),
}

// ===== impl Debug =====

impl Debug {
    // Log debug message using the tracing API.
    pub(crate) fn log(&self) {
        match self {
            Debug::SessionWrite(id)
            | Debug::PropagationSuppressed(id)
            | Debug::TxnCommit(id)
            | Debug::TxnRollback(id) => {
                debug_span!("session", %id).in_scope(|| {
                    debug!("{}", self);
                });
            }
            Debug::PropagationNoOp(id, reason) => {
                debug_span!("session", %id).in_scope(|| {
                    debug!(%reason, "{}", self);
                });
            }
            Debug::PasswordInherited(id, peer_group, password) => {
                debug_span!("session", %id).in_scope(|| {
                    debug!(%peer_group, %password, "{}", self);
                });
            }
        }
    }
}

impl std::fmt::Display for Debug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::SessionWrite(..) => {
                write!(f, "session written")
            }
            Debug::PropagationSuppressed(..) => {
                write!(f, "propagation suppressed")
            }
            Debug::PropagationNoOp(..) => {
                write!(f, "nothing to propagate")
            }
            Debug::PasswordInherited(..) => {
                write!(f, "password inherited from peer group")
            }
            Debug::TxnCommit(..) => {
                write!(f, "transaction committed")
            }
            Debug::TxnRollback(..) => {
                write!(f, "transaction rolled back")
            }
        }
    }
}
