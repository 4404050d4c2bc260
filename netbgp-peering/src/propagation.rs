//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::sync::atomic::{self, AtomicBool};
use std::sync::{Mutex, PoisonError};

use crate::debug::Debug;
use crate::error::{PropagationError, StoreError};
use crate::records::{PasswordId, Session, SessionId};
use crate::store::{RecordStore, Transaction};

// Copies a peer group's password into member sessions that have none.
#[derive(Debug, Default)]
pub struct CredentialPropagation {
    // Set for the duration of a corrective write.
    suppressed: AtomicBool,
}

// Re-enables propagation when dropped.
#[derive(Debug)]
pub struct SuppressGuard<'a> {
    propagation: &'a CredentialPropagation,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PropagationOutcome {
    // The session now references the peer group's password.
    Propagated { password: PasswordId },
    NoOp(NoOpReason),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NoOpReason {
    // The write was itself a corrective write.
    Suppressed,
    PasswordSet,
    NoPeerGroup,
    PeerGroupWithoutPassword,
}

// Persists sessions, running credential propagation within the same
// transaction as the triggering write.
#[derive(Debug)]
pub struct SessionWriter<S> {
    store: S,
    propagation: CredentialPropagation,
    // Serializes session writes.
    writer: Mutex<()>,
}

// Outcome of `SessionWriter::save`, reporting the triggering write and the
// corrective write separately.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WriteReport {
    pub trigger: Result<(), StoreError>,
    // `None` when propagation didn't run.
    pub propagation: Option<Result<PropagationOutcome, PropagationError>>,
    pub commit: Result<(), StoreError>,
}

// ===== impl CredentialPropagation =====

impl CredentialPropagation {
    // Handles a persisted session write.
    //
    // The session is re-read from `txn`. When it has no password but its peer
    // group has a non-empty one, the password is copied over and `persist` is
    // invoked once, with propagation suppressed.
    pub fn on_session_write<T, F>(
        &self,
        txn: &mut T,
        id: SessionId,
        persist: F,
    ) -> Result<PropagationOutcome, PropagationError>
    where
        T: Transaction + ?Sized,
        F: FnOnce(&mut T, Session) -> Result<(), StoreError>,
    {
        if self.is_suppressed() {
            Debug::PropagationSuppressed(id).log();
            return Ok(PropagationOutcome::NoOp(NoOpReason::Suppressed));
        }

        let mut session = txn
            .session(id)
            .ok_or(PropagationError::SessionNotFound(id))?;
        if session.password.is_some() {
            return Ok(PropagationOutcome::NoOp(NoOpReason::PasswordSet));
        }
        let Some(pg_id) = session.peer_group else {
            return Ok(PropagationOutcome::NoOp(NoOpReason::NoPeerGroup));
        };
        let peer_group = txn
            .peer_group(pg_id)
            .ok_or(PropagationError::PeerGroupNotFound(pg_id))?;
        let Some(password) = peer_group.password.filter(|id| {
            txn.password(*id)
                .is_some_and(|password| !password.is_empty())
        }) else {
            return Ok(PropagationOutcome::NoOp(
                NoOpReason::PeerGroupWithoutPassword,
            ));
        };

        session.password = Some(password);
        session.validate().map_err(|error| {
            PropagationError::CorrectiveWrite(id, error.into())
        })?;
        {
            let _guard = self.suppress();
            persist(txn, session)
                .map_err(|error| PropagationError::CorrectiveWrite(id, error))?;
        }

        Debug::PasswordInherited(id, pg_id, password).log();
        Ok(PropagationOutcome::Propagated { password })
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed.load(atomic::Ordering::Acquire)
    }

    // Disables propagation until the returned guard is dropped.
    pub fn suppress(&self) -> SuppressGuard<'_> {
        self.suppressed.store(true, atomic::Ordering::Release);
        SuppressGuard { propagation: self }
    }
}

// ===== impl SuppressGuard =====

impl Drop for SuppressGuard<'_> {
    fn drop(&mut self) {
        self.propagation
            .suppressed
            .store(false, atomic::Ordering::Release);
    }
}

// ===== impl NoOpReason =====

impl std::fmt::Display for NoOpReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoOpReason::Suppressed => write!(f, "corrective write"),
            NoOpReason::PasswordSet => write!(f, "password already set"),
            NoOpReason::NoPeerGroup => write!(f, "no peer group"),
            NoOpReason::PeerGroupWithoutPassword => {
                write!(f, "peer group has no password")
            }
        }
    }
}

// ===== impl SessionWriter =====

impl<S: RecordStore> SessionWriter<S> {
    pub fn new(store: S) -> SessionWriter<S> {
        SessionWriter {
            store,
            propagation: Default::default(),
            writer: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // Persists a session (created or updated) and propagates the peer group
    // password to it. Both writes commit together or not at all.
    pub fn save(&self, session: Session) -> WriteReport {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let id = session.id;

        let mut txn = match self.store.begin() {
            Ok(txn) => txn,
            Err(error) => {
                return WriteReport {
                    trigger: Err(error),
                    propagation: None,
                    commit: Err(StoreError::RolledBack),
                };
            }
        };

        let (trigger, propagation) = self.write(&mut txn, session);
        let commit = match (&trigger, &propagation) {
            (Ok(()), None | Some(Ok(_))) => txn.commit(),
            _ => {
                // Dropping the transaction discards both writes.
                drop(txn);
                Err(StoreError::RolledBack)
            }
        };

        match &commit {
            Ok(()) => Debug::TxnCommit(id).log(),
            Err(_) => Debug::TxnRollback(id).log(),
        }
        WriteReport {
            trigger,
            propagation,
            commit,
        }
    }

    // Writes the session and, unless suppressed, runs propagation.
    fn write<'a>(
        &self,
        txn: &mut S::Txn<'a>,
        session: Session,
    ) -> (
        Result<(), StoreError>,
        Option<Result<PropagationOutcome, PropagationError>>,
    )
    where
        S: 'a,
    {
        let id = session.id;
        if let Err(error) = txn.save_session(session) {
            error.log();
            return (Err(error), None);
        }
        Debug::SessionWrite(id).log();

        // The nested trigger of the corrective write observes the
        // suppression flag and returns right away.
        let outcome =
            self.propagation.on_session_write(txn, id, |txn, session| {
                self.write(txn, session).0
            });
        match &outcome {
            Ok(PropagationOutcome::NoOp(reason)) => {
                if *reason != NoOpReason::Suppressed {
                    Debug::PropagationNoOp(id, *reason).log();
                }
            }
            Ok(PropagationOutcome::Propagated { .. }) => (),
            Err(error) => error.log(),
        }

        (Ok(()), Some(outcome))
    }
}

impl WriteReport {
    // Returns whether the triggering write was committed.
    pub fn committed(&self) -> bool {
        self.commit.is_ok()
    }
}
