//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use crate::error::StoreError;
use crate::records::{
    Password, PasswordId, PeerGroup, PeerGroupId, Session, SessionId,
};

// Read access to the records of the host store.
pub trait Records {
    fn session(&self, id: SessionId) -> Option<Session>;

    fn peer_group(&self, id: PeerGroupId) -> Option<PeerGroup>;

    fn password(&self, id: PasswordId) -> Option<Password>;
}

// Unit of work against the host store. Dropping a transaction without
// committing it discards every write it staged.
pub trait Transaction: Records {
    fn save_session(&mut self, session: Session) -> Result<(), StoreError>;

    fn save_peer_group(
        &mut self,
        peer_group: PeerGroup,
    ) -> Result<(), StoreError>;

    fn save_password(&mut self, password: Password) -> Result<(), StoreError>;

    fn delete_password(&mut self, id: PasswordId) -> Result<(), StoreError>;

    fn commit(self) -> Result<(), StoreError>;
}

// Host record store.
pub trait RecordStore {
    type Txn<'a>: Transaction
    where
        Self: 'a;

    fn begin(&self) -> Result<Self::Txn<'_>, StoreError>;
}

// In-memory record store.
//
// A transaction holds the store lock from `begin` until it's committed or
// dropped, so writes are serialized and readers never see staged records.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Clone, Debug, Default)]
struct Tables {
    sessions: BTreeMap<SessionId, Session>,
    peer_groups: BTreeMap<PeerGroupId, PeerGroup>,
    passwords: BTreeMap<PasswordId, Password>,
    // Number of session writes committed so far.
    session_writes: u64,
}

pub struct MemoryTxn<'a> {
    tables: MutexGuard<'a, Tables>,
    staged: Tables,
}

// ===== impl MemoryStore =====

impl MemoryStore {
    // Returns the committed state of a session.
    pub fn session(&self, id: SessionId) -> Option<Session> {
        self.lock().sessions.get(&id).cloned()
    }

    pub fn peer_group(&self, id: PeerGroupId) -> Option<PeerGroup> {
        self.lock().peer_groups.get(&id).cloned()
    }

    pub fn password(&self, id: PasswordId) -> Option<Password> {
        self.lock().passwords.get(&id).cloned()
    }

    // Returns the number of committed session writes.
    pub fn session_writes(&self) -> u64 {
        self.lock().session_writes
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RecordStore for MemoryStore {
    type Txn<'a> = MemoryTxn<'a>;

    fn begin(&self) -> Result<MemoryTxn<'_>, StoreError> {
        let tables = self.lock();
        let staged = tables.clone();
        Ok(MemoryTxn { tables, staged })
    }
}

// ===== impl MemoryTxn =====

impl Records for MemoryTxn<'_> {
    fn session(&self, id: SessionId) -> Option<Session> {
        self.staged.sessions.get(&id).cloned()
    }

    fn peer_group(&self, id: PeerGroupId) -> Option<PeerGroup> {
        self.staged.peer_groups.get(&id).cloned()
    }

    fn password(&self, id: PasswordId) -> Option<Password> {
        self.staged.passwords.get(&id).cloned()
    }
}

impl Transaction for MemoryTxn<'_> {
    fn save_session(&mut self, mut session: Session) -> Result<(), StoreError> {
        session.validate()?;
        if let Some(id) = session.peer_group
            && !self.staged.peer_groups.contains_key(&id)
        {
            return Err(StoreError::UnknownPeerGroup(id));
        }
        if let Some(id) = session.password
            && !self.staged.passwords.contains_key(&id)
        {
            return Err(StoreError::UnknownPassword(id));
        }

        session.last_updated = Some(Utc::now());
        self.staged.sessions.insert(session.id, session);
        self.staged.session_writes += 1;
        Ok(())
    }

    fn save_peer_group(
        &mut self,
        peer_group: PeerGroup,
    ) -> Result<(), StoreError> {
        if let Some(id) = peer_group.password
            && !self.staged.passwords.contains_key(&id)
        {
            return Err(StoreError::UnknownPassword(id));
        }

        self.staged.peer_groups.insert(peer_group.id, peer_group);
        Ok(())
    }

    fn save_password(&mut self, password: Password) -> Result<(), StoreError> {
        self.staged.passwords.insert(password.id, password);
        Ok(())
    }

    fn delete_password(&mut self, id: PasswordId) -> Result<(), StoreError> {
        let in_use = self
            .staged
            .sessions
            .values()
            .any(|session| session.password == Some(id))
            || self
                .staged
                .peer_groups
                .values()
                .any(|peer_group| peer_group.password == Some(id));
        if in_use {
            return Err(StoreError::PasswordInUse(id));
        }

        self.staged
            .passwords
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::UnknownPassword(id))
    }

    fn commit(mut self) -> Result<(), StoreError> {
        *self.tables = std::mem::take(&mut self.staged);
        Ok(())
    }
}

// ===== unit tests =====
