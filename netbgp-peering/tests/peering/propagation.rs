//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use netbgp_peering::error::{PropagationError, StoreError};
use netbgp_peering::propagation::{
    CredentialPropagation, NoOpReason, PropagationOutcome, SessionWriter,
};
use netbgp_peering::records::{
    Password, PasswordId, PeerGroup, PeerGroupId, Session, SessionId,
};
use netbgp_peering::store::{MemoryStore, RecordStore, Records, Transaction};

use super::{session, store};

// Store whose transactions reject every session write after the first one.
struct FlakyStore(MemoryStore);

struct FlakyTxn<'a> {
    inner: <MemoryStore as RecordStore>::Txn<'a>,
    session_writes: usize,
}

impl RecordStore for FlakyStore {
    type Txn<'a> = FlakyTxn<'a>;

    fn begin(&self) -> Result<FlakyTxn<'_>, StoreError> {
        let inner = self.0.begin()?;
        Ok(FlakyTxn {
            inner,
            session_writes: 0,
        })
    }
}

impl Records for FlakyTxn<'_> {
    fn session(&self, id: SessionId) -> Option<Session> {
        self.inner.session(id)
    }

    fn peer_group(&self, id: PeerGroupId) -> Option<PeerGroup> {
        self.inner.peer_group(id)
    }

    fn password(&self, id: PasswordId) -> Option<Password> {
        self.inner.password(id)
    }
}

impl Transaction for FlakyTxn<'_> {
    fn save_session(&mut self, session: Session) -> Result<(), StoreError> {
        self.session_writes += 1;
        if self.session_writes > 1 {
            return Err(StoreError::WriteRejected("disk full".to_owned()));
        }
        self.inner.save_session(session)
    }

    fn save_peer_group(
        &mut self,
        peer_group: PeerGroup,
    ) -> Result<(), StoreError> {
        self.inner.save_peer_group(peer_group)
    }

    fn save_password(&mut self, password: Password) -> Result<(), StoreError> {
        self.inner.save_password(password)
    }

    fn delete_password(&mut self, id: PasswordId) -> Result<(), StoreError> {
        self.inner.delete_password(id)
    }

    fn commit(self) -> Result<(), StoreError> {
        self.inner.commit()
    }
}

#[test]
fn inherit_peer_group_password() {
    let writer = SessionWriter::new(store());
    let writes = writer.store().session_writes();

    let report = writer.save(session(1, Some(10), None));
    assert_eq!(report.trigger, Ok(()));
    assert_eq!(
        report.propagation,
        Some(Ok(PropagationOutcome::Propagated { password: 2 }))
    );
    assert!(report.committed());

    let stored = writer.store().session(1).unwrap();
    assert_eq!(stored.password, Some(2));
    assert_eq!(writer.store().password(2).unwrap().value, "P1");
    // The triggering write plus exactly one corrective write.
    assert_eq!(writer.store().session_writes(), writes + 2);
    assert!(stored.last_updated.is_some());
}

#[test]
fn own_password_kept() {
    let writer = SessionWriter::new(store());
    let writes = writer.store().session_writes();

    let report = writer.save(session(1, Some(10), Some(1)));
    assert_eq!(
        report.propagation,
        Some(Ok(PropagationOutcome::NoOp(NoOpReason::PasswordSet)))
    );
    assert!(report.committed());

    assert_eq!(writer.store().session(1).unwrap().password, Some(1));
    assert_eq!(writer.store().session_writes(), writes + 1);
}

#[test]
fn no_op_conditions() {
    let writer = SessionWriter::new(store());

    for (session, reason) in [
        (session(1, None, None), NoOpReason::NoPeerGroup),
        (session(2, Some(11), None), NoOpReason::PeerGroupWithoutPassword),
        (session(3, Some(12), None), NoOpReason::PeerGroupWithoutPassword),
    ] {
        let id = session.id;
        let writes = writer.store().session_writes();

        let report = writer.save(session);
        assert_eq!(
            report.propagation,
            Some(Ok(PropagationOutcome::NoOp(reason)))
        );
        assert!(report.committed());
        assert_eq!(writer.store().session(id).unwrap().password, None);
        assert_eq!(writer.store().session_writes(), writes + 1);
    }
}

#[test]
fn update_after_password_removed() {
    let writer = SessionWriter::new(store());
    assert!(writer.save(session(1, None, Some(1))).committed());

    // Clearing the password of a grouped session makes it inherit again.
    let report = writer.save(session(1, Some(10), None));
    assert_eq!(
        report.propagation,
        Some(Ok(PropagationOutcome::Propagated { password: 2 }))
    );
    assert_eq!(writer.store().session(1).unwrap().password, Some(2));
}

#[test]
fn failed_trigger_skips_propagation() {
    let writer = SessionWriter::new(store());

    let report = writer.save(session(1, Some(99), None));
    assert_eq!(report.trigger, Err(StoreError::UnknownPeerGroup(99)));
    assert_eq!(report.propagation, None);
    assert_eq!(report.commit, Err(StoreError::RolledBack));
    assert!(writer.store().session(1).is_none());
}

#[test]
fn failed_corrective_write_rolls_back() {
    let writer = SessionWriter::new(FlakyStore(store()));
    let writes = writer.store().0.session_writes();

    let report = writer.save(session(1, Some(10), None));
    assert_eq!(report.trigger, Ok(()));
    assert_eq!(
        report.propagation,
        Some(Err(PropagationError::CorrectiveWrite(
            1,
            StoreError::WriteRejected("disk full".to_owned())
        )))
    );
    assert_eq!(report.commit, Err(StoreError::RolledBack));

    // Neither write is visible.
    assert!(writer.store().0.session(1).is_none());
    assert_eq!(writer.store().0.session_writes(), writes);
}

#[test]
fn suppression_guard() {
    let store = store();
    let propagation = CredentialPropagation::default();
    let mut txn = store.begin().unwrap();
    txn.save_session(session(1, Some(10), None)).unwrap();

    {
        let _guard = propagation.suppress();
        assert!(propagation.is_suppressed());
        let outcome = propagation.on_session_write(&mut txn, 1, |_, _| {
            panic!("corrective write while suppressed")
        });
        assert_eq!(
            outcome,
            Ok(PropagationOutcome::NoOp(NoOpReason::Suppressed))
        );
    }
    assert!(!propagation.is_suppressed());

    // The corrective write runs exactly once, with propagation disabled.
    let mut calls = 0;
    let outcome =
        propagation.on_session_write(&mut txn, 1, |txn, session| {
            calls += 1;
            assert!(propagation.is_suppressed());
            assert_eq!(session.password, Some(2));
            txn.save_session(session)
        });
    assert_eq!(outcome, Ok(PropagationOutcome::Propagated { password: 2 }));
    assert_eq!(calls, 1);
    assert!(!propagation.is_suppressed());
    assert_eq!(txn.session(1).unwrap().password, Some(2));
}

#[test]
fn session_not_found() {
    let store = store();
    let propagation = CredentialPropagation::default();
    let mut txn = store.begin().unwrap();

    let outcome = propagation.on_session_write(&mut txn, 42, |_, _| Ok(()));
    assert_eq!(outcome, Err(PropagationError::SessionNotFound(42)));
}
