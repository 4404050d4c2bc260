//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![warn(rust_2018_idioms)]

pub mod debug;
pub mod error;
pub mod propagation;
pub mod records;
pub mod store;

pub use crate::propagation::{
    CredentialPropagation, SessionWriter, WriteReport,
};
pub use crate::store::{MemoryStore, RecordStore, Records, Transaction};
