//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};

use crate::ip::IpNetworkExt;

// Action taken by a rule entry whose match conditions are satisfied.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Permit,
    Deny,
}

// Range of IP prefixes: a covering network plus the accepted prefix lengths.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct IpPrefixRange {
    pub prefix: IpNetwork,
    pub masklen_lower: u8,
    pub masklen_upper: u8,
}

// ===== impl Action =====

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Permit => write!(f, "permit"),
            Action::Deny => write!(f, "deny"),
        }
    }
}

// ===== impl IpPrefixRange =====

impl IpPrefixRange {
    // Builds the range covered by `prefix` with optional `ge`/`le` bounds.
    //
    // A missing lower bound defaults to the prefix's own length and a missing
    // upper bound to the address family's maximum length.
    pub fn new(prefix: IpNetwork, ge: Option<u8>, le: Option<u8>) -> Self {
        let prefix = prefix.apply_mask();
        let masklen_lower = ge.unwrap_or(prefix.prefix());
        let masklen_upper =
            le.unwrap_or(prefix.address_family().max_prefixlen());

        IpPrefixRange {
            prefix,
            masklen_lower,
            masklen_upper,
        }
    }

    // Returns whether the given prefix falls within this range.
    pub fn contains(&self, prefix: &IpNetwork) -> bool {
        let len = prefix.prefix();
        self.prefix.covers(prefix)
            && len >= self.masklen_lower
            && len <= self.masklen_upper
    }
}

// ===== unit tests =====
