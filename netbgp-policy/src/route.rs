//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;
use std::net::IpAddr;

use derive_new::new;
use ipnetwork::IpNetwork;
use netbgp_utils::bgp::{Comm, Origin};
use netbgp_utils::ip::{AddressFamily, IpNetworkExt};
use netbgp_utils::value::Mapping;
use serde::{Deserialize, Serialize};

// Attribute bag of a candidate route, containing only the information
// relevant for the evaluation of rule chains.
#[derive(Clone, Debug, PartialEq, new)]
#[derive(Deserialize, Serialize)]
pub struct Route {
    pub prefix: IpNetwork,
    // AS path, leftmost ASN first.
    #[new(default)]
    #[serde(default)]
    pub as_path: Vec<u32>,
    #[new(default)]
    #[serde(default)]
    pub communities: BTreeSet<Comm>,
    #[new(default)]
    #[serde(default)]
    pub next_hop: Option<IpAddr>,
    #[new(default)]
    #[serde(default)]
    pub local_pref: Option<u32>,
    #[new(default)]
    #[serde(default)]
    pub med: Option<u32>,
    #[new(default)]
    #[serde(default)]
    pub origin: Option<Origin>,
    // Free-form attributes addressed by name.
    #[new(default)]
    #[serde(default)]
    pub attrs: Mapping,
}

// ===== impl Route =====

impl Route {
    pub fn address_family(&self) -> AddressFamily {
        self.prefix.address_family()
    }

    // Prepends the given ASNs, leftmost first, to the AS path.
    pub fn as_path_prepend(&mut self, asns: &[u32]) {
        self.as_path.splice(0..0, asns.iter().copied());
    }
}
