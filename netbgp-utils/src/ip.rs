//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::IpAddr;

use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};

// Address family of a route, prefix list or session endpoint.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

// Extension methods for IpAddr.
pub trait IpAddrExt {
    fn address_family(&self) -> AddressFamily;
}

// Extension methods for IpNetwork.
pub trait IpNetworkExt {
    fn address_family(&self) -> AddressFamily;

    // Returns the network with its host bits cleared.
    #[must_use]
    fn apply_mask(&self) -> IpNetwork;

    // Returns true if `other` lies within this network, ignoring host bits.
    fn covers(&self, other: &IpNetwork) -> bool;
}

// ===== impl AddressFamily =====

impl AddressFamily {
    pub const fn max_prefixlen(&self) -> u8 {
        match self {
            AddressFamily::Ipv4 => 32,
            AddressFamily::Ipv6 => 128,
        }
    }
}

impl std::fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressFamily::Ipv4 => write!(f, "IPv4"),
            AddressFamily::Ipv6 => write!(f, "IPv6"),
        }
    }
}

// ===== impl IpAddr =====

impl IpAddrExt for IpAddr {
    fn address_family(&self) -> AddressFamily {
        match self {
            IpAddr::V4(_) => AddressFamily::Ipv4,
            IpAddr::V6(_) => AddressFamily::Ipv6,
        }
    }
}

// ===== impl IpNetwork =====

impl IpNetworkExt for IpNetwork {
    fn address_family(&self) -> AddressFamily {
        self.ip().address_family()
    }

    fn apply_mask(&self) -> IpNetwork {
        // The prefix length comes from a valid network.
        IpNetwork::new(self.network(), self.prefix()).unwrap_or(*self)
    }

    fn covers(&self, other: &IpNetwork) -> bool {
        self.address_family() == other.address_family()
            && self.prefix() <= other.prefix()
            && self.contains(other.network())
    }
}

// ===== unit tests =====
