//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

mod chain;
mod prefix_list;
mod validation;

use std::net::IpAddr;
use std::sync::Arc;

use ipnetwork::IpNetwork;
use netbgp_policy::catalog::Catalog;
use netbgp_policy::chain::{PrefixList, RoutingPolicy};
use netbgp_policy::rule::{PolicyRule, PrefixListRule};
use netbgp_utils::bgp::Community;
use netbgp_utils::ip::AddressFamily;
use netbgp_utils::policy::Action;

//
// Helper functions.
//

fn net(s: &str) -> IpNetwork {
    s.parse().unwrap()
}

fn addr(s: &str) -> IpAddr {
    s.parse().unwrap()
}

// Builds a record set holding two communities, two network prefixes and one
// prefix list per address family.
//
// PL-V4:
//   5 deny   10.1.0.0/16 le 32
//  10 permit prefix 1 (10.0.0.0/8) le 24
//
// PL-V6:
//  10 permit prefix 2 (2001:db8::/32) ge 48 le 64
fn catalog() -> Catalog {
    let mut catalog = Catalog::default();
    catalog
        .insert_community(Community::new(1, "65000:100"))
        .unwrap();
    catalog
        .insert_community(Community::new(2, "65000:200"))
        .unwrap();
    catalog.insert_prefix(1, net("10.0.0.0/8"));
    catalog.insert_prefix(2, net("2001:db8::/32"));

    let plist = PrefixList::new("PL-V4", AddressFamily::Ipv4);
    plist
        .add_rule(PrefixListRule {
            le: Some(32),
            ..PrefixListRule::with_custom(5, Action::Deny, net("10.1.0.0/16"))
        })
        .unwrap();
    plist
        .add_rule(PrefixListRule {
            le: Some(24),
            ..PrefixListRule::with_prefix(10, Action::Permit, 1)
        })
        .unwrap();
    catalog.insert_prefix_list(plist).unwrap();

    let plist = PrefixList::new("PL-V6", AddressFamily::Ipv6);
    plist
        .add_rule(PrefixListRule {
            ge: Some(48),
            le: Some(64),
            ..PrefixListRule::with_prefix(10, Action::Permit, 2)
        })
        .unwrap();
    catalog.insert_prefix_list(plist).unwrap();

    catalog
}

// Registers a routing policy built from the given rules.
fn add_policy(
    catalog: &mut Catalog,
    name: &str,
    rules: Vec<PolicyRule>,
) -> Arc<RoutingPolicy> {
    let policy = catalog
        .insert_routing_policy(RoutingPolicy::new(name))
        .unwrap();
    for rule in rules {
        policy.add_rule(rule).unwrap();
    }
    policy
}
