//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use netbgp_policy::catalog::Lookup;
use netbgp_policy::chain::PrefixList;
use netbgp_policy::error::EvalError;
use netbgp_policy::eval::{self, EvalConfig};
use netbgp_policy::rule::PrefixListRule;
use netbgp_utils::ip::AddressFamily;
use netbgp_utils::policy::Action;

use super::{catalog, net};

#[test]
fn first_match_wins() {
    let catalog = catalog();
    assert!(catalog.finalize_all().is_empty());
    let plist = catalog.prefix_list("PL-V4").unwrap();

    // Covered by the earlier deny entry.
    assert_eq!(
        eval::prefix_list_lookup(plist, &net("10.1.2.0/24"), &catalog),
        Ok(Some((5, Action::Deny)))
    );
    assert_eq!(
        eval::prefix_list_lookup(plist, &net("10.1.0.0/16"), &catalog),
        Ok(Some((5, Action::Deny)))
    );
    // Falls through to the permit entry.
    assert_eq!(
        eval::prefix_list_lookup(plist, &net("10.2.0.0/16"), &catalog),
        Ok(Some((10, Action::Permit)))
    );
    assert_eq!(
        eval::prefix_list_lookup(plist, &net("10.0.0.0/8"), &catalog),
        Ok(Some((10, Action::Permit)))
    );
}

#[test]
fn length_range_limits() {
    let catalog = catalog();
    assert!(catalog.finalize_all().is_empty());
    let plist = catalog.prefix_list("PL-V4").unwrap();

    // Longer than "le 24".
    assert_eq!(
        eval::prefix_list_lookup(plist, &net("10.2.3.0/25"), &catalog),
        Ok(None)
    );
    // Outside of the network range.
    assert_eq!(
        eval::prefix_list_lookup(plist, &net("192.168.0.0/16"), &catalog),
        Ok(None)
    );
    // Shorter than the entry's own length.
    assert_eq!(
        eval::prefix_list_lookup(plist, &net("0.0.0.0/0"), &catalog),
        Ok(None)
    );

    let plist = catalog.prefix_list("PL-V6").unwrap();
    assert_eq!(
        eval::prefix_list_lookup(plist, &net("2001:db8:1::/48"), &catalog),
        Ok(Some((10, Action::Permit)))
    );
    assert_eq!(
        eval::prefix_list_lookup(plist, &net("2001:db8::/32"), &catalog),
        Ok(None)
    );
    assert_eq!(
        eval::prefix_list_lookup(plist, &net("2001:db8:1:2::/80"), &catalog),
        Ok(None)
    );
}

#[test]
fn exact_match_without_bounds() {
    let catalog = catalog();
    let plist = PrefixList::new("EXACT", AddressFamily::Ipv4);
    plist
        .add_rule(PrefixListRule::with_custom(
            10,
            Action::Permit,
            net("172.16.0.0/12"),
        ))
        .unwrap();
    plist.finalize(&catalog).unwrap();

    // Without bounds the entry covers its own length up to the family
    // maximum.
    for prefix in ["172.16.0.0/12", "172.20.0.0/16", "172.31.255.255/32"] {
        assert_eq!(
            eval::prefix_list_lookup(&plist, &net(prefix), &catalog),
            Ok(Some((10, Action::Permit)))
        );
    }
    assert_eq!(
        eval::prefix_list_lookup(&plist, &net("172.0.0.0/8"), &catalog),
        Ok(None)
    );
}

#[test]
fn default_policy() {
    let catalog = catalog();
    let mut plist = PrefixList::new("DFLT", AddressFamily::Ipv4);
    plist
        .add_rule(PrefixListRule::with_custom(
            10,
            Action::Permit,
            net("10.0.0.0/8"),
        ))
        .unwrap();
    plist.finalize(&catalog).unwrap();

    let config = EvalConfig::default();
    assert_eq!(
        eval::evaluate_prefix_list(
            &plist,
            &net("10.0.0.0/8"),
            &catalog,
            &config,
        ),
        Ok(Action::Permit)
    );
    assert_eq!(
        eval::evaluate_prefix_list(
            &plist,
            &net("11.0.0.0/8"),
            &catalog,
            &config,
        ),
        Err(EvalError::NoMatchingRule("DFLT".to_owned()))
    );

    let config = EvalConfig {
        default_action: Some(Action::Deny),
        ..Default::default()
    };
    assert_eq!(
        eval::evaluate_prefix_list(
            &plist,
            &net("11.0.0.0/8"),
            &catalog,
            &config,
        ),
        Ok(Action::Deny)
    );

    // The chain's own default takes precedence.
    plist.default_action = Some(Action::Permit);
    assert_eq!(
        eval::evaluate_prefix_list(
            &plist,
            &net("11.0.0.0/8"),
            &catalog,
            &config,
        ),
        Ok(Action::Permit)
    );
}

#[test]
fn not_finalized() {
    let catalog = catalog();
    let plist = catalog.prefix_list("PL-V4").unwrap();

    assert_eq!(
        eval::prefix_list_lookup(plist, &net("10.2.0.0/16"), &catalog),
        Err(EvalError::NotFinalized("PL-V4".to_owned()))
    );
}
