//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use netbgp_policy::catalog::Catalog;
use netbgp_policy::chain::RoutingPolicy;
use netbgp_policy::error::{
    Error, RuleField, ValidationError, ValidationErrorKind,
};
use netbgp_policy::rule::PolicyRule;
use netbgp_utils::policy::Action;

use super::catalog;

fn rule(index: u32, continue_entry: Option<u32>) -> PolicyRule {
    PolicyRule {
        continue_entry,
        ..PolicyRule::new(index, Action::Permit)
    }
}

#[test]
fn finalize_resolves_continue_target() {
    let catalog = Catalog::default();
    let policy = RoutingPolicy::new("RP");
    policy.add_rule(rule(1, Some(3))).unwrap();
    policy.add_rule(rule(3, None)).unwrap();
    policy.add_rule(rule(5, Some(0))).unwrap();

    assert!(policy.finalize(&catalog).is_ok());
    assert_eq!(
        policy.finalized_generation(),
        Some(policy.snapshot().generation())
    );
}

#[test]
fn finalize_dangling_continue_target() {
    let catalog = Catalog::default();
    let policy = RoutingPolicy::new("RP");
    for index in [1, 3, 5] {
        policy.add_rule(rule(index, None)).unwrap();
    }
    policy.add_rule(rule(7, Some(9))).unwrap();

    let errors = policy.finalize(&catalog).unwrap_err();
    assert_eq!(
        errors,
        vec![ValidationError::new(
            7,
            RuleField::ContinueEntry,
            ValidationErrorKind::DanglingContinueTarget(9),
        )]
    );
    assert!(!policy.is_finalized());
}

#[test]
fn continue_target_order_independent() {
    // The target may be added after the rule referring to it.
    let catalog = Catalog::default();
    let policy = RoutingPolicy::new("RP");
    policy.add_rule(rule(5, Some(3))).unwrap();
    assert!(policy.finalize(&catalog).is_err());

    policy.add_rule(rule(3, None)).unwrap();
    assert!(policy.finalize(&catalog).is_ok());
}

#[test]
fn duplicate_index() {
    for (first, second) in [
        (Action::Permit, Action::Deny),
        (Action::Deny, Action::Permit),
    ] {
        let policy = RoutingPolicy::new("RP");
        policy.add_rule(PolicyRule::new(10, first)).unwrap();

        let error = policy.add_rule(PolicyRule::new(10, second)).unwrap_err();
        assert_eq!(error.kind, ValidationErrorKind::DuplicateIndex);
        assert_eq!(error.index, 10);
        assert_eq!(policy.snapshot().len(), 1);
        assert_eq!(policy.snapshot().get(10).unwrap().action, first);
    }
}

#[test]
fn replace_and_remove() {
    let policy = RoutingPolicy::new("RP");
    assert!(policy.replace_rule(PolicyRule::new(10, Action::Deny)).is_none());

    let old = policy.replace_rule(PolicyRule::new(10, Action::Permit));
    assert_eq!(old.map(|rule| rule.action), Some(Action::Deny));

    let removed = policy.remove_rule(10).unwrap();
    assert_eq!(removed.action, Action::Permit);
    assert!(policy.snapshot().is_empty());
    assert!(policy.remove_rule(10).is_none());
}

#[test]
fn ascending_index_order() {
    let policy = RoutingPolicy::new("RP");
    for index in [40, 5, 100, 20] {
        policy.add_rule(rule(index, None)).unwrap();
    }

    let order = policy
        .snapshot()
        .iter()
        .map(|rule| rule.index)
        .collect::<Vec<_>>();
    assert_eq!(order, [5, 20, 40, 100]);
}

#[test]
fn zero_index_rejected() {
    let catalog = Catalog::default();
    let policy = RoutingPolicy::new("RP");
    policy.add_rule(rule(0, None)).unwrap();

    let errors = policy.finalize(&catalog).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ValidationErrorKind::InvalidIndex);
}

#[test]
fn edit_after_finalize_leaves_stale_generation() {
    let catalog = Catalog::default();
    let policy = RoutingPolicy::new("RP");
    policy.add_rule(rule(10, None)).unwrap();
    policy.finalize(&catalog).unwrap();
    let finalized = policy.finalized_generation().unwrap();

    policy.add_rule(rule(20, None)).unwrap();
    assert_eq!(policy.finalized_generation(), Some(finalized));
    assert!(policy.snapshot().generation() > finalized);
}

#[test]
fn duplicate_chain_name() {
    let mut catalog = catalog();
    catalog
        .insert_routing_policy(RoutingPolicy::new("RP"))
        .unwrap();

    let error = catalog
        .insert_routing_policy(RoutingPolicy::new("RP"))
        .unwrap_err();
    assert!(matches!(error, Error::DuplicateChainName(name) if name == "RP"));

    assert!(catalog.remove_routing_policy("RP").is_some());
    assert!(catalog
        .insert_routing_policy(RoutingPolicy::new("RP"))
        .is_ok());
}

#[test]
fn finalize_all_reports_failed_chains() {
    let mut catalog = catalog();
    let good = catalog
        .insert_routing_policy(RoutingPolicy::new("GOOD"))
        .unwrap();
    good.add_rule(rule(10, None)).unwrap();
    let bad = catalog
        .insert_routing_policy(RoutingPolicy::new("BAD"))
        .unwrap();
    bad.add_rule(rule(10, Some(20))).unwrap();

    let failed = catalog.finalize_all();
    assert_eq!(failed.keys().collect::<Vec<_>>(), ["routing-policy BAD"]);
    assert!(good.is_finalized());
    assert!(catalog.prefix_lists().all(|plist| plist.is_finalized()));
}
