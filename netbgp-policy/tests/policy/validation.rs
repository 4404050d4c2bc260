//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use maplit::btreemap;
use netbgp_policy::catalog::Catalog;
use netbgp_policy::chain::{PrefixList, RoutingPolicy};
use netbgp_policy::error::{RuleField, ValidationErrorKind};
use netbgp_policy::rule::{PolicyRule, PrefixListRule, RuleEntry};
use netbgp_policy::validation::ValidationCxt;
use netbgp_utils::ip::AddressFamily;
use netbgp_utils::policy::Action;
use netbgp_utils::value::{MappingError, Value};

use super::{catalog, net};

fn validate_v4(
    catalog: &Catalog,
    rule: &PrefixListRule,
) -> Vec<(RuleField, ValidationErrorKind)> {
    let cxt = ValidationCxt::new(Some(AddressFamily::Ipv4), catalog);
    match rule.validate(&cxt) {
        Ok(()) => vec![],
        Err(errors) => errors
            .into_iter()
            .map(|error| (error.field, error.kind))
            .collect(),
    }
}

#[test]
fn prefix_source_exactly_one() {
    let catalog = catalog();

    let both = PrefixListRule {
        prefix_custom: Some(net("192.168.0.0/16")),
        ..PrefixListRule::with_prefix(10, Action::Permit, 1)
    };
    assert_eq!(
        validate_v4(&catalog, &both),
        [(RuleField::Prefix, ValidationErrorKind::ConflictingPrefixSource)]
    );

    let neither = PrefixListRule::new(10, Action::Permit);
    assert_eq!(
        validate_v4(&catalog, &neither),
        [(RuleField::Prefix, ValidationErrorKind::ConflictingPrefixSource)]
    );

    let record = PrefixListRule::with_prefix(10, Action::Permit, 1);
    assert!(validate_v4(&catalog, &record).is_empty());

    let custom =
        PrefixListRule::with_custom(10, Action::Permit, net("192.168.0.0/16"));
    assert!(validate_v4(&catalog, &custom).is_empty());
}

#[test]
fn ge_greater_than_le() {
    let catalog = catalog();
    let rule = PrefixListRule {
        ge: Some(24),
        le: Some(16),
        ..PrefixListRule::with_custom(10, Action::Permit, net("10.0.0.0/8"))
    };

    assert_eq!(
        validate_v4(&catalog, &rule),
        [(
            RuleField::Ge,
            ValidationErrorKind::InvalidPrefixLengthRange {
                ge: Some(24),
                le: Some(16),
                min: 8,
                max: 32,
            }
        )]
    );
}

#[test]
fn length_bounds() {
    let catalog = catalog();
    let rule = |ge, le| PrefixListRule {
        ge,
        le,
        ..PrefixListRule::with_custom(10, Action::Permit, net("10.0.0.0/16"))
    };

    // Bounds equal to the prefix's own length and the family maximum.
    assert!(validate_v4(&catalog, &rule(Some(16), Some(32))).is_empty());
    assert!(validate_v4(&catalog, &rule(Some(20), None)).is_empty());
    assert!(validate_v4(&catalog, &rule(None, Some(16))).is_empty());

    // Shorter than the prefix itself.
    let errors = validate_v4(&catalog, &rule(Some(8), None));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, RuleField::Ge);

    // Beyond the family maximum.
    let errors = validate_v4(&catalog, &rule(None, Some(33)));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, RuleField::Le);
}

#[test]
fn ipv6_length_bounds() {
    let catalog = catalog();
    let cxt = ValidationCxt::new(Some(AddressFamily::Ipv6), &catalog);
    let rule = PrefixListRule {
        ge: Some(48),
        le: Some(128),
        ..PrefixListRule::with_prefix(10, Action::Permit, 2)
    };
    assert!(rule.validate(&cxt).is_ok());

    let rule = PrefixListRule {
        le: Some(129),
        ..rule
    };
    assert!(rule.validate(&cxt).is_err());
}

#[test]
fn prefix_family_mismatch() {
    let catalog = catalog();
    let rule = PrefixListRule::with_prefix(10, Action::Permit, 2);

    assert_eq!(
        validate_v4(&catalog, &rule),
        [(
            RuleField::Prefix,
            ValidationErrorKind::AddressFamilyMismatch {
                expected: AddressFamily::Ipv4,
                found: AddressFamily::Ipv6,
            }
        )]
    );
}

#[test]
fn unresolved_prefix_record() {
    let catalog = catalog();
    let rule = PrefixListRule::with_prefix(10, Action::Permit, 99);

    assert_eq!(
        validate_v4(&catalog, &rule),
        [(
            RuleField::Prefix,
            ValidationErrorKind::UnresolvedReference("prefix 99".to_owned())
        )]
    );
}

#[test]
fn validate_does_not_mutate() {
    let catalog = catalog();
    let cxt = ValidationCxt::new(Some(AddressFamily::Ipv4), &catalog);
    let rule = PrefixListRule {
        ge: Some(30),
        le: Some(20),
        ..PrefixListRule::with_prefix(10, Action::Permit, 1)
    };
    let copy = rule.clone();

    assert!(rule.validate(&cxt).is_err());
    assert_eq!(rule, copy);
}

#[test]
fn malformed_mappings() {
    let catalog = catalog();
    let cxt = ValidationCxt::new(None, &catalog);

    let rule = PolicyRule {
        match_custom: btreemap! {
            String::new() => Value::from("x"),
        },
        set_actions: btreemap! {
            "weight".to_owned() => Value::Map(btreemap! {
                "scale".to_owned() => Value::Float(f64::NAN),
            }),
        },
        ..PolicyRule::new(10, Action::Permit)
    };

    let errors = rule.validate(&cxt).unwrap_err();
    let fields = errors.iter().map(|error| error.field).collect::<Vec<_>>();
    assert_eq!(fields, [RuleField::MatchCustom, RuleField::SetActions]);
    assert_eq!(
        errors[1].kind,
        ValidationErrorKind::MalformedMapping(MappingError::NonFiniteNumber(
            "weight.scale".to_owned()
        ))
    );
}

#[test]
fn nested_mappings_accepted() {
    let catalog = catalog();
    let cxt = ValidationCxt::new(None, &catalog);
    let rule = PolicyRule {
        match_custom: btreemap! {
            "ip next-hop".to_owned() => Value::from("192.0.2.1"),
        },
        set_actions: btreemap! {
            "as-path prepend".to_owned() => Value::from(vec![65001u32, 65001]),
            "vendor".to_owned() => Value::Map(btreemap! {
                "flags".to_owned() => Value::from(vec![true, false]),
            }),
        },
        continue_entry: Some(42),
        ..PolicyRule::new(10, Action::Permit)
    };

    // The continue target is only resolved by the chain.
    assert!(rule.validate(&cxt).is_ok());
}

#[test]
fn unresolved_policy_references() {
    let catalog = catalog();
    let policy = RoutingPolicy::new("RP");
    policy
        .add_rule(PolicyRule {
            match_community: [1, 7].into(),
            match_ip_address: ["PL-V6".to_owned(), "MISSING".to_owned()].into(),
            ..PolicyRule::new(10, Action::Permit)
        })
        .unwrap();

    let errors = policy.finalize(&catalog).unwrap_err();
    let kinds = errors
        .iter()
        .map(|error| (error.field, error.kind.clone()))
        .collect::<Vec<_>>();
    assert_eq!(
        kinds,
        [
            (
                RuleField::MatchCommunity,
                ValidationErrorKind::UnresolvedReference(
                    "community 7".to_owned()
                )
            ),
            (
                RuleField::MatchIpAddress,
                ValidationErrorKind::UnresolvedReference(
                    "prefix-list MISSING".to_owned()
                )
            ),
            (
                RuleField::MatchIpAddress,
                ValidationErrorKind::AddressFamilyMismatch {
                    expected: AddressFamily::Ipv4,
                    found: AddressFamily::Ipv6,
                }
            ),
        ]
    );
}

#[test]
fn prefix_list_finalize_collects_all_errors() {
    let catalog = catalog();
    let plist = PrefixList::new("PL", AddressFamily::Ipv4);
    plist
        .add_rule(PrefixListRule::new(20, Action::Permit))
        .unwrap();
    plist
        .add_rule(PrefixListRule {
            ge: Some(24),
            le: Some(16),
            ..PrefixListRule::with_custom(10, Action::Deny, net("10.0.0.0/8"))
        })
        .unwrap();

    let errors = plist.finalize(&catalog).unwrap_err();
    let indexes = errors.iter().map(|error| error.index).collect::<Vec<_>>();
    assert_eq!(indexes, [10, 20]);
}
