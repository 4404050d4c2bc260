//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use netbgp_utils::ip::{AddressFamily, IpNetworkExt};
use netbgp_utils::value::{self, Mapping};

use crate::catalog::Lookup;
use crate::chain::RuleSet;
use crate::error::{RuleField, ValidationError, ValidationErrorKind};
use crate::rule::{PolicyRule, PrefixListRule, RuleEntry};

// Context a rule entry is validated in.
pub struct ValidationCxt<'a> {
    // Address family of the owning chain, if it is bound to one.
    pub family: Option<AddressFamily>,
    // Host record lookups.
    pub lookup: &'a dyn Lookup,
}

// ===== impl ValidationCxt =====

impl<'a> ValidationCxt<'a> {
    pub fn new(
        family: Option<AddressFamily>,
        lookup: &'a dyn Lookup,
    ) -> ValidationCxt<'a> {
        ValidationCxt { family, lookup }
    }
}

// ===== global functions =====

// Validates a routing policy rule entry in isolation.
//
// The continue target is a soft reference and is only resolved when the
// owning chain is finalized.
pub fn validate_policy_rule(
    rule: &PolicyRule,
    _cxt: &ValidationCxt<'_>,
) -> Result<(), Vec<ValidationError>> {
    let mut errors = vec![];

    check_index(rule.index, &mut errors);
    check_mapping(
        rule.index,
        RuleField::MatchCustom,
        &rule.match_custom,
        &mut errors,
    );
    check_mapping(
        rule.index,
        RuleField::SetActions,
        &rule.set_actions,
        &mut errors,
    );

    result(errors)
}

// Validates a prefix list rule entry in isolation.
pub fn validate_prefix_list_rule(
    rule: &PrefixListRule,
    cxt: &ValidationCxt<'_>,
) -> Result<(), Vec<ValidationError>> {
    let mut errors = vec![];
    let index = rule.index;

    check_index(index, &mut errors);

    // Exactly one prefix source must be supplied.
    let network = match (rule.prefix, rule.prefix_custom) {
        (Some(_), Some(_)) | (None, None) => {
            errors.push(ValidationError::new(
                index,
                RuleField::Prefix,
                ValidationErrorKind::ConflictingPrefixSource,
            ));
            None
        }
        (Some(id), None) => {
            let network = cxt.lookup.prefix(id);
            if network.is_none() {
                errors.push(ValidationError::new(
                    index,
                    RuleField::Prefix,
                    ValidationErrorKind::UnresolvedReference(format!(
                        "prefix {id}"
                    )),
                ));
            }
            network
        }
        (None, Some(network)) => Some(network),
    };

    // Check the prefix length bounds.
    let (min, max) = match network {
        Some(network) => {
            let family = network.address_family();
            if let Some(expected) = cxt.family
                && expected != family
            {
                errors.push(ValidationError::new(
                    index,
                    RuleField::Prefix,
                    ValidationErrorKind::AddressFamilyMismatch {
                        expected,
                        found: family,
                    },
                ));
            }
            (network.prefix(), family.max_prefixlen())
        }
        None => {
            let family = cxt.family.unwrap_or(AddressFamily::Ipv6);
            (0, family.max_prefixlen())
        }
    };
    let range_error = || ValidationErrorKind::InvalidPrefixLengthRange {
        ge: rule.ge,
        le: rule.le,
        min,
        max,
    };
    let in_bounds = |len: u8| len >= min && len <= max;
    if let Some(ge) = rule.ge
        && !in_bounds(ge)
    {
        errors.push(ValidationError::new(index, RuleField::Ge, range_error()));
    }
    if let Some(le) = rule.le
        && !in_bounds(le)
    {
        errors.push(ValidationError::new(index, RuleField::Le, range_error()));
    }
    if let (Some(ge), Some(le)) = (rule.ge, rule.le)
        && ge > le
    {
        errors.push(ValidationError::new(index, RuleField::Ge, range_error()));
    }

    result(errors)
}

// Checks that the records a routing policy rule refers to exist and belong
// to the right address family.
pub fn check_policy_rule_references(
    rule: &PolicyRule,
    cxt: &ValidationCxt<'_>,
) -> Vec<ValidationError> {
    let mut errors = vec![];
    let index = rule.index;

    for id in &rule.match_community {
        let resolved = cxt
            .lookup
            .community(*id)
            .is_some_and(|community| community.comm().is_ok());
        if !resolved {
            errors.push(ValidationError::new(
                index,
                RuleField::MatchCommunity,
                ValidationErrorKind::UnresolvedReference(format!(
                    "community {id}"
                )),
            ));
        }
    }

    for (field, names, expected) in [
        (
            RuleField::MatchIpAddress,
            &rule.match_ip_address,
            AddressFamily::Ipv4,
        ),
        (
            RuleField::MatchIpv6Address,
            &rule.match_ipv6_address,
            AddressFamily::Ipv6,
        ),
    ] {
        for name in names {
            match cxt.lookup.prefix_list(name) {
                Some(plist) => {
                    if let Some(found) = plist.family
                        && found != expected
                    {
                        errors.push(ValidationError::new(
                            index,
                            field,
                            ValidationErrorKind::AddressFamilyMismatch {
                                expected,
                                found,
                            },
                        ));
                    }
                }
                None => {
                    errors.push(ValidationError::new(
                        index,
                        field,
                        ValidationErrorKind::UnresolvedReference(format!(
                            "prefix-list {name}"
                        )),
                    ));
                }
            }
        }
    }

    errors
}

// Resolves every continue target of the rule set.
pub(crate) fn check_continue_targets<E: RuleEntry>(
    rules: &RuleSet<E>,
) -> Vec<ValidationError> {
    rules
        .iter()
        .filter_map(|rule| match rule.continue_entry() {
            Some(target) if target != 0 && rules.resolve(target).is_none() => {
                Some(ValidationError::new(
                    rule.index(),
                    RuleField::ContinueEntry,
                    ValidationErrorKind::DanglingContinueTarget(target),
                ))
            }
            _ => None,
        })
        .collect()
}

// ===== helper functions =====

fn check_index(index: u32, errors: &mut Vec<ValidationError>) {
    if index == 0 {
        errors.push(ValidationError::new(
            index,
            RuleField::Index,
            ValidationErrorKind::InvalidIndex,
        ));
    }
}

fn check_mapping(
    index: u32,
    field: RuleField,
    mapping: &Mapping,
    errors: &mut Vec<ValidationError>,
) {
    if let Err(error) = value::check_mapping(mapping, "") {
        errors.push(ValidationError::new(
            index,
            field,
            ValidationErrorKind::MalformedMapping(error),
        ));
    }
}

fn result(errors: Vec<ValidationError>) -> Result<(), Vec<ValidationError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
