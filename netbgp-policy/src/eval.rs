//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;
use std::net::IpAddr;

use ipnetwork::IpNetwork;
use itertools::Itertools;
use netbgp_utils::bgp::{Comm, Origin};
use netbgp_utils::ip::{AddressFamily, IpNetworkExt};
use netbgp_utils::policy::{Action, IpPrefixRange};
use netbgp_utils::value::{Mapping, Value};
use serde::{Deserialize, Serialize};
use tracing::debug_span;

use crate::catalog::Lookup;
use crate::chain::{PrefixList, RoutingPolicy, RuleChain, RuleSet};
use crate::debug::Debug;
use crate::error::EvalError;
use crate::route::Route;
use crate::rule::{PolicyRule, PrefixListRule, RuleEntry};

// System-level evaluation settings.
#[derive(Clone, Debug)]
#[derive(Deserialize, Serialize)]
pub struct EvalConfig {
    // Decision used when a chain without its own default is exhausted.
    pub default_action: Option<Action>,
    // Upper bound on the number of continue directives followed by one walk.
    pub max_steps: usize,
}

// Outcome of a routing policy evaluation.
#[derive(Clone, Debug, PartialEq)]
pub enum Decision {
    // Route accepted, carrying the modified working copy of its attributes.
    Permit(Route),
    // Route filtered out.
    Deny,
}

// ===== impl EvalConfig =====

impl EvalConfig {
    pub const DFLT_MAX_STEPS: usize = 4096;
}

impl Default for EvalConfig {
    fn default() -> EvalConfig {
        EvalConfig {
            default_action: None,
            max_steps: EvalConfig::DFLT_MAX_STEPS,
        }
    }
}

// ===== impl Decision =====

impl Decision {
    pub fn action(&self) -> Action {
        match self {
            Decision::Permit(_) => Action::Permit,
            Decision::Deny => Action::Deny,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Permit(_) => write!(f, "PERMIT"),
            Decision::Deny => write!(f, "DENY"),
        }
    }
}

// ===== global functions =====

// Walks a finalized routing policy against a route.
//
// The stored route is never modified: set actions are applied to a working
// copy that is returned along with a PERMIT decision.
pub fn evaluate(
    policy: &RoutingPolicy,
    route: &Route,
    family: AddressFamily,
    lookup: &dyn Lookup,
    config: &EvalConfig,
) -> Result<Decision, EvalError> {
    if route.address_family() != family {
        return Err(EvalError::AddressFamilyMismatch {
            family,
            prefix: route.prefix,
        });
    }
    let rules = evaluation_snapshot(policy)?;

    debug_span!("evaluation", chain = %policy.name, prefix = %route.prefix)
        .in_scope(|| {
            let mut working = route.clone();
            let mut permitted = false;
            let mut visited = BTreeSet::new();
            let mut continues = 0;
            let mut cursor = rules.first();

            while let Some(rule) = cursor {
                if !visited.insert(rule.index) {
                    return Err(EvalError::ContinueLoop { index: rule.index });
                }

                if !rule_matches(rule, &working, family, lookup)? {
                    Debug::RuleNoMatch(rule.index).log();
                    cursor = rules.next_after(rule.index);
                    continue;
                }
                Debug::RuleMatch(rule.index, rule.action).log();

                if rule.action == Action::Deny {
                    return Ok(Decision::Deny);
                }

                apply_set_actions(rule.index, &rule.set_actions, &mut working)?;
                permitted = true;
                if rule.continue_entry.is_some() {
                    continues += 1;
                    if continues > config.max_steps {
                        return Err(EvalError::ContinueLoop {
                            index: rule.index,
                        });
                    }
                }
                cursor = match rule.continue_entry {
                    None => return Ok(Decision::Permit(working)),
                    Some(0) => {
                        Debug::ContinueNext(rule.index).log();
                        rules.next_after(rule.index)
                    }
                    Some(target) => {
                        // The target was resolved at finalization time, but
                        // the chain may have been edited since.
                        let rule_idx = rules.resolve(target).ok_or(
                            EvalError::EvaluationFault {
                                index: rule.index,
                                target,
                            },
                        )?;
                        Debug::ContinueJump(rule.index, target).log();
                        Some(&rules[rule_idx])
                    }
                };
            }

            // A permitting rule that chained onward keeps its decision once
            // the chain runs out.
            if permitted {
                return Ok(Decision::Permit(working));
            }

            match default_action(policy, config)? {
                Action::Permit => Ok(Decision::Permit(working)),
                Action::Deny => Ok(Decision::Deny),
            }
        })
}

// Walks a finalized prefix list and returns the action of the first entry
// matching the prefix, if any.
pub fn prefix_list_lookup(
    plist: &PrefixList,
    prefix: &IpNetwork,
    lookup: &dyn Lookup,
) -> Result<Option<(u32, Action)>, EvalError> {
    let rules = evaluation_snapshot(plist)?;

    for rule in rules.iter() {
        if prefix_rule_matches(rule, prefix, lookup)? {
            return Ok(Some((rule.index, rule.action)));
        }
    }

    Ok(None)
}

// Evaluates a finalized prefix list on its own, applying the configured
// default policy when no entry matches.
pub fn evaluate_prefix_list(
    plist: &PrefixList,
    prefix: &IpNetwork,
    lookup: &dyn Lookup,
    config: &EvalConfig,
) -> Result<Action, EvalError> {
    match prefix_list_lookup(plist, prefix, lookup)? {
        Some((_, action)) => Ok(action),
        None => default_action(plist, config),
    }
}

// ===== helper functions =====

fn evaluation_snapshot<E: RuleEntry>(
    chain: &RuleChain<E>,
) -> Result<std::sync::Arc<RuleSet<E>>, EvalError> {
    let Some(finalized) = chain.finalized_generation() else {
        return Err(EvalError::NotFinalized(chain.name.clone()));
    };

    let rules = chain.snapshot();
    Debug::EvalStart(&chain.name, rules.generation()).log();
    if rules.generation() != finalized {
        Debug::EvalStaleSnapshot(&chain.name, finalized, rules.generation())
            .log();
    }

    Ok(rules)
}

fn default_action<E: RuleEntry>(
    chain: &RuleChain<E>,
    config: &EvalConfig,
) -> Result<Action, EvalError> {
    let action = chain
        .default_action
        .or(config.default_action)
        .ok_or_else(|| EvalError::NoMatchingRule(chain.name.clone()))?;
    Debug::DefaultPolicy(&chain.name, action).log();
    Ok(action)
}

// Evaluates the match conditions of a routing policy rule.
//
// Categories are ANDed together; the alternatives within each category are
// ORed. An empty category is vacuously true.
fn rule_matches(
    rule: &PolicyRule,
    route: &Route,
    family: AddressFamily,
    lookup: &dyn Lookup,
) -> Result<bool, EvalError> {
    // "match community"
    if !rule.match_community.is_empty() {
        let mut matched = false;
        for id in &rule.match_community {
            let comm = lookup
                .community(*id)
                .and_then(|community| community.comm().ok())
                .ok_or_else(|| EvalError::UnresolvedReference {
                    index: rule.index,
                    reference: format!("community {id}"),
                })?;
            if route.communities.contains(&comm) {
                matched = true;
                break;
            }
        }
        if !matched {
            return Ok(false);
        }
    }

    // "match ip address prefix-list" and "match ipv6 address prefix-list"
    for (names, plist_family) in [
        (&rule.match_ip_address, AddressFamily::Ipv4),
        (&rule.match_ipv6_address, AddressFamily::Ipv6),
    ] {
        if names.is_empty() {
            continue;
        }
        // A route never belongs to a prefix list of another address family.
        if family != plist_family {
            return Ok(false);
        }
        let mut matched = false;
        for name in names {
            let plist = lookup.prefix_list(name).ok_or_else(|| {
                EvalError::UnresolvedReference {
                    index: rule.index,
                    reference: format!("prefix-list {name}"),
                }
            })?;
            if let Some((_, Action::Permit)) =
                prefix_list_lookup(plist, &route.prefix, lookup)?
            {
                matched = true;
                break;
            }
        }
        if !matched {
            return Ok(false);
        }
    }

    // Custom match statements.
    Ok(rule
        .match_custom
        .iter()
        .all(|(key, value)| custom_matches(key, value, route)))
}

// Checks whether a prefix list entry covers the given prefix.
fn prefix_rule_matches(
    rule: &PrefixListRule,
    prefix: &IpNetwork,
    lookup: &dyn Lookup,
) -> Result<bool, EvalError> {
    let network = match (rule.prefix_custom, rule.prefix) {
        (Some(network), _) => network,
        (None, Some(id)) => lookup.prefix(id).ok_or_else(|| {
            EvalError::UnresolvedReference {
                index: rule.index,
                reference: format!("prefix {id}"),
            }
        })?,
        (None, None) => return Ok(false),
    };
    if network.address_family() != prefix.address_family() {
        return Ok(false);
    }

    let range = IpPrefixRange::new(network, rule.ge, rule.le);
    Ok(range.contains(prefix))
}

// Evaluates a single custom match statement. A list value holds
// alternatives, any of which may match.
fn custom_matches(key: &str, expected: &Value, route: &Route) -> bool {
    match expected {
        Value::List(alternatives) => alternatives
            .iter()
            .any(|alternative| custom_matches_one(key, alternative, route)),
        _ => custom_matches_one(key, expected, route),
    }
}

fn custom_matches_one(key: &str, expected: &Value, route: &Route) -> bool {
    match normalize_key(key).as_str() {
        "ip nexthop" | "ipv6 nexthop" | "nexthop" => {
            let Some(nexthop) = route.next_hop else {
                return false;
            };
            let Some(expected) = expected.as_string() else {
                return false;
            };
            let expected = expected.trim();
            if let Ok(addr) = expected.parse::<IpAddr>() {
                addr == nexthop
            } else if let Ok(network) = expected.parse::<IpNetwork>() {
                network.contains(nexthop)
            } else {
                false
            }
        }
        "as-path" => expected
            .to_u32()
            .is_some_and(|asn| route.as_path.contains(&asn)),
        "local-preference" => {
            expected.to_u32().is_some() && expected.to_u32() == route.local_pref
        }
        "metric" => {
            expected.to_u32().is_some() && expected.to_u32() == route.med
        }
        "origin" => expected
            .as_string()
            .and_then(|origin| origin.trim().parse::<Origin>().ok())
            .is_some_and(|origin| route.origin == Some(origin)),
        "community" => expected
            .as_string()
            .and_then(|comm| comm.parse::<Comm>().ok())
            .is_some_and(|comm| route.communities.contains(&comm)),
        _ => route
            .attrs
            .get(key)
            .is_some_and(|value| value.loosely_eq(expected)),
    }
}

// Applies the set actions of a matching PERMIT rule to the working copy.
fn apply_set_actions(
    index: u32,
    set_actions: &Mapping,
    route: &mut Route,
) -> Result<(), EvalError> {
    for (key, value) in set_actions {
        let invalid = || EvalError::InvalidSetAction {
            index,
            key: key.clone(),
        };

        match normalize_key(key).as_str() {
            // "set as-path prepend"
            "as-path prepend" => {
                let asns = value
                    .words()
                    .iter()
                    .map(|word| word.parse::<u32>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|_| invalid())?;
                if asns.is_empty() {
                    return Err(invalid());
                }
                route.as_path_prepend(&asns);
            }
            // "set community"
            "community" => {
                let mut words = value.words();
                let additive = words.last().is_some_and(|w| w == "additive");
                if additive {
                    words.pop();
                }
                let comms = if words.len() == 1 && words[0] == "none" {
                    BTreeSet::new()
                } else {
                    parse_comms(&words).ok_or_else(invalid)?
                };
                if !additive {
                    route.communities.clear();
                }
                route.communities.extend(comms);
            }
            // "set comm-list delete"
            "comm-list delete" | "community delete" => {
                let comms = parse_comms(&value.words()).ok_or_else(invalid)?;
                route.communities.retain(|comm| !comms.contains(comm));
            }
            // "set local-preference"
            "local-preference" => {
                route.local_pref = Some(value.to_u32().ok_or_else(invalid)?);
            }
            // "set metric"
            "metric" => {
                let med = set_metric(route.med, value).ok_or_else(invalid)?;
                route.med = Some(med);
            }
            // "set origin"
            "origin" => {
                let origin = value
                    .as_string()
                    .and_then(|origin| origin.trim().parse::<Origin>().ok())
                    .ok_or_else(invalid)?;
                route.origin = Some(origin);
            }
            // "set ip next-hop" and "set ipv6 next-hop"
            "ip nexthop" | "ipv6 nexthop" | "nexthop" => {
                let nexthop = value
                    .as_string()
                    .and_then(|addr| addr.trim().parse::<IpAddr>().ok())
                    .ok_or_else(invalid)?;
                route.next_hop = Some(nexthop);
            }
            // Vendor-specific attributes are carried verbatim.
            _ => {
                route.attrs.insert(key.clone(), value.clone());
            }
        }
    }

    Ok(())
}

// Computes the new metric. Strings prefixed with "+" or "-" adjust the
// current value, saturating at the bounds.
fn set_metric(current: Option<u32>, value: &Value) -> Option<u32> {
    if let Some(value) = value.as_string() {
        let value = value.trim();
        if let Some(delta) = value.strip_prefix('+') {
            let delta = delta.parse::<u32>().ok()?;
            return Some(current.unwrap_or(0).saturating_add(delta));
        }
        if let Some(delta) = value.strip_prefix('-') {
            let delta = delta.parse::<u32>().ok()?;
            return Some(current.unwrap_or(0).saturating_sub(delta));
        }
    }
    value.to_u32()
}

fn parse_comms(words: &[String]) -> Option<BTreeSet<Comm>> {
    if words.is_empty() {
        return None;
    }
    words.iter().map(|word| word.parse::<Comm>().ok()).collect()
}

// Normalizes protocol attribute names, so that "ip next-hop" and
// "IP  nexthop" address the same attribute.
fn normalize_key(key: &str) -> String {
    key.split_whitespace()
        .map(|word| word.to_ascii_lowercase().replace("next-hop", "nexthop"))
        .join(" ")
}

// ===== unit tests =====
