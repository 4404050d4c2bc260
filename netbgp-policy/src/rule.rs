//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;

use derive_new::new;
use ipnetwork::IpNetwork;
use netbgp_utils::bgp::CommunityId;
use netbgp_utils::policy::Action;
use netbgp_utils::value::Mapping;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::validation::{self, ValidationCxt};

// Identifier of a network-prefix record in the host's record set.
pub type PrefixId = u32;

// Common shape of the numbered match/action steps held by a rule chain.
pub trait RuleEntry: Clone + std::fmt::Debug + Send + Sync + 'static {
    // Position of the entry within its chain.
    fn index(&self) -> u32;

    fn action(&self) -> Action;

    // Soft reference to another entry of the same chain.
    fn continue_entry(&self) -> Option<u32> {
        None
    }

    // Checks the entry's own fields. Continue targets are resolved by the
    // chain instead.
    fn validate(
        &self,
        cxt: &ValidationCxt<'_>,
    ) -> Result<(), Vec<ValidationError>>;

    // Checks that the records the entry refers to can be resolved.
    fn check_references(
        &self,
        _cxt: &ValidationCxt<'_>,
    ) -> Vec<ValidationError> {
        vec![]
    }
}

// Routing policy rule entry.
#[derive(Clone, Debug, PartialEq, new)]
#[derive(Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyRule {
    pub index: u32,
    pub action: Action,
    // `None` stops the walk once the rule permits, `Some(0)` moves on to the
    // next entry and `Some(n)` jumps to the entry with index `n`.
    #[new(default)]
    #[serde(default)]
    pub continue_entry: Option<u32>,
    #[new(default)]
    #[serde(default)]
    pub match_community: BTreeSet<CommunityId>,
    #[new(default)]
    #[serde(default)]
    pub match_ip_address: BTreeSet<String>,
    #[new(default)]
    #[serde(default)]
    pub match_ipv6_address: BTreeSet<String>,
    #[new(default)]
    #[serde(default)]
    pub match_custom: Mapping,
    #[new(default)]
    #[serde(default)]
    pub set_actions: Mapping,
    #[new(default)]
    #[serde(default)]
    pub description: String,
}

// Prefix list rule entry.
#[derive(Clone, Debug, Eq, PartialEq, new)]
#[derive(Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrefixListRule {
    pub index: u32,
    pub action: Action,
    // Reference to a network-prefix record.
    #[new(default)]
    #[serde(default)]
    pub prefix: Option<PrefixId>,
    // Literal network not drawn from the record set.
    #[new(default)]
    #[serde(default)]
    pub prefix_custom: Option<IpNetwork>,
    #[new(default)]
    #[serde(default)]
    pub ge: Option<u8>,
    #[new(default)]
    #[serde(default)]
    pub le: Option<u8>,
    #[new(default)]
    #[serde(default)]
    pub description: String,
}

// ===== impl PolicyRule =====

impl RuleEntry for PolicyRule {
    fn index(&self) -> u32 {
        self.index
    }

    fn action(&self) -> Action {
        self.action
    }

    fn continue_entry(&self) -> Option<u32> {
        self.continue_entry
    }

    fn validate(
        &self,
        cxt: &ValidationCxt<'_>,
    ) -> Result<(), Vec<ValidationError>> {
        validation::validate_policy_rule(self, cxt)
    }

    fn check_references(
        &self,
        cxt: &ValidationCxt<'_>,
    ) -> Vec<ValidationError> {
        validation::check_policy_rule_references(self, cxt)
    }
}

// ===== impl PrefixListRule =====

impl PrefixListRule {
    pub fn with_prefix(index: u32, action: Action, prefix: PrefixId) -> Self {
        PrefixListRule {
            prefix: Some(prefix),
            ..PrefixListRule::new(index, action)
        }
    }

    pub fn with_custom(index: u32, action: Action, prefix: IpNetwork) -> Self {
        PrefixListRule {
            prefix_custom: Some(prefix),
            ..PrefixListRule::new(index, action)
        }
    }
}

impl RuleEntry for PrefixListRule {
    fn index(&self) -> u32 {
        self.index
    }

    fn action(&self) -> Action {
        self.action
    }

    fn validate(
        &self,
        cxt: &ValidationCxt<'_>,
    ) -> Result<(), Vec<ValidationError>> {
        validation::validate_prefix_list_rule(self, cxt)
    }
}
