//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{self, AtomicU64};
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use generational_arena::{Arena, Index};
use netbgp_utils::ip::AddressFamily;
use netbgp_utils::policy::Action;

use crate::catalog::Lookup;
use crate::debug::Debug;
use crate::error::{RuleField, ValidationError, ValidationErrorKind};
use crate::rule::{PolicyRule, PrefixListRule, RuleEntry};
use crate::validation::{self, ValidationCxt};

// Type aliases.
pub type RoutingPolicy = RuleChain<PolicyRule>;
pub type PrefixList = RuleChain<PrefixListRule>;
pub type RuleIndex = Index;

// Immutable snapshot of the rule entries of a chain.
#[derive(Clone, Debug)]
pub struct RuleSet<E> {
    // Rule entry arena.
    arena: Arena<E>,
    // Rule entries keyed by their index, in evaluation order (1:1).
    index_tree: BTreeMap<u32, RuleIndex>,
    // Incremented by every published edit.
    generation: u64,
}

// Named, ordered chain of rule entries.
//
// Edits publish a new snapshot of the rule set, so finalization and
// evaluation passes always see either the pre-edit or the post-edit set.
#[derive(Debug)]
pub struct RuleChain<E> {
    // Name of the chain, unique within its variant.
    pub name: String,
    pub description: String,
    // Decision used when the walk exhausts the chain without any match.
    pub default_action: Option<Action>,
    // Address family the chain is bound to (prefix lists only).
    pub family: Option<AddressFamily>,
    // Latest published rule set.
    rules: ArcSwap<RuleSet<E>>,
    // Serializes writers.
    writer: Mutex<()>,
    // Generation of the last successfully finalized rule set (zero if never).
    finalized: AtomicU64,
}

// ===== impl RuleSet =====

impl<E: RuleEntry> RuleSet<E> {
    pub fn get(&self, index: u32) -> Option<&E> {
        self.resolve(index).map(|rule_idx| &self.arena[rule_idx])
    }

    // Resolves a rule index into its arena slot.
    pub fn resolve(&self, index: u32) -> Option<RuleIndex> {
        self.index_tree.get(&index).copied()
    }

    // Returns an iterator visiting all rule entries in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &E> + '_ {
        self.index_tree.values().map(|rule_idx| &self.arena[*rule_idx])
    }

    pub fn first(&self) -> Option<&E> {
        self.iter().next()
    }

    // Returns the entry following the given index in evaluation order.
    pub fn next_after(&self, index: u32) -> Option<&E> {
        self.index_tree
            .range((Bound::Excluded(index), Bound::Unbounded))
            .next()
            .map(|(_, rule_idx)| &self.arena[*rule_idx])
    }

    pub fn contains(&self, index: u32) -> bool {
        self.index_tree.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.index_tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_tree.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn insert(&mut self, rule: E) {
        let index = rule.index();
        let rule_idx = self.arena.insert(rule);
        self.index_tree.insert(index, rule_idx);
    }

    fn remove(&mut self, index: u32) -> Option<E> {
        let rule_idx = self.index_tree.remove(&index)?;
        self.arena.remove(rule_idx)
    }
}

impl<E> Default for RuleSet<E> {
    fn default() -> RuleSet<E> {
        RuleSet {
            arena: Arena::new(),
            index_tree: Default::default(),
            generation: 1,
        }
    }
}

impl<E> std::ops::Index<RuleIndex> for RuleSet<E> {
    type Output = E;

    fn index(&self, rule_idx: RuleIndex) -> &E {
        &self.arena[rule_idx]
    }
}

// ===== impl RuleChain =====

impl<E: RuleEntry> RuleChain<E> {
    fn with_family(name: String, family: Option<AddressFamily>) -> Self {
        RuleChain {
            name,
            description: String::new(),
            default_action: None,
            family,
            rules: ArcSwap::from_pointee(RuleSet::default()),
            writer: Mutex::new(()),
            finalized: AtomicU64::new(0),
        }
    }

    // Returns the latest published rule set.
    pub fn snapshot(&self) -> Arc<RuleSet<E>> {
        self.rules.load_full()
    }

    // Adds a rule entry to the chain.
    pub fn add_rule(&self, rule: E) -> Result<(), ValidationError> {
        let index = rule.index();
        self.update(|rules| {
            if rules.contains(index) {
                return Err(ValidationError::new(
                    index,
                    RuleField::Index,
                    ValidationErrorKind::DuplicateIndex,
                ));
            }
            rules.insert(rule);
            Ok(())
        })?;

        Debug::RuleAdd(&self.name, index).log();
        Ok(())
    }

    // Replaces the rule entry holding the same index, returning the previous
    // entry. Adds the entry if the index is unused.
    pub fn replace_rule(&self, rule: E) -> Option<E> {
        let index = rule.index();
        let old = self.update(|rules| {
            let old = rules.remove(index);
            rules.insert(rule);
            Ok::<_, ()>(old)
        });

        Debug::RuleReplace(&self.name, index).log();
        old.ok().flatten()
    }

    // Removes the rule entry with the given index.
    pub fn remove_rule(&self, index: u32) -> Option<E> {
        let old = self
            .update(|rules| rules.remove(index).ok_or(()))
            .ok()?;

        Debug::RuleRemove(&self.name, index).log();
        Some(old)
    }

    // Validates every rule entry of the current snapshot and resolves all
    // continue targets.
    pub fn finalize(
        &self,
        lookup: &dyn Lookup,
    ) -> Result<(), Vec<ValidationError>> {
        let rules = self.snapshot();
        let cxt = ValidationCxt::new(self.family, lookup);

        let mut errors = vec![];
        for rule in rules.iter() {
            if let Err(rule_errors) = rule.validate(&cxt) {
                errors.extend(rule_errors);
            }
            errors.extend(rule.check_references(&cxt));
        }
        errors.extend(validation::check_continue_targets(&rules));

        if !errors.is_empty() {
            errors.sort_by_key(|error| (error.index, error.field));
            Debug::ChainFinalizeFail(&self.name, errors.len()).log();
            return Err(errors);
        }

        self.finalized
            .store(rules.generation(), atomic::Ordering::Release);
        Debug::ChainFinalize(&self.name, rules.len()).log();
        Ok(())
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized_generation().is_some()
    }

    // Returns the generation of the last successfully finalized rule set.
    pub fn finalized_generation(&self) -> Option<u64> {
        match self.finalized.load(atomic::Ordering::Acquire) {
            0 => None,
            generation => Some(generation),
        }
    }

    // Copies the current snapshot, applies `f` and publishes the result
    // unless `f` fails.
    fn update<T, X>(
        &self,
        f: impl FnOnce(&mut RuleSet<E>) -> Result<T, X>,
    ) -> Result<T, X> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut rules = RuleSet::clone(&self.rules.load());
        let result = f(&mut rules)?;
        rules.generation += 1;
        self.rules.store(Arc::new(rules));
        Ok(result)
    }
}

impl RuleChain<PolicyRule> {
    pub fn new(name: impl Into<String>) -> RoutingPolicy {
        RuleChain::with_family(name.into(), None)
    }
}

impl RuleChain<PrefixListRule> {
    pub fn new(name: impl Into<String>, family: AddressFamily) -> PrefixList {
        RuleChain::with_family(name.into(), Some(family))
    }
}

// ===== unit tests =====
