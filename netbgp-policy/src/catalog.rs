//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::sync::Arc;

use ipnetwork::IpNetwork;
use netbgp_utils::bgp::{Community, CommunityId};

use crate::chain::{PrefixList, RoutingPolicy};
use crate::error::{Error, ValidationError};
use crate::rule::PrefixId;

// Read-only lookups the host record store provides, keyed by identifier.
pub trait Lookup {
    fn community(&self, id: CommunityId) -> Option<&Community>;

    fn prefix(&self, id: PrefixId) -> Option<IpNetwork>;

    fn prefix_list(&self, name: &str) -> Option<&PrefixList>;

    fn routing_policy(&self, name: &str) -> Option<&RoutingPolicy>;
}

// In-memory record set implementing `Lookup`.
#[derive(Debug, Default)]
pub struct Catalog {
    communities: BTreeMap<CommunityId, Community>,
    prefixes: BTreeMap<PrefixId, IpNetwork>,
    prefix_lists: BTreeMap<String, Arc<PrefixList>>,
    routing_policies: BTreeMap<String, Arc<RoutingPolicy>>,
}

// ===== impl Catalog =====

impl Catalog {
    // Inserts or replaces a community record.
    pub fn insert_community(
        &mut self,
        community: Community,
    ) -> Result<(), Error> {
        community
            .validate()
            .map_err(|error| Error::InvalidCommunity(community.id, error))?;
        self.communities.insert(community.id, community);
        Ok(())
    }

    // Inserts or replaces a network-prefix record.
    pub fn insert_prefix(&mut self, id: PrefixId, prefix: IpNetwork) {
        self.prefixes.insert(id, prefix);
    }

    pub fn insert_prefix_list(
        &mut self,
        plist: PrefixList,
    ) -> Result<Arc<PrefixList>, Error> {
        insert_chain(&mut self.prefix_lists, plist, |plist| &plist.name)
    }

    pub fn insert_routing_policy(
        &mut self,
        policy: RoutingPolicy,
    ) -> Result<Arc<RoutingPolicy>, Error> {
        insert_chain(&mut self.routing_policies, policy, |policy| {
            &policy.name
        })
    }

    // Removes a prefix list together with all of its rule entries.
    pub fn remove_prefix_list(
        &mut self,
        name: &str,
    ) -> Option<Arc<PrefixList>> {
        self.prefix_lists.remove(name)
    }

    // Removes a routing policy together with all of its rule entries.
    pub fn remove_routing_policy(
        &mut self,
        name: &str,
    ) -> Option<Arc<RoutingPolicy>> {
        self.routing_policies.remove(name)
    }

    pub fn prefix_lists(&self) -> impl Iterator<Item = &Arc<PrefixList>> {
        self.prefix_lists.values()
    }

    pub fn routing_policies(
        &self,
    ) -> impl Iterator<Item = &Arc<RoutingPolicy>> {
        self.routing_policies.values()
    }

    // Finalizes every chain, prefix lists first. Returns the validation
    // errors of each chain that failed.
    pub fn finalize_all(&self) -> BTreeMap<String, Vec<ValidationError>> {
        let mut failed = BTreeMap::new();

        for plist in self.prefix_lists.values() {
            if let Err(errors) = plist.finalize(self) {
                failed.insert(format!("prefix-list {}", plist.name), errors);
            }
        }
        for policy in self.routing_policies.values() {
            if let Err(errors) = policy.finalize(self) {
                failed
                    .insert(format!("routing-policy {}", policy.name), errors);
            }
        }

        failed
    }
}

impl Lookup for Catalog {
    fn community(&self, id: CommunityId) -> Option<&Community> {
        self.communities.get(&id)
    }

    fn prefix(&self, id: PrefixId) -> Option<IpNetwork> {
        self.prefixes.get(&id).copied()
    }

    fn prefix_list(&self, name: &str) -> Option<&PrefixList> {
        self.prefix_lists.get(name).map(Arc::as_ref)
    }

    fn routing_policy(&self, name: &str) -> Option<&RoutingPolicy> {
        self.routing_policies.get(name).map(Arc::as_ref)
    }
}

// ===== helper functions =====

fn insert_chain<T>(
    tree: &mut BTreeMap<String, Arc<T>>,
    chain: T,
    name: impl Fn(&T) -> &String,
) -> Result<Arc<T>, Error> {
    match tree.entry(name(&chain).clone()) {
        btree_map::Entry::Occupied(o) => {
            Err(Error::DuplicateChainName(o.key().clone()))
        }
        btree_map::Entry::Vacant(v) => Ok(v.insert(Arc::new(chain)).clone()),
    }
}
