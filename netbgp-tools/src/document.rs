//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::path::Path;

use ipnetwork::IpNetwork;
use netbgp_policy::catalog::Catalog;
use netbgp_policy::chain::{PrefixList, RoutingPolicy};
use netbgp_policy::error::{Error as PolicyError, ValidationError};
use netbgp_policy::route::Route;
use netbgp_policy::rule::{PolicyRule, PrefixId, PrefixListRule};
use netbgp_utils::bgp::Community;
use netbgp_utils::ip::AddressFamily;
use netbgp_utils::policy::Action;
use netbgp_utils::value::{self, MappingError};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::error;

// Policy document, as read from disk.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Document {
    pub communities: Vec<Community>,
    pub prefixes: BTreeMap<PrefixId, IpNetwork>,
    pub prefix_lists: Vec<ChainDocument>,
    pub routing_policies: Vec<ChainDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainDocument {
    pub name: String,
    #[serde(default)]
    pub family: Option<AddressFamily>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default: Option<Action>,
    // Kept loosely typed so that malformed mappings are reported per rule.
    #[serde(default)]
    pub rules: Vec<serde_json::Value>,
}

// Route to be evaluated against a routing policy.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteEntry {
    pub policy: String,
    // Defaults to the family of the route's prefix.
    #[serde(default)]
    pub family: Option<AddressFamily>,
    pub route: Route,
}

// Document loading errors.
#[derive(Debug)]
pub enum Error {
    Io(String, std::io::Error),
    Parse(String, serde_json::Error),
    MissingFamily(String),
    Rule(String, usize, serde_json::Error),
    Mapping(String, usize, &'static str, MappingError),
    Validation(String, ValidationError),
    Policy(PolicyError),
}

// ===== impl Document =====

impl Document {
    pub fn load(path: &Path) -> Result<Document, Error> {
        read_json(path)
    }

    // Builds a catalog holding every record of the document. Chains are left
    // unfinalized.
    pub fn into_catalog(self) -> Result<Catalog, Error> {
        let mut catalog = Catalog::default();

        for community in self.communities {
            catalog.insert_community(community).map_err(Error::Policy)?;
        }
        for (id, prefix) in self.prefixes {
            catalog.insert_prefix(id, prefix);
        }

        for doc in self.prefix_lists {
            let family = doc
                .family
                .ok_or_else(|| Error::MissingFamily(doc.name.clone()))?;
            let mut plist = PrefixList::new(&doc.name, family);
            plist.description = doc.description;
            plist.default_action = doc.default;
            for (pos, rule) in doc.rules.into_iter().enumerate() {
                let rule = serde_json::from_value::<PrefixListRule>(rule)
                    .map_err(|error| {
                        Error::Rule(doc.name.clone(), pos, error)
                    })?;
                plist.add_rule(rule).map_err(|error| {
                    Error::Validation(doc.name.clone(), error)
                })?;
            }
            catalog.insert_prefix_list(plist).map_err(Error::Policy)?;
        }

        for doc in self.routing_policies {
            let mut policy = RoutingPolicy::new(&doc.name);
            policy.description = doc.description;
            policy.default_action = doc.default;
            for (pos, rule) in doc.rules.into_iter().enumerate() {
                let rule = policy_rule(&doc.name, pos, rule)?;
                policy.add_rule(rule).map_err(|error| {
                    Error::Validation(doc.name.clone(), error)
                })?;
            }
            catalog.insert_routing_policy(policy).map_err(Error::Policy)?;
        }

        Ok(catalog)
    }
}

// ===== impl RouteEntry =====

impl RouteEntry {
    pub fn load(path: &Path) -> Result<Vec<RouteEntry>, Error> {
        read_json(path)
    }

    pub fn family(&self) -> AddressFamily {
        self.family.unwrap_or_else(|| self.route.address_family())
    }
}

// ===== impl Error =====

impl Error {
    pub fn log(&self) {
        match self {
            Error::Io(path, error) => {
                error!(%path, %error, "failed to read file");
            }
            Error::Parse(path, error) => {
                error!(%path, %error, "failed to parse file");
            }
            Error::MissingFamily(name) => {
                error!(chain = %name, "missing address family");
            }
            Error::Rule(name, pos, error) => {
                error!(chain = %name, %pos, %error, "malformed rule");
            }
            Error::Mapping(name, pos, field, error) => {
                error!(
                    chain = %name, %pos, %field, %error,
                    "malformed mapping"
                );
            }
            Error::Validation(name, error) => {
                error.log(name);
            }
            Error::Policy(error) => {
                error.log();
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(path, error) => {
                write!(f, "failed to read {path}: {error}")
            }
            Error::Parse(path, error) => {
                write!(f, "failed to parse {path}: {error}")
            }
            Error::MissingFamily(name) => {
                write!(f, "prefix-list {name}: missing address family")
            }
            Error::Rule(name, pos, error) => {
                write!(f, "chain {name}: rule #{pos}: {error}")
            }
            Error::Mapping(name, pos, field, error) => {
                write!(f, "chain {name}: rule #{pos}: {field}: {error}")
            }
            Error::Validation(name, error) => {
                write!(f, "chain {name}: {error}")
            }
            Error::Policy(error) => match error {
                PolicyError::DuplicateChainName(name) => {
                    write!(f, "{error}: {name}")
                }
                PolicyError::InvalidCommunity(id, source) => {
                    write!(f, "{error} {id}: {source}")
                }
            },
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(_, error) => Some(error),
            Error::Parse(_, error) | Error::Rule(_, _, error) => Some(error),
            Error::Mapping(_, _, _, error) => Some(error),
            Error::Validation(_, error) => Some(error),
            Error::Policy(error) => Some(error),
            Error::MissingFamily(_) => None,
        }
    }
}

// ===== helper functions =====

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Error> {
    let name = path.display().to_string();
    let data = std::fs::read_to_string(path)
        .map_err(|error| Error::Io(name.clone(), error))?;
    serde_json::from_str(&data).map_err(|error| Error::Parse(name, error))
}

// Decodes a routing policy rule, checking its open-ended mappings first.
fn policy_rule(
    chain: &str,
    pos: usize,
    mut rule: serde_json::Value,
) -> Result<PolicyRule, Error> {
    let mut mappings = vec![];
    for field in ["match_custom", "set_actions"] {
        let json = rule
            .as_object_mut()
            .and_then(|object| object.remove(field))
            .unwrap_or_default();
        let mapping = value::parse_mapping(&json).map_err(|error| {
            Error::Mapping(chain.to_owned(), pos, field, error)
        })?;
        mappings.push(mapping);
    }

    let mut rule = serde_json::from_value::<PolicyRule>(rule)
        .map_err(|error| Error::Rule(chain.to_owned(), pos, error))?;
    rule.set_actions = mappings.pop().unwrap_or_default();
    rule.match_custom = mappings.pop().unwrap_or_default();
    Ok(rule)
}

// ===== unit tests =====
