//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use ipnetwork::IpNetwork;
use netbgp_utils::bgp::CommunityError;
use netbgp_utils::ip::AddressFamily;
use netbgp_utils::value::MappingError;
use tracing::{warn, warn_span};

// Policy errors.
#[derive(Debug)]
pub enum Error {
    DuplicateChainName(String),
    InvalidCommunity(u32, CommunityError),
}

// Field-scoped rule validation failure.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidationError {
    // Index of the offending rule entry.
    pub index: u32,
    pub field: RuleField,
    pub kind: ValidationErrorKind,
}

// Rule entry fields that validation failures are scoped to.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum RuleField {
    Index,
    ContinueEntry,
    MatchCommunity,
    MatchIpAddress,
    MatchIpv6Address,
    MatchCustom,
    SetActions,
    Prefix,
    Ge,
    Le,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ValidationErrorKind {
    InvalidIndex,
    DuplicateIndex,
    ConflictingPrefixSource,
    InvalidPrefixLengthRange {
        ge: Option<u8>,
        le: Option<u8>,
        min: u8,
        max: u8,
    },
    DanglingContinueTarget(u32),
    MalformedMapping(MappingError),
    AddressFamilyMismatch {
        expected: AddressFamily,
        found: AddressFamily,
    },
    UnresolvedReference(String),
}

// Chain evaluation errors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EvalError {
    // The chain was never successfully finalized.
    NotFinalized(String),
    // A continue target vanished after the chain was finalized.
    EvaluationFault { index: u32, target: u32 },
    // The chain was exhausted and no default policy is configured.
    NoMatchingRule(String),
    // The walk revisited a rule entry.
    ContinueLoop { index: u32 },
    UnresolvedReference { index: u32, reference: String },
    InvalidSetAction { index: u32, key: String },
    AddressFamilyMismatch { family: AddressFamily, prefix: IpNetwork },
}

// ===== impl Error =====

impl Error {
    pub fn log(&self) {
        match self {
            Error::DuplicateChainName(name) => {
                warn!(%name, "{}", self);
            }
            Error::InvalidCommunity(id, error) => {
                warn!(%id, %error, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::DuplicateChainName(..) => {
                write!(f, "duplicate chain name")
            }
            Error::InvalidCommunity(..) => {
                write!(f, "invalid community")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidCommunity(_, error) => Some(error),
            _ => None,
        }
    }
}

// ===== impl ValidationError =====

impl ValidationError {
    pub fn new(
        index: u32,
        field: RuleField,
        kind: ValidationErrorKind,
    ) -> ValidationError {
        ValidationError { index, field, kind }
    }

    pub fn log(&self, chain: &str) {
        warn_span!("chain", name = %chain).in_scope(|| {
            warn!(index = %self.index, field = %self.field, "{}", self);
        });
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rule {} ({}): {}", self.index, self.field, self.kind)
    }
}

impl std::error::Error for ValidationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ValidationErrorKind::MalformedMapping(error) => Some(error),
            _ => None,
        }
    }
}

// ===== impl RuleField =====

impl std::fmt::Display for RuleField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RuleField::Index => "index",
            RuleField::ContinueEntry => "continue_entry",
            RuleField::MatchCommunity => "match_community",
            RuleField::MatchIpAddress => "match_ip_address",
            RuleField::MatchIpv6Address => "match_ipv6_address",
            RuleField::MatchCustom => "match_custom",
            RuleField::SetActions => "set_actions",
            RuleField::Prefix => "prefix",
            RuleField::Ge => "ge",
            RuleField::Le => "le",
        };
        write!(f, "{name}")
    }
}

// ===== impl ValidationErrorKind =====

impl std::fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationErrorKind::InvalidIndex => {
                write!(f, "index must be a positive integer")
            }
            ValidationErrorKind::DuplicateIndex => {
                write!(f, "index already in use within the chain")
            }
            ValidationErrorKind::ConflictingPrefixSource => {
                write!(f, "exactly one of prefix and prefix_custom must be set")
            }
            ValidationErrorKind::InvalidPrefixLengthRange {
                ge,
                le,
                min,
                max,
            } => {
                write!(f, "invalid prefix length range")?;
                if let Some(ge) = ge {
                    write!(f, " ge {ge}")?;
                }
                if let Some(le) = le {
                    write!(f, " le {le}")?;
                }
                write!(f, " (bounds must lie within {min}..={max})")
            }
            ValidationErrorKind::DanglingContinueTarget(target) => {
                write!(f, "continue target {target} does not exist")
            }
            ValidationErrorKind::MalformedMapping(error) => {
                write!(f, "malformed mapping: {error}")
            }
            ValidationErrorKind::AddressFamilyMismatch { expected, found } => {
                write!(f, "expected {expected} but found {found}")
            }
            ValidationErrorKind::UnresolvedReference(reference) => {
                write!(f, "unresolved reference {reference}")
            }
        }
    }
}

// ===== impl EvalError =====

impl EvalError {
    pub fn log(&self) {
        match self {
            EvalError::NotFinalized(chain)
            | EvalError::NoMatchingRule(chain) => {
                warn!(%chain, "{}", self);
            }
            EvalError::EvaluationFault { index, target } => {
                warn!(%index, %target, "{}", self);
            }
            EvalError::ContinueLoop { index } => {
                warn!(%index, "{}", self);
            }
            EvalError::UnresolvedReference { index, reference } => {
                warn!(%index, %reference, "{}", self);
            }
            EvalError::InvalidSetAction { index, key } => {
                warn!(%index, %key, "{}", self);
            }
            EvalError::AddressFamilyMismatch { family, prefix } => {
                warn!(%family, %prefix, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalError::NotFinalized(..) => {
                write!(f, "chain has not been finalized")
            }
            EvalError::EvaluationFault { .. } => {
                write!(f, "continue target vanished after finalization")
            }
            EvalError::NoMatchingRule(..) => {
                write!(f, "no rule matched and no default policy is set")
            }
            EvalError::ContinueLoop { .. } => {
                write!(f, "continue directives form a loop")
            }
            EvalError::UnresolvedReference { .. } => {
                write!(f, "failed to resolve match reference")
            }
            EvalError::InvalidSetAction { .. } => {
                write!(f, "invalid set action value")
            }
            EvalError::AddressFamilyMismatch { .. } => {
                write!(f, "route prefix does not belong to the address family")
            }
        }
    }
}

impl std::error::Error for EvalError {}
