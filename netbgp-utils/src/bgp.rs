//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! BGP definitions shared by the policy and peering crates.

use std::str::FromStr;

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};

// Identifier of a community record in the host's record set.
pub type CommunityId = u32;

// Maximum length of a community description.
pub const COMMUNITY_DESCR_MAX_LEN: usize = 200;

// Standard BGP community (RFC 1997).
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct Comm(pub u32);

// BGP Well-known Communities.
//
// IANA registry:
// https://www.iana.org/assignments/bgp-well-known-communities/bgp-well-known-communities.xhtml
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(FromPrimitive)]
#[repr(u32)]
pub enum WellKnownCommunities {
    GracefulShutdown = 0xFFFF0000,
    AcceptOwn = 0xFFFF0001,
    LlgrStale = 0xFFFF0006,
    NoLlgr = 0xFFFF0007,
    Blackhole = 0xFFFF029A,
    NoExport = 0xFFFFFF01,
    NoAdvertise = 0xFFFFFF02,
    NoExportSubconfed = 0xFFFFFF03,
    NoPeer = 0xFFFFFF04,
}

#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunityStatus {
    #[default]
    Active,
    Available,
    Reserved,
    Deprecated,
}

// BGP route origin.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Igp,
    Egp,
    Incomplete,
}

// Community record, used as a match target by routing policies.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Community {
    pub id: CommunityId,
    // Community value, either `ASN:NN` or a well-known token.
    pub value: String,
    #[serde(default)]
    pub status: CommunityStatus,
    #[serde(default)]
    pub tenant: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CommParseError {
    Empty,
    MissingSeparator(String),
    InvalidAsn(String),
    InvalidValue(String),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CommunityError {
    InvalidValue(CommParseError),
    DescriptionTooLong(usize),
}

// ===== impl Comm =====

impl Comm {
    pub fn new(asn: u16, value: u16) -> Comm {
        Comm(((asn as u32) << 16) | value as u32)
    }

    pub fn asn(&self) -> u16 {
        (self.0 >> 16) as u16
    }

    pub fn value(&self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }
}

impl std::fmt::Display for Comm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match WellKnownCommunities::from_u32(self.0) {
            Some(wkc) => write!(f, "{wkc}"),
            None => write!(f, "{}:{}", self.asn(), self.value()),
        }
    }
}

impl FromStr for Comm {
    type Err = CommParseError;

    fn from_str(s: &str) -> Result<Comm, CommParseError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CommParseError::Empty);
        }
        if let Some(wkc) = WellKnownCommunities::from_token(s) {
            return Ok(Comm(wkc as u32));
        }

        let (asn, value) = s
            .split_once(':')
            .ok_or_else(|| CommParseError::MissingSeparator(s.to_owned()))?;
        let asn = asn
            .parse::<u16>()
            .map_err(|_| CommParseError::InvalidAsn(asn.to_owned()))?;
        let value = value
            .parse::<u16>()
            .map_err(|_| CommParseError::InvalidValue(value.to_owned()))?;
        Ok(Comm::new(asn, value))
    }
}

impl TryFrom<String> for Comm {
    type Error = CommParseError;

    fn try_from(s: String) -> Result<Comm, CommParseError> {
        s.parse()
    }
}

impl From<Comm> for String {
    fn from(comm: Comm) -> String {
        comm.to_string()
    }
}

// ===== impl WellKnownCommunities =====

impl WellKnownCommunities {
    fn from_token(token: &str) -> Option<WellKnownCommunities> {
        let wkc = match token.to_ascii_lowercase().as_str() {
            "graceful-shutdown" => WellKnownCommunities::GracefulShutdown,
            "accept-own" => WellKnownCommunities::AcceptOwn,
            "llgr-stale" => WellKnownCommunities::LlgrStale,
            "no-llgr" => WellKnownCommunities::NoLlgr,
            "blackhole" => WellKnownCommunities::Blackhole,
            "no-export" => WellKnownCommunities::NoExport,
            "no-advertise" => WellKnownCommunities::NoAdvertise,
            "no-export-subconfed" | "local-as" => {
                WellKnownCommunities::NoExportSubconfed
            }
            "no-peer" => WellKnownCommunities::NoPeer,
            _ => return None,
        };
        Some(wkc)
    }
}

impl std::fmt::Display for WellKnownCommunities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let token = match self {
            WellKnownCommunities::GracefulShutdown => "graceful-shutdown",
            WellKnownCommunities::AcceptOwn => "accept-own",
            WellKnownCommunities::LlgrStale => "llgr-stale",
            WellKnownCommunities::NoLlgr => "no-llgr",
            WellKnownCommunities::Blackhole => "blackhole",
            WellKnownCommunities::NoExport => "no-export",
            WellKnownCommunities::NoAdvertise => "no-advertise",
            WellKnownCommunities::NoExportSubconfed => "no-export-subconfed",
            WellKnownCommunities::NoPeer => "no-peer",
        };
        write!(f, "{token}")
    }
}

// ===== impl Origin =====

impl FromStr for Origin {
    type Err = ();

    fn from_str(s: &str) -> Result<Origin, ()> {
        match s.to_ascii_lowercase().as_str() {
            "igp" => Ok(Origin::Igp),
            "egp" => Ok(Origin::Egp),
            "incomplete" | "?" => Ok(Origin::Incomplete),
            _ => Err(()),
        }
    }
}

// ===== impl Community =====

impl Community {
    pub fn new(id: CommunityId, value: impl Into<String>) -> Community {
        Community {
            id,
            value: value.into(),
            status: Default::default(),
            tenant: None,
            description: String::new(),
        }
    }

    // Returns the parsed community value.
    pub fn comm(&self) -> Result<Comm, CommParseError> {
        self.value.parse()
    }

    pub fn validate(&self) -> Result<(), CommunityError> {
        self.comm().map_err(CommunityError::InvalidValue)?;

        let len = self.description.chars().count();
        if len > COMMUNITY_DESCR_MAX_LEN {
            return Err(CommunityError::DescriptionTooLong(len));
        }

        Ok(())
    }
}

// ===== impl CommParseError =====

impl std::fmt::Display for CommParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommParseError::Empty => {
                write!(f, "empty community value")
            }
            CommParseError::MissingSeparator(s) => {
                write!(f, "community {s:?} is not in ASN:NN format")
            }
            CommParseError::InvalidAsn(s) => {
                write!(f, "invalid community ASN {s:?}")
            }
            CommParseError::InvalidValue(s) => {
                write!(f, "invalid community value {s:?}")
            }
        }
    }
}

impl std::error::Error for CommParseError {}

// ===== impl CommunityError =====

impl std::fmt::Display for CommunityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommunityError::InvalidValue(error) => error.fmt(f),
            CommunityError::DescriptionTooLong(len) => {
                write!(
                    f,
                    "description has {len} characters (maximum is {COMMUNITY_DESCR_MAX_LEN})"
                )
            }
        }
    }
}

impl std::error::Error for CommunityError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommunityError::InvalidValue(error) => Some(error),
            _ => None,
        }
    }
}

// ===== unit tests =====
