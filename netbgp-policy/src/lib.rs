//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![warn(rust_2018_idioms)]

pub mod catalog;
pub mod chain;
pub mod debug;
pub mod error;
pub mod eval;
pub mod route;
pub mod rule;
pub mod validation;

pub use crate::catalog::{Catalog, Lookup};
pub use crate::chain::{PrefixList, RoutingPolicy, RuleChain, RuleSet};
pub use crate::error::{EvalError, ValidationError};
pub use crate::eval::{Decision, EvalConfig};
pub use crate::route::Route;
pub use crate::rule::{PolicyRule, PrefixListRule, RuleEntry};
