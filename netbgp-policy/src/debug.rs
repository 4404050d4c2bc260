//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use netbgp_utils::policy::Action;
use tracing::{debug, debug_span};

// Policy debug messages.
#[derive(Debug)]
pub enum Debug<'a> {
    RuleAdd(&'a str, u32),
    RuleReplace(&'a str, u32),
    RuleRemove(&'a str, u32),
    ChainFinalize(&'a str, usize),
    ChainFinalizeFail(&'a str, usize),
    EvalStart(&'a str, u64),
    EvalStaleSnapshot(&'a str, u64, u64),
    RuleMatch(u32, Action),
    RuleNoMatch(u32),
    ContinueNext(u32),
    ContinueJump(u32, u32),
    DefaultPolicy(&'a str, Action),
}

// ===== impl Debug =====

impl Debug<'_> {
    // Log debug message using the tracing API.
    pub(crate) fn log(&self) {
        match self {
            Debug::RuleAdd(chain, index)
            | Debug::RuleReplace(chain, index)
            | Debug::RuleRemove(chain, index) => {
                debug_span!("chain", name = %chain).in_scope(|| {
                    debug!(%index, "{}", self);
                });
            }
            Debug::ChainFinalize(chain, rules) => {
                debug_span!("chain", name = %chain).in_scope(|| {
                    debug!(%rules, "{}", self);
                });
            }
            Debug::ChainFinalizeFail(chain, errors) => {
                debug_span!("chain", name = %chain).in_scope(|| {
                    debug!(%errors, "{}", self);
                });
            }
            Debug::EvalStart(chain, generation) => {
                debug_span!("chain", name = %chain).in_scope(|| {
                    debug!(%generation, "{}", self);
                });
            }
            Debug::EvalStaleSnapshot(chain, finalized, current) => {
                debug_span!("chain", name = %chain).in_scope(|| {
                    debug!(%finalized, %current, "{}", self);
                });
            }
            Debug::RuleMatch(index, action) => {
                // Parent span(s): evaluation
                debug!(%index, %action, "{}", self);
            }
            Debug::RuleNoMatch(index) | Debug::ContinueNext(index) => {
                // Parent span(s): evaluation
                debug!(%index, "{}", self);
            }
            Debug::ContinueJump(index, target) => {
                // Parent span(s): evaluation
                debug!(%index, %target, "{}", self);
            }
            Debug::DefaultPolicy(chain, action) => {
                // Parent span(s): evaluation
                debug!(%chain, %action, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::RuleAdd(..) => {
                write!(f, "rule added")
            }
            Debug::RuleReplace(..) => {
                write!(f, "rule replaced")
            }
            Debug::RuleRemove(..) => {
                write!(f, "rule removed")
            }
            Debug::ChainFinalize(..) => {
                write!(f, "chain finalized")
            }
            Debug::ChainFinalizeFail(..) => {
                write!(f, "chain failed validation")
            }
            Debug::EvalStart(..) => {
                write!(f, "evaluating chain")
            }
            Debug::EvalStaleSnapshot(..) => {
                write!(f, "chain modified since last finalization")
            }
            Debug::RuleMatch(..) => {
                write!(f, "rule matched")
            }
            Debug::RuleNoMatch(..) => {
                write!(f, "rule did not match")
            }
            Debug::ContinueNext(..) => {
                write!(f, "continuing to next rule")
            }
            Debug::ContinueJump(..) => {
                write!(f, "jumping to continue target")
            }
            Debug::DefaultPolicy(..) => {
                write!(f, "chain exhausted, applying default policy")
            }
        }
    }
}
