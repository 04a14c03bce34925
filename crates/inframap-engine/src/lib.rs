#![forbid(unsafe_code)]
//! Graph construction, validation rules, and view selection over an
//! in-memory inventory snapshot. All computation is single-threaded and
//! pure; per-asset findings are returned as data, never thrown.

mod graph;
mod placeholder;
mod propagate;
mod rules;
mod select;

pub use graph::{DependencyGraph, DuplicateId, GraphError};
pub use placeholder::resolve_placeholders;
pub use propagate::{propagate, GraphAnnotations, LabelField, TraversalLimits};
pub use rules::{validate, Rule, RuleContext, RuleError, RuleSet, ValidateError};
pub use select::select;

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    Pattern { pattern: String, detail: String },
    TraversalBudget { steps: usize },
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pattern { pattern, detail } => {
                write!(f, "invalid pattern `{pattern}`: {detail}")
            }
            Self::TraversalBudget { steps } => {
                write!(f, "traversal step budget exhausted after {steps} steps")
            }
        }
    }
}

impl std::error::Error for EngineError {}
