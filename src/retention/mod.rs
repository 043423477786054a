//! Workspace retention rules.
//!
//! ## Contents
//! - [`RetentionRule`], [`RuleStatus`] — the immutable rule model
//! - [`resolve_rules`] — validation and synthesis of a workflow's rule set

mod rules;

pub use rules::{resolve_rules, RetentionRule, RuleStatus};
