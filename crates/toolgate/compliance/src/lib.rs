#![deny(unsafe_code)]
//! # toolgate-compliance
//!
//! Compliance Checker - structural and policy rules evaluated against every
//! invocation intent before any quantitative or policy stage runs.
//!
//! Rules are named, pure, and independent: each reads the intent through
//! [`toolgate_types::IntentView`] and returns one [`ComplianceResult`]. A
//! broken rule is reported as `skipped` instead of failing the whole check.
//!
//! ## Built-in rules
//!
//! | id | blocks | checks |
//! |---|---|---|
//! | `tool_name_convention` | yes | tool name non-empty, `^[a-z][a-z0-9_]*$` |
//! | `actor_present` | no | actor non-empty |
//! | `actor_no_whitespace` | yes | actor has no whitespace |
//! | `params_serializable` | no | parameter nesting within a depth bound |
//! | `tool_deny_list` | yes | tool not on the configured deny-list |
//! | `rate_limit` | no | placeholder, replace with a stateful rule |

pub mod builtin;
pub mod checker;
pub mod rule;

pub use builtin::{
    builtin_rules, ActorPresentRule, ActorWhitespaceRule, ComplianceSettings,
    ParamsSerializableRule, RateLimitRule, ToolDenyListRule, ToolNameConventionRule,
};
pub use checker::{ComplianceChecker, ComplianceReport, ReportSummary, RuleInfo};
pub use rule::{
    ComplianceResult, ComplianceRule, ComplianceStatus, FnRule, ParseSeverityError,
    ParseStatusError, RuleError, Severity, Violation,
};
