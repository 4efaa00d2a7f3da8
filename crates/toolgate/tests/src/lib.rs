//! Shared fixtures for the Toolgate integration suites.

use serde_json::Value;
use toolgate_types::Intent;

/// Gateway config used by the end-to-end suites: compliance, risk and NL
/// policy enabled, `drop_database` pinned high, one ops policy.
pub const GATEWAY_YAML: &str = r#"
stages:
  compliance: true
  risk: true
  nl_policy: true
collaborator_timeout_ms: 500
risk:
  policy:
    tool_risk_overrides:
      drop_database: 0.9
    actor_trust:
      root: 0.0
    max_acceptable_risk: 0.6
compliance:
  tool_deny_list: [format_disk]
dag:
  enabled: true
nl_policies:
  ops: "The intern must not deploy. No agent may drop tables."
"#;

pub fn intent(tool: &str, actor: &str) -> Intent {
    Intent::builder(tool)
        .actor(actor)
        .build()
        .expect("fixture intent is serializable")
}

pub fn intent_with_params(tool: &str, actor: &str, params: &[(&str, Value)]) -> Intent {
    params
        .iter()
        .fold(Intent::builder(tool).actor(actor), |b, (k, v)| b.param(*k, v.clone()))
        .build()
        .expect("fixture intent is serializable")
}
