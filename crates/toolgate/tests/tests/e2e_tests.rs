#[path = "e2e/gateway_flow.rs"]
mod gateway_flow;

#[path = "e2e/risk_gating.rs"]
mod risk_gating;

#[path = "e2e/policy_gate.rs"]
mod policy_gate;

#[path = "e2e/collaborators.rs"]
mod collaborators;
