#[path = "property/dag_properties.rs"]
mod dag_properties;

#[path = "property/risk_properties.rs"]
mod risk_properties;

#[path = "property/nl_policy_properties.rs"]
mod nl_policy_properties;
