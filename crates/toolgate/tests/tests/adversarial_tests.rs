#[path = "adversarial/bypass_gate.rs"]
mod bypass_gate;

#[path = "adversarial/forge_events.rs"]
mod forge_events;
