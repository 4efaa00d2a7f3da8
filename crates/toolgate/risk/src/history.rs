use toolgate_dag::EventDag;

/// Penalty added per recorded incident.
pub const INCIDENT_PENALTY: f64 = 0.05;
/// Ceiling on the total history penalty.
pub const MAX_HISTORY_PENALTY: f64 = 0.25;

/// Recorded incidents for one tool.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IncidentHistory {
    pub incidents: usize,
    pub penalty: f64,
}

/// Count error and rollback events recorded against `tool`.
pub fn incident_count(dag: &EventDag, tool: &str) -> usize {
    let mut count = 0;
    dag.for_each_node(|node| {
        if node.tool() == Some(tool) && node.marker().is_some() {
            count += 1;
        }
    });
    count
}

/// `min(INCIDENT_PENALTY * incidents, MAX_HISTORY_PENALTY)`.
pub fn history_penalty(dag: &EventDag, tool: &str) -> IncidentHistory {
    let incidents = incident_count(dag, tool);
    IncidentHistory {
        incidents,
        penalty: (INCIDENT_PENALTY * incidents as f64).min(MAX_HISTORY_PENALTY),
    }
}
