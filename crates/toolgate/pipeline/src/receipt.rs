use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use toolgate_types::{cid_of, Cid, CidError, Intent};

/// Proof that an allowed invocation ran, content-addressed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReceipt {
    /// Digest of the intent, output, decision and correlation CIDs.
    pub receipt_cid: Cid,
    pub intent_cid: Cid,
    /// Digest of the tool result, or of the error text on failure.
    pub output_cid: Cid,
    /// Digest of the execution outcome (success or error) for this intent.
    pub decision_cid: Cid,
    /// Equal to the intent CID.
    pub correlation_id: Cid,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Event appended to the attached DAG, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_cid: Option<Cid>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct ErrorOutput<'a> {
    error: &'a str,
}

#[derive(Serialize)]
struct ExecutionDecision<'a> {
    intent_cid: &'a Cid,
    outcome: &'static str,
}

#[derive(Serialize)]
struct ReceiptBody<'a> {
    intent_cid: &'a Cid,
    output_cid: &'a Cid,
    decision_cid: &'a Cid,
    correlation_id: &'a Cid,
}

impl ExecutionReceipt {
    /// Build the receipt for one execution. Deterministic in its CIDs.
    pub fn build(intent: &Intent, output: &Value, error: Option<&str>) -> Result<Self, CidError> {
        let intent_cid = intent.cid();
        let output_cid = match error {
            Some(error) => cid_of(&ErrorOutput { error })?,
            None => cid_of(output)?,
        };
        let decision_cid = cid_of(&ExecutionDecision {
            intent_cid: &intent_cid,
            outcome: if error.is_some() { "error" } else { "success" },
        })?;
        let correlation_id = intent_cid;
        let receipt_cid = cid_of(&ReceiptBody {
            intent_cid: &intent_cid,
            output_cid: &output_cid,
            decision_cid: &decision_cid,
            correlation_id: &correlation_id,
        })?;

        Ok(Self {
            receipt_cid,
            intent_cid,
            output_cid,
            decision_cid,
            correlation_id,
            success: error.is_none(),
            error: error.map(str::to_string),
            event_cid: None,
            recorded_at: Utc::now(),
        })
    }
}
