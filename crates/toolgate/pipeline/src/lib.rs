#![deny(unsafe_code)]
//! # toolgate-pipeline
//!
//! Dispatch Pipeline - the ordered, short-circuiting composition of gate
//! stages every tool invocation passes before it may execute.
//!
//! ## Stages
//!
//! 1. **Compliance** - structural rules; denies on any `non_compliant` rule
//! 2. **Risk** - quantitative score against the acceptable maximum
//! 3. **Delegation** - capability-delegation chain, opt-in per invocation
//! 4. **Policy** - temporal deontic policy evaluator
//! 5. **NL Policy** - prohibition-first natural-language policy gate
//!
//! Disabled stages record nothing. The first failing stage stops the run;
//! if every run stage passes a synthetic `pass` outcome is appended. An
//! enabled stage whose collaborator is missing or reports itself
//! unavailable passes with an "unavailable" reason; a collaborator that
//! times out fails its stage.
//!
//! After execution, [`DispatchPipeline::record_execution`] issues a
//! content-addressed [`ExecutionReceipt`] and appends a causal-root event to
//! the attached [`toolgate_dag::EventDag`], if any.

pub mod admin;
pub mod config;
pub mod context;
pub mod error;
pub mod mocks;
pub mod pipeline;
pub mod receipt;
pub mod stages;
pub mod traits;

pub use admin::GatewayAdmin;
pub use config::{DagSettings, GatewayConfig, RiskSettings, StageToggles};
pub use context::{
    CheckContext, DelegationAnchor, GateContext, ParseStageIdError, StageId, StageOutcome,
};
pub use error::{CollaboratorError, ConfigError, PipelineError};
pub use mocks::{StaticDelegationEvaluator, StaticTemporalPolicyEvaluator};
pub use pipeline::{
    DecisionRecord, DispatchPipeline, PipelineConfig, PipelineResult, DEFAULT_COLLABORATOR_TIMEOUT,
};
pub use receipt::ExecutionReceipt;
pub use stages::{ComplianceStage, DelegationStage, NlPolicyStage, PolicyStage, RiskStage};
pub use traits::{
    DelegationCheck, DelegationEvaluator, DelegationRequest, GateStage, TemporalDecision,
    TemporalPolicyEvaluator,
};
