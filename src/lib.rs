//! Reasoning chain - step-by-step structured reasoning with a language model
//!
//! Drives a model through a sequence of schema-validated reasoning steps,
//! then asks it for a final answer, streaming progress as it goes.

pub mod llm;
pub mod reasoning;
pub mod render;
pub mod schema;
pub mod session;
pub mod structured;
pub mod system_prompt;

#[cfg(test)]
pub(crate) mod testing;

pub use reasoning::{Progress, Reasoner, ReasoningLimits, StepKind, StepRecord};
pub use schema::{
    schema_for, validate, FinalAnswer, NextAction, OutputKind, ReasoningStep, SchemaDescriptor,
    StructuredValue, ValidationError,
};
pub use structured::{CallFailure, FailureKind, RetryPolicy, StructuredClient, StructuredResult};
