//! Structured output contracts
//!
//! Two shapes are exchanged with the model: a reasoning step and a final
//! answer. Each is described once as static data ([`SchemaDescriptor`]) and
//! consumed two ways: encoded as a JSON schema hint for the model, and used to
//! check raw model output before it is deserialized.

#[cfg(test)]
mod proptests;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use thiserror::Error;

/// Title carried by error-shaped results
pub const ERROR_TITLE: &str = "Error";

/// Which structured shape a call expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    ReasoningStep,
    FinalAnswer,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputKind::ReasoningStep => f.write_str("reasoning step"),
            OutputKind::FinalAnswer => f.write_str("final answer"),
        }
    }
}

impl OutputKind {
    /// Name used in user-facing failure text
    pub fn short_name(self) -> &'static str {
        match self {
            OutputKind::ReasoningStep => "step",
            OutputKind::FinalAnswer => "final answer",
        }
    }
}

/// Type constraint of a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    /// A string restricted to the listed values
    Enum(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
}

/// Shape descriptor for one structured output kind. Every field is required.
#[derive(Debug, PartialEq, Eq)]
pub struct SchemaDescriptor {
    pub kind: OutputKind,
    pub fields: &'static [FieldSpec],
}

const NEXT_ACTION_VALUES: &[&str] = &["continue", "final_answer"];

static REASONING_STEP_SCHEMA: SchemaDescriptor = SchemaDescriptor {
    kind: OutputKind::ReasoningStep,
    fields: &[
        FieldSpec {
            name: "title",
            field_type: FieldType::String,
        },
        FieldSpec {
            name: "content",
            field_type: FieldType::String,
        },
        FieldSpec {
            name: "next_action",
            field_type: FieldType::Enum(NEXT_ACTION_VALUES),
        },
    ],
};

static FINAL_ANSWER_SCHEMA: SchemaDescriptor = SchemaDescriptor {
    kind: OutputKind::FinalAnswer,
    fields: &[
        FieldSpec {
            name: "title",
            field_type: FieldType::String,
        },
        FieldSpec {
            name: "content",
            field_type: FieldType::String,
        },
    ],
};

/// Get the descriptor for an output kind
pub fn schema_for(kind: OutputKind) -> &'static SchemaDescriptor {
    match kind {
        OutputKind::ReasoningStep => &REASONING_STEP_SCHEMA,
        OutputKind::FinalAnswer => &FINAL_ANSWER_SCHEMA,
    }
}

impl SchemaDescriptor {
    /// Encode as a JSON schema object suitable as a generation hint
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in self.fields {
            let property = match field.field_type {
                FieldType::String => json!({ "type": "string" }),
                FieldType::Enum(values) => json!({ "type": "string", "enum": values }),
            };
            properties.insert(field.name.to_string(), property);
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": self.field_names().collect::<Vec<_>>(),
            "additionalProperties": false,
        })
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    /// Check a parsed JSON value against this descriptor
    pub fn check(&self, value: &Value) -> Result<(), ValidationError> {
        let object = value.as_object().ok_or(ValidationError::NotAnObject)?;

        for field in self.fields {
            let raw = object
                .get(field.name)
                .ok_or(ValidationError::MissingField(field.name))?;
            let text = raw.as_str().ok_or(ValidationError::WrongType {
                field: field.name,
                expected: "string",
            })?;
            if let FieldType::Enum(allowed) = field.field_type {
                if !allowed.contains(&text) {
                    return Err(ValidationError::InvalidEnumValue {
                        field: field.name,
                        value: text.to_string(),
                        allowed,
                    });
                }
            }
        }

        Ok(())
    }
}

/// Model output did not conform to the required shape
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("response is not well-formed JSON: {0}")]
    Malformed(String),
    #[error("response is not a JSON object")]
    NotAnObject,
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    #[error("field '{field}' must be a {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("field '{field}' has value '{value}', expected one of {allowed:?}")]
    InvalidEnumValue {
        field: &'static str,
        value: String,
        allowed: &'static [&'static str],
    },
}

/// Whether the model wants another step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    Continue,
    FinalAnswer,
}

impl NextAction {
    pub fn as_str(self) -> &'static str {
        match self {
            NextAction::Continue => "continue",
            NextAction::FinalAnswer => "final_answer",
        }
    }
}

/// One intermediate reasoning step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningStep {
    pub title: String,
    pub content: String,
    pub next_action: NextAction,
}

impl ReasoningStep {
    /// Wire-format JSON, as recorded in the conversation log
    pub fn to_wire(&self) -> String {
        json!({
            "title": self.title,
            "content": self.content,
            "next_action": self.next_action.as_str(),
        })
        .to_string()
    }
}

/// Terminal answer; carries no next action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalAnswer {
    pub title: String,
    pub content: String,
}

/// A type that can be produced by a schema-constrained model call
pub trait StructuredOutput: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: OutputKind;

    /// Value standing in for a call that could not produce valid output
    fn error_shaped(message: impl Into<String>) -> Self;

    fn title(&self) -> &str;

    fn content(&self) -> &str;
}

impl StructuredOutput for ReasoningStep {
    const KIND: OutputKind = OutputKind::ReasoningStep;

    fn error_shaped(message: impl Into<String>) -> Self {
        Self {
            title: ERROR_TITLE.to_string(),
            content: message.into(),
            // Forces the reasoning loop to stop
            next_action: NextAction::FinalAnswer,
        }
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn content(&self) -> &str {
        &self.content
    }
}

impl StructuredOutput for FinalAnswer {
    const KIND: OutputKind = OutputKind::FinalAnswer;

    fn error_shaped(message: impl Into<String>) -> Self {
        Self {
            title: ERROR_TITLE.to_string(),
            content: message.into(),
        }
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn content(&self) -> &str {
        &self.content
    }
}

/// Either validated shape, for callers that pick the kind at runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuredValue {
    Step(ReasoningStep),
    Answer(FinalAnswer),
}

impl StructuredValue {
    pub fn kind(&self) -> OutputKind {
        match self {
            StructuredValue::Step(_) => OutputKind::ReasoningStep,
            StructuredValue::Answer(_) => OutputKind::FinalAnswer,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            StructuredValue::Step(step) => &step.title,
            StructuredValue::Answer(answer) => &answer.title,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            StructuredValue::Step(step) => &step.content,
            StructuredValue::Answer(answer) => &answer.content,
        }
    }

    /// Error-shaped value of the given kind
    pub fn error_shaped(kind: OutputKind, message: impl Into<String>) -> Self {
        match kind {
            OutputKind::ReasoningStep => StructuredValue::Step(ReasoningStep::error_shaped(message)),
            OutputKind::FinalAnswer => StructuredValue::Answer(FinalAnswer::error_shaped(message)),
        }
    }
}

/// Parse raw model output as the shape matching `kind`
pub fn validate(raw: &str, kind: OutputKind) -> Result<StructuredValue, ValidationError> {
    match kind {
        OutputKind::ReasoningStep => validate_as::<ReasoningStep>(raw).map(StructuredValue::Step),
        OutputKind::FinalAnswer => validate_as::<FinalAnswer>(raw).map(StructuredValue::Answer),
    }
}

/// Parse raw model output directly into a typed structured value
pub fn validate_as<T: StructuredOutput>(raw: &str) -> Result<T, ValidationError> {
    let value: Value =
        serde_json::from_str(raw.trim()).map_err(|e| ValidationError::Malformed(e.to_string()))?;
    schema_for(T::KIND).check(&value)?;
    serde_json::from_value(value).map_err(|e| ValidationError::Malformed(e.to_string()))
}
