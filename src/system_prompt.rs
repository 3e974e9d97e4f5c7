//! Fixed prompts for the reasoning protocol

use crate::schema::{FieldType, SchemaDescriptor};

/// Persona and reasoning-strategy directives seeding every run
pub const REASONING_SYSTEM_PROMPT: &str = "You are an expert AI assistant that explains your reasoning step by step. \
For each step, provide a title that describes what you are doing in that step, along with the content. \
Decide whether you need another step or are ready to give the final answer. \
Respond with a JSON object with the keys 'title', 'content' and 'next_action' ('continue' or 'final_answer').

Use as many reasoning steps as possible, and at least 3. \
Be aware of your limitations as a language model and of what you can and cannot do. \
In your reasoning, explore alternative answers. \
Consider that you may be wrong, and if so, where the error in your reasoning would be. \
Fully test all other possibilities. \
When you say you are re-examining, actually re-examine using a different approach; do not merely claim to. \
Use at least 3 methods to derive the answer.";

/// Assistant turn inserted after the user prompt
pub const ACKNOWLEDGEMENT: &str = "Thank you! I will now think step by step following my instructions, \
starting at the beginning after decomposing the problem.";

/// User turn that opens the final-answer phase
pub const FINAL_ANSWER_REQUEST: &str =
    "Please provide the final answer based solely on your reasoning above. \
Respond with a JSON object with the keys 'title' and 'content'.";

/// System message sent after a response failed validation
pub fn corrective_message(schema: &SchemaDescriptor) -> String {
    let fields = schema
        .fields
        .iter()
        .map(|field| match field.field_type {
            FieldType::String => format!("'{}' (string)", field.name),
            FieldType::Enum(values) => format!("'{}' (one of: {})", field.name, values.join(", ")),
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Your previous response did not match the required JSON schema for a {}. \
Respond again with a single JSON object containing exactly these fields: {fields}.",
        schema.kind
    )
}
