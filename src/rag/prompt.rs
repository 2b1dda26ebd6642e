//! Prompt composition.

use crate::config::Prompts;
use std::collections::HashMap;

/// Merge the retrieved context and the user's question into the instruction
/// template. No truncation is applied; an oversized prompt is left for the
/// inference endpoint to reject.
pub fn compose(prompts: &Prompts, context: &str, question: &str) -> String {
    let mut vars = HashMap::new();
    vars.insert("context".to_string(), context.to_string());
    vars.insert("question".to_string(), question.to_string());
    prompts.render_with_custom(&prompts.rag.template, &vars)
}
