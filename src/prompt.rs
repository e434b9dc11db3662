//! Prompt assembly for the downstream language-model call.
//!
//! A template holds a system message and an input template with
//! `{{FACTS}}` and `{{QUESTION}}` placeholders, plus optional few-shot
//! examples. Rendering a [`GroundingContext`] produces the role-tagged
//! message list the LLM caller sends verbatim; seshat itself never talks
//! to the model.

use serde::{Deserialize, Serialize};

use crate::error::{PromptError, PromptResult};
use crate::pipeline::GroundingContext;

/// A role-tagged chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "system", "user", or "assistant".
    pub role: String,
    /// Message content.
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: String) -> Self {
        Self {
            role: role.to_string(),
            content,
        }
    }
}

/// One worked example for few-shot prompting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FewShotExample {
    pub question: String,
    #[serde(default)]
    pub facts: Vec<String>,
    pub output: String,
}

/// A grounding prompt template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// The system message, sent as-is.
    pub system: String,
    /// User-turn template; `{{FACTS}}` and `{{QUESTION}}` are substituted.
    pub input_template: String,
    /// Worked examples, included when rendering with `few_shot`.
    #[serde(default)]
    pub few_shot: Vec<FewShotExample>,
}

impl PromptTemplate {
    /// The built-in knowledge-augmented QA template.
    pub fn knowledge_qa() -> Self {
        Self {
            system: "You are a question answering assistant. Use the provided \
                     facts when they are relevant, and answer concisely."
                .into(),
            input_template: "Below are facts in the form of triples meaningful \
                             to answer the question.\n{{FACTS}}\n\nQuestion: \
                             {{QUESTION}}\nAnswer:"
                .into(),
            few_shot: Vec::new(),
        }
    }

    /// Load a template from a TOML file.
    pub fn load(path: &std::path::Path) -> PromptResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PromptError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| PromptError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Render a grounding context into the message list for the LLM call.
    ///
    /// With `few_shot`, each example contributes a user/assistant pair
    /// between the system message and the real question.
    pub fn render(&self, context: &GroundingContext, few_shot: bool) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::new("system", self.system.clone())];

        if few_shot {
            for example in &self.few_shot {
                messages.push(ChatMessage::new(
                    "user",
                    self.format_input(&example.facts, &example.question),
                ));
                messages.push(ChatMessage::new("assistant", example.output.clone()));
            }
        }

        messages.push(ChatMessage::new(
            "user",
            self.format_input(&context.facts, &context.question),
        ));
        messages
    }

    /// Substitute `{{FACTS}}` (one fact per line) and `{{QUESTION}}`.
    /// Other placeholders pass through untouched.
    fn format_input(&self, facts: &[String], question: &str) -> String {
        self.input_template
            .replace("{{FACTS}}", &facts.join("\n"))
            .replace("{{QUESTION}}", question)
    }
}
