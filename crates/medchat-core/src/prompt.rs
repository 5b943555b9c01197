//! Prompt template with `{context}` and `{question}` placeholders

use crate::{Error, Result};

const CONTEXT: &str = "context";
const QUESTION: &str = "question";

/// Template used when none is configured
pub const DEFAULT_TEMPLATE: &str = "Use the following pieces of information to answer the user's question.
If you don't know the answer, just say that you don't know, don't try to make up an answer.

Context: {context}
Question: {question}

Only return the helpful answer below and nothing else.
Helpful answer:";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Context,
    Question,
}

/// A parsed prompt template.
///
/// Parsing guarantees each placeholder occurs exactly once and that no
/// other `{name}` placeholder is present. Rendering is a single pass over
/// the parsed segments, so substituted text is never scanned again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

impl PromptTemplate {
    pub fn parse(template: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = template;
        let (mut contexts, mut questions) = (0, 0);

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            let Some(close) = after.find('}') else {
                literal.push_str(&rest[open..]);
                rest = "";
                break;
            };

            let name = &after[..close];
            let placeholder = match name {
                CONTEXT => {
                    contexts += 1;
                    Segment::Context
                }
                QUESTION => {
                    questions += 1;
                    Segment::Question
                }
                other if is_identifier(other) => {
                    return Err(Error::Configuration(format!(
                        "prompt template uses unknown placeholder {{{}}}",
                        other
                    )));
                }
                _ => {
                    // Not a placeholder, keep the brace and continue after it
                    literal.push('{');
                    rest = after;
                    continue;
                }
            };

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(placeholder);
            rest = &after[close + 1..];
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        if contexts != 1 || questions != 1 {
            return Err(Error::Configuration(format!(
                "prompt template must contain {{context}} and {{question}} exactly once (found {} and {})",
                contexts, questions
            )));
        }

        Ok(Self { segments })
    }

    /// Fill both placeholders
    pub fn render(&self, context: &str, question: &str) -> String {
        let capacity = self
            .segments
            .iter()
            .map(|s| match s {
                Segment::Literal(text) => text.len(),
                Segment::Context => context.len(),
                Segment::Question => question.len(),
            })
            .sum();

        let mut prompt = String::with_capacity(capacity);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => prompt.push_str(text),
                Segment::Context => prompt.push_str(context),
                Segment::Question => prompt.push_str(question),
            }
        }
        prompt
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        match Self::parse(DEFAULT_TEMPLATE) {
            Ok(template) => template,
            Err(e) => unreachable!("default prompt template is invalid: {e}"),
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Render the default template
pub fn build_prompt(context: &str, question: &str) -> String {
    PromptTemplate::default().render(context, question)
}
