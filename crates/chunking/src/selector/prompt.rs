//! Completion prompt for strategy selection and parsing of its answer.

use super::registry::RegisteredStrategy;
use super::RankedStrategy;
use crate::options::StrategyName;
use crate::selector::features::DocumentFeatures;
use handlebars::Handlebars;
use rechunk_core::ChunkError;
use serde::Deserialize;
use serde_json::json;

pub const SYSTEM_PROMPT: &str =
    "You choose document chunking strategies for a retrieval system. Answer with JSON only.";

const SELECTION_TEMPLATE: &str = r#"Pick the chunking strategy for the document described below.

Document features:
- language: {{features.language_code}}
- domain: {{features.domain}}
- headings: {{features.has_headers}}
- code blocks: {{features.has_code}}
- tables: {{features.has_tables}}
- lists: {{features.has_lists}}
- paragraphs in sample: {{features.paragraph_count}}
- average sentence length: {{sentence_tokens}} tokens
- total tokens: {{features.total_tokens}}

Candidate strategies, best rule-based score first:
{{#each candidates}}
- {{name}} (score {{score}}): {{description}}. Strengths: {{strengths}}.
{{/each}}

Reply with a single JSON object:
{"strategy": "<one candidate name>", "confidence": <number between 0 and 1>, "reasoning": "<one sentence>"}
"#;

/// Render the selection prompt.
pub fn render_selection_prompt(
    features: &DocumentFeatures,
    ranking: &[RankedStrategy],
    candidates: &[RegisteredStrategy],
) -> Result<String, ChunkError> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars
        .register_template_string("selection", SELECTION_TEMPLATE)
        .map_err(|e| ChunkError::SelectionFailure(format!("Failed to register template: {e}")))?;

    let rows: Vec<serde_json::Value> = ranking
        .iter()
        .filter_map(|ranked| {
            let entry = candidates.iter().find(|c| c.name == ranked.name)?;
            Some(json!({
                "name": entry.name,
                "score": format!("{:.2}", ranked.score),
                "description": entry.metadata.description,
                "strengths": entry.metadata.strengths.join(", "),
            }))
        })
        .collect();

    let context = json!({
        "features": features,
        "sentence_tokens": format!("{:.1}", features.avg_sentence_tokens),
        "candidates": rows,
    });

    handlebars
        .render("selection", &context)
        .map_err(|e| ChunkError::SelectionFailure(format!("Failed to render template: {e}")))
}

/// Answer expected from the completion service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompletionAnswer {
    pub strategy: String,
    pub confidence: f32,
    #[serde(default)]
    pub reasoning: String,
}

/// Parse the completion text, tolerating prose or code fences around the
/// JSON object. The strategy must name one of `candidates`.
pub fn parse_answer(
    raw: &str,
    candidates: &[RegisteredStrategy],
) -> Result<CompletionAnswer, ChunkError> {
    let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) else {
        return Err(ChunkError::SelectionFailure(
            "completion answer contains no JSON object".to_string(),
        ));
    };
    if end < start {
        return Err(ChunkError::SelectionFailure(
            "completion answer contains no JSON object".to_string(),
        ));
    }

    let mut answer: CompletionAnswer = serde_json::from_str(&raw[start..=end])
        .map_err(|e| ChunkError::SelectionFailure(format!("malformed completion answer: {e}")))?;

    let name = StrategyName::parse(&answer.strategy);
    let Some(entry) = candidates.iter().find(|c| c.name == name.as_str()) else {
        return Err(ChunkError::SelectionFailure(format!(
            "completion chose unknown strategy '{}'",
            answer.strategy
        )));
    };

    answer.strategy = entry.name.clone();
    answer.confidence = if answer.confidence.is_finite() {
        answer.confidence.clamp(0.0, 1.0)
    } else {
        0.0
    };
    Ok(answer)
}
