//! Auto strategy selection.
//!
//! Selection always has a complete rule-based path: document features are
//! matched against each registered strategy's metadata. When a completion
//! service is injected and the analysis budget allows it, the ranking is
//! also sent to the service for a final pick. Any failure on that path
//! lands on the Smart strategy.

pub mod features;
pub mod prompt;
pub mod registry;

pub use features::DocumentFeatures;
pub use registry::{RegisteredStrategy, StrategyHandle, StrategyMetadata, StrategyRegistry};

use crate::cancel::CancellationFlag;
use crate::language::LanguageProfile;
use crate::options::ChunkingOptions;
use crate::types::{RefinedContent, SelectionOutcome, SelectionSource};
use rechunk_core::config::SelectionSection;
use rechunk_core::ChunkError;
use rechunk_llm::{CompletionRequest, CompletionService};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Strategy chosen whenever selection is inconclusive or fails.
pub const FALLBACK_STRATEGY: &str = "smart";

/// Score added per feature tag found in `optimal_for_document_types`.
const TAG_MATCH_BONUS: f32 = 0.15;

/// Score added when a `prefer_speed`/`prefer_quality` hint matches a strength.
const PREFERENCE_BONUS: f32 = 0.3;

/// Top-two gap under which the ranking is considered inconclusive.
const INCONCLUSIVE_MARGIN: f32 = 0.03;

const FALLBACK_CONFIDENCE: f32 = 0.5;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Knobs of the Auto selector.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorSettings {
    /// Consult the completion service when one is available
    pub enabled: bool,
    /// Bound on a single completion call
    pub timeout: Duration,
    /// Completion answers below this confidence are ignored
    pub min_confidence: f32,
    /// Default analysis budget when the options do not set one
    pub max_analysis_time: Duration,
}

impl Default for SelectorSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout: Duration::from_secs(10),
            min_confidence: 0.6,
            max_analysis_time: Duration::from_secs(15),
        }
    }
}

impl From<&SelectionSection> for SelectorSettings {
    fn from(section: &SelectionSection) -> Self {
        let defaults = Self::default();
        Self {
            enabled: section.enabled,
            timeout: Duration::try_from_secs_f64(section.timeout_secs).unwrap_or(defaults.timeout),
            min_confidence: section.min_confidence.clamp(0.0, 1.0),
            max_analysis_time: Duration::try_from_secs_f64(section.max_analysis_time_secs)
                .unwrap_or(defaults.max_analysis_time),
        }
    }
}

/// One row of the rule-based ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedStrategy {
    pub name: String,
    pub score: f32,
    /// Feature tags and preferences that contributed to the score
    pub matched: Vec<String>,
}

/// Score every candidate against the document features, best first.
/// Ties are broken by name so the order is deterministic.
pub fn rank_strategies(
    features: &DocumentFeatures,
    candidates: &[RegisteredStrategy],
    options: &ChunkingOptions,
) -> Vec<RankedStrategy> {
    let tags = features.tags();
    let prefer_speed = options.flag("prefer_speed");
    let prefer_quality = options.flag("prefer_quality");

    let mut ranking: Vec<RankedStrategy> = candidates
        .iter()
        .map(|entry| {
            let metadata = &entry.metadata;
            let mut score = metadata.priority_score;
            let mut matched = Vec::new();

            for tag in &tags {
                if metadata.optimal_for_document_types.iter().any(|t| t == tag) {
                    score += TAG_MATCH_BONUS;
                    matched.push(tag.to_string());
                }
            }
            if prefer_speed && metadata.has_strength("speed") {
                score += PREFERENCE_BONUS;
                matched.push("prefer_speed".to_string());
            }
            if prefer_quality && metadata.has_strength("quality") {
                score += PREFERENCE_BONUS;
                matched.push("prefer_quality".to_string());
            }

            RankedStrategy {
                name: entry.name.clone(),
                score,
                matched,
            }
        })
        .collect();

    ranking.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.name.cmp(&b.name))
    });
    ranking
}

/// Deterministic decision from a ranking alone.
pub fn decide_by_rules(ranking: &[RankedStrategy]) -> SelectionOutcome {
    let Some(top) = ranking.first() else {
        return fallback("no strategies registered to rank");
    };

    let gap = ranking
        .get(1)
        .map_or(top.score, |second| top.score - second.score);

    if gap < INCONCLUSIVE_MARGIN {
        return SelectionOutcome {
            strategy: FALLBACK_STRATEGY.to_string(),
            confidence: FALLBACK_CONFIDENCE,
            reasoning: format!(
                "rule ranking inconclusive ({} {:.2} vs {:.2}); defaulting to {FALLBACK_STRATEGY}",
                top.name,
                top.score,
                top.score - gap
            ),
            source: SelectionSource::Rules,
        };
    }

    let matched = if top.matched.is_empty() {
        "no feature matches".to_string()
    } else {
        format!("matched {}", top.matched.join(", "))
    };
    SelectionOutcome {
        strategy: top.name.clone(),
        confidence: (0.5 + gap).min(0.95),
        reasoning: format!("rule ranking: {} scored {:.2} ({matched})", top.name, top.score),
        source: SelectionSource::Rules,
    }
}

/// Smart, recorded as a recovered selection failure.
fn fallback(reason: &str) -> SelectionOutcome {
    let error = ChunkError::SelectionFailure(reason.to_string());
    tracing::warn!(error = %error, "Falling back to {}", FALLBACK_STRATEGY);
    SelectionOutcome {
        strategy: FALLBACK_STRATEGY.to_string(),
        confidence: FALLBACK_CONFIDENCE,
        reasoning: error.to_string(),
        source: SelectionSource::Fallback,
    }
}

/// Picks a strategy for `StrategyName::Auto`.
#[derive(Clone, Default)]
pub struct AutoSelector {
    service: Option<Arc<dyn CompletionService>>,
    settings: SelectorSettings,
}

impl std::fmt::Debug for AutoSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoSelector")
            .field(
                "service",
                &self.service.as_ref().map(|s| s.provider_name().to_string()),
            )
            .field("settings", &self.settings)
            .finish()
    }
}

impl AutoSelector {
    /// Selector without a completion service.
    pub fn rules_only() -> Self {
        Self::default()
    }

    pub fn new(service: Option<Arc<dyn CompletionService>>, settings: SelectorSettings) -> Self {
        Self { service, settings }
    }

    pub fn has_service(&self) -> bool {
        self.service.is_some()
    }

    pub fn settings(&self) -> &SelectorSettings {
        &self.settings
    }

    /// Rule-based selection only. Never blocks.
    pub fn select_by_rules(
        &self,
        content: &RefinedContent,
        profile: &LanguageProfile,
        registry: &StrategyRegistry,
        options: &ChunkingOptions,
    ) -> SelectionOutcome {
        let candidates = registry.snapshot();
        let features = DocumentFeatures::extract(content, profile);
        let ranking = rank_strategies(&features, &candidates, options);
        decide_by_rules(&ranking)
    }

    /// Full selection, consulting the completion service when one is set.
    ///
    /// Only cancellation is reported as an error; every other failure
    /// becomes a fallback outcome.
    pub async fn select(
        &self,
        content: &RefinedContent,
        profile: &LanguageProfile,
        registry: &StrategyRegistry,
        options: &ChunkingOptions,
        cancel: &CancellationFlag,
    ) -> Result<SelectionOutcome, ChunkError> {
        let started = Instant::now();
        let candidates = registry.snapshot();
        let features = DocumentFeatures::extract(content, profile);
        let ranking = rank_strategies(&features, &candidates, options);
        let rules = decide_by_rules(&ranking);
        tracing::debug!(
            strategy = %rules.strategy,
            confidence = rules.confidence,
            candidates = candidates.len(),
            "Rule-based ranking complete"
        );

        let Some(service) = self.service.as_ref().filter(|_| self.settings.enabled) else {
            return Ok(rules);
        };
        if candidates.is_empty() {
            return Ok(rules);
        }

        let budget = options
            .max_analysis_time()
            .unwrap_or(self.settings.max_analysis_time);
        let remaining = budget.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            return Ok(fallback("analysis time budget exhausted before completion call"));
        }

        let prompt = match prompt::render_selection_prompt(&features, &ranking, &candidates) {
            Ok(prompt) => prompt,
            Err(error) => return Ok(fallback(&error.to_string())),
        };
        let request = CompletionRequest::new(prompt, service.default_model())
            .with_system(prompt::SYSTEM_PROMPT)
            .with_temperature(0.0)
            .with_max_tokens(256)
            .with_json_mode();

        let limit = remaining.min(self.settings.timeout);
        tracing::debug!(
            provider = service.provider_name(),
            timeout_ms = limit.as_millis() as u64,
            "Consulting completion service"
        );

        let response = tokio::select! {
            result = tokio::time::timeout(limit, service.complete(&request)) => result,
            _ = wait_cancelled(cancel) => return Err(ChunkError::Cancelled),
        };

        let response = match response {
            Ok(Ok(response)) => response,
            Ok(Err(error)) => return Ok(fallback(&format!("completion call failed: {error}"))),
            Err(_) => {
                return Ok(fallback(&format!(
                    "completion call timed out after {} ms",
                    limit.as_millis()
                )))
            }
        };

        let answer = match prompt::parse_answer(&response.content, &candidates) {
            Ok(answer) => answer,
            Err(error) => return Ok(fallback(&error.to_string())),
        };

        if answer.confidence < self.settings.min_confidence {
            tracing::debug!(
                strategy = %answer.strategy,
                confidence = answer.confidence,
                "Completion answer below confidence threshold"
            );
            let mut outcome = rules;
            outcome.reasoning = format!(
                "{}; completion suggested {} at confidence {:.2}, below {:.2}",
                outcome.reasoning, answer.strategy, answer.confidence, self.settings.min_confidence
            );
            return Ok(outcome);
        }

        Ok(SelectionOutcome {
            strategy: answer.strategy,
            confidence: answer.confidence,
            reasoning: answer.reasoning,
            source: SelectionSource::Completion,
        })
    }
}

async fn wait_cancelled(cancel: &CancellationFlag) {
    while !cancel.is_cancelled() {
        tokio::time::sleep(CANCEL_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::get_profile;
    use rechunk_core::{AppError, AppResult};
    use rechunk_llm::CompletionResponse;
    use serde_json::json;

    struct Answering(&'static str);

    #[async_trait::async_trait]
    impl CompletionService for Answering {
        fn provider_name(&self) -> &str {
            "stub"
        }

        fn default_model(&self) -> &str {
            "stub-model"
        }

        async fn complete(&self, request: &CompletionRequest) -> AppResult<CompletionResponse> {
            assert!(request.json_mode);
            Ok(CompletionResponse {
                content: self.0.to_string(),
                model: request.model.clone(),
                usage: Default::default(),
            })
        }
    }

    struct Sleeping;

    #[async_trait::async_trait]
    impl CompletionService for Sleeping {
        fn provider_name(&self) -> &str {
            "sleeping"
        }

        fn default_model(&self) -> &str {
            "stub-model"
        }

        async fn complete(&self, _request: &CompletionRequest) -> AppResult<CompletionResponse> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Err(AppError::Llm("unreachable".into()))
        }
    }

    struct Failing;

    #[async_trait::async_trait]
    impl CompletionService for Failing {
        fn provider_name(&self) -> &str {
            "failing"
        }

        fn default_model(&self) -> &str {
            "stub-model"
        }

        async fn complete(&self, _request: &CompletionRequest) -> AppResult<CompletionResponse> {
            Err(AppError::Llm("connection refused".into()))
        }
    }

    fn narrative() -> RefinedContent {
        RefinedContent::new(
            "We walked to the river.\n\nThe boats drifted past slowly.\n\nEvening came.",
        )
    }

    fn markdown() -> RefinedContent {
        RefinedContent::new(
            "# Setup\n\nInstall the server.\n\n```sh\ncargo install rechunk\n```\n\n| a | b |\n|---|---|\n| 1 | 2 |\n",
        )
    }

    fn selector(service: impl CompletionService + 'static) -> AutoSelector {
        AutoSelector::new(
            Some(Arc::new(service)),
            SelectorSettings {
                timeout: Duration::from_millis(50),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_rules_pick_intelligent_for_markdown() {
        let outcome = AutoSelector::rules_only().select_by_rules(
            &markdown(),
            get_profile("en"),
            &StrategyRegistry::with_builtins(),
            &ChunkingOptions::default(),
        );
        assert_eq!(outcome.strategy, "intelligent");
        assert_eq!(outcome.source, SelectionSource::Rules);
        assert!(outcome.confidence > 0.5);
    }

    #[test]
    fn test_rules_pick_smart_for_narrative() {
        let outcome = AutoSelector::rules_only().select_by_rules(
            &narrative(),
            get_profile("en"),
            &StrategyRegistry::with_builtins(),
            &ChunkingOptions::default(),
        );
        assert_eq!(outcome.strategy, "smart");
    }

    #[test]
    fn test_prefer_speed_biases_ranking() {
        let options = ChunkingOptions::default().with_strategy_option("prefer_speed", json!(true));
        let features = DocumentFeatures::extract(&narrative(), get_profile("en"));
        let ranking = rank_strategies(
            &features,
            &StrategyRegistry::with_builtins().snapshot(),
            &options,
        );
        assert_eq!(ranking[0].name, "paragraph");
        assert!(ranking[0].matched.contains(&"prefer_speed".to_string()));
    }

    #[test]
    fn test_inconclusive_ranking_defaults_to_smart() {
        let ranking = vec![
            RankedStrategy {
                name: "paragraph".into(),
                score: 0.70,
                matched: Vec::new(),
            },
            RankedStrategy {
                name: "fixed_size".into(),
                score: 0.69,
                matched: Vec::new(),
            },
        ];
        let outcome = decide_by_rules(&ranking);
        assert_eq!(outcome.strategy, "smart");
        assert_eq!(outcome.source, SelectionSource::Rules);

        let empty = decide_by_rules(&[]);
        assert_eq!(empty.strategy, "smart");
        assert_eq!(empty.source, SelectionSource::Fallback);
    }

    #[tokio::test]
    async fn test_completion_answer_is_used() {
        let selector = selector(Answering(
            r#"{"strategy": "semantic", "confidence": 0.9, "reasoning": "short narrative"}"#,
        ));
        let outcome = selector
            .select(
                &narrative(),
                get_profile("en"),
                &StrategyRegistry::with_builtins(),
                &ChunkingOptions::default(),
                &CancellationFlag::new(),
            )
            .await
            .unwrap();
        assert_eq!(outcome.strategy, "semantic");
        assert_eq!(outcome.source, SelectionSource::Completion);
        assert_eq!(outcome.reasoning, "short narrative");
    }

    #[tokio::test]
    async fn test_low_confidence_answer_uses_rules() {
        let selector = selector(Answering(r#"{"strategy": "fixed_size", "confidence": 0.2}"#));
        let outcome = selector
            .select(
                &markdown(),
                get_profile("en"),
                &StrategyRegistry::with_builtins(),
                &ChunkingOptions::default(),
                &CancellationFlag::new(),
            )
            .await
            .unwrap();
        assert_eq!(outcome.strategy, "intelligent");
        assert_eq!(outcome.source, SelectionSource::Rules);
        assert!(outcome.reasoning.contains("below"));
    }

    #[tokio::test]
    async fn test_timeout_falls_back_to_smart() {
        let outcome = selector(Sleeping)
            .select(
                &markdown(),
                get_profile("en"),
                &StrategyRegistry::with_builtins(),
                &ChunkingOptions::default(),
                &CancellationFlag::new(),
            )
            .await
            .unwrap();
        assert_eq!(outcome.strategy, "smart");
        assert_eq!(outcome.source, SelectionSource::Fallback);
        assert!(outcome.reasoning.contains("timed out"));
    }

    #[tokio::test]
    async fn test_service_error_and_garbage_fall_back() {
        for selector in [selector(Failing), selector(Answering("I like paragraphs"))] {
            let outcome = selector
                .select(
                    &narrative(),
                    get_profile("en"),
                    &StrategyRegistry::with_builtins(),
                    &ChunkingOptions::default(),
                    &CancellationFlag::new(),
                )
                .await
                .unwrap();
            assert_eq!(outcome.strategy, "smart");
            assert_eq!(outcome.source, SelectionSource::Fallback);
        }
    }

    #[tokio::test]
    async fn test_exhausted_budget_skips_the_call() {
        let options = ChunkingOptions::default()
            .with_strategy_option(crate::options::MAX_ANALYSIS_TIME_KEY, json!(0));
        let outcome = selector(Answering(r#"{"strategy": "paragraph", "confidence": 1.0}"#))
            .select(
                &markdown(),
                get_profile("en"),
                &StrategyRegistry::with_builtins(),
                &options,
                &CancellationFlag::new(),
            )
            .await
            .unwrap();
        assert_eq!(outcome.source, SelectionSource::Fallback);
        assert_eq!(outcome.strategy, "smart");
    }

    #[tokio::test]
    async fn test_cancel_interrupts_completion_call() {
        let selector = AutoSelector::new(Some(Arc::new(Sleeping)), SelectorSettings::default());
        let cancel = CancellationFlag::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            trigger.cancel();
        });

        let result = selector
            .select(
                &narrative(),
                get_profile("en"),
                &StrategyRegistry::with_builtins(),
                &ChunkingOptions::default(),
                &cancel,
            )
            .await;
        assert_eq!(result, Err(ChunkError::Cancelled));
    }

    #[test]
    fn test_settings_from_config_section() {
        let section = SelectionSection {
            enabled: false,
            timeout_secs: 2.5,
            min_confidence: 0.7,
            max_analysis_time_secs: -1.0,
        };
        let settings = SelectorSettings::from(&section);
        assert!(!settings.enabled);
        assert_eq!(settings.timeout, Duration::from_millis(2500));
        assert_eq!(settings.max_analysis_time, Duration::from_secs(15));
    }
}
