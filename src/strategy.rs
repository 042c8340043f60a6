//! Strategic prompt expansion: one brief in, exactly five copy angles out.

use crate::error::PipelineError;
use crate::model::{CreativeBrief, StrategicPrompts, STRATEGIC_PROMPT_COUNT};
use crate::provider::{GenerationClient, GenerationOptions, ResponseSchema};
use crate::retry::{is_retryable, RetryPolicy};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};

pub const RESPONSE_SCHEMA_NAME: &str = "strategic_prompts";

/// Angles used when the backend never produces a valid set.
pub const FALLBACK_PROMPTS: [&str; STRATEGIC_PROMPT_COUNT] = [
    "Create compelling ad copy that highlights the main benefits of the product",
    "Write emotional copy that connects with the target audience's pain points",
    "Develop urgent copy that encourages immediate action",
    "Focus on social proof and testimonials in your ad copy",
    "Emphasize unique selling propositions that differentiate from competitors",
];

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Deserialize)]
struct PromptsPayload {
    prompts: Vec<String>,
}

/// Expansion result with provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyOutcome {
    pub prompts: StrategicPrompts,
    pub attempts: u32,
    pub used_fallback: bool,
}

pub struct StrategicPromptExpander {
    client: Arc<GenerationClient>,
    policy: RetryPolicy,
    options: GenerationOptions,
}

impl StrategicPromptExpander {
    pub fn new(client: Arc<GenerationClient>) -> Self {
        Self {
            client,
            policy: RetryPolicy::with_attempts(DEFAULT_MAX_ATTEMPTS),
            options: GenerationOptions::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Expand `brief` into five angles. Invalid structured output is retried
    /// with the same prompt; once attempts run out the fixed fallback set is
    /// returned. Backend errors propagate untouched.
    #[instrument(skip(self, brief), fields(platform = %brief.platform()))]
    pub async fn expand(&self, brief: &CreativeBrief) -> Result<StrategyOutcome, PipelineError> {
        let prompt = build_prompt(brief);
        let schema = response_schema();

        let outcome = self
            .policy
            .retry_or_fallback(
                "strategic_prompts",
                |_attempt| {
                    let prompt = &prompt;
                    let schema = &schema;
                    async move {
                        let (payload, _raw) = self
                            .client
                            .generate_structured::<PromptsPayload>(prompt, schema, &self.options)
                            .await?;
                        StrategicPrompts::try_from(payload.prompts)
                    }
                },
                is_retryable,
                fallback_prompts,
            )
            .await?;

        info!(
            attempts = outcome.attempts,
            used_fallback = outcome.used_fallback,
            "Strategic prompts ready"
        );
        Ok(StrategyOutcome {
            prompts: outcome.value,
            attempts: outcome.attempts,
            used_fallback: outcome.used_fallback,
        })
    }
}

pub fn fallback_prompts() -> StrategicPrompts {
    StrategicPrompts::from_static(FALLBACK_PROMPTS)
}

pub fn build_prompt(brief: &CreativeBrief) -> String {
    let platform = brief.platform();
    format!(
        "You are an expert marketing strategist. Based on the following campaign brief, \
generate {count} strategic prompts that will be used to create compelling ad copy.

Campaign Brief:
- Product: {product}
- Target Audience: {audience}
- Platform: {platform}

Each prompt should:
1. Be specific and actionable for copywriters
2. Focus on a different angle: emotional, rational, urgency, benefits, differentiation
3. Be designed to generate high-converting ad copy for {platform}
4. Consider the target audience and platform requirements
5. Be between 20-50 words

Return exactly {count} strategic prompts that will help create diverse, effective ad \
variations optimized for {platform}.",
        count = STRATEGIC_PROMPT_COUNT,
        product = brief.product_description(),
        audience = brief.target_audience(),
        platform = platform,
    )
}

pub fn response_schema() -> ResponseSchema {
    ResponseSchema::new(
        RESPONSE_SCHEMA_NAME,
        json!({
            "type": "OBJECT",
            "properties": {
                "prompts": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" },
                    "minItems": STRATEGIC_PROMPT_COUNT,
                    "maxItems": STRATEGIC_PROMPT_COUNT
                }
            },
            "required": ["prompts"]
        }),
    )
}
