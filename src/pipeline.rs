use crate::config::ModelConfig;
use crate::llm::{ModelClient, ModelError};
use crate::models::{GenerationOutput, GenerationRequest, Mode};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

pub const EXPANDER_INSTRUCTION: &str = "You are a prompt expander. The user will give you a short description of a website idea. \
Don't include any specific HTML function; act as if you don't know HTML at all. \
Rewrite it into a longer, detailed prompt for a website generator. Be creative, around 150 to 200 characters; \
you may add information if the idea is too short to reach that. \
Make sure the described site is complete, with no loading screen unless that loading screen fully works. \
Output only the expanded prompt.";

pub const GENERATOR_INSTRUCTION: &str = "You are a professional web designer. Generate complete HTML and CSS.";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Please enter a website description.")]
    EmptyPrompt,
    #[error("expanding prompt failed: {0}")]
    Expansion(#[source] ModelError),
    #[error("generating markup failed: {0}")]
    Generation(#[source] ModelError),
}

/// Rewrites a short idea into a longer design brief.
pub struct PromptExpander {
    client: Arc<dyn ModelClient>,
    model: String,
    temperature: f32,
}

impl PromptExpander {
    pub fn new(client: Arc<dyn ModelClient>, model: impl Into<String>, temperature: f32) -> Self {
        Self { client, model: model.into(), temperature }
    }

    pub async fn expand(&self, raw_prompt: &str) -> Result<String, ModelError> {
        let expanded = self.client
            .invoke(&self.model, EXPANDER_INSTRUCTION, raw_prompt, self.temperature)
            .await?;
        Ok(expanded.trim().to_string())
    }
}

/// Turns a prompt into final markup, returned verbatim.
pub struct CodeGenerator {
    client: Arc<dyn ModelClient>,
    model: String,
    temperature: f32,
}

impl CodeGenerator {
    pub fn new(client: Arc<dyn ModelClient>, model: impl Into<String>, temperature: f32) -> Self {
        Self { client, model: model.into(), temperature }
    }

    pub async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        self.client
            .invoke(&self.model, GENERATOR_INSTRUCTION, prompt, self.temperature)
            .await
    }
}

pub struct Pipeline {
    expander: PromptExpander,
    generator: CodeGenerator,
}

impl Pipeline {
    pub fn new(expander: PromptExpander, generator: CodeGenerator) -> Self {
        Self { expander, generator }
    }

    /// Wires both stages to one client using the configured models and temperatures.
    pub fn from_config(client: Arc<dyn ModelClient>, config: &ModelConfig) -> Self {
        Self::new(
            PromptExpander::new(client.clone(), config.expander_model.clone(), config.expander_temperature),
            CodeGenerator::new(client, config.generator_model.clone(), config.generator_temperature),
        )
    }

    /// Trims and rejects blank input; nothing is sent for an empty prompt.
    pub fn validate(raw_prompt: &str) -> Result<&str, PipelineError> {
        let prompt = raw_prompt.trim();
        if prompt.is_empty() {
            Err(PipelineError::EmptyPrompt)
        } else {
            Ok(prompt)
        }
    }

    pub async fn run(&self, request: &GenerationRequest) -> Result<GenerationOutput, PipelineError> {
        let prompt = Self::validate(&request.raw_prompt)?;
        info!("🚀 Generating with {} for: {}", request.mode.label(), prompt);

        match request.mode {
            Mode::Direct => {
                let markup = self.generator.generate(prompt).await.map_err(|e| {
                    error!("❌ Generation failed: {}", e);
                    PipelineError::Generation(e)
                })?;
                Ok(GenerationOutput { markup, expanded_prompt: None })
            }
            Mode::TwoStage => {
                let expanded = self.expander.expand(prompt).await.map_err(|e| {
                    error!("❌ Expansion failed, skipping generation: {}", e);
                    PipelineError::Expansion(e)
                })?;
                info!("--- Elaborated prompt ---\n{}", expanded);

                let markup = self.generator.generate(&expanded).await.map_err(|e| {
                    error!("❌ Generation failed: {}", e);
                    PipelineError::Generation(e)
                })?;
                Ok(GenerationOutput { markup, expanded_prompt: Some(expanded) })
            }
        }
    }
}
