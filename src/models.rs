use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Single generator call.
    #[default]
    Direct,
    /// Expand the idea into a brief first, then generate from the brief.
    TwoStage,
}

impl Mode {
    pub fn label(self) -> &'static str {
        match self {
            Mode::Direct => "LLM Alpha",
            Mode::TwoStage => "LLM Beta",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerationRequest {
    #[serde(alias = "prompt")]
    pub raw_prompt: String,
    #[serde(default)]
    pub mode: Mode,
}

#[cfg(test)]
impl GenerationRequest {
    pub fn new(raw_prompt: impl Into<String>, mode: Mode) -> Self {
        Self { raw_prompt: raw_prompt.into(), mode }
    }
}

/// Successful pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutput {
    pub markup: String,
    pub expanded_prompt: Option<String>,
}

/// What the shell shows for one finished request.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerationResult {
    pub seq: u64,
    pub mode: Mode,
    pub markup: String,
    pub diagnostic_prompt: Option<String>,
    pub error: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl GenerationResult {
    pub fn from_outcome<E: std::fmt::Display>(seq: u64, mode: Mode, outcome: Result<GenerationOutput, E>) -> Self {
        let (markup, diagnostic_prompt, error) = match outcome {
            Ok(out) => (out.markup, out.expanded_prompt, None),
            Err(e) => (String::new(), None, Some(format!("Error: {e}"))),
        };
        Self { seq, mode, markup, diagnostic_prompt, error, completed_at: Utc::now() }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running { seq: u64 },
    Succeeded { seq: u64 },
    Failed { seq: u64 },
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SaveRequest {
    #[serde(default)]
    pub path: Option<String>,
}

// --- Chat-completion wire format ---

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self { role: "system".into(), content: content.into() }
    }

    pub fn user(content: &str) -> Self {
        Self { role: "user".into(), content: content.into() }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    pub fn first_content(self) -> Option<String> {
        self.choices.into_iter().next().and_then(|c| c.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn request_accepts_prompt_alias_and_defaults_to_direct() {
        let req: GenerationRequest = serde_json::from_str(r#"{"prompt": "a blog"}"#).unwrap();
        assert_eq!(req.raw_prompt, "a blog");
        assert_eq!(req.mode, Mode::Direct);

        let req: GenerationRequest = serde_json::from_str(r#"{"raw_prompt": "a shop", "mode": "two_stage"}"#).unwrap();
        assert_eq!(req.mode, Mode::TwoStage);
    }

    #[test]
    fn result_carries_either_markup_or_error() {
        let ok = GenerationResult::from_outcome::<String>(
            3,
            Mode::TwoStage,
            Ok(GenerationOutput { markup: "<html></html>".into(), expanded_prompt: Some("brief".into()) }),
        );
        assert!(ok.is_success());
        assert_eq!(ok.diagnostic_prompt.as_deref(), Some("brief"));

        let err = GenerationResult::from_outcome::<&str>(4, Mode::Direct, Err("HTTP error: reset"));
        assert!(!err.is_success());
        assert_eq!(err.markup, "");
        assert_eq!(err.error.as_deref(), Some("Error: HTTP error: reset"));
    }

    #[test]
    fn completion_content_is_extracted() {
        let resp: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":"<p>hi</p>"}}]}"#).unwrap();
        assert_eq!(resp.first_content().as_deref(), Some("<p>hi</p>"));
    }
}
