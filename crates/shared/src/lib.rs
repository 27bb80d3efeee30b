pub mod error;
pub mod messages;
pub mod notice;
pub mod records;
pub mod summarizer;

/// Well-known storage keys shared by the popup, the watcher and the worker.
pub mod keys {
    /// Credential, synchronized tier.
    pub const API_KEY: &str = "parasummarizer_api_key";
    /// Pending captured text, local tier.
    pub const SELECTED_TEXT: &str = "parasummarizer_selected_text";
    /// Summary history (JSON array), local tier.
    pub const SUMMARIES: &str = "parasummarizer_summaries";
}

pub mod settings {
    use serde::{Deserialize, Serialize};

    pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
    pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

    fn default_base_url() -> String {
        DEFAULT_BASE_URL.to_string()
    }

    fn default_model() -> String {
        DEFAULT_MODEL.to_string()
    }

    fn default_max_tokens() -> u32 {
        500
    }

    fn default_temperature() -> f32 {
        0.3
    }

    fn default_capture_min_chars() -> usize {
        10
    }

    fn default_max_input_chars() -> usize {
        4000
    }

    fn default_timeout() -> Option<u64> {
        Some(120)
    }

    fn default_true() -> bool {
        true
    }

    /// Everything the summarizer needs that is not a secret.
    ///
    /// Every field has a serde default so older or hand-edited settings files
    /// keep loading when new fields are added.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct SummarizerSettings {
        /// Root of an OpenAI-compatible API, without the `/v1/...` path.
        #[serde(default = "default_base_url")]
        pub base_url: String,
        #[serde(default = "default_model")]
        pub model: String,
        #[serde(default = "default_max_tokens")]
        pub max_tokens: u32,
        #[serde(default = "default_temperature")]
        pub temperature: f32,
        /// A selection is captured only when its trimmed length is strictly
        /// greater than this.
        #[serde(default = "default_capture_min_chars")]
        pub capture_min_chars: usize,
        /// Submitted text is cut to this many characters.
        #[serde(default = "default_max_input_chars")]
        pub max_input_chars: usize,
        /// `None` waits for the endpoint forever.
        #[serde(default = "default_timeout")]
        pub request_timeout_secs: Option<u64>,
        #[serde(default = "default_true")]
        pub history_enabled: bool,
    }

    impl Default for SummarizerSettings {
        fn default() -> Self {
            Self {
                base_url: default_base_url(),
                model: default_model(),
                max_tokens: default_max_tokens(),
                temperature: default_temperature(),
                capture_min_chars: default_capture_min_chars(),
                max_input_chars: default_max_input_chars(),
                request_timeout_secs: default_timeout(),
                history_enabled: true,
            }
        }
    }

    impl SummarizerSettings {
        /// Apply `PARASUMMARIZER_BASE_URL` / `PARASUMMARIZER_MODEL` if set.
        pub fn with_env_overrides(mut self) -> Self {
            if let Ok(url) = std::env::var("PARASUMMARIZER_BASE_URL") {
                if !url.trim().is_empty() {
                    self.base_url = url.trim().to_string();
                }
            }
            if let Ok(model) = std::env::var("PARASUMMARIZER_MODEL") {
                if !model.trim().is_empty() {
                    self.model = model.trim().to_string();
                }
            }
            self
        }

        pub fn chat_completions_url(&self) -> String {
            format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
        }
    }
}

pub mod agent_api {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ChatMessage {
        pub role: String, // "system" | "user" | "assistant"
        pub content: String,
    }

    impl ChatMessage {
        pub fn system(content: impl Into<String>) -> Self {
            Self {
                role: "system".to_string(),
                content: content.into(),
            }
        }

        pub fn user(content: impl Into<String>) -> Self {
            Self {
                role: "user".to_string(),
                content: content.into(),
            }
        }
    }
}
