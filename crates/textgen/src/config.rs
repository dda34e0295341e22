/// Default model used for document generation.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Default OpenAI-compatible API root.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Default whole-request timeout in seconds. Full document sets take tens of
/// seconds to come back.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Text-generation client configuration.
#[derive(Debug, Clone)]
pub struct TextGenConfig {
    /// API key. `None` leaves generation unconfigured.
    pub api_key: Option<String>,
    pub model: String,
    /// API root without trailing slash, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for TextGenConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl TextGenConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var               | Default                      |
    /// |-----------------------|------------------------------|
    /// | `OPENAI_API_KEY`      | unset (generation disabled)  |
    /// | `OPENAI_MODEL`        | `gpt-4o-mini`                |
    /// | `OPENAI_BASE_URL`     | `https://api.openai.com/v1`  |
    /// | `OPENAI_TEMPERATURE`  | `0.7`                        |
    /// | `OPENAI_TIMEOUT_SECS` | `120`                        |
    ///
    /// # Panics
    ///
    /// Panics if a numeric variable is set but does not parse.
    pub fn from_env() -> Self {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());

        let base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.into())
            .trim_end_matches('/')
            .to_string();

        let temperature: f32 = std::env::var("OPENAI_TEMPERATURE")
            .unwrap_or_else(|_| DEFAULT_TEMPERATURE.to_string())
            .parse()
            .expect("OPENAI_TEMPERATURE must be a valid f32");

        let timeout_secs: u64 = std::env::var("OPENAI_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .expect("OPENAI_TIMEOUT_SECS must be a valid u64");

        Self {
            api_key,
            model,
            base_url,
            temperature,
            timeout_secs,
        }
    }
}
