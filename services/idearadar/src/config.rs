use anyhow::{bail, Context, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoringProvider {
    OpenAi,
    Gemini,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoringStrategy {
    /// Provider-side JSON schema; the response is already type-correct.
    StrictSchema,
    /// Free-form JSON mode, repaired and clamped locally.
    JsonMode,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub admin_token: String,

    pub openai_api_key: String,
    pub openai_base_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,

    pub scoring_provider: ScoringProvider,
    pub scoring_strategy: ScoringStrategy,
    pub scoring_model: String,
    pub scoring_temperature: f32,
    pub prefer_fine_tuned: bool,
    pub finetune_base_model: String,
    pub llm_timeout_secs: u64,
}

const MAX_SCORING_TEMPERATURE: f32 = 0.3;

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Missing required env var: {key}"))
        };
        let or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let database_url = get("DATABASE_URL")?;
        let openai_api_key = get("OPENAI_API_KEY")?;
        let admin_token = get("ADMIN_TOKEN")?;

        let openai_base_url = or("OPENAI_BASE_URL", "https://api.openai.com/v1");
        let gemini_api_key = lookup("GEMINI_API_KEY").filter(|v| !v.trim().is_empty());
        let gemini_base_url = or(
            "GEMINI_BASE_URL",
            "https://generativelanguage.googleapis.com/v1beta",
        );

        let scoring_provider = match or("SCORING_PROVIDER", "openai").to_lowercase().as_str() {
            "openai" => ScoringProvider::OpenAi,
            "gemini" => ScoringProvider::Gemini,
            other => bail!("SCORING_PROVIDER must be openai or gemini, got {other}"),
        };
        let scoring_strategy = match or("SCORING_STRATEGY", "strict_schema").to_lowercase().as_str() {
            "strict_schema" => ScoringStrategy::StrictSchema,
            "json_mode" => ScoringStrategy::JsonMode,
            other => bail!("SCORING_STRATEGY must be strict_schema or json_mode, got {other}"),
        };

        let scoring_temperature: f32 = or("SCORING_TEMPERATURE", "0.2")
            .parse()
            .context("SCORING_TEMPERATURE must be a number")?;
        let llm_timeout_secs: u64 = or("LLM_TIMEOUT_SECS", "60")
            .parse()
            .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?;
        let prefer_fine_tuned = lookup("PREFER_FINE_TUNED")
            .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
            .unwrap_or(true);

        // fail fast, fail loud
        for (name, url) in [("OPENAI_BASE_URL", &openai_base_url), ("GEMINI_BASE_URL", &gemini_base_url)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                bail!("{name} must start with http:// or https://");
            }
        }
        if !(0.0..=MAX_SCORING_TEMPERATURE).contains(&scoring_temperature) {
            bail!("SCORING_TEMPERATURE must be between 0 and {MAX_SCORING_TEMPERATURE}");
        }
        if scoring_provider == ScoringProvider::Gemini && gemini_api_key.is_none() {
            bail!("SCORING_PROVIDER=gemini requires GEMINI_API_KEY");
        }
        if llm_timeout_secs == 0 {
            bail!("LLM_TIMEOUT_SECS must be greater than zero");
        }

        Ok(Self {
            database_url,
            bind_addr: or("BIND_ADDR", "0.0.0.0:8080"),
            admin_token,
            openai_api_key,
            openai_base_url,
            gemini_api_key,
            gemini_base_url,
            scoring_provider,
            scoring_strategy,
            scoring_model: or("SCORING_MODEL", "gpt-4o-mini"),
            scoring_temperature,
            prefer_fine_tuned,
            finetune_base_model: or("FINETUNE_BASE_MODEL", "gpt-4o-mini-2024-07-18"),
            llm_timeout_secs,
        })
    }
}
