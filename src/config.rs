use std::fmt;
use std::time::Duration;

use crate::constants;

/// Connection settings for the completion endpoint.
///
/// Built once at startup and handed to [`crate::completion::CompletionClient`];
/// nothing on the request path reads the process environment.
#[derive(Clone)]
pub struct CoachConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl CoachConfig {
    pub fn new(api_key: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: api_url.into(),
            model: constants::DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(constants::DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for CoachConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = if self.api_key.is_empty() { "<unset>" } else { "<redacted>" };
        f.debug_struct("CoachConfig")
            .field("api_key", &key)
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Endpoint options shared by every subcommand.
#[derive(clap::Args, Debug, Clone)]
pub struct ApiArgs {
    /// Bearer token for the completion endpoint.
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true, default_value = "", global = true)]
    pub api_key: String,
    /// Chat-completions URL.
    #[arg(long, env = "GROQ_API_URL", default_value = constants::DEFAULT_API_URL, global = true)]
    pub api_url: String,
    /// Model identifier sent with every request.
    #[arg(long, env = "GROQ_MODEL", default_value = constants::DEFAULT_MODEL, global = true)]
    pub model: String,
    /// Seconds to wait for a reply before giving up.
    #[arg(long, env = "COACH_TIMEOUT_SECS", default_value_t = constants::DEFAULT_TIMEOUT_SECS, global = true)]
    pub timeout_secs: u64,
}

impl From<ApiArgs> for CoachConfig {
    fn from(args: ApiArgs) -> Self {
        CoachConfig::new(args.api_key, args.api_url)
            .with_model(args.model)
            .with_timeout(Duration::from_secs(args.timeout_secs))
    }
}
