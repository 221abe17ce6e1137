use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Origin of the backend, e.g. `http://localhost:5000`
    pub api_host: String,
    /// Path the API is mounted under, or a full URL that replaces the
    /// host entirely
    pub api_base_path: String,
    /// How long to wait after an upload before telling the front end
    /// the conversation is ready
    pub ready_delay: Duration,
    pub request_timeout: Duration,
}

impl AppConfig {
    /// Builds the config from a variable lookup so it can be tested
    /// without touching the process environment.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_host =
            lookup("DOCCHAT_API_HOST").unwrap_or_else(|| "http://localhost:5000".to_string());
        let api_base_path = lookup("DOCCHAT_API_URL").unwrap_or_else(|| "/api".to_string());
        let ready_delay_ms = lookup("DOCCHAT_READY_DELAY_MS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(1000);
        let request_timeout_secs = lookup("DOCCHAT_REQUEST_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60 * 10);

        Self {
            api_host,
            api_base_path,
            ready_delay: Duration::from_millis(ready_delay_ms),
            request_timeout: Duration::from_secs(request_timeout_secs),
        }
    }

    pub fn api_base_url(&self) -> String {
        if self.api_base_path.starts_with("http://") || self.api_base_path.starts_with("https://")
        {
            return self.api_base_path.trim_end_matches('/').to_string();
        }
        format!(
            "{}/{}",
            self.api_host.trim_end_matches('/'),
            self.api_base_path.trim_matches('/')
        )
        .trim_end_matches('/')
        .to_string()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }
}
