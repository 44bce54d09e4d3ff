use std::fmt;
use std::path::PathBuf;

pub(crate) const DEFAULT_PROFILE_BASE_URL: &str = "https://teazer-api.onrender.com/api/insta?username=";
pub(crate) const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub(crate) const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
const ENV_API_KEY_FALLBACK: &str = "API_KEY";
const LOG_FILE_NAME: &str = "insta-checker.log";

#[derive(Clone)]
pub(crate) struct Config {
    /// Username is appended verbatim to this value.
    pub(crate) profile_base_url: String,
    pub(crate) gemini_base_url: String,
    pub(crate) gemini_model: String,
    pub(crate) api_key: Option<String>,
    pub(crate) log_path: PathBuf,
}

impl fmt::Debug for Config {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Config")
            .field("profile_base_url", &self.profile_base_url)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("gemini_model", &self.gemini_model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("log_path", &self.log_path)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile_base_url: DEFAULT_PROFILE_BASE_URL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            api_key: None,
            log_path: std::env::temp_dir().join(LOG_FILE_NAME),
        }
    }
}

impl Config {
    pub(crate) fn from_env() -> Self {
        let api_key = read_api_key(|name| std::env::var(name).ok());
        Self {
            api_key,
            ..Self::default()
        }
    }

    pub(crate) fn gemini_generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.gemini_base_url.trim_end_matches('/'),
            self.gemini_model
        )
    }
}

fn read_api_key(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    [ENV_GEMINI_API_KEY, ENV_API_KEY_FALLBACK]
        .into_iter()
        .filter_map(lookup)
        .map(|raw| raw.trim().to_string())
        .find(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_prefers_gemini_variable() {
        let key = read_api_key(|name| match name {
            "GEMINI_API_KEY" => Some("primary".to_string()),
            "API_KEY" => Some("fallback".to_string()),
            _ => None,
        });
        assert_eq!(key.as_deref(), Some("primary"));
    }

    #[test]
    fn api_key_falls_back_when_primary_blank() {
        let key = read_api_key(|name| match name {
            "GEMINI_API_KEY" => Some("   ".to_string()),
            "API_KEY" => Some(" fallback \n".to_string()),
            _ => None,
        });
        assert_eq!(key.as_deref(), Some("fallback"));
    }

    #[test]
    fn api_key_absent_is_none() {
        assert_eq!(read_api_key(|_| None), None);
    }

    #[test]
    fn generate_url_joins_base_and_model() {
        let config = Config {
            gemini_base_url: "http://127.0.0.1:9/v1beta/".to_string(),
            ..Config::default()
        };
        assert_eq!(
            config.gemini_generate_url(),
            "http://127.0.0.1:9/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let config = Config {
            api_key: Some("secret-value".to_string()),
            ..Config::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret-value"));
        assert!(rendered.contains("<redacted>"));
    }
}
