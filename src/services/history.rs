use std::time::Duration;

use anyhow::{Context, Result};
use rand::Rng;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, info};

use super::HistorySource;
use crate::config::Config;
use crate::truncate;

pub(crate) const MIN_RECORDS: u32 = 15;
pub(crate) const MAX_RECORDS: u32 = 100;
const RESPONSE_MIME_TYPE: &str = "application/json";
const API_KEY_HEADER: &str = "x-goog-api-key";
const ERROR_BODY_LOG_CHARS: usize = 200;

/// One fabricated login event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginRecord {
    pub(crate) device_type: String,
    pub(crate) device_model: String,
    pub(crate) login_type: String,
    /// Free-form; never parsed.
    pub(crate) login_time: String,
    pub(crate) login_ip: String,
    pub(crate) login_location: String,
    /// `Normal Giriş` or `Hack Girişi`.
    pub(crate) login_method: String,
}

/// The only failure callers see; the cause is logged where it happens.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("Failed to generate login history from AI.")]
pub(crate) struct GenerateError;

#[derive(Debug, Error)]
enum GenerationFailure {
    #[error("no API key configured (set GEMINI_API_KEY)")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("prompt blocked: {0}")]
    Blocked(String),
    #[error("response carried no candidate text (finish reason: {0})")]
    Empty(String),
    #[error("response is not the expected JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

pub(crate) fn pick_record_count<R: Rng>(rng: &mut R) -> u32 {
    rng.gen_range(MIN_RECORDS..=MAX_RECORDS)
}

pub(crate) fn build_prompt(username: &str, count: u32) -> String {
    format!(
        "For the Instagram user '{username}', generate a list of {count} fake login attempts. \
         Provide details for each attempt. For the 'loginLocation', generate locations mostly \
         around Baku, Azerbaijan (e.g., 'Bakı, Binə qəsəbəsi', 'Gənclik, Bakı'). For the \
         'loginMethod', use either 'Normal Giriş' or 'Hack Girişi'."
    )
}

pub(crate) fn response_schema() -> Value {
    let field = |description: &str| json!({ "type": "STRING", "description": description });
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "deviceType": field("The type of device, e.g., 'Mobil' or 'PC'."),
                "deviceModel": field("The specific model of the device, e.g., 'iPhone 14 Pro' or 'Windows 11 PC'."),
                "loginType": field("The method of login, e.g., 'Password', 'Biometric', '2FA'."),
                "loginTime": field("The timestamp of the login, in a readable format like 'YYYY-MM-DD HH:MM:SS'."),
                "loginIp": field("A realistic-looking fake IP address for the login."),
                "loginLocation": field("The geographical location of the login. Mostly around Baku, Azerbaijan."),
                "loginMethod": field("The method of the login attempt, e.g., 'Normal Giriş' or 'Hack Girişi'."),
            },
            "required": [
                "deviceType",
                "deviceModel",
                "loginType",
                "loginTime",
                "loginIp",
                "loginLocation",
                "loginMethod"
            ]
        }
    })
}

pub(crate) fn parse_records(text: &str) -> std::result::Result<Vec<LoginRecord>, serde_json::Error> {
    serde_json::from_str(text.trim())
}

// --- generateContent wire format ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

impl<'a> GenerateContentRequest<'a> {
    fn structured(prompt: &'a str) -> Self {
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: RESPONSE_MIME_TYPE,
                response_schema: response_schema(),
            },
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Debug)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> std::result::Result<String, GenerationFailure> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(GenerationFailure::Blocked(reason));
        }
        let Some(first) = self.candidates.into_iter().next() else {
            return Err(GenerationFailure::Empty("no candidates".to_string()));
        };
        let text: String = first
            .content
            .map(|content| content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            let reason = first.finish_reason.unwrap_or_else(|| "unknown".to_string());
            return Err(GenerationFailure::Empty(reason));
        }
        Ok(text)
    }
}

pub(crate) struct GeminiHistoryGenerator {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl GeminiHistoryGenerator {
    pub(crate) fn new(config: &Config) -> Result<Self> {
        // Large record lists can take well over the default request timeout.
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .context("build generative service http client")?;
        Ok(Self {
            client,
            url: config.gemini_generate_url(),
            api_key: config.api_key.clone(),
        })
    }

    fn request_records(
        &self,
        username: &str,
        count: u32,
    ) -> std::result::Result<Vec<LoginRecord>, GenerationFailure> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GenerationFailure::MissingApiKey)?;
        let prompt = build_prompt(username, count);
        info!(username, count, "requesting login history");

        let response = self
            .client
            .post(&self.url)
            .header(API_KEY_HEADER, api_key)
            .json(&GenerateContentRequest::structured(&prompt))
            .send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(GenerationFailure::Status {
                status: status.as_u16(),
                body: truncate(&body, ERROR_BODY_LOG_CHARS),
            });
        }

        let reply: GenerateContentResponse = serde_json::from_str(&body)?;
        let records = parse_records(&reply.into_text()?)?;
        info!(
            username,
            requested = count,
            received = records.len(),
            "login history generated"
        );
        Ok(records)
    }
}

impl HistorySource for GeminiHistoryGenerator {
    fn generate_history(
        &self,
        username: &str,
    ) -> std::result::Result<Vec<LoginRecord>, GenerateError> {
        let count = pick_record_count(&mut rand::thread_rng());
        self.request_records(username, count).map_err(|failure| {
            error!(username, count, error = %failure, "error generating login attempts");
            GenerateError
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_server::{closed_port_url, serve_once};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const RECORD_JSON: &str = r#"{"deviceType":"Mobil","deviceModel":"iPhone 14 Pro","loginType":"Password","loginTime":"2024-05-01 10:22:13","loginIp":"185.12.4.9","loginLocation":"Gənclik, Bakı","loginMethod":"Normal Giriş"}"#;

    fn generator_for(base_url: &str, api_key: Option<&str>) -> GeminiHistoryGenerator {
        let config = Config {
            gemini_base_url: format!("{base_url}/v1beta"),
            api_key: api_key.map(str::to_string),
            ..Config::default()
        };
        GeminiHistoryGenerator::new(&config).expect("build generator")
    }

    fn candidate_reply(text: &str) -> String {
        json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        })
        .to_string()
    }

    #[test]
    fn record_count_stays_within_inclusive_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let counts: Vec<u32> = (0..2000).map(|_| pick_record_count(&mut rng)).collect();
        assert!(counts.iter().all(|c| (MIN_RECORDS..=MAX_RECORDS).contains(c)));
        assert!(counts.contains(&MIN_RECORDS));
        assert!(counts.contains(&MAX_RECORDS));
    }

    #[test]
    fn prompt_names_user_count_region_and_channel_tags() {
        let prompt = build_prompt("nasa", 42);
        assert!(prompt.starts_with("For the Instagram user 'nasa', generate a list of 42 fake"));
        assert!(prompt.contains("mostly around Baku, Azerbaijan"));
        assert!(prompt.contains("'Bakı, Binə qəsəbəsi', 'Gənclik, Bakı'"));
        assert!(prompt.contains("either 'Normal Giriş' or 'Hack Girişi'"));
    }

    #[test]
    fn schema_requires_all_seven_fields() {
        let schema = response_schema();
        assert_eq!(schema["type"], "ARRAY");
        assert_eq!(schema["items"]["type"], "OBJECT");
        let required = schema["items"]["required"].as_array().expect("required list");
        assert_eq!(required.len(), 7);
        let properties = schema["items"]["properties"].as_object().expect("properties");
        for name in required {
            let name = name.as_str().expect("field name");
            assert_eq!(properties[name]["type"], "STRING");
        }
    }

    #[test]
    fn parse_records_trims_and_maps_camel_case() {
        let text = format!("\n  [{RECORD_JSON}]  \n");
        let records = parse_records(&text).expect("records");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].device_model, "iPhone 14 Pro");
        assert_eq!(records[0].login_location, "Gənclik, Bakı");
        assert_eq!(records[0].login_method, "Normal Giriş");
    }

    #[test]
    fn parse_records_rejects_missing_fields() {
        assert!(parse_records(r#"[{"deviceType":"PC"}]"#).is_err());
        assert!(parse_records("not json").is_err());
        assert!(parse_records(r#"{"deviceType":"PC"}"#).is_err());
    }

    #[test]
    fn blocked_prompt_and_empty_candidates_fail() {
        let blocked: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)
                .expect("decode");
        assert!(matches!(
            blocked.into_text(),
            Err(GenerationFailure::Blocked(reason)) if reason == "SAFETY"
        ));

        let empty = GenerateContentResponse::default();
        assert!(matches!(empty.into_text(), Err(GenerationFailure::Empty(_))));
    }

    #[test]
    fn generate_posts_structured_request_and_parses_reply() {
        let reply = candidate_reply(&format!("[{RECORD_JSON},{RECORD_JSON}]"));
        let server = serve_once("200 OK", &reply);
        let generator = generator_for(&server.base_url, Some("test-key"));

        let records = generator.generate_history("nasa").expect("records");

        assert_eq!(records.len(), 2);
        let request = server.request();
        assert!(request.starts_with("POST /v1beta/models/gemini-2.5-flash:generateContent"));
        assert!(request.to_ascii_lowercase().contains("x-goog-api-key: test-key"));
        assert!(request.contains(r#""responseMimeType":"application/json""#));
        assert!(request.contains(r#""responseSchema""#));
        assert!(request.contains("For the Instagram user 'nasa'"));

        let requested: u32 = request
            .split("generate a list of ")
            .nth(1)
            .expect("count in prompt")
            .chars()
            .take_while(char::is_ascii_digit)
            .collect::<String>()
            .parse()
            .expect("numeric count");
        assert!((MIN_RECORDS..=MAX_RECORDS).contains(&requested));
    }

    #[test]
    fn generation_failures_collapse_to_one_message() {
        let server = serve_once("500 Internal Server Error", r#"{"error":"overloaded"}"#);
        let generator = generator_for(&server.base_url, Some("k"));
        let err = generator.generate_history("a").expect_err("server failure");
        assert_eq!(err.to_string(), "Failed to generate login history from AI.");

        let server = serve_once("200 OK", &candidate_reply("[{\"deviceType\":\"PC\"}]"));
        let generator = generator_for(&server.base_url, Some("k"));
        assert_eq!(generator.generate_history("a"), Err(GenerateError));

        let generator = generator_for(&closed_port_url(), Some("k"));
        assert_eq!(generator.generate_history("a"), Err(GenerateError));
    }

    #[test]
    fn missing_api_key_fails_without_calling_service() {
        let generator = generator_for(&closed_port_url(), None);
        assert!(matches!(
            generator.request_records("a", 15),
            Err(GenerationFailure::MissingApiKey)
        ));
        assert_eq!(generator.generate_history("a"), Err(GenerateError));
    }
}
