use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use super::ProfileSource;
use crate::config::Config;

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub(crate) struct Profile {
    pub(crate) username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) full_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) biography: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) followers: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) following: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) is_private: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) is_verified: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) profile_pic_url: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub(crate) enum FetchError {
    #[error("A network error occurred. Please check your internet connection and try again.")]
    Network,
    #[error("User '{0}' not found.")]
    NotFound(String),
    #[error("The external API server failed (Status: {0}). This is an issue with the remote service, not this application. Please try again later.")]
    Server(u16),
    #[error("API request failed with an unexpected status: {0}.")]
    UnexpectedStatus(u16),
    #[error("User '{0}' not found or the API returned an invalid response.")]
    InvalidPayload(String),
    #[error("Failed to parse the response from the server. The API might be returning malformed data.")]
    Malformed,
}

/// Maps one HTTP exchange onto a profile or a classified failure.
pub(crate) fn interpret_response(
    username: &str,
    status: u16,
    body: &[u8],
) -> std::result::Result<Profile, FetchError> {
    if status == 404 {
        return Err(FetchError::NotFound(username.to_string()));
    }
    if status >= 500 {
        return Err(FetchError::Server(status));
    }
    if !(200..300).contains(&status) {
        return Err(FetchError::UnexpectedStatus(status));
    }
    parse_profile_body(username, body)
}

fn parse_profile_body(username: &str, body: &[u8]) -> std::result::Result<Profile, FetchError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(FetchError::InvalidPayload(username.to_string()));
    }
    let value: Value = serde_json::from_slice(body).map_err(|err| {
        warn!(username, error = %err, "profile body is not JSON");
        FetchError::Malformed
    })?;
    let has_username = value
        .get("username")
        .and_then(Value::as_str)
        .is_some_and(|name| !name.is_empty());
    if !has_username {
        return Err(FetchError::InvalidPayload(username.to_string()));
    }
    serde_json::from_value(value).map_err(|err| {
        warn!(username, error = %err, "profile body has unexpected field types");
        FetchError::Malformed
    })
}

pub(crate) struct HttpProfileFetcher {
    client: Client,
    base_url: String,
}

impl HttpProfileFetcher {
    pub(crate) fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .context("build profile http client")?;
        Ok(Self {
            client,
            base_url: config.profile_base_url.clone(),
        })
    }

    fn profile_url(&self, username: &str) -> String {
        // Not URL-encoded; reserved characters in the username reach the endpoint as typed.
        format!("{}{}", self.base_url, username)
    }
}

impl ProfileSource for HttpProfileFetcher {
    fn fetch_profile(&self, username: &str) -> std::result::Result<Profile, FetchError> {
        let url = self.profile_url(username);
        info!(username, "fetching profile");
        let response = self.client.get(&url).send().map_err(|err| {
            warn!(username, error = %err, "profile request failed");
            FetchError::Network
        })?;
        let status = response.status().as_u16();
        info!(username, status, "profile endpoint responded");
        if !response.status().is_success() {
            return interpret_response(username, status, &[]);
        }
        let body = response.bytes().map_err(|err| {
            warn!(username, error = %err, "profile body could not be read");
            FetchError::Malformed
        })?;
        interpret_response(username, status, &body)
    }
}
