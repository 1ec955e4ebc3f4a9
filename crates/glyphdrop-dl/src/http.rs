use std::env;

use tracing::debug;
use ureq::{
    http::{
        header::{ACCEPT, AUTHORIZATION},
        Response,
    },
    Body,
};

use crate::{error::DownloadError, http_client::SHARED_AGENT};

/// Environment variables checked, in order, for a GitHub API token.
pub const TOKEN_ENV: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

pub struct Http;

impl Http {
    /// Issues a GET request and fails on any non-success status.
    pub fn fetch(url: &str) -> Result<Response<Body>, DownloadError> {
        let resp = SHARED_AGENT.get(url).call()?;
        ensure_success(resp, url)
    }

    /// Fetches and deserializes a JSON document from the GitHub API.
    ///
    /// The first token found in [`TOKEN_ENV`] is sent as a bearer token, which lifts the
    /// anonymous rate limit.
    pub fn json<T: serde::de::DeserializeOwned>(url: &str) -> Result<T, DownloadError> {
        let mut req = SHARED_AGENT
            .get(url)
            .header(ACCEPT, "application/vnd.github+json");

        if let Some(token) = TOKEN_ENV.iter().find_map(|var| env::var(var).ok()) {
            debug!("Using API token from environment");
            req = req.header(AUTHORIZATION, &format!("Bearer {}", token));
        }

        ensure_success(req.call()?, url)?
            .body_mut()
            .read_json()
            .map_err(|_| DownloadError::InvalidResponse)
    }
}

fn ensure_success(resp: Response<Body>, url: &str) -> Result<Response<Body>, DownloadError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(DownloadError::HttpError {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(resp)
}
