//! Shared HTTP transport for the resource services.
//!
//! # Design
//! `Transport` owns the pieces every request needs: the agent, the
//! trimmed base URL, and the optional bearer token. Services hand it a
//! method, a relative path, and an optional payload; it builds the URL,
//! attaches the auth header, executes one round trip, and branches on the
//! status code. Network failures propagate verbatim as
//! [`Error::Transport`] with no retry or classification.

use serde::de::DeserializeOwned;

use crate::error::{ApiError, Error};

/// HTTP method for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

/// A request body together with the content type it is sent as.
///
/// Policy source travels as plain text; everything else is JSON.
#[derive(Debug, Clone)]
pub(crate) struct Payload<'a> {
    bytes: &'a [u8],
    content_type: &'static str,
}

impl<'a> Payload<'a> {
    pub(crate) fn json(bytes: &'a [u8]) -> Self {
        Self { bytes, content_type: "application/json" }
    }

    pub(crate) fn text(bytes: &'a [u8]) -> Self {
        Self { bytes, content_type: "text/plain" }
    }
}

/// Joins path segments, collapsing repeated and dangling slashes.
///
/// The result always carries a single leading slash: joining `/v1/data`
/// with `a//b/` yields `/v1/data/a/b`.
pub(crate) fn join_path(prefix: &str, rest: &str) -> String {
    let segments: Vec<&str> = prefix
        .split('/')
        .chain(rest.split('/'))
        .filter(|s| !s.is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}

/// Executes single synchronous round trips against the configured server.
#[derive(Debug)]
pub(crate) struct Transport {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
}

impl Transport {
    /// `base_url` must already be validated; it is stored with any
    /// trailing slash trimmed so joined paths never double up.
    pub(crate) fn new(base_url: String, token: Option<String>, agent: ureq::Agent) -> Self {
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Executes a request and decodes the response by status class.
    ///
    /// - 2xx with content: body decoded into `T`, returned as `Some`.
    /// - 204: body untouched, returns `None`.
    /// - anything else: body decoded into [`ApiError`] and returned as
    ///   [`Error::Api`]; an undecodable body is [`Error::Decode`].
    pub(crate) fn execute<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        payload: Option<Payload<'_>>,
    ) -> Result<Option<T>, Error> {
        let mut response = self.send(&method, path, payload)?;
        let status = response.status().as_u16();

        if !(200..300).contains(&status) {
            let body = response.body_mut().read_to_string()?;
            let api_err: ApiError = serde_json::from_str(&body).map_err(Error::Decode)?;
            return Err(Error::Api(api_err));
        }

        if status == 204 {
            return Ok(None);
        }

        let body = response.body_mut().read_to_string()?;
        let decoded = serde_json::from_str(&body).map_err(Error::Decode)?;
        Ok(Some(decoded))
    }

    /// Executes a request and returns the raw response bytes verbatim,
    /// regardless of status code. The caller interprets content and
    /// status; only transport failures surface as errors.
    pub(crate) fn execute_raw(
        &self,
        method: HttpMethod,
        path: &str,
        payload: Option<Payload<'_>>,
    ) -> Result<Vec<u8>, Error> {
        let mut response = self.send(&method, path, payload)?;
        Ok(response.body_mut().read_to_vec()?)
    }

    fn send(
        &self,
        method: &HttpMethod,
        path: &str,
        payload: Option<Payload<'_>>,
    ) -> Result<ureq::http::Response<ureq::Body>, Error> {
        let url = self.build_url(path);
        let auth = self.token.as_ref().map(|t| format!("Bearer {t}"));

        let result = match (method, payload) {
            (HttpMethod::Get, _) => {
                let mut req = self.agent.get(&url);
                if let Some(a) = &auth {
                    req = req.header("Authorization", a.as_str());
                }
                req.call()
            }
            (HttpMethod::Delete, _) => {
                let mut req = self.agent.delete(&url);
                if let Some(a) = &auth {
                    req = req.header("Authorization", a.as_str());
                }
                req.call()
            }
            (HttpMethod::Post, Some(p)) => {
                let mut req = self.agent.post(&url).content_type(p.content_type);
                if let Some(a) = &auth {
                    req = req.header("Authorization", a.as_str());
                }
                req.send(p.bytes)
            }
            (HttpMethod::Post, None) => {
                let mut req = self.agent.post(&url);
                if let Some(a) = &auth {
                    req = req.header("Authorization", a.as_str());
                }
                req.send_empty()
            }
            (HttpMethod::Put, Some(p)) => {
                let mut req = self.agent.put(&url).content_type(p.content_type);
                if let Some(a) = &auth {
                    req = req.header("Authorization", a.as_str());
                }
                req.send(p.bytes)
            }
            (HttpMethod::Put, None) => {
                let mut req = self.agent.put(&url);
                if let Some(a) = &auth {
                    req = req.header("Authorization", a.as_str());
                }
                req.send_empty()
            }
        };

        result.map_err(Error::Transport)
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, join_path("", path))
    }
}
