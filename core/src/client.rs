//! Client construction and configuration.
//!
//! # Design
//! Configuration is an explicit builder with defaulted fields and a
//! validating `build()`: the base URL must parse as an absolute URL or
//! construction fails with no partial client. The three resource services
//! share one [`Transport`] and are built exactly once; nothing is mutated
//! after construction, so a `Client` can be used from multiple threads as
//! long as calls are independent round trips (they are).

use std::sync::Arc;

use crate::data::DataService;
use crate::error::Error;
use crate::http::Transport;
use crate::policy::PolicyService;
use crate::query::QueryService;

/// Base URL used when none is configured.
pub const DEFAULT_URL: &str = "http://localhost:8181";

/// Configures and validates a [`Client`].
///
/// Unset options keep their defaults: [`DEFAULT_URL`], a default agent,
/// and no bearer token.
#[derive(Debug)]
pub struct ClientBuilder {
    url: String,
    token: Option<String>,
    agent: Option<ureq::Agent>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            token: None,
            agent: None,
        }
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL of the server. Must be absolute; validated by
    /// [`build`](Self::build).
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Sets the bearer token attached to every request. Without one, no
    /// `Authorization` header is sent at all.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the agent used to execute requests. Timeouts and deadlines
    /// are configured here. The agent should be built with
    /// `http_status_as_error(false)` so non-2xx responses reach the
    /// client as data instead of transport errors.
    pub fn agent(mut self, agent: ureq::Agent) -> Self {
        self.agent = Some(agent);
        self
    }

    /// Validates the configuration and builds the client.
    pub fn build(self) -> Result<Client, Error> {
        let uri: ureq::http::Uri = self
            .url
            .parse()
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", self.url)))?;
        if uri.scheme().is_none() || uri.authority().is_none() {
            return Err(Error::InvalidUrl(format!("{}: not an absolute URL", self.url)));
        }

        let agent = self.agent.unwrap_or_else(default_agent);
        let transport = Arc::new(Transport::new(self.url, self.token, agent));

        Ok(Client {
            policies: PolicyService::new(Arc::clone(&transport)),
            data: DataService::new(Arc::clone(&transport)),
            queries: QueryService::new(Arc::clone(&transport)),
            transport,
        })
    }
}

/// A client for the policy engine's REST API.
///
/// Operations live on the [`Service`](crate::Service) trait, which this
/// type implements by delegating to its resource services.
#[derive(Debug)]
pub struct Client {
    pub(crate) policies: PolicyService,
    pub(crate) data: DataService,
    pub(crate) queries: QueryService,
    transport: Arc<Transport>,
}

impl Client {
    /// Builds a client against [`DEFAULT_URL`] with default options.
    pub fn new() -> Result<Self, Error> {
        Self::builder().build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The configured base URL, trailing slash trimmed.
    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }
}

fn default_agent() -> ureq::Agent {
    ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent()
}
