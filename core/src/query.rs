//! Query execution operations.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::Error;
use crate::http::{join_path, HttpMethod, Payload, Transport};
use crate::types::{AdHocQueryOptions, QueryResponse};

/// Query execution against the document tree, under `/v1/query`.
#[derive(Debug)]
pub(crate) struct QueryService {
    transport: Arc<Transport>,
    path: &'static str,
}

impl QueryService {
    pub(crate) fn new(transport: Arc<Transport>) -> Self {
        Self { transport, path: "/v1/query" }
    }

    /// Posts `input` to the literal `path` — not joined under the query
    /// prefix — and returns the raw response bytes regardless of status.
    /// The caller interprets both the content and the status.
    ///
    /// <https://www.openpolicyagent.org/docs/latest/rest-api/#execute-a-simple-query>
    pub(crate) fn simple(&self, path: &str, input: &Map<String, Value>) -> Result<Vec<u8>, Error> {
        let body = serde_json::to_vec(input).map_err(Error::Encode)?;
        self.transport.execute_raw(HttpMethod::Post, path, Some(Payload::json(&body)))
    }

    /// Runs an ad-hoc query with the given options; empty options fields
    /// are left off the wire entirely.
    ///
    /// <https://www.openpolicyagent.org/docs/latest/rest-api/#execute-an-ad-hoc-query>
    pub(crate) fn ad_hoc(&self, path: &str, options: &AdHocQueryOptions) -> Result<QueryResponse, Error> {
        let body = serde_json::to_vec(options).map_err(Error::Encode)?;
        let res = self.transport.execute(
            HttpMethod::Post,
            &join_path(self.path, path),
            Some(Payload::json(&body)),
        )?;
        Ok(res.unwrap_or_default())
    }
}
