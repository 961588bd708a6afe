//! Policy management operations.

use std::sync::Arc;

use crate::error::Error;
use crate::http::{join_path, HttpMethod, Payload, Transport};
use crate::types::{PolicyDeleteResponse, PolicyGetResponse, PolicyListResponse, PolicyPutResponse};

/// Operations on named policy modules under `/v1/policies`.
#[derive(Debug)]
pub(crate) struct PolicyService {
    transport: Arc<Transport>,
    path: &'static str,
}

impl PolicyService {
    pub(crate) fn new(transport: Arc<Transport>) -> Self {
        Self { transport, path: "/v1/policies" }
    }

    /// Creates or updates the policy `id` from raw source text.
    ///
    /// <https://www.openpolicyagent.org/docs/latest/rest-api/#create-or-update-a-policy>
    pub(crate) fn create_or_update(&self, id: &str, policy: &[u8]) -> Result<PolicyPutResponse, Error> {
        let res = self.transport.execute(
            HttpMethod::Put,
            &join_path(self.path, id),
            Some(Payload::text(policy)),
        )?;
        Ok(res.unwrap_or_default())
    }

    /// Lists all policies.
    ///
    /// <https://www.openpolicyagent.org/docs/latest/rest-api/#list-policies>
    pub(crate) fn list(&self) -> Result<PolicyListResponse, Error> {
        let res = self.transport.execute(HttpMethod::Get, self.path, None)?;
        Ok(res.unwrap_or_default())
    }

    /// Fetches the policy `id`.
    ///
    /// <https://www.openpolicyagent.org/docs/latest/rest-api/#get-a-policy>
    pub(crate) fn get(&self, id: &str) -> Result<PolicyGetResponse, Error> {
        let res = self.transport.execute(HttpMethod::Get, &join_path(self.path, id), None)?;
        Ok(res.unwrap_or_default())
    }

    /// Deletes the policy `id`.
    ///
    /// <https://www.openpolicyagent.org/docs/latest/rest-api/#delete-a-policy>
    pub(crate) fn delete(&self, id: &str) -> Result<PolicyDeleteResponse, Error> {
        let res = self.transport.execute(HttpMethod::Delete, &join_path(self.path, id), None)?;
        Ok(res.unwrap_or_default())
    }
}
