//! The full operation set supported against the policy engine.

use serde_json::{Map, Value};

use crate::client::Client;
use crate::error::Error;
use crate::types::{
    AdHocQueryOptions, DataResponse, PolicyDeleteResponse, PolicyGetResponse, PolicyListResponse,
    PolicyPutResponse, QueryResponse,
};

/// Every policy, data, and query operation the engine's API offers.
///
/// [`Client`] implements this by delegating to its resource services;
/// the trait is object safe, so code under test can depend on
/// `&dyn Service` and swap in a double.
pub trait Service {
    /// Creates or updates the policy `id` from raw source text.
    fn policy_create_or_update(&self, id: &str, policy: &[u8]) -> Result<PolicyPutResponse, Error>;

    /// Lists all policies, in the server's order.
    fn policy_list(&self) -> Result<PolicyListResponse, Error>;

    /// Fetches the policy `id`.
    fn policy_get(&self, id: &str) -> Result<PolicyGetResponse, Error>;

    /// Deletes the policy `id`.
    fn policy_delete(&self, id: &str) -> Result<PolicyDeleteResponse, Error>;

    /// Creates the document at `path`, replacing anything already there.
    fn data_create_or_override(&self, path: &str, data: &Map<String, Value>) -> Result<(), Error>;

    /// Reads the document at `path`.
    fn data_get(&self, path: &str) -> Result<DataResponse, Error>;

    /// Evaluates the document at `path` against `input`.
    fn data_get_with_input(
        &self,
        path: &str,
        input: &Map<String, Value>,
    ) -> Result<DataResponse, Error>;

    /// Writes the document at `path`; replace or merge is determined by
    /// the server from the path granularity.
    fn data_update(&self, path: &str, data: &Map<String, Value>) -> Result<(), Error>;

    /// Deletes the document at `path`.
    fn data_delete(&self, path: &str) -> Result<(), Error>;

    /// Posts `input` to the literal `path` and returns the raw response
    /// bytes regardless of status.
    fn query_simple(&self, path: &str, input: &Map<String, Value>) -> Result<Vec<u8>, Error>;

    /// Runs an ad-hoc query under the query prefix.
    fn query_ad_hoc(&self, path: &str, options: &AdHocQueryOptions)
        -> Result<QueryResponse, Error>;
}

impl Service for Client {
    fn policy_create_or_update(&self, id: &str, policy: &[u8]) -> Result<PolicyPutResponse, Error> {
        self.policies.create_or_update(id, policy)
    }

    fn policy_list(&self) -> Result<PolicyListResponse, Error> {
        self.policies.list()
    }

    fn policy_get(&self, id: &str) -> Result<PolicyGetResponse, Error> {
        self.policies.get(id)
    }

    fn policy_delete(&self, id: &str) -> Result<PolicyDeleteResponse, Error> {
        self.policies.delete(id)
    }

    fn data_create_or_override(&self, path: &str, data: &Map<String, Value>) -> Result<(), Error> {
        self.data.create_or_override(path, data)
    }

    fn data_get(&self, path: &str) -> Result<DataResponse, Error> {
        self.data.get(path)
    }

    fn data_get_with_input(
        &self,
        path: &str,
        input: &Map<String, Value>,
    ) -> Result<DataResponse, Error> {
        self.data.get_with_input(path, input)
    }

    fn data_update(&self, path: &str, data: &Map<String, Value>) -> Result<(), Error> {
        self.data.update(path, data)
    }

    fn data_delete(&self, path: &str) -> Result<(), Error> {
        self.data.delete(path)
    }

    fn query_simple(&self, path: &str, input: &Map<String, Value>) -> Result<Vec<u8>, Error> {
        self.queries.simple(path, input)
    }

    fn query_ad_hoc(
        &self,
        path: &str,
        options: &AdHocQueryOptions,
    ) -> Result<QueryResponse, Error> {
        self.queries.ad_hoc(path, options)
    }
}
