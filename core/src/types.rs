//! Wire types for the policy API.
//!
//! # Design
//! These mirror the server's response envelopes but are defined
//! independently of any server crate. Optional bookkeeping fields
//! (`metrics`, `decision_id`) decode when present and stay `None`
//! otherwise, so the types keep working against servers that enable or
//! disable instrumentation. Integration tests catch any schema drift
//! against the mock server.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A policy module as stored by the server: its id and raw source text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub raw: String,
}

/// Response to listing policies. `result` keeps the server's order;
/// insertion order is not guaranteed by this client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyListResponse {
    #[serde(default)]
    pub result: Vec<Policy>,
}

/// Response to fetching a single policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyGetResponse {
    #[serde(default)]
    pub result: Policy,
}

/// Response to creating or updating a policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyPutResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Map<String, Value>>,
}

/// Response to deleting a policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyDeleteResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Map<String, Value>>,
}

/// Response to reading or evaluating a document.
///
/// `result` is absent when nothing is defined at the requested path;
/// that is a successful response, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Map<String, Value>>,
}

/// Options for an ad-hoc query. Empty fields are omitted from the wire
/// form entirely rather than serialized as null or empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdHocQueryOptions {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unknowns: Vec<String>,
}

/// Response to an ad-hoc query: one map of variable bindings per result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub result: Vec<Map<String, Value>>,
}
