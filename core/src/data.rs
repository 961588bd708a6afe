//! Document tree operations.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::Error;
use crate::http::{join_path, HttpMethod, Payload, Transport};
use crate::types::DataResponse;

/// Operations on the hierarchical document tree under `/v1/data`.
#[derive(Debug)]
pub(crate) struct DataService {
    transport: Arc<Transport>,
    path: &'static str,
}

impl DataService {
    pub(crate) fn new(transport: Arc<Transport>) -> Self {
        Self { transport, path: "/v1/data" }
    }

    /// Creates the document at `path`, replacing anything already there.
    ///
    /// <https://www.openpolicyagent.org/docs/latest/rest-api/#create-or-overwrite-a-document>
    pub(crate) fn create_or_override(&self, path: &str, data: &Map<String, Value>) -> Result<(), Error> {
        self.put(path, data)
    }

    /// Reads the document at `path`. An undefined path yields an absent
    /// `result`, not an error.
    ///
    /// <https://www.openpolicyagent.org/docs/latest/rest-api/#get-a-document>
    pub(crate) fn get(&self, path: &str) -> Result<DataResponse, Error> {
        let res = self.transport.execute(HttpMethod::Get, &join_path(self.path, path), None)?;
        Ok(res.unwrap_or_default())
    }

    /// Evaluates the document at `path` against the supplied input.
    ///
    /// <https://www.openpolicyagent.org/docs/latest/rest-api/#get-a-document-with-input>
    pub(crate) fn get_with_input(
        &self,
        path: &str,
        input: &Map<String, Value>,
    ) -> Result<DataResponse, Error> {
        let mut wrapper = Map::new();
        wrapper.insert("input".to_string(), Value::Object(input.clone()));
        let body = serde_json::to_vec(&wrapper).map_err(Error::Encode)?;

        let res = self.transport.execute(
            HttpMethod::Post,
            &join_path(self.path, path),
            Some(Payload::json(&body)),
        )?;
        Ok(res.unwrap_or_default())
    }

    /// Writes the document at `path`. Wire-identical to
    /// [`create_or_override`](Self::create_or_override); whether the
    /// server replaces or merges is decided by the path granularity,
    /// so point this at a sub-path to patch a single element.
    ///
    /// <https://www.openpolicyagent.org/docs/latest/rest-api/#patch-a-document>
    pub(crate) fn update(&self, path: &str, data: &Map<String, Value>) -> Result<(), Error> {
        self.put(path, data)
    }

    /// Deletes the document at `path`.
    ///
    /// <https://www.openpolicyagent.org/docs/latest/rest-api/#delete-a-document>
    pub(crate) fn delete(&self, path: &str) -> Result<(), Error> {
        let _: Option<Value> =
            self.transport.execute(HttpMethod::Delete, &join_path(self.path, path), None)?;
        Ok(())
    }

    fn put(&self, path: &str, data: &Map<String, Value>) -> Result<(), Error> {
        let body = serde_json::to_vec(data).map_err(Error::Encode)?;
        let _: Option<Value> = self.transport.execute(
            HttpMethod::Put,
            &join_path(self.path, path),
            Some(Payload::json(&body)),
        )?;
        Ok(())
    }
}
