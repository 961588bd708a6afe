//! Full lifecycle tests against the live mock server.
//!
//! # Design
//! Each test starts its own mock server on an ephemeral port (fresh
//! state) and drives the client over real HTTP, covering every
//! [`Service`] operation plus the error taxonomy: API errors with their
//! server codes, transport failures, and undecodable bodies.

use opa_client::{codes, AdHocQueryOptions, Client, Error, Service};
use serde_json::{json, Map, Value};

/// Starts the mock server on a random port and returns its base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

/// Same as [`start_server`], requiring the given bearer token.
fn start_server_with_token(token: &str) -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    let app = mock_server::app_with_token(token);
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with(listener, app).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn obj(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

#[test]
fn policy_lifecycle() {
    let client = Client::builder().url(start_server()).build().unwrap();

    let policy = "
package opa.examples

import data.servers
import data.networks
import data.ports
";
    client.policy_create_or_update("example1", policy.as_bytes()).unwrap();

    let updated = "
package opa.examples

import data.servers
import data.networks
";
    client.policy_create_or_update("example1", updated.as_bytes()).unwrap();

    let list = client.policy_list().unwrap();
    assert_eq!(list.result.len(), 1);
    assert_eq!(list.result[0].id, "example1");
    assert_eq!(list.result[0].raw, updated);

    let got = client.policy_get("example1").unwrap();
    assert_eq!(got.result.id, "example1");
    assert_eq!(got.result.raw, updated);

    client.policy_delete("example1").unwrap();
    assert!(client.policy_list().unwrap().result.is_empty());

    let err = client.policy_get("example1").unwrap_err();
    assert_eq!(err.api_code(), Some(codes::RESOURCE_NOT_FOUND));

    let err = client.policy_delete("example1").unwrap_err();
    assert_eq!(err.api_code(), Some(codes::RESOURCE_NOT_FOUND));
}

#[test]
fn invalid_policy_surfaces_the_compile_error() {
    let client = Client::builder().url(start_server()).build().unwrap();

    let err = client.policy_create_or_update("example1", b"\npotato\n").unwrap_err();
    let Error::Api(api) = err else {
        panic!("expected an API error, got {err}");
    };
    assert_eq!(api.code, codes::INVALID_PARAMETER);
    assert!(api.to_string().starts_with("invalid_parameter: "));

    assert_eq!(api.errors.len(), 1);
    let nested = &api.errors[0];
    assert_eq!(nested.details, vec!["potato".to_string()]);
    let location = nested.location.as_ref().unwrap();
    assert_eq!(location.file, "example1");
    assert_eq!(location.row, 2);
}

#[test]
fn data_lifecycle() {
    let client = Client::builder().url(start_server()).build().unwrap();

    let document = obj(json!({"example": {"key": "value"}}));
    client.data_create_or_override("test-data", &document).unwrap();

    let res = client.data_get("test-data").unwrap();
    assert_eq!(res.result, Some(json!({"example": {"key": "value"}})));

    // reading a sub-path projects into the document
    let res = client.data_get("test-data/example").unwrap();
    assert_eq!(res.result, Some(json!({"key": "value"})));

    // updating a sub-path patches the parent without touching siblings
    let patch = obj(json!({"key2": "value2"}));
    client.data_update("test-data/example2", &patch).unwrap();
    let res = client.data_get("test-data").unwrap();
    assert_eq!(
        res.result,
        Some(json!({
            "example": {"key": "value"},
            "example2": {"key2": "value2"},
        }))
    );

    // updating the root path replaces the whole document
    let replacement = obj(json!({"fresh": true}));
    client.data_update("test-data", &replacement).unwrap();
    let res = client.data_get("test-data").unwrap();
    assert_eq!(res.result, Some(json!({"fresh": true})));

    // a deleted path reads back as absent, not as an error
    client.data_delete("test-data").unwrap();
    let res = client.data_get("test-data").unwrap();
    assert_eq!(res.result, None);

    let err = client.data_delete("test-data").unwrap_err();
    assert_eq!(err.api_code(), Some(codes::RESOURCE_NOT_FOUND));
}

#[test]
fn data_get_with_input_evaluates_rules() {
    let client = Client::builder().url(start_server()).build().unwrap();

    let policy = "
package opa.examples

import input.example.flag

default allow_request = false
allow_request { flag == true }
";
    client.policy_create_or_update("example-data", policy.as_bytes()).unwrap();

    let input = obj(json!({"example": {"flag": true}}));
    let res = client.data_get_with_input("opa/examples/allow_request", &input).unwrap();
    assert_eq!(res.result, Some(json!(true)));

    let input = obj(json!({"example": {"flag": false}}));
    let res = client.data_get_with_input("opa/examples/allow_request", &input).unwrap();
    assert_eq!(res.result, Some(json!(false)));

    // without input the rule body fails and the default applies
    let res = client.data_get("opa/examples/allow_request").unwrap();
    assert_eq!(res.result, Some(json!(false)));

    client.policy_delete("example-data").unwrap();
}

#[test]
fn simple_query_returns_raw_bytes_for_any_status() {
    let client = Client::builder().url(start_server()).build().unwrap();

    let policy = "
package system

import input.example.flag

main { flag == true }
";
    client.policy_create_or_update("main", policy.as_bytes()).unwrap();

    let input = obj(json!({"example": {"flag": true}}));
    let raw = client.query_simple("/", &input).unwrap();
    let value: Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(value, json!(true));

    // undefined result answers 404; the passthrough still succeeds and
    // hands the error body back verbatim
    let input = obj(json!({"example": {"flag": false}}));
    let raw = client.query_simple("/", &input).unwrap();
    let value: Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(value["code"], json!(codes::UNDEFINED_DOCUMENT));
}

#[test]
fn ad_hoc_query_binds_variables() {
    let client = Client::builder().url(start_server()).build().unwrap();

    client
        .data_create_or_override("servers", &obj(json!({"app": {"port": 8080}})))
        .unwrap();

    let opts = AdHocQueryOptions {
        query: "x = data.servers.app".to_string(),
        ..AdHocQueryOptions::default()
    };
    let res = client.query_ad_hoc("", &opts).unwrap();
    assert_eq!(res.result.len(), 1);
    assert_eq!(res.result[0]["x"], json!({"port": 8080}));

    let opts = AdHocQueryOptions {
        query: "x = data.missing.path".to_string(),
        ..AdHocQueryOptions::default()
    };
    let res = client.query_ad_hoc("", &opts).unwrap();
    assert!(res.result.is_empty());

    let err = client.query_ad_hoc("", &AdHocQueryOptions::default()).unwrap_err();
    assert_eq!(err.api_code(), Some(codes::INVALID_PARAMETER));
}

#[test]
fn bearer_token_is_attached_only_when_configured() {
    let base = start_server_with_token("my-token");

    let denied = Client::builder().url(&base).build().unwrap();
    let err = denied.policy_list().unwrap_err();
    assert_eq!(err.api_code(), Some(codes::UNAUTHORIZED));

    let authorized = Client::builder().url(&base).token("my-token").build().unwrap();
    assert!(authorized.policy_list().unwrap().result.is_empty());
}

#[test]
fn base_url_with_trailing_slash_is_normalized() {
    let base = format!("{}/", start_server());
    let client = Client::builder().url(base).build().unwrap();

    let document = obj(json!({"key": "value"}));
    client.data_create_or_override("test-data", &document).unwrap();
    let res = client.data_get("test-data").unwrap();
    assert_eq!(res.result, Some(json!({"key": "value"})));
}

#[test]
fn connection_failure_is_a_transport_error() {
    let client = Client::builder().url("http://127.0.0.1:1").build().unwrap();
    let err = client.policy_list().unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}

#[test]
fn undecodable_error_body_is_a_decode_failure() {
    let client = Client::builder().url(start_server()).build().unwrap();

    // nothing routes below the query prefix, so the server answers 404
    // with an empty body that cannot decode into the error shape
    let opts = AdHocQueryOptions {
        query: "x = data.servers".to_string(),
        ..AdHocQueryOptions::default()
    };
    let err = client.query_ad_hoc("no/such/route", &opts).unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
}
