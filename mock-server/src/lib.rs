//! In-memory mock of the policy engine's REST API.
//!
//! Backs the client crate's integration tests: policies are compiled with
//! the small language subset in [`rego`] and evaluated against request
//! input, documents live in a JSON tree keyed by slash-separated paths,
//! and every error answers with the engine's structured body shape
//! (`code`/`message`/`errors`/`location`/`details`).

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

mod rego;

struct StoredPolicy {
    raw: String,
    module: rego::Module,
}

struct Store {
    policies: BTreeMap<String, StoredPolicy>,
    data: Value,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            policies: BTreeMap::new(),
            data: Value::Object(Map::new()),
        }
    }
}

type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/", post(simple_query))
        .route("/v1/policies", get(list_policies))
        .route(
            "/v1/policies/{id}",
            get(get_policy).put(put_policy).delete(delete_policy),
        )
        .route(
            "/v1/data/{*path}",
            get(get_data).put(put_data).post(post_data).delete(delete_data),
        )
        .route("/v1/query", post(ad_hoc_query))
        .with_state(db)
}

/// Same API surface as [`app`], but every request must carry
/// `Authorization: Bearer <token>`; anything else answers 401 with code
/// `unauthorized`.
pub fn app_with_token(token: &str) -> Router {
    let expected = format!("Bearer {token}");
    app().layer(middleware::from_fn(move |req: Request, next: Next| {
        let expected = expected.clone();
        async move {
            let authorized = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                == Some(expected.as_str());
            if authorized {
                next.run(req).await
            } else {
                api_error(
                    StatusCode::UNAUTHORIZED,
                    "unauthorized",
                    "authorization failed".to_string(),
                )
            }
        }
    }))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, app()).await
}

pub async fn run_with(listener: TcpListener, app: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, app).await
}

fn api_error(status: StatusCode, code: &str, message: String) -> Response {
    (status, Json(json!({"code": code, "message": message}))).into_response()
}

fn bad_request(message: String) -> Response {
    api_error(StatusCode::BAD_REQUEST, "invalid_parameter", message)
}

fn policy_not_found(id: &str) -> Response {
    api_error(
        StatusCode::NOT_FOUND,
        "resource_not_found",
        format!("storage_not_found_error: policy id \"{id}\""),
    )
}

// --- policies ---

async fn put_policy(State(db): State<Db>, Path(id): Path<String>, body: String) -> Response {
    match rego::compile(&body) {
        Ok(module) => {
            db.write().await.policies.insert(id, StoredPolicy { raw: body, module });
            Json(json!({})).into_response()
        }
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "code": "invalid_parameter",
                "message": "error(s) occurred while compiling module(s)",
                "errors": [{
                    "code": "rego_parse_error",
                    "message": e.message,
                    "location": {"file": id, "row": e.row, "col": e.col},
                    "details": [e.text],
                }],
            })),
        )
            .into_response(),
    }
}

async fn list_policies(State(db): State<Db>) -> Response {
    let store = db.read().await;
    let result: Vec<Value> = store
        .policies
        .iter()
        .map(|(id, p)| json!({"id": id, "raw": p.raw}))
        .collect();
    Json(json!({"result": result})).into_response()
}

async fn get_policy(State(db): State<Db>, Path(id): Path<String>) -> Response {
    let store = db.read().await;
    match store.policies.get(&id) {
        Some(p) => Json(json!({"result": {"id": id, "raw": p.raw}})).into_response(),
        None => policy_not_found(&id),
    }
}

async fn delete_policy(State(db): State<Db>, Path(id): Path<String>) -> Response {
    match db.write().await.policies.remove(&id) {
        Some(_) => Json(json!({})).into_response(),
        None => policy_not_found(&id),
    }
}

// --- data ---

async fn get_data(State(db): State<Db>, Path(path): Path<String>) -> Response {
    let store = db.read().await;
    document_response(eval_document(&store, &split_path(&path), &Value::Null))
}

async fn post_data(State(db): State<Db>, Path(path): Path<String>, body: Bytes) -> Response {
    let input = if body.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(v) => v.get("input").cloned().unwrap_or(Value::Null),
            Err(e) => {
                return bad_request(format!("error(s) occurred while decoding the input: {e}"))
            }
        }
    };
    let store = db.read().await;
    document_response(eval_document(&store, &split_path(&path), &input))
}

async fn put_data(State(db): State<Db>, Path(path): Path<String>, body: Bytes) -> Response {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            return bad_request(format!("error(s) occurred while decoding the document: {e}"))
        }
    };
    insert_at(&mut db.write().await.data, &split_path(&path), value);
    StatusCode::NO_CONTENT.into_response()
}

async fn delete_data(State(db): State<Db>, Path(path): Path<String>) -> Response {
    if remove_at(&mut db.write().await.data, &split_path(&path)) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        api_error(
            StatusCode::NOT_FOUND,
            "resource_not_found",
            format!("storage_not_found_error: document \"{path}\""),
        )
    }
}

fn document_response(result: Option<Value>) -> Response {
    match result {
        Some(v) => Json(json!({"result": v})).into_response(),
        None => Json(json!({})).into_response(),
    }
}

// --- queries ---

/// The simple-query endpoint: the request body is the input document and
/// the response is the bare value of the `system.main` rule.
async fn simple_query(State(db): State<Db>, body: Bytes) -> Response {
    let input = if body.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice(&body) {
            Ok(v) => v,
            Err(e) => {
                return bad_request(format!("error(s) occurred while decoding the input: {e}"))
            }
        }
    };
    let store = db.read().await;
    let path = split_path("system/main");
    match eval_document(&store, &path, &input) {
        Some(v) => Json(v).into_response(),
        None => api_error(
            StatusCode::NOT_FOUND,
            "undefined_document",
            "data.system.main is undefined".to_string(),
        ),
    }
}

async fn ad_hoc_query(State(db): State<Db>, body: Bytes) -> Response {
    let options: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => return bad_request(format!("error(s) occurred while decoding the query: {e}")),
    };
    let query = options
        .get("query")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string();
    if query.is_empty() {
        return bad_request("parameter \"query\" is required".to_string());
    }
    let store = db.read().await;
    match eval_query(&store, &query) {
        Ok(Some((var, value))) => {
            let mut binding = Map::new();
            binding.insert(var, value);
            Json(json!({"result": [binding]})).into_response()
        }
        Ok(None) => Json(json!({})).into_response(),
        Err(message) => bad_request(message),
    }
}

/// Supports bindings of the form `x = data.a.b.c` (either side), enough
/// to exercise the ad-hoc wire shape.
fn eval_query(store: &Store, query: &str) -> Result<Option<(String, Value)>, String> {
    let Some((lhs, rhs)) = query.split_once('=') else {
        return Err(format!("unsupported query `{query}`"));
    };
    let (lhs, rhs) = (lhs.trim(), rhs.trim());
    let (var, reference) = if lhs.starts_with("data.") {
        (rhs, lhs)
    } else if rhs.starts_with("data.") {
        (lhs, rhs)
    } else {
        return Err(format!("unsupported query `{query}`"));
    };
    if var.is_empty() || !var.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!("unsupported binding variable `{var}`"));
    }
    let path: Vec<String> = reference["data.".len()..]
        .split('.')
        .map(str::to_string)
        .collect();
    Ok(lookup(&store.data, &path).cloned().map(|v| (var.to_string(), v)))
}

// --- document tree ---

fn split_path(path: &str) -> Vec<String> {
    path.split('/').filter(|s| !s.is_empty()).map(str::to_string).collect()
}

/// Stored data wins over rules; otherwise every registered module gets a
/// chance to evaluate the path as a rule against `input`.
fn eval_document(store: &Store, path: &[String], input: &Value) -> Option<Value> {
    if let Some(v) = lookup(&store.data, path) {
        return Some(v.clone());
    }
    store.policies.values().find_map(|p| p.module.eval_rule(path, input))
}

fn lookup<'a>(root: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(root, |node, seg| node.get(seg.as_str()))
}

fn insert_at(root: &mut Value, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        *root = value;
        return;
    };
    let mut node = root;
    for seg in parents {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let Value::Object(map) = node else { unreachable!() };
        node = map.entry(seg.clone()).or_insert_with(|| Value::Object(Map::new()));
    }
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else { unreachable!() };
    map.insert(last.clone(), value);
}

fn remove_at(root: &mut Value, path: &[String]) -> bool {
    let Some((last, parents)) = path.split_last() else {
        return false;
    };
    let mut node = root;
    for seg in parents {
        match node.get_mut(seg.as_str()) {
            Some(next) => node = next,
            None => return false,
        }
    }
    match node {
        Value::Object(map) => map.remove(last).is_some(),
        _ => false,
    }
}
