//! In-memory stand-in for the Tranco API.
//!
//! Serves the same paths and JSON shapes as `https://tranco-list.eu`,
//! seeded from `fixtures/`. Lists created through `PUT /api/lists/create`
//! are kept in memory so they can be fetched back by id. Every request's
//! method and path is recorded for assertions in tests.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RankEntry {
    pub date: String,
    pub rank: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ranks {
    pub domain: String,
    pub ranks: Vec<RankEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub providers: Vec<String>,
    pub list_prefix: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(rename = "filterTLD")]
    pub filter_tld: String,
    #[serde(rename = "filterPLD")]
    pub filter_pld: String,
    pub combination_method: String,
    pub is_daily_list: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListMetadata {
    pub list_id: String,
    pub available: bool,
    pub failed: bool,
    pub download: String,
    pub created_on: String,
    pub configuration: Configuration,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreatedList {
    pub list_id: String,
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: i64,
    pub message: String,
}

pub const CODE_INVALID_REQUEST: i64 = 1;
pub const CODE_UNAUTHORIZED: i64 = 2;
pub const CODE_NOT_FOUND: i64 = 4;

#[derive(Default)]
struct Store {
    ranks: HashMap<String, Vec<RankEntry>>,
    lists: HashMap<String, ListMetadata>,
    /// `YYYYMMDD` of a daily list's end date -> list id.
    daily: HashMap<String, String>,
    requests: Vec<String>,
}

impl Store {
    fn insert_list(&mut self, list: ListMetadata) {
        if list.configuration.is_daily_list {
            let key = list.configuration.end_date.replace('-', "");
            self.daily.insert(key, list.list_id.clone());
        }
        self.lists.insert(list.list_id.clone(), list);
    }
}

/// Shared state of one mock server instance.
#[derive(Clone)]
pub struct MockState {
    store: Arc<RwLock<Store>>,
    credentials: Option<(String, String)>,
}

impl MockState {
    /// Empty server that rejects every authenticated call.
    pub fn empty() -> Self {
        Self {
            store: Arc::new(RwLock::new(Store::default())),
            credentials: None,
        }
    }

    /// Server loaded with the rank and list fixtures.
    pub fn seeded() -> Self {
        let ranks: Vec<Ranks> = serde_json::from_str(include_str!("../fixtures/ranks.json"))
            .expect("fixtures/ranks.json is valid");
        let lists: Vec<ListMetadata> = serde_json::from_str(include_str!("../fixtures/lists.json"))
            .expect("fixtures/lists.json is valid");

        let mut store = Store::default();
        for entry in ranks {
            store.ranks.insert(entry.domain, entry.ranks);
        }
        for list in lists {
            store.insert_list(list);
        }
        Self {
            store: Arc::new(RwLock::new(store)),
            credentials: None,
        }
    }

    /// Accept HTTP Basic authentication with exactly these credentials.
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.credentials = Some((username.to_string(), password.to_string()));
        self
    }

    /// `"METHOD /path"` of every request received so far, in order.
    pub async fn requests(&self) -> Vec<String> {
        self.store.read().await.requests.clone()
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let Some((username, password)) = &self.credentials else {
            return false;
        };
        basic_auth(headers).is_some_and(|(u, p)| &u == username && &p == password)
    }
}

pub fn app(state: MockState) -> Router {
    Router::new()
        .route("/api/ranks/domain/{domain}", get(get_ranks))
        .route("/api/lists/id/{id}", get(get_list_by_id))
        .route("/api/lists/date/{date}", get(get_list_by_date))
        .route("/api/lists/create", put(create_list))
        .route("/api/auth/test", get(auth_test))
        .layer(middleware::from_fn_with_state(state.clone(), record_request))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    axum::serve(listener, app(state)).await
}

async fn record_request(State(state): State<MockState>, req: Request, next: Next) -> Response {
    let line = format!("{} {}", req.method(), req.uri().path());
    state.store.write().await.requests.push(line);
    next.run(req).await
}

fn error(status: StatusCode, code: i64, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            code,
            message: message.to_string(),
        }),
    )
        .into_response()
}

fn not_found() -> Response {
    error(StatusCode::NOT_FOUND, CODE_NOT_FOUND, "Not Found")
}

fn unauthorized() -> Response {
    error(StatusCode::UNAUTHORIZED, CODE_UNAUTHORIZED, "Unauthorized")
}

/// Decode `Authorization: Basic ...` into its username and password.
fn basic_auth(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = String::from_utf8(STANDARD.decode(encoded).ok()?).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

async fn get_ranks(State(state): State<MockState>, Path(domain): Path<String>) -> Json<Ranks> {
    let store = state.store.read().await;
    let ranks = store.ranks.get(&domain).cloned().unwrap_or_default();
    Json(Ranks { domain, ranks })
}

async fn get_list_by_id(State(state): State<MockState>, Path(id): Path<String>) -> Response {
    let store = state.store.read().await;
    match store.lists.get(&id) {
        Some(list) => Json(list.clone()).into_response(),
        None => not_found(),
    }
}

async fn get_list_by_date(State(state): State<MockState>, Path(date): Path<String>) -> Response {
    if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
        return error(
            StatusCode::BAD_REQUEST,
            CODE_INVALID_REQUEST,
            "Date must be formatted as YYYYMMDD",
        );
    }
    let store = state.store.read().await;
    match store.daily.get(&date).and_then(|id| store.lists.get(id)) {
        Some(list) => Json(list.clone()).into_response(),
        None => not_found(),
    }
}

async fn auth_test(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    StatusCode::OK.into_response()
}

async fn create_list(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(configuration): Json<Configuration>,
) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    if configuration.providers.is_empty() {
        return error(
            StatusCode::BAD_REQUEST,
            CODE_INVALID_REQUEST,
            "At least one provider is required",
        );
    }

    let list_id = new_list_id();
    let mut warnings = Vec::new();
    if configuration.providers.iter().any(|p| p == "alexa") {
        warnings.push("Alexa data is no longer updated".to_string());
    }

    let list = ListMetadata {
        list_id: list_id.clone(),
        available: false,
        failed: false,
        download: format!("https://tranco-list.eu/download/{list_id}/1000000"),
        created_on: chrono::Utc::now()
            .naive_utc()
            .format("%Y-%m-%dT%H:%M:%S%.6f")
            .to_string(),
        configuration,
    };
    state.store.write().await.insert_list(list);

    Json(CreatedList { list_id, warnings }).into_response()
}

/// Five upper-case alphanumerics, the shape of real Tranco list ids.
fn new_list_id() -> String {
    Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(5)
        .collect::<String>()
        .to_uppercase()
}
