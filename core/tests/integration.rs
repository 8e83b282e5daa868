//! Every client operation against the live mock server.
//!
//! # Design
//! Each test starts the mock server on a random port inside the test's
//! runtime and talks to it over real HTTP through the default reqwest
//! transport. The server records every request it receives, which lets the
//! tests assert exact paths and that rejected calls never left the client.

use std::time::Duration;

use chrono::NaiveDate;
use mock_server::MockState;
use tranco_client::{
    ApiError, CancelToken, ClientConfig, Configuration, ErrorKind, HttpRequest, HttpResponse,
    Operation, TrancoClient, Transport, TransportError,
};

async fn start(state: MockState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener, state));
    format!("http://{addr}")
}

fn client(base_url: &str) -> TrancoClient {
    TrancoClient::from_config(ClientConfig::default().with_base_url(base_url)).unwrap()
}

fn authed_client(base_url: &str, username: &str, password: &str) -> TrancoClient {
    let config = ClientConfig::default()
        .with_base_url(base_url)
        .with_credentials(username, password);
    TrancoClient::from_config(config).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn configuration() -> Configuration {
    Configuration {
        providers: vec!["umbrella".into(), "majestic".into(), "farsight".into()],
        list_prefix: "short".into(),
        start_date: date(2023, 1, 1),
        end_date: date(2023, 1, 30),
        filter_tld: "false".into(),
        filter_pld: "on".into(),
        combination_method: "borda".into(),
        is_daily_list: false,
    }
}

// ---------------------------------------------------------------------------
// Ranks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_ranks_returns_history_most_recent_first() {
    let url = start(MockState::seeded()).await;

    let ranks = client(&url).get_ranks("example.com").await.unwrap();

    assert_eq!(ranks.domain, "example.com");
    assert_eq!(ranks.ranks.len(), 10);
    assert_eq!(ranks.ranks[0].date, date(2023, 9, 2));
    assert_eq!(ranks.ranks[0].rank, 192);
    assert_eq!(ranks.ranks[9].date, date(2023, 8, 24));
    assert!(ranks.ranks.windows(2).all(|w| w[0].date > w[1].date));
}

#[tokio::test]
async fn get_ranks_unknown_domain_is_empty() {
    let url = start(MockState::seeded()).await;

    let ranks = client(&url).get_ranks("no-example.com").await.unwrap();

    assert_eq!(ranks.domain, "no-example.com");
    assert!(ranks.ranks.is_empty());
}

#[tokio::test]
async fn get_ranks_empty_domain_never_reaches_server() {
    let state = MockState::seeded();
    let url = start(state.clone()).await;

    let err = client(&url).get_ranks("").await.unwrap_err();

    assert_eq!(err.operation(), Operation::GetRanks);
    assert!(matches!(err.kind(), ErrorKind::Validation(_)));
    assert!(state.requests().await.is_empty());
}

// ---------------------------------------------------------------------------
// List metadata
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_list_metadata_by_id_maps_every_field() {
    let url = start(MockState::seeded()).await;

    let list = client(&url).get_list_metadata_by_id("JX5LY").await.unwrap();

    assert_eq!(list.list_id, "JX5LY");
    assert!(list.available);
    assert!(!list.failed);
    assert_eq!(list.download, "https://tranco-list.eu/download/JX5LY/1000000");
    assert_eq!(
        list.created_on,
        date(2022, 12, 11).and_hms_micro_opt(22, 0, 9, 199_647).unwrap()
    );
    assert_eq!(
        list.configuration,
        Configuration {
            providers: vec![
                "alexa".into(),
                "umbrella".into(),
                "majestic".into(),
                "farsight".into()
            ],
            list_prefix: "full".into(),
            start_date: date(2022, 11, 12),
            end_date: date(2022, 12, 11),
            filter_tld: "false".into(),
            filter_pld: "on".into(),
            combination_method: "dowdall".into(),
            is_daily_list: true,
        }
    );
}

#[tokio::test]
async fn get_list_metadata_by_id_not_found_carries_service_error() {
    let url = start(MockState::seeded()).await;

    let err = client(&url).get_list_metadata_by_id("xxx").await.unwrap_err();

    assert_eq!(err.operation(), Operation::GetListMetadataById);
    assert_eq!(
        err.api_error(),
        Some(&ApiError {
            http_status: 404,
            code: 4,
            message: "Not Found".to_string(),
        })
    );
}

#[tokio::test]
async fn get_list_metadata_by_id_empty_id_never_reaches_server() {
    let state = MockState::seeded();
    let url = start(state.clone()).await;

    let err = client(&url).get_list_metadata_by_id("").await.unwrap_err();

    assert!(matches!(err.kind(), ErrorKind::Validation(_)));
    assert!(state.requests().await.is_empty());
}

#[tokio::test]
async fn get_list_metadata_by_date_uses_compact_date_path() {
    let state = MockState::seeded();
    let url = start(state.clone()).await;

    let list = client(&url)
        .get_list_metadata_by_date(date(2022, 12, 11))
        .await
        .unwrap();

    assert_eq!(list.list_id, "JX5LY");
    assert_eq!(state.requests().await, vec!["GET /api/lists/date/20221211".to_string()]);
}

#[tokio::test]
async fn get_list_metadata_by_date_forwards_unknown_dates() {
    let state = MockState::seeded();
    let url = start(state.clone()).await;

    let err = client(&url)
        .get_list_metadata_by_date(date(1192, 12, 11))
        .await
        .unwrap_err();

    assert_eq!(err.operation(), Operation::GetListMetadataByDate);
    assert_eq!(err.api_error().map(|e| e.http_status), Some(404));
    assert_eq!(state.requests().await, vec!["GET /api/lists/date/11921211".to_string()]);
}

#[tokio::test]
async fn non_json_error_body_keeps_status_only() {
    let url = start(MockState::seeded()).await;

    // Unknown routes answer 404 with an empty body.
    let err = client(&format!("{url}/missing"))
        .get_list_metadata_by_id("JX5LY")
        .await
        .unwrap_err();

    assert_eq!(err.api_error(), Some(&ApiError::status_only(404)));
    assert_eq!(
        err.to_string(),
        "get list metadata by id failed: request failed with status code 404"
    );
}

// ---------------------------------------------------------------------------
// Authenticated calls
// ---------------------------------------------------------------------------

#[tokio::test]
async fn auth_test_accepts_valid_credentials() {
    let url = start(MockState::seeded().with_credentials("user", "pass")).await;

    authed_client(&url, "user", "pass").auth_test().await.unwrap();
}

#[tokio::test]
async fn auth_test_rejected_credentials_are_api_error() {
    let url = start(MockState::seeded().with_credentials("user", "pass")).await;

    let err = authed_client(&url, "user", "wrong").auth_test().await.unwrap_err();

    assert_eq!(err.operation(), Operation::AuthTest);
    assert_eq!(err.api_error().map(|e| (e.http_status, e.code)), Some((401, 2)));
}

#[tokio::test]
async fn authenticated_calls_without_credentials_never_reach_server() {
    let state = MockState::seeded().with_credentials("user", "pass");
    let url = start(state.clone()).await;

    let err = client(&url).auth_test().await.unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Configuration(_)));

    let err = authed_client(&url, "", "")
        .create_list(&configuration())
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Configuration(_)));

    assert!(state.requests().await.is_empty());
}

#[tokio::test]
async fn created_list_echoes_configuration() {
    let state = MockState::seeded().with_credentials("user", "pass");
    let url = start(state.clone()).await;
    let client = authed_client(&url, "user", "pass");
    let input = configuration();

    let created = client.create_list(&input).await.unwrap();
    assert_eq!(created.list_id.len(), 5);
    assert!(created.warnings.is_empty());

    let list = client.get_list_metadata_by_id(&created.list_id).await.unwrap();
    assert_eq!(list.list_id, created.list_id);
    assert_eq!(list.configuration, input);
    assert!(!list.available);

    assert_eq!(
        state.requests().await,
        vec![
            "PUT /api/lists/create".to_string(),
            format!("GET /api/lists/id/{}", created.list_id),
        ]
    );
}

#[tokio::test]
async fn create_list_surfaces_service_warnings() {
    let url = start(MockState::seeded().with_credentials("user", "pass")).await;
    let input = Configuration {
        providers: vec!["alexa".into()],
        ..configuration()
    };

    let created = authed_client(&url, "user", "pass")
        .create_list(&input)
        .await
        .unwrap();

    assert_eq!(created.warnings, vec!["Alexa data is no longer updated".to_string()]);
}

// ---------------------------------------------------------------------------
// Transport failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn connection_refused_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{addr}"))
        .get_ranks("example.com")
        .await
        .unwrap_err();

    assert!(matches!(err.kind(), ErrorKind::Transport(TransportError::Http(_))));
}

/// Serve a single connection with a fixed status and raw body bytes.
async fn serve_raw(status_line: &'static str, body: &'static [u8]) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request: Vec<u8> = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let head = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
            body.len()
        );
        stream.write_all(head.as_bytes()).await.unwrap();
        stream.write_all(body).await.unwrap();
        let _ = stream.shutdown().await;
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn invalid_utf8_success_body_is_decode_error() {
    let url = serve_raw("200 OK", b"{\"domain\":\"ex\xFFample.com\",\"ranks\":[]}").await;

    let err = client(&url).get_ranks("example.com").await.unwrap_err();

    assert_eq!(err.operation(), Operation::GetRanks);
    assert!(matches!(err.kind(), ErrorKind::Decode(_)), "got {err}");
}

#[tokio::test]
async fn invalid_utf8_error_body_keeps_status_only() {
    let url = serve_raw("404 Not Found", b"{\"code\":4,\"message\":\"Not \xFFFound\"}").await;

    let err = client(&url).get_list_metadata_by_id("JX5LY").await.unwrap_err();

    assert_eq!(err.api_error(), Some(&ApiError::status_only(404)));
}

/// A transport whose requests never complete.
struct Stalled;

impl Transport for Stalled {
    async fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
        std::future::pending().await
    }
}

fn stalled_client() -> TrancoClient<Stalled> {
    TrancoClient::with_transport(ClientConfig::default(), Stalled)
}

#[tokio::test]
async fn cancel_token_aborts_in_flight_request() {
    let token = CancelToken::new();
    let client = stalled_client().with_cancel(token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });

    let err = client.get_ranks("example.com").await.unwrap_err();
    canceller.await.unwrap();

    assert_eq!(err.operation(), Operation::GetRanks);
    assert!(matches!(err.kind(), ErrorKind::Transport(TransportError::Cancelled)));
}

#[tokio::test]
async fn already_cancelled_token_fails_immediately() {
    let token = CancelToken::new();
    token.cancel();

    let err = stalled_client()
        .with_cancel(token)
        .get_list_metadata_by_date(date(2022, 12, 11))
        .await
        .unwrap_err();

    assert!(matches!(err.kind(), ErrorKind::Transport(TransportError::Cancelled)));
}

#[tokio::test]
async fn call_timeout_aborts_slow_request() {
    let err = stalled_client()
        .with_call_timeout(Duration::from_millis(20))
        .get_list_metadata_by_id("JX5LY")
        .await
        .unwrap_err();

    assert!(matches!(err.kind(), ErrorKind::Transport(TransportError::TimedOut)));
}
