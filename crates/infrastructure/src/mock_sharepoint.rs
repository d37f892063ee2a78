//! Local HTTP stand-in for SharePoint and the access control service.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Option<String>,
    pub(crate) authorization: Option<String>,
    pub(crate) body: String,
}

#[derive(Debug, Clone)]
struct CannedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

/// Answers queued responses per method and path; unmatched requests get 404.
#[derive(Default)]
pub(crate) struct MockSharePoint {
    responses: Mutex<HashMap<(Method, String), VecDeque<CannedResponse>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockSharePoint {
    pub(crate) async fn respond(&self, method: Method, path: &str, status: StatusCode, body: &str) {
        self.enqueue(method, path, status, HeaderMap::new(), body)
            .await;
    }

    pub(crate) async fn respond_with_header(
        &self,
        method: Method,
        path: &str,
        status: StatusCode,
        header: (HeaderName, &str),
        body: &str,
    ) {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(header.1)
            .unwrap_or_else(|_| panic!("canned header value must be valid"));
        headers.insert(header.0, value);
        self.enqueue(method, path, status, headers, body).await;
    }

    pub(crate) async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().await.clone()
    }

    pub(crate) async fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .await
            .iter()
            .filter(|request| request.path == path)
            .cloned()
            .collect()
    }

    async fn enqueue(
        &self,
        method: Method,
        path: &str,
        status: StatusCode,
        headers: HeaderMap,
        body: &str,
    ) {
        self.responses
            .lock()
            .await
            .entry((method, path.to_owned()))
            .or_default()
            .push_back(CannedResponse {
                status,
                headers,
                body: body.to_owned(),
            });
    }
}

async fn handle(
    State(mock): State<Arc<MockSharePoint>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    mock.requests.lock().await.push(RecordedRequest {
        method: method.clone(),
        path: uri.path().to_owned(),
        query: uri.query().map(str::to_owned),
        authorization: headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned),
        body,
    });

    let canned = mock
        .responses
        .lock()
        .await
        .get_mut(&(method, uri.path().to_owned()))
        .and_then(VecDeque::pop_front);

    match canned {
        Some(canned) => (canned.status, canned.headers, canned.body).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Starts the mock on an ephemeral local port and returns its base URL.
pub(crate) async fn start_mock() -> (Arc<MockSharePoint>, String) {
    let mock = Arc::new(MockSharePoint::default());
    let app = Router::new().fallback(handle).with_state(mock.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|_| panic!("mock listener must bind"));
    let address = listener
        .local_addr()
        .unwrap_or_else(|_| panic!("mock listener must expose its address"));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (mock, format!("http://{address}"))
}

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap_or_else(|_| panic!("http client must build"))
}
