//! In-memory transport for unit tests

use std::future::Future;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use super::error::Result;
use super::transport::{HttpRequest, HttpResponse, Transport};

pub(crate) const DATE_HEADER: &str = "Sun, 05 Aug 2018 11:08:39 GMT";

type Handler = Box<dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync>;

/// Answers every request with a handler and records what was sent
pub(crate) struct FakeTransport {
    handler: Handler,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeTransport {
    pub(crate) fn new(
        handler: impl Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for FakeTransport {
    fn execute(&self, request: HttpRequest) -> impl Future<Output = Result<HttpResponse>> + Send {
        let response = (self.handler)(&request);
        self.requests.lock().unwrap().push(request);
        async move { Ok(response) }
    }
}

/// JSON response carrying a fixed `Date` header
pub(crate) fn respond(status: u16, body: Value) -> HttpResponse {
    HttpResponse {
        status,
        headers: vec![("Date".to_string(), DATE_HEADER.to_string())],
        body: serde_json::to_vec(&body).unwrap(),
    }
}

/// Decoded value of one query parameter
pub(crate) fn query_value(request: &HttpRequest, key: &str) -> Option<String> {
    request
        .url
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// A single-page collection body
pub(crate) fn collection(data: Vec<Value>, next_url: Option<String>, total_count: i64) -> Value {
    serde_json::json!({
        "object": "collection",
        "data_updated_at": "2018-08-05T11:08:39.431000Z",
        "pages": {"per_page": 500, "next_url": next_url},
        "total_count": total_count,
        "data": data
    })
}
