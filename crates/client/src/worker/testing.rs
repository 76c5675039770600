//! Scripted network for controller tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use fitshell_core::{Error, Request, Response, ResponseType};
use url::Url;

use crate::fetch::Network;

pub(crate) const ORIGIN: &str = "https://app.example";

pub(crate) fn origin() -> Url {
    Url::parse(ORIGIN).unwrap()
}

pub(crate) fn get(path: &str) -> Request {
    Request::get(origin().join(path).unwrap())
}

pub(crate) fn response(url: &Url, status: u16, body: &'static [u8], response_type: ResponseType) -> Response {
    Response {
        url: url.clone(),
        status,
        status_text: String::new(),
        headers: vec![("content-type".to_string(), "text/plain".to_string())],
        body: Bytes::from_static(body),
        response_type,
    }
}

/// Answers from a fixed route table and counts every call.
/// Unknown URLs get a basic 404.
#[derive(Default)]
pub(crate) struct StubNetwork {
    routes: Mutex<HashMap<String, Result<Response, String>>>,
    calls: AtomicUsize,
}

impl StubNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn route(self, url: Url, outcome: Result<Response, String>) -> Self {
        self.routes.lock().unwrap().insert(url.to_string(), outcome);
        self
    }

    pub(crate) fn ok(self, path: &str, body: &'static [u8]) -> Self {
        let url = origin().join(path).unwrap();
        let res = response(&url, 200, body, ResponseType::Basic);
        self.route(url, Ok(res))
    }

    pub(crate) fn status(self, path: &str, status: u16) -> Self {
        self.respond(path, status, b"")
    }

    pub(crate) fn respond(self, path: &str, status: u16, body: &'static [u8]) -> Self {
        let url = origin().join(path).unwrap();
        let res = response(&url, status, body, ResponseType::Basic);
        self.route(url, Ok(res))
    }

    pub(crate) fn cross_origin(self, url: &str, response_type: ResponseType) -> Self {
        let url = Url::parse(url).unwrap();
        let res = response(&url, 200, b"remote", response_type);
        self.route(url, Ok(res))
    }

    pub(crate) fn fail(self, path: &str) -> Self {
        let url = origin().join(path).unwrap();
        self.route(url, Err("connection reset".to_string()))
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: Request) -> Result<Response, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let routed = self.routes.lock().unwrap().get(request.url.as_str()).cloned();
        match routed {
            Some(Ok(res)) => Ok(res),
            Some(Err(reason)) => Err(Error::Network(reason)),
            None => Ok(response(&request.url, 404, b"not found", ResponseType::Basic)),
        }
    }
}
