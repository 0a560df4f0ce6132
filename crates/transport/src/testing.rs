//! Scripted transport for tests: replays queued replies and records requests

use crate::{HttpRequest, HttpResponse, Transport, TransportError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Semaphore;

enum Reply {
    Response(HttpResponse),
    Error(TransportError),
}

#[derive(Default)]
pub struct FakeTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<HttpRequest>>,
    gate: Option<Arc<Semaphore>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send waits for a permit on `gate` before replying
    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn push_json(&self, status: u16, body: Value) -> &Self {
        self.push_text(status, body.to_string())
    }

    pub fn push_text(&self, status: u16, body: impl Into<String>) -> &Self {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Reply::Response(HttpResponse {
                status,
                body: body.into(),
            }));
        self
    }

    pub fn push_error(&self, error: TransportError) -> &Self {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Reply::Error(error));
        self
    }

    /// Requests seen so far, in send order
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| TransportError::Connect(e.to_string()))?
                .forget();
        }

        let reply = self.replies.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
        match reply {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Error(error)) => Err(error),
            None => Err(TransportError::Connect("no scripted reply".to_string())),
        }
    }
}
