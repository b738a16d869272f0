//! Shared fixtures for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use quarry_core::config::ContextConfig;
use quarry_core::transport::BoxError;
use quarry_core::{Context, Transport, TransportRequest, TransportResponse};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Records requests and answers from a queue; an empty queue answers 200 with no body
#[derive(Clone, Default)]
pub struct RecordingTransport {
    responses: Arc<Mutex<VecDeque<TransportResponse>>>,
    requests: Arc<Mutex<Vec<TransportRequest>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, response: TransportResponse) -> &Self {
        self.responses.lock().expect("responses lock poisoned").push_back(response);
        self
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().expect("requests lock poisoned").clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|request| request.path).collect()
    }

    pub fn context(&self) -> Context {
        Context::new(ContextConfig::new("https://platform.example", "acme"), Arc::new(self.clone()))
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse, BoxError> {
        self.requests.lock().expect("requests lock poisoned").push(request);
        let next = self.responses.lock().expect("responses lock poisoned").pop_front();
        Ok(next.unwrap_or_else(|| TransportResponse::empty(200)))
    }
}
