use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::config::ContextConfig;
use crate::context::Context;
use crate::transport::{BoxError, Transport, TransportRequest, TransportResponse};

// --- Scripted transport ---

enum Scripted {
    Respond(TransportResponse),
    Fail(String),
}

/// Transport that records every request and replays scripted answers in order
///
/// Once the script runs out every request gets an empty 200.
#[derive(Clone, Default)]
pub struct MockTransport {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<TransportRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, response: TransportResponse) {
        self.script.lock().expect("mock script lock poisoned").push_back(Scripted::Respond(response));
    }

    pub fn fail(&self, message: &str) {
        self.script
            .lock()
            .expect("mock script lock poisoned")
            .push_back(Scripted::Fail(message.to_string()));
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().expect("mock requests lock poisoned").clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse, BoxError> {
        self.requests.lock().expect("mock requests lock poisoned").push(request);
        let next = self.script.lock().expect("mock script lock poisoned").pop_front();
        match next {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Fail(message)) => Err(message.into()),
            None => Ok(TransportResponse::empty(200)),
        }
    }
}

/// Valid context for namespace `acme` over `transport`
pub fn context_with(transport: &MockTransport) -> Context {
    Context::new(ContextConfig::new("https://platform.example", "acme"), Arc::new(transport.clone()))
}
