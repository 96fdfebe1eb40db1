#![cfg(test)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::TransportError;
use crate::transport::{ApiRequest, HttpResponse, Transport};

type Scripted = Result<HttpResponse, TransportError>;

/// Transport that replays a fixed script and records every attempt.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    fallback: Option<Scripted>,
    sent: Mutex<Vec<(Instant, ApiRequest)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, status: u16, body: &str) -> Self {
        self.push(Ok(HttpResponse::new(status, body.to_string())))
    }

    pub fn reply_json(self, status: u16, body: serde_json::Value) -> Self {
        self.push(Ok(HttpResponse::new(status, body.to_string())))
    }

    pub fn fail(self, err: TransportError) -> Self {
        self.push(Err(err))
    }

    /// Answer every attempt after the script runs out.
    pub fn reply_always(mut self, status: u16, body: &str) -> Self {
        self.fallback = Some(Ok(HttpResponse::new(status, body.to_string())));
        self
    }

    fn push(self, item: Scripted) -> Self {
        self.script.lock().unwrap().push_back(item);
        self
    }

    pub fn sent(&self) -> Vec<ApiRequest> {
        self.sent.lock().unwrap().iter().map(|(_, r)| r.clone()).collect()
    }

    pub fn sent_at(&self) -> Vec<Instant> {
        self.sent.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<HttpResponse, TransportError> {
        self.sent
            .lock()
            .unwrap()
            .push((Instant::now(), request.clone()));
        let next = self.script.lock().unwrap().pop_front();
        match next.or_else(|| self.fallback.clone()) {
            Some(item) => item,
            None => Err(TransportError::Other("script exhausted".into())),
        }
    }
}
