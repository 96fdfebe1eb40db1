use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::{ApiError, TransportError};
use crate::retry::RetryState;
use crate::transport::{ApiRequest, HttpResponse, Transport};

/// A failed attempt as it travels through the inbound hooks.
#[derive(Debug, Clone)]
pub enum Failure {
    /// No response arrived (DNS, connect, timeout, reset).
    Transport(TransportError),
    /// A response arrived with a non-2xx status.
    Status(HttpResponse),
    /// Already translated by the error normalizer.
    Normalized(ApiError),
}

impl Failure {
    pub fn status(&self) -> Option<u16> {
        match self {
            Failure::Transport(_) => None,
            Failure::Status(resp) => Some(resp.status),
            Failure::Normalized(err) => Some(err.status),
        }
    }
}

pub type Outcome = Result<HttpResponse, Failure>;

/// Outbound hook; may edit the request before it reaches the transport.
pub trait RequestHook: Send + Sync {
    fn name(&self) -> &str;
    fn on_request(&self, request: &mut ApiRequest);
}

/// Inbound hook. Both methods default to passing the outcome through.
#[async_trait]
pub trait ResponseHook: Send + Sync {
    fn name(&self) -> &str;

    async fn on_success(&self, response: HttpResponse, _call: &mut Call<'_>) -> Outcome {
        Ok(response)
    }

    async fn on_failure(&self, failure: Failure, _call: &mut Call<'_>) -> Outcome {
        Err(failure)
    }
}

/// What an inbound hook knows about the logical request it is handling.
pub struct Call<'a> {
    pipeline: &'a Pipeline,
    transport: &'a dyn Transport,
    request: &'a ApiRequest,
    state: &'a mut RetryState,
    position: usize,
}

impl<'a> Call<'a> {
    /// The request as the caller issued it, before outbound hooks.
    pub fn request(&self) -> &ApiRequest {
        self.request
    }

    pub fn state(&self) -> &RetryState {
        self.state
    }

    pub fn state_mut(&mut self) -> &mut RetryState {
        self.state
    }

    /// Send the identical request again. The new attempt passes through the
    /// outbound hooks and the transport, and then through the inbound hooks
    /// that run before this one.
    pub fn reissue(&mut self) -> BoxFuture<'_, Outcome> {
        self.pipeline
            .run(self.transport, self.request, &mut *self.state, self.position + 1)
    }
}

/// Ordered request/response hook chain.
///
/// Outbound hooks run in registration order. Inbound hooks run in reverse:
/// the last registered inbound hook is the first to see a response or
/// failure. The default client registers the error normalizer before the
/// retry hook, so retry decisions are made on raw failures.
#[derive(Default, Clone)]
pub struct Pipeline {
    outbound: Vec<Arc<dyn RequestHook>>,
    inbound: Vec<Arc<dyn ResponseHook>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_outbound(&mut self, hook: Arc<dyn RequestHook>) -> &mut Self {
        self.outbound.push(hook);
        self
    }

    pub fn register_inbound(&mut self, hook: Arc<dyn ResponseHook>) -> &mut Self {
        self.inbound.push(hook);
        self
    }

    pub fn outbound_names(&self) -> Vec<&str> {
        self.outbound.iter().map(|h| h.name()).collect()
    }

    pub fn inbound_names(&self) -> Vec<&str> {
        self.inbound.iter().map(|h| h.name()).collect()
    }

    /// Run one logical request through the whole chain.
    pub async fn dispatch(
        &self,
        transport: &dyn Transport,
        request: &ApiRequest,
        state: &mut RetryState,
    ) -> Outcome {
        self.run(transport, request, state, 0).await
    }

    /// One attempt, then inbound hooks from the last registered down to `floor`.
    fn run<'a>(
        &'a self,
        transport: &'a dyn Transport,
        request: &'a ApiRequest,
        state: &'a mut RetryState,
        floor: usize,
    ) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            let mut outgoing = request.clone();
            for hook in &self.outbound {
                hook.on_request(&mut outgoing);
            }

            let mut outcome = match transport.send(&outgoing).await {
                Ok(resp) if resp.is_success() => Ok(resp),
                Ok(resp) => Err(Failure::Status(resp)),
                Err(e) => Err(Failure::Transport(e)),
            };

            for position in (floor..self.inbound.len()).rev() {
                let hook = &self.inbound[position];
                let mut call = Call {
                    pipeline: self,
                    transport,
                    request,
                    state: &mut *state,
                    position,
                };
                outcome = match outcome {
                    Ok(resp) => hook.on_success(resp, &mut call).await,
                    Err(failure) => hook.on_failure(failure, &mut call).await,
                };
            }
            outcome
        })
    }
}

/// Outbound request logging; silent unless dev mode is on.
#[derive(Debug, Clone, Copy)]
pub struct RequestLogger {
    dev_mode: bool,
}

impl RequestLogger {
    pub fn new(dev_mode: bool) -> Self {
        Self { dev_mode }
    }
}

impl RequestHook for RequestLogger {
    fn name(&self) -> &str {
        "request-logger"
    }

    fn on_request(&self, request: &mut ApiRequest) {
        if self.dev_mode {
            tracing::debug!(method = %request.method, path = %request.path, "api request");
        }
    }
}
