use std::sync::Arc;
use std::time::Instant;

use http::Method;
use once_cell::sync::OnceCell;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{field, Instrument};

use crate::config::Config;
use crate::error::{ApiError, ApiResult, CoreResult, DEFAULT_STATUS};
use crate::model::ApiResponse;
use crate::normalizer::{normalize, ErrorNormalizer};
use crate::pipeline::{Pipeline, RequestLogger};
use crate::retry::{RetryHook, RetryPolicy, RetryState};
use crate::session::{Navigator, SessionExpiryRouter};
use crate::telemetry::{self, RequestTrace};
use crate::transport::{ApiRequest, HttpResponse, ReqwestTransport, RequestOptions, Transport};

/// Shared API client. Construct once and pass by reference; every verb
/// operation returns only the envelope's `data` or an [`ApiError`].
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    session: SessionExpiryRouter,
    dev_mode: bool,
    pipeline: OnceCell<Pipeline>,
}

impl ApiClient {
    /// Build a client backed by reqwest.
    pub fn from_config(cfg: &Config, navigator: Arc<dyn Navigator>) -> CoreResult<Self> {
        cfg.validate()?;
        let transport = ReqwestTransport::new(&cfg.client)?;
        Ok(Self::with_transport(cfg, Arc::new(transport), navigator))
    }

    pub fn with_transport(
        cfg: &Config,
        transport: Arc<dyn Transport>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            transport,
            retry: RetryPolicy::from(&cfg.retry),
            session: SessionExpiryRouter::new(navigator, cfg.session.login_path.clone()),
            dev_mode: cfg.dev_mode,
            pipeline: OnceCell::new(),
        }
    }

    /// Replace the default hooks with a caller-assembled pipeline.
    /// Later `setup_interceptors` calls leave it untouched.
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = OnceCell::with_value(pipeline);
        self
    }

    /// Install the default hooks. Returns `true` only for the call that
    /// actually installed them.
    pub fn setup_interceptors(&self) -> bool {
        let mut installed = false;
        self.pipeline.get_or_init(|| {
            installed = true;
            self.default_pipeline()
        });
        installed
    }

    /// The installed pipeline; installs the default one on first use.
    pub fn pipeline(&self) -> &Pipeline {
        self.pipeline.get_or_init(|| self.default_pipeline())
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    fn default_pipeline(&self) -> Pipeline {
        let mut pipeline = Pipeline::new();
        pipeline
            .register_outbound(Arc::new(RequestLogger::new(self.dev_mode)))
            // normalizer first: inbound hooks run in reverse, so retry sees raw failures
            .register_inbound(Arc::new(ErrorNormalizer::new(
                self.session.clone(),
                self.dev_mode,
            )))
            .register_inbound(Arc::new(RetryHook::new(self.retry.clone(), self.dev_mode)));
        pipeline
    }

    pub async fn get<R: DeserializeOwned>(
        &self,
        path: &str,
        opts: Option<RequestOptions>,
    ) -> ApiResult<R> {
        self.request::<(), R>(Method::GET, path, None, opts).await
    }

    pub async fn post<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
        opts: Option<RequestOptions>,
    ) -> ApiResult<R> {
        self.request(Method::POST, path, body, opts).await
    }

    pub async fn put<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
        opts: Option<RequestOptions>,
    ) -> ApiResult<R> {
        self.request(Method::PUT, path, body, opts).await
    }

    pub async fn patch<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
        opts: Option<RequestOptions>,
    ) -> ApiResult<R> {
        self.request(Method::PATCH, path, body, opts).await
    }

    pub async fn delete<R: DeserializeOwned>(
        &self,
        path: &str,
        opts: Option<RequestOptions>,
    ) -> ApiResult<R> {
        self.request::<(), R>(Method::DELETE, path, None, opts).await
    }

    /// HEAD carries no envelope; success yields the response headers.
    pub async fn head(
        &self,
        path: &str,
        opts: Option<RequestOptions>,
    ) -> ApiResult<http::HeaderMap> {
        let mut req = ApiRequest::new(Method::HEAD, path);
        if let Some(opts) = opts {
            req = req.with_options(opts);
        }
        self.execute(&req).await.map(|resp| resp.headers)
    }

    /// Any-method variant of the verb helpers.
    pub async fn request<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        opts: Option<RequestOptions>,
    ) -> ApiResult<R> {
        let mut req = ApiRequest::new(method, path);
        if let Some(body) = body {
            let value = serde_json::to_value(body).map_err(|e| {
                ApiError::unknown(DEFAULT_STATUS, format!("json encode error: {e}"))
            })?;
            req = req.with_body(value);
        }
        if let Some(opts) = opts {
            req = req.with_options(opts);
        }
        let resp = self.execute(&req).await?;
        if req.method == Method::HEAD {
            return null_data(&resp);
        }
        unwrap_envelope(&resp)
    }

    /// Run one logical request through the pipeline without unwrapping.
    pub async fn execute(&self, request: &ApiRequest) -> ApiResult<HttpResponse> {
        let start = Instant::now();
        let span = tracing::info_span!(
            "api.request",
            http.method = %request.method,
            http.path = %request.path,
            http.status = field::Empty,
            retry.count = field::Empty,
            error.code = field::Empty,
        );
        let mut state = RetryState::default();
        let outcome = self
            .pipeline()
            .dispatch(self.transport.as_ref(), request, &mut state)
            .instrument(span.clone())
            .await;

        let trace = RequestTrace::new(request.method.as_str(), &request.path)
            .retries(state.retry_count)
            .latency_ms(start.elapsed().as_millis() as u64);
        span.record("retry.count", state.retry_count);
        match outcome {
            Ok(resp) => {
                span.record("http.status", resp.status);
                telemetry::emit(trace.status(resp.status));
                Ok(resp)
            }
            Err(failure) => {
                let err = normalize(failure);
                span.record("http.status", err.status);
                span.record("error.code", err.code.as_str());
                telemetry::emit(trace.status(err.status).error_code(&err.code));
                Err(err)
            }
        }
    }
}

/// Strip the success envelope, keeping only `data`. An empty body (HEAD,
/// 204) unwraps as null `data`.
pub fn unwrap_envelope<R: DeserializeOwned>(resp: &HttpResponse) -> ApiResult<R> {
    if resp.body.is_empty() {
        return null_data(resp);
    }
    resp.json::<ApiResponse<R>>()
        .map(ApiResponse::into_data)
        .map_err(|e| ApiError::unknown(resp.status, format!("json decode error: {e}")))
}

fn null_data<R: DeserializeOwned>(resp: &HttpResponse) -> ApiResult<R> {
    R::deserialize(serde_json::Value::Null)
        .map_err(|e| ApiError::unknown(resp.status, format!("json decode error: {e}")))
}
