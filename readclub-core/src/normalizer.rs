use async_trait::async_trait;

use crate::codes::UNKNOWN_CODE;
use crate::error::{ApiError, DEFAULT_STATUS};
use crate::model::ErrorEnvelope;
use crate::pipeline::{Call, Failure, Outcome, ResponseHook};
use crate::session::SessionExpiryRouter;

/// Translate any failure into the one error shape callers see.
pub fn normalize(failure: Failure) -> ApiError {
    match failure {
        Failure::Transport(e) => ApiError::unknown(DEFAULT_STATUS, e.to_string()),
        Failure::Status(resp) => {
            let env = resp.json::<ErrorEnvelope>().unwrap_or_default();
            ApiError::new(
                env.code.unwrap_or_else(|| UNKNOWN_CODE.to_string()),
                resp.status,
                env.message
                    .unwrap_or_else(|| format!("Request failed with status code {}", resp.status)),
            )
        }
        Failure::Normalized(err) => err,
    }
}

/// Terminal inbound hook: normalizes failures and routes session expiry.
pub struct ErrorNormalizer {
    session: SessionExpiryRouter,
    dev_mode: bool,
}

impl ErrorNormalizer {
    pub fn new(session: SessionExpiryRouter, dev_mode: bool) -> Self {
        Self { session, dev_mode }
    }
}

#[async_trait]
impl ResponseHook for ErrorNormalizer {
    fn name(&self) -> &str {
        "error-normalizer"
    }

    async fn on_failure(&self, failure: Failure, call: &mut Call<'_>) -> Outcome {
        let err = normalize(failure);
        let request = call.request();
        if self.dev_mode {
            tracing::warn!(
                method = %request.method,
                path = %request.path,
                code = %err.code,
                status = err.status,
                message = %err.message,
                "api request failed"
            );
        }
        if err.is_unauthorized() {
            self.session.observe(err.status, request.bare_path());
        }
        Err(Failure::Normalized(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::pipeline::Pipeline;
    use crate::retry::RetryState;
    use crate::session::{MemoryNavigator, Navigator};
    use crate::test_util::ScriptedTransport;
    use crate::transport::{ApiRequest, HttpResponse};
    use http::Method;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn envelope_fields_win() {
        let body = json!({"code":"U002","message":"duplicate","data":null}).to_string();
        let err = normalize(Failure::Status(HttpResponse::new(409, body)));
        assert_eq!(err.code, "U002");
        assert_eq!(err.status, 409);
        assert_eq!(err.message, "duplicate");
        assert_eq!(err.user_message(), "이미 사용 중인 닉네임입니다.");
    }

    #[test]
    fn unregistered_code_keeps_server_message() {
        let body = json!({"code":"Z999","message":"mystery","data":null}).to_string();
        let err = normalize(Failure::Status(HttpResponse::new(400, body)));
        assert_eq!(err.user_message(), "mystery");
    }

    #[test]
    fn missing_message_keeps_registered_code() {
        let body = json!({"code":"U002","data":null}).to_string();
        let err = normalize(Failure::Status(HttpResponse::new(409, body)));
        assert_eq!(err.code, "U002");
        assert_eq!(err.status, 409);
        assert_eq!(err.message, "Request failed with status code 409");
        assert_eq!(err.user_message(), "이미 사용 중인 닉네임입니다.");
    }

    #[test]
    fn null_message_keeps_registered_code() {
        let body = json!({"code":"U002","message":null,"data":null}).to_string();
        let err = normalize(Failure::Status(HttpResponse::new(409, body)));
        assert_eq!(err.code, "U002");
        assert_eq!(err.message, "Request failed with status code 409");
        assert!(err.is("U002"));
    }

    #[test]
    fn message_without_code_is_unknown() {
        let body = json!({"message":"rate limited"}).to_string();
        let err = normalize(Failure::Status(HttpResponse::new(429, body)));
        assert_eq!(err.code, UNKNOWN_CODE);
        assert_eq!(err.message, "rate limited");
    }

    #[test]
    fn body_without_envelope_uses_status() {
        let err = normalize(Failure::Status(HttpResponse::new(502, "<html>bad gateway</html>")));
        assert_eq!(err.code, UNKNOWN_CODE);
        assert_eq!(err.status, 502);
        assert_eq!(err.message, "Request failed with status code 502");
    }

    #[test]
    fn transport_failure_uses_sentinels() {
        let err = normalize(Failure::Transport(TransportError::Connect("refused".into())));
        assert_eq!(err.code, UNKNOWN_CODE);
        assert_eq!(err.status, 500);
        assert_eq!(err.message, "connection failed: refused");
    }

    #[test]
    fn normalized_passes_through() {
        let original = ApiError::new("T003", 409, "closed");
        assert_eq!(normalize(Failure::Normalized(original.clone())), original);
    }

    fn normalizer_pipeline(nav: Arc<MemoryNavigator>) -> Pipeline {
        let session = SessionExpiryRouter::new(nav, "/login");
        let mut pipeline = Pipeline::new();
        pipeline.register_inbound(Arc::new(ErrorNormalizer::new(session, true)));
        pipeline
    }

    #[tokio::test]
    async fn hook_rejects_with_normalized_and_routes_401() {
        let nav = Arc::new(MemoryNavigator::new("/groups"));
        let pipeline = normalizer_pipeline(nav.clone());
        let transport = ScriptedTransport::new()
            .reply_json(401, json!({"code":"C101","message":"login required","data":null}));
        let out = pipeline
            .dispatch(&transport, &ApiRequest::new(Method::GET, "/groups/mine"), &mut RetryState::default())
            .await;
        match out {
            Err(Failure::Normalized(err)) => {
                assert_eq!(err.code, "C101");
                assert_eq!(err.status, 401);
            }
            other => panic!("expected normalized error, got {other:?}"),
        }
        assert_eq!(nav.current_path(), "/login");
        assert_eq!(nav.navigations(), 1);
    }

    #[tokio::test]
    async fn hook_leaves_identity_check_401_alone() {
        let nav = Arc::new(MemoryNavigator::new("/"));
        let pipeline = normalizer_pipeline(nav.clone());
        let transport = ScriptedTransport::new().reply(401, "");
        let out = pipeline
            .dispatch(&transport, &ApiRequest::new(Method::GET, "/auth/me?t=1"), &mut RetryState::default())
            .await;
        assert!(matches!(out, Err(Failure::Normalized(ref e)) if e.status == 401));
        assert_eq!(nav.navigations(), 0);
    }

    #[tokio::test]
    async fn hook_passes_success_through() {
        let nav = Arc::new(MemoryNavigator::new("/"));
        let pipeline = normalizer_pipeline(nav);
        let transport = ScriptedTransport::new().reply(201, "{\"code\":\"SUCCESS\"}");
        let out = pipeline
            .dispatch(&transport, &ApiRequest::new(Method::POST, "/groups"), &mut RetryState::default())
            .await
            .unwrap();
        assert_eq!(out.status, 201);
    }
}
