use serde::{Deserialize, Serialize};

/// Summary of one logical request, emitted once it reaches a terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RequestTrace {
    pub method: String,
    pub path: String,

    /// Final status; for transport failures this is the sentinel status.
    pub status: Option<u16>,

    /// Normalized error code, only for failed requests.
    pub error_code: Option<String>,

    /// Re-issues performed before the terminal outcome.
    pub retries: u32,

    pub latency_ms: u64,
}

impl RequestTrace {
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            ..Default::default()
        }
    }
    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
    pub fn error_code(mut self, code: &str) -> Self {
        self.error_code = Some(code.to_string());
        self
    }
    pub fn retries(mut self, n: u32) -> Self {
        self.retries = n;
        self
    }
    pub fn latency_ms(mut self, ms: u64) -> Self {
        self.latency_ms = ms;
        self
    }

    pub fn is_error(&self) -> bool {
        self.error_code.is_some()
    }
}
