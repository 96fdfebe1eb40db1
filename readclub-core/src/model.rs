use serde::{Deserialize, Serialize};

/// Wire shape of every successful reply.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub code: String,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn into_data(self) -> T {
        self.data
    }
}

/// Wire shape of a server-signaled failure (`data` is always null).
///
/// Every field is optional: a body that carries only a `code` still keeps it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Offset-based page nested inside `data` for list endpoints.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_pages: u32,
    pub total_elements: u64,
    pub size: u32,
    /// Zero-based page index.
    pub number: u32,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.number.saturating_add(1) < self.total_pages
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Cursor-based page; `next_cursor` is opaque to the client.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    pub has_next: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}
