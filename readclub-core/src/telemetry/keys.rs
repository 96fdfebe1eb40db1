/// Field keys recorded on the `api.request` span.
/// Keep these stable; changing them is a breaking change for dashboards.
pub const SPAN_API_REQUEST: &str = "api.request";

pub const KEY_HTTP_METHOD: &str = "http.method";
pub const KEY_HTTP_PATH: &str = "http.path";
pub const KEY_HTTP_STATUS: &str = "http.status";
pub const KEY_RETRY_COUNT: &str = "retry.count";

/// Set only when the request ends in an error.
pub const KEY_ERROR_CODE: &str = "error.code";
