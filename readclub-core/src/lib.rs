pub mod codes;
pub mod config;
pub mod error;
pub mod http_client;
pub mod model;
pub mod normalizer;
pub mod pipeline;
pub mod retry;
pub mod session;
pub mod telemetry;
pub mod transport;
#[cfg(test)]
pub mod test_util;

pub use error::{ApiError, ApiResult, CoreResult, ReadClubError};
pub use http_client::ApiClient;
