pub mod bots;
pub mod common;
pub mod logs;
pub mod system;
pub mod workers;

pub use bots::BotsApi;
pub use logs::LogsApi;
pub use system::SystemApi;
pub use workers::WorkersApi;

use poem_openapi::OpenApi;

/// Combines all API modules into a single OpenAPI specification
pub fn create_combined_api() -> impl OpenApi {
    (SystemApi, BotsApi, WorkersApi, LogsApi)
}
