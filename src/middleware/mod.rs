/// Middleware module
///
/// Request logging, static-file hit counting, and the access-token
/// extractor used by protected handlers.

mod authenticated;
mod metrics;
mod request_logger;

pub use authenticated::{authorization_header, CurrentUser};
pub use metrics::{HitCounter, Metrics};
pub use request_logger::RequestLogger;
