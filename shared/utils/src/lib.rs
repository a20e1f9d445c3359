pub mod logging;
pub mod metrics;

pub use logging::{LogFormat, LoggingInitializer, LoggingSettings};
pub use metrics::AppMetrics;
