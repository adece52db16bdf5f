use tracing::{error, warn, Level};

use crate::services::DashboardError;

/// Records a failed dashboard operation on the diagnostic channel.
///
/// Storage failures are expected in private browsing modes and log at `warn`.
pub fn log_failure(operation: &str, err: &DashboardError) {
    match err {
        DashboardError::Storage(_) => {
            warn!(operation, category = err.category(), error = %err, "operation failed")
        }
        _ => error!(operation, category = err.category(), error = %err, "operation failed"),
    }
}

/// Maximum level for the console subscriber; unrecognised names mean `info`.
pub fn max_level(name: &str) -> Level {
    name.trim().parse().unwrap_or(Level::INFO)
}
