//! Tracing and request correlation (shared setup).

pub mod request_id;
pub mod tracing;

pub use request_id::{REQUEST_ID_HEADER, RequestId};
pub use tracing::LogFormat;

/// Initialize process-wide logging in the given format.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(format: LogFormat) {
    tracing::init(format);
}
