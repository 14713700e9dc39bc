//! Polling for a path to appear.

use std::path::Path;
use std::time::Duration;

use crate::error::DriverError;

/// Blocks until `path` exists, checking every `poll`.
///
/// Fails with [`DriverError::WaitTimedOut`] once more than `timeout` has been
/// spent waiting.
pub fn wait_for_path(path: &Path, timeout: Duration, poll: Duration) -> Result<(), DriverError> {
    let mut waited = Duration::ZERO;
    while !path.exists() {
        if waited >= timeout {
            return Err(DriverError::WaitTimedOut {
                path: path.to_path_buf(),
            });
        }
        std::thread::sleep(poll);
        waited += poll;
    }
    Ok(())
}
