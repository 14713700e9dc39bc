//! `debase-build wait`: block until a path exists.

use std::path::Path;
use std::time::Duration;

use debase_driver::wait_for_path;

use crate::{GlobalArgs, WaitArgs};

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Runs the `debase-build wait` command. Exits 1 on timeout.
pub fn run(args: &WaitArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let path = Path::new(&args.target);
    if !global.quiet && !path.exists() {
        eprintln!("    Waiting for {}", path.display());
    }
    match wait_for_path(path, Duration::from_secs(args.timeout), POLL_INTERVAL) {
        Ok(()) => Ok(0),
        Err(e) => {
            eprintln!("{e}");
            Ok(e.exit_code())
        }
    }
}
