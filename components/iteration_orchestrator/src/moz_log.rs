//! Browser network log (`MOZ_LOG`) handling
//!
//! The browser writes its log to one file in the base directory; after every
//! iteration that file is moved next to the URL's other artifacts.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File the browser logs into, relative to the base directory
pub const MOZ_LOG_FILE_NAME: &str = "moz_log.txt";

/// Log modules enabled when the configuration names none
pub const DEFAULT_MOZ_LOG_MODULES: &str =
    "timestamp,sync,nsHttp:5,cache2:5,nsSocketTransport:5,nsHostResolver:5";

/// Name of the relocated log of iteration `index`
pub fn moz_log_file_name(index: usize) -> String {
    format!("moz_log-{}.txt", index)
}

/// Environment the browser must be launched with to produce the log
pub fn browser_env(modules: &str, base_dir: &Path) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    env.insert("MOZ_LOG".to_string(), modules.to_string());
    env.insert(
        "MOZ_LOG_FILE".to_string(),
        base_dir.join(MOZ_LOG_FILE_NAME).display().to_string(),
    );
    env
}

/// Move the browser log into `dest_dir` under the name for `index`
///
/// A missing log file is not an error: the browser may not have written
/// anything yet. Returns the new path when a file was moved.
pub async fn relocate(base_dir: &Path, dest_dir: &Path, index: usize) -> io::Result<Option<PathBuf>> {
    let source = base_dir.join(MOZ_LOG_FILE_NAME);
    let destination = dest_dir.join(moz_log_file_name(index));

    match tokio::fs::rename(&source, &destination).await {
        Ok(()) => {
            debug!("Moved {} to {}", source.display(), destination.display());
            Ok(Some(destination))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("No browser log at {}, skipping relocation", source.display());
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
