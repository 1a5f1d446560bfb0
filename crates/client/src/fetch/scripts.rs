//! User script loading.
//!
//! Script names come straight from the request, so only plain file names are
//! resolved, and only inside the configured scripts directory.

use std::io::ErrorKind;
use std::path::Path;

/// A user script ready to be evaluated in the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserScript {
    pub name: String,
    pub source: String,
}

/// Whether `name` is a bare file name with no path components.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && name != "." && !name.contains("..")
}

/// Load the named scripts from `dir`, preserving order.
///
/// Rejected names and missing or unreadable files are skipped with a warning.
pub async fn load_user_scripts(dir: &Path, names: &[String]) -> Vec<UserScript> {
    let mut scripts = Vec::with_capacity(names.len());

    for name in names {
        if !is_plain_name(name) {
            tracing::warn!(script = %name, "rejecting user script name with path components");
            continue;
        }

        let path = dir.join(name);
        match tokio::fs::read_to_string(&path).await {
            Ok(source) => scripts.push(UserScript { name: name.clone(), source }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(script = %name, path = %path.display(), "user script not found, skipping");
            }
            Err(e) => {
                tracing::warn!(script = %name, path = %path.display(), error = %e, "user script unreadable, skipping");
            }
        }
    }

    scripts
}
