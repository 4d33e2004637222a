//! Refresh cookie persistence
//!
//! The refresh credential lives in the HTTP client's cookie jar, which only
//! exists for one run. Between runs the cookies the jar holds for the refresh
//! endpoint are kept in a file in the data directory.
//!
//! The jar only hands out `name=value` pairs, so attributes such as
//! `Expires` and `Max-Age` are not saved. Expiry is left to the server: a
//! refresh it rejects ends the session, which deletes this file, so a stale
//! cookie is sent at most once.

use anyhow::{Context, Result};
use reqwest::Url;
use reqwest::cookie::{CookieStore, Jar};
use std::path::Path;
use tracing::debug;

pub const FILE_NAME: &str = "cookies";

/// Load saved cookies into `jar`. Returns how many were restored.
pub fn restore(jar: &Jar, path: &Path, refresh_url: &Url) -> Result<usize> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };

    let mut count = 0;
    for pair in content.trim().split("; ").filter(|p| p.contains('=')) {
        jar.add_cookie_str(&format!("{pair}; Path=/"), refresh_url);
        count += 1;
    }

    debug!(count, "Restored refresh cookies");
    Ok(count)
}

/// Save the cookies `jar` would send to the refresh endpoint.
/// An empty jar removes the file.
pub fn save(jar: &Jar, path: &Path, refresh_url: &Url) -> Result<()> {
    let Some(header) = jar.cookies(refresh_url) else {
        return remove(path);
    };
    let value = header
        .to_str()
        .context("Cookie jar holds a non-text cookie")?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, value).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Delete saved cookies
pub fn remove(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}
