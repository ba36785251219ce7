use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Resolve the console's home directory.
///
/// - `None` (or blank) → `<platform home>/<default_subdir>`; the platform home
///   is `%APPDATA%` on Windows and `$HOME` elsewhere.
/// - A leading `~` is expanded against the platform home.
/// - Relative paths are made absolute against the current directory.
///
/// With `create`, the directory is created if missing.
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf> {
    let raw = configured
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let path = match raw {
        None => platform_home()?.join(default_subdir),
        Some(p) => expand_tilde(&p)?,
    };

    let path = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .context("current directory is not accessible")?
            .join(path)
    };

    if create {
        std::fs::create_dir_all(&path)
            .with_context(|| format!("cannot create home dir {}", path.display()))?;
    }
    Ok(path)
}

fn expand_tilde(p: &str) -> Result<PathBuf> {
    if p == "~" {
        return platform_home();
    }
    if let Some(rest) = p.strip_prefix("~/").or_else(|| p.strip_prefix("~\\")) {
        return Ok(platform_home()?.join(rest));
    }
    Ok(Path::new(p).to_path_buf())
}

fn platform_home() -> Result<PathBuf> {
    let var = if cfg!(windows) { "APPDATA" } else { "HOME" };
    match std::env::var_os(var) {
        Some(v) if !v.is_empty() => Ok(PathBuf::from(v)),
        _ => bail!("environment variable {var} is not set"),
    }
}
