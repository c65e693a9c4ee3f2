use arboard::Clipboard;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const DEFAULT_FILE_NAME: &str = "index.html";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Nothing to save. Please generate a website first.")]
    NothingToSave,
    #[error("Error saving file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),
    #[error("Invalid save path '{0}': must be a relative path inside the output directory")]
    InvalidPath(String),
}

/// Where a save lands: `index.html` in `output_dir` by default, `.html` added when the
/// requested name has no extension, `index.html` inside a requested directory.
/// Requested paths must stay under `output_dir`: absolute paths and `..` are refused.
pub fn resolve_target(output_dir: &Path, requested: Option<&str>) -> Result<PathBuf, OutputError> {
    let requested = requested.map(str::trim).filter(|p| !p.is_empty());
    let Some(requested) = requested else {
        return Ok(output_dir.join(DEFAULT_FILE_NAME));
    };

    let relative = Path::new(requested);
    let contained = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !contained {
        return Err(OutputError::InvalidPath(requested.to_string()));
    }

    let mut path = output_dir.join(relative);
    if path.is_dir() {
        return Ok(path.join(DEFAULT_FILE_NAME));
    }
    if path.extension().is_none() {
        path.set_extension("html");
    }
    Ok(path)
}

/// Writes markup verbatim as UTF-8.
pub fn save_markup(target: &Path, markup: Option<&str>) -> Result<PathBuf, OutputError> {
    let markup = markup.filter(|m| !m.trim().is_empty()).ok_or(OutputError::NothingToSave)?;
    std::fs::write(target, markup.as_bytes())?;
    info!("💾 Saved {} bytes to {}", markup.len(), target.display());
    Ok(target.to_path_buf())
}

pub fn copy_to_clipboard(markup: Option<&str>) -> Result<(), OutputError> {
    let markup = markup.filter(|m| !m.trim().is_empty()).ok_or(OutputError::NothingToSave)?;
    let mut clipboard = Clipboard::new().map_err(|e| OutputError::Clipboard(e.to_string()))?;
    clipboard
        .set_text(markup.to_string())
        .map_err(|e| OutputError::Clipboard(e.to_string()))?;
    info!("📋 Copied {} bytes to clipboard", markup.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn default_target_is_index_html() {
        let dir = tempdir().unwrap();
        assert_eq!(resolve_target(dir.path(), None).unwrap(), dir.path().join("index.html"));
        assert_eq!(resolve_target(dir.path(), Some("  ")).unwrap(), dir.path().join("index.html"));
    }

    #[test]
    fn missing_extension_gets_html() {
        let dir = tempdir().unwrap();
        assert_eq!(resolve_target(dir.path(), Some("landing")).unwrap(), dir.path().join("landing.html"));
        assert_eq!(resolve_target(dir.path(), Some("page.htm")).unwrap(), dir.path().join("page.htm"));
    }

    #[test]
    fn directory_target_gets_default_name() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("site");
        std::fs::create_dir(&sub).unwrap();
        assert_eq!(resolve_target(dir.path(), Some("site")).unwrap(), sub.join("index.html"));
        assert_eq!(resolve_target(dir.path(), Some("./site/about")).unwrap(), sub.join("about.html"));
    }

    #[test]
    fn paths_escaping_output_dir_are_refused() {
        let dir = tempdir().unwrap();
        for requested in ["/tmp/victim/bashrc_like", "../outside", "site/../../outside.html"] {
            let err = resolve_target(dir.path(), Some(requested)).unwrap_err();
            assert!(matches!(err, OutputError::InvalidPath(_)), "{requested} should be refused");
        }
    }

    #[test]
    fn nothing_to_save_leaves_filesystem_untouched() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("index.html");
        assert!(matches!(save_markup(&target, None), Err(OutputError::NothingToSave)));
        assert!(matches!(save_markup(&target, Some("  ")), Err(OutputError::NothingToSave)));
        assert!(!target.exists());
    }

    #[test]
    fn saved_markup_reads_back_byte_identical() {
        let dir = tempdir().unwrap();
        let target = resolve_target(dir.path(), None).unwrap();
        let markup = "<!DOCTYPE html>\n<html><body><h1>Café ☕ — «bienvenue»</h1></body></html>\n";

        let written = save_markup(&target, Some(markup)).unwrap();

        assert_eq!(written, target);
        assert_eq!(std::fs::read(&target).unwrap(), markup.as_bytes());
    }

    #[test]
    fn unwritable_target_is_an_io_error() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("missing-dir").join("index.html");
        let err = save_markup(&target, Some("<html></html>")).unwrap_err();
        assert!(matches!(err, OutputError::Io(_)));
        assert!(err.to_string().starts_with("Error saving file:"));
    }

    #[test]
    fn copy_with_nothing_is_rejected_before_touching_clipboard() {
        assert!(matches!(copy_to_clipboard(None), Err(OutputError::NothingToSave)));
    }
}
