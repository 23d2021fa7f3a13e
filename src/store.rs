use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::fs;

/// Characters allowed in a stored file name
static SAFE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("static regex is valid"));

/// Prefix of every file written by the job runner
pub const ARTIFACT_PREFIX: &str = "kintaro_";

/// The directory holding downloaded artifacts.
/// The filesystem is the record, nothing else is persisted.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the store directory (and its parents) if it is missing.
    pub async fn ensure_exists(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.root).await
    }

    /// Path of `name` inside the store. `name` must already be a safe name.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Resolves `name` to a path, refusing anything that could leave the store
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        is_safe_name(name).then(|| self.path_for(name))
    }
}

/// Checks that `name` only uses `[A-Za-z0-9_.-]` and is not a relative dir.
pub fn is_safe_name(name: &str) -> bool {
    name != "." && name != ".." && SAFE_NAME.is_match(name)
}

/// Replaces every character outside `[A-Za-z0-9_.-]` with `_`
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize_filename("a b/c\\d?.mp4"), "a_b_c_d_.mp4");
        assert_eq!(sanitize_filename("vidéo.mp4"), "vid_o.mp4");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for name in [
            "kintaro_youtube_1700000000000.mp4",
            "../../etc/passwd",
            "spaces and ünïcödé",
            "",
            "a\0b\tc",
        ] {
            let once = sanitize_filename(name);
            assert_eq!(sanitize_filename(&once), once);
        }
    }

    #[test]
    fn sanitized_names_are_safe() {
        assert!(is_safe_name(&sanitize_filename("kintaro_other_1.mp4")));
        assert!(is_safe_name(&sanitize_filename("weird name?.mp4")));
    }

    #[test]
    fn safe_name_rejects_traversal() {
        assert!(!is_safe_name(".."));
        assert!(!is_safe_name("."));
        assert!(!is_safe_name("../secret"));
        assert!(!is_safe_name("a/b"));
        assert!(!is_safe_name(""));
        assert!(is_safe_name("..hidden"));
    }

    #[test]
    fn resolve_stays_inside_root() {
        let store = Store::new("/srv/downloads");
        assert_eq!(
            store.resolve("kintaro_x.mp4"),
            Some(PathBuf::from("/srv/downloads/kintaro_x.mp4"))
        );
        assert_eq!(store.resolve("../x"), None);
    }
}
