//! Observable timer state shared by the tick loops.

use std::path::PathBuf;

/// Current visible state of a running timer.
///
/// Both tick loops update it under one mutex; the lock is never held across
/// bus or disk I/O.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub progress: f64,
    pub remaining_text: String,
    pub image_path: Option<PathBuf>,
    pub is_paused: bool,
}

impl Snapshot {
    /// `file://` URL of the current image, or an empty string.
    pub fn art_url(&self) -> String {
        art_url(self.image_path.as_deref())
    }
}

pub(crate) fn art_url(path: Option<&std::path::Path>) -> String {
    match path {
        Some(path) => format!("file://{}", path.display()),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn art_url_is_a_file_url_or_empty() {
        let mut snapshot = Snapshot::default();
        assert_eq!(snapshot.art_url(), "");
        snapshot.image_path = Some(PathBuf::from("/cache/3584E4/sh0.r0.1.00.svg"));
        assert_eq!(snapshot.art_url(), "file:///cache/3584E4/sh0.r0.1.00.svg");
    }
}
