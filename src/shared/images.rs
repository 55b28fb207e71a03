//! Capture image persistence
//!
//! The scanner hands back a raw image alongside every template. The shell
//! renders them; the core only offers to keep them on disk for later review.
//! Bytes are written exactly as the device produced them, no format
//! conversion.

use std::path::{Path, PathBuf};

/// Write one capture image into `dir`, creating it if needed.
///
/// Files are named by user id and sample position so the three samples of an
/// enrollment sort together.
pub fn save_capture_image(
    dir: &Path,
    user_id: i64,
    sample_index: usize,
    bytes: &[u8],
) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let path = dir.join(format!("user_{user_id}_sample_{sample_index}.raw"));
    std::fs::write(&path, bytes)?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_bytes_under_the_given_dir() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("captures");

        let path = save_capture_image(&target, 7, 2, b"raw-image").unwrap();

        assert!(path.starts_with(&target));
        assert_eq!(std::fs::read(&path).unwrap(), b"raw-image");
    }
}
