//! Local storage paths and directory helpers.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::Result;

/// Full path of the local copy for a session.
pub fn local_output_path(directory: &Path, file_name: &str) -> PathBuf {
    directory.join(file_name)
}

/// Remove a local file, treating "already gone" as success.
pub async fn remove_local_file(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Open a directory in the platform file manager without waiting for it.
pub fn reveal_directory(path: &Path) -> Result<()> {
    let program = if cfg!(target_os = "windows") {
        "explorer"
    } else if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };

    Command::new(program)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_output_path() {
        let path = local_output_path(Path::new("/downloads"), "song.mp3");
        assert_eq!(path, PathBuf::from("/downloads/song.mp3"));
    }

    #[tokio::test]
    async fn test_remove_local_file_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.mp4");
        assert!(remove_local_file(&path).await.is_ok());

        tokio::fs::write(&path, b"data").await.unwrap();
        remove_local_file(&path).await.unwrap();
        assert!(!path.exists());
    }
}
