//! File system utilities.
//!
//! Writes go to a sibling temp file first and are renamed into place, so a
//! reader never observes a half-written file.

use std::path::Path;

use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};

/// Ensure the parent directory of `path` exists.
pub async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

/// Write bytes atomically (write to temp, then rename).
pub async fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    ensure_parent(path).await?;

    let tmp = path.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Read bytes, returning None if the file doesn't exist.
pub async fn read_bytes(path: &Path) -> Result<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AppError::Io(e)),
    }
}

/// Write pretty-printed JSON atomically.
pub async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    write_bytes(path, &bytes).await
}

/// Read JSON, returning None if the file doesn't exist.
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match read_bytes(path).await? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

/// Write TOML atomically.
pub async fn write_toml<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = toml::to_string_pretty(value)?;
    write_bytes(path, text.as_bytes()).await
}

/// Read TOML, returning None if the file doesn't exist.
pub async fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match read_bytes(path).await? {
        Some(bytes) => {
            let text = String::from_utf8(bytes).map_err(|e| {
                AppError::config(format!("{} is not valid UTF-8: {}", path.display(), e))
            })?;
            Ok(Some(toml::from_str(&text)?))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/test.txt");

        write_bytes(&path, b"hello").await.unwrap();
        let data = read_bytes(&path).await.unwrap();
        assert_eq!(data, Some(b"hello".to_vec()));
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_read_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let data = read_bytes(&tmp.path().join("nope.txt")).await.unwrap();
        assert!(data.is_none());

        let parsed: Option<Vec<String>> = read_json(&tmp.path().join("nope.json")).await.unwrap();
        assert!(parsed.is_none());
    }

    #[tokio::test]
    async fn test_toml_roundtrip_overwrites() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("values.toml");

        let mut values = std::collections::BTreeMap::new();
        values.insert("a".to_string(), 1);
        write_toml(&path, &values).await.unwrap();
        values.insert("b".to_string(), 2);
        write_toml(&path, &values).await.unwrap();

        let loaded: std::collections::BTreeMap<String, i32> =
            read_toml(&path).await.unwrap().unwrap();
        assert_eq!(loaded.len(), 2);
    }
}
