//! Per-category manifest files.
//!
//! `meta.json` lists every article the listing page produced, whether or not its
//! PDF arrived. `failed.json` lists the articles whose PDF could not be stored and
//! only exists while there are such articles.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CrawlError;
use crate::types::{ArticleMetadata, DownloadFailure};

pub const MANIFEST_FILE: &str = "meta.json";
pub const FAILURES_FILE: &str = "failed.json";

/// Four-space indented JSON with non-ASCII text written as-is.
pub(crate) fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CrawlError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

/// Write through a sibling `.part` file so readers never see a truncated file.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CrawlError> {
    let mut part = path.as_os_str().to_owned();
    part.push(".part");
    let part = PathBuf::from(part);

    tokio::fs::write(&part, bytes)
        .await
        .map_err(|e| CrawlError::io(&part, e))?;
    tokio::fs::rename(&part, path)
        .await
        .map_err(|e| CrawlError::io(path, e))
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CrawlError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| CrawlError::io(path, e))?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Persist the full article list of a category, creating the directory if needed.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file cannot be written.
pub async fn write_manifest(
    dir: &Path,
    articles: &[ArticleMetadata],
) -> Result<PathBuf, CrawlError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| CrawlError::io(dir, e))?;
    let path = dir.join(MANIFEST_FILE);
    write_atomic(&path, &to_pretty_json(articles)?).await?;
    tracing::debug!(path = %path.display(), articles = articles.len(), "manifest written");
    Ok(path)
}

/// # Errors
///
/// Returns an error if `meta.json` is missing or malformed.
pub async fn read_manifest(dir: &Path) -> Result<Vec<ArticleMetadata>, CrawlError> {
    read_json(&dir.join(MANIFEST_FILE)).await
}

/// Record failed downloads, or remove a stale `failed.json` when there are none.
///
/// Returns the path written, if any.
///
/// # Errors
///
/// Returns an error if the file cannot be written or removed.
pub async fn write_failures(
    dir: &Path,
    failures: &[DownloadFailure],
) -> Result<Option<PathBuf>, CrawlError> {
    let path = dir.join(FAILURES_FILE);
    if failures.is_empty() {
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "stale failure list removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(CrawlError::io(&path, e)),
        }
        return Ok(None);
    }
    write_atomic(&path, &to_pretty_json(failures)?).await?;
    Ok(Some(path))
}

/// Failed downloads of a category; empty when `failed.json` does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub async fn read_failures(dir: &Path) -> Result<Vec<DownloadFailure>, CrawlError> {
    let path = dir.join(FAILURES_FILE);
    match tokio::fs::try_exists(&path).await {
        Ok(true) => read_json(&path).await,
        Ok(false) => Ok(Vec::new()),
        Err(e) => Err(CrawlError::io(&path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(id: &str, title: &str) -> ArticleMetadata {
        ArticleMetadata {
            title: title.into(),
            authors: vec!["X".into()],
            id: id.into(),
            link: format!("https://arxiv.org/pdf/{id}"),
            category: "cs".into(),
        }
    }

    fn failure(id: &str) -> DownloadFailure {
        DownloadFailure {
            id: id.into(),
            link: format!("https://arxiv.org/pdf/{id}"),
            error: "unexpected status 404".into(),
            attempts: 1,
        }
    }

    #[tokio::test]
    async fn manifest_creates_directory_and_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("cs");
        let articles = vec![article("1.1", "A"), article("2.2", "B")];

        let path = write_manifest(&dir, &articles).await.unwrap();
        assert_eq!(path, dir.join(MANIFEST_FILE));
        assert!(!dir.join("meta.json.part").exists());

        let loaded = read_manifest(&dir).await.unwrap();
        assert_eq!(loaded, articles);
    }

    #[tokio::test]
    async fn manifest_layout_is_indented_utf8_in_field_order() {
        let tmp = tempfile::tempdir().unwrap();
        write_manifest(tmp.path(), &[article("1.1", "Пёс и газон")])
            .await
            .unwrap();
        let text = std::fs::read_to_string(tmp.path().join(MANIFEST_FILE)).unwrap();

        assert!(text.contains("Пёс и газон"));
        assert!(text.contains("\n        \"title\""));
        let order: Vec<usize> = ["\"title\"", "\"authors\"", "\"id\"", "\"link\"", "\"category\""]
            .iter()
            .map(|k| text.find(k).unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn empty_manifest_is_empty_array() {
        let tmp = tempfile::tempdir().unwrap();
        write_manifest(tmp.path(), &[]).await.unwrap();
        let text = std::fs::read_to_string(tmp.path().join(MANIFEST_FILE)).unwrap();
        assert_eq!(text, "[]");
    }

    #[tokio::test]
    async fn failures_written_and_cleared() {
        let tmp = tempfile::tempdir().unwrap();
        let written = write_failures(tmp.path(), &[failure("3.3")]).await.unwrap();
        assert_eq!(written, Some(tmp.path().join(FAILURES_FILE)));
        assert_eq!(read_failures(tmp.path()).await.unwrap(), vec![failure("3.3")]);

        let cleared = write_failures(tmp.path(), &[]).await.unwrap();
        assert!(cleared.is_none());
        assert!(!tmp.path().join(FAILURES_FILE).exists());
        assert!(read_failures(tmp.path()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clearing_absent_failures_is_noop() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(write_failures(tmp.path(), &[]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_manifest_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = read_manifest(tmp.path()).await.unwrap_err();
        assert!(matches!(err, CrawlError::Io { .. }));
    }
}
