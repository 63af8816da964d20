use std::path::Path;
use std::pin::Pin;

use super::super::{
    DEFAULT_MAX_FILE_SIZE, Document, DocumentError, DocumentLoader, DocumentMetadata,
};

/// Extracts the text layer of a PDF on the blocking pool.
pub struct PdfLoader {
    pub max_file_size: u64,
}

impl Default for PdfLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl DocumentLoader for PdfLoader {
    fn load(
        &self,
        path: &Path,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<Vec<Document>, DocumentError>> + Send + '_>>
    {
        let path = path.to_path_buf();
        let max_size = self.max_file_size;
        Box::pin(async move {
            let is_pdf = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
            if !is_pdf {
                return Err(DocumentError::UnsupportedFormat(path.display().to_string()));
            }

            let meta = tokio::fs::metadata(&path).await?;
            if meta.len() > max_size {
                return Err(DocumentError::FileTooLarge(meta.len()));
            }

            let source = path.display().to_string();
            let content = tokio::task::spawn_blocking(move || {
                pdf_extract::extract_text(&path).map_err(|e| DocumentError::Pdf(e.to_string()))
            })
            .await
            .map_err(|e| DocumentError::Pdf(format!("extraction task failed: {e}")))??;

            Ok(vec![Document {
                content,
                metadata: DocumentMetadata {
                    source,
                    content_type: "application/pdf".to_owned(),
                    article: None,
                },
            }])
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_non_pdf_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("notes.txt");
        std::fs::write(&path, "text").unwrap();
        let err = PdfLoader::default().load(&path).await.unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedFormat(_)));
    }

    #[tokio::test]
    async fn rejects_oversized_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("big.pdf");
        std::fs::write(&path, vec![b'x'; 64]).unwrap();
        let loader = PdfLoader { max_file_size: 16 };
        let err = loader.load(&path).await.unwrap_err();
        assert!(matches!(err, DocumentError::FileTooLarge(64)));
    }

    #[tokio::test]
    async fn garbage_is_pdf_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();
        let err = PdfLoader::default().load(&path).await.unwrap_err();
        assert!(matches!(err, DocumentError::Pdf(_)));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = PdfLoader::default()
            .load(&tmp.path().join("absent.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::Io(_)));
    }
}
