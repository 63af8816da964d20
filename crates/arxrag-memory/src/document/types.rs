use arxrag_crawler::ArticleMetadata;

#[derive(Debug, Clone)]
pub struct DocumentMetadata {
    /// Path of the file the text came from.
    pub source: String,
    pub content_type: String,
    /// Manifest record of the article, attached by the dataset loader.
    pub article: Option<ArticleMetadata>,
}

impl DocumentMetadata {
    /// Stable key for point ids: `<category>/<id>` when the article is known, else the
    /// source path. Cross-listed articles get one key per category.
    #[must_use]
    pub fn key(&self) -> String {
        self.article.as_ref().map_or_else(
            || self.source.clone(),
            |a| format!("{}/{}", a.category, a.id),
        )
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub content: String,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone)]
pub struct Chunk {
    pub content: String,
    pub metadata: DocumentMetadata,
    pub chunk_index: usize,
}
