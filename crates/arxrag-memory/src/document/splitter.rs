//! Sentence-aware chunking. Sizes are measured in characters, not bytes.

use super::types::{Chunk, Document};
use crate::config::IngestConfig;

#[derive(Debug, Clone)]
pub struct SplitterConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub sentence_aware: bool,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            sentence_aware: true,
        }
    }
}

impl From<&IngestConfig> for SplitterConfig {
    fn from(c: &IngestConfig) -> Self {
        Self {
            chunk_size: c.chunk_size,
            chunk_overlap: c.chunk_overlap,
            sentence_aware: c.sentence_aware,
        }
    }
}

pub struct TextSplitter {
    config: SplitterConfig,
}

impl TextSplitter {
    #[must_use]
    pub fn new(config: SplitterConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn split(&self, document: &Document) -> Vec<Chunk> {
        let text = &document.content;
        if text.trim().is_empty() {
            return Vec::new();
        }

        let size = self.config.chunk_size.max(1);
        let pieces = if self.config.sentence_aware {
            let sentences: Vec<String> = split_sentences(text)
                .into_iter()
                .flat_map(|s| {
                    if char_len(&s) > size {
                        split_chars(&s, size, 0)
                    } else {
                        vec![s]
                    }
                })
                .collect();
            merge_sentences(&sentences, size, self.config.chunk_overlap)
        } else {
            split_chars(text, size, self.config.chunk_overlap)
        };

        pieces
            .into_iter()
            .filter(|p| !p.trim().is_empty())
            .enumerate()
            .map(|(i, content)| Chunk {
                content,
                metadata: document.metadata.clone(),
                chunk_index: i,
            })
            .collect()
    }

    /// Split every document, keeping per-document chunk numbering.
    #[must_use]
    pub fn split_all(&self, documents: &[Document]) -> Vec<Chunk> {
        documents.iter().flat_map(|d| self.split(d)).collect()
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Break on paragraph gaps and on `.`, `?`, `!` followed by whitespace. The
/// whitespace after a boundary stays with the preceding sentence.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        let boundary = match (c, chars.peek()) {
            ('\n', Some('\n')) => true,
            ('.' | '?' | '!', Some(next)) => next.is_whitespace(),
            _ => false,
        };
        if boundary {
            while let Some(ws) = chars.next_if(|n| n.is_whitespace()) {
                current.push(ws);
            }
            if !current.trim().is_empty() {
                sentences.push(std::mem::take(&mut current));
            }
        }
    }

    if !current.trim().is_empty() {
        sentences.push(current);
    }

    sentences
}

/// Merge sentences into chunks of at most `chunk_size` characters, seeding each new
/// chunk with trailing sentences of the previous one up to `chunk_overlap` characters.
fn merge_sentences(sentences: &[String], chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let lens: Vec<usize> = sentences.iter().map(|s| char_len(s)).collect();
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut current_len = 0;

    for idx in 0..sentences.len() {
        if idx > start && current_len + lens[idx] > chunk_size {
            chunks.push(sentences[start..idx].concat());

            let mut overlap_len = 0;
            let mut overlap_start = idx;
            for i in (start + 1..idx).rev() {
                let with = overlap_len + lens[i];
                if with > chunk_overlap || with + lens[idx] > chunk_size {
                    break;
                }
                overlap_len = with;
                overlap_start = i;
            }
            start = overlap_start;
            current_len = overlap_len;
        }
        current_len += lens[idx];
    }

    if start < sentences.len() {
        chunks.push(sentences[start..].concat());
    }

    chunks
}

fn split_chars(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let step = chunk_size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}
