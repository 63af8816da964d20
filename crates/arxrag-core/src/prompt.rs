//! Prompt templates for answering a query from retrieved chunks.

use serde::{Deserialize, Serialize};

const BASIC_RAG_SYSTEM: &str = "You are science expert. You must find answer to user's query in context.
Context is placed between xml tag <context>.
Each document from context is placed between xml tag <document>.
Your answers must be short.
If you cannot find answer in context, answer \"no information\".";

// Lowercase tag fragments that would let retrieved text close the template's own tags.
const SANITIZE_PATTERNS: &[(&str, &str)] = &[
    ("</document>", "&lt;/document&gt;"),
    ("<document", "&lt;document"),
    ("</context>", "&lt;/context&gt;"),
    ("<context", "&lt;context"),
    ("</query>", "&lt;/query&gt;"),
    ("<query", "&lt;query"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

fn replace_case_insensitive(src: &str, pattern: &str, replacement: &str) -> String {
    let lower = src.to_ascii_lowercase();
    let mut out = String::with_capacity(src.len());
    let mut rest = 0;
    for (pos, _) in lower.match_indices(pattern) {
        out.push_str(&src[rest..pos]);
        out.push_str(replacement);
        rest = pos + pattern.len();
    }
    out.push_str(&src[rest..]);
    out
}

/// Escape the template's own tags inside untrusted text.
#[must_use]
pub fn sanitize(text: &str) -> String {
    SANITIZE_PATTERNS
        .iter()
        .fold(text.to_owned(), |acc, (pattern, replacement)| {
            replace_case_insensitive(&acc, pattern, replacement)
        })
}

/// System instruction plus a user turn carrying the query and every document in
/// retrieval order.
#[must_use]
pub fn basic_rag_prompt<S: AsRef<str>>(query: &str, documents: &[S]) -> Vec<PromptMessage> {
    let context: String = documents
        .iter()
        .map(|d| format!("<document>{}</document>", sanitize(d.as_ref())))
        .collect();
    vec![
        PromptMessage {
            role: Role::System,
            content: BASIC_RAG_SYSTEM.to_owned(),
        },
        PromptMessage {
            role: Role::User,
            content: format!("<query>{}</query><context>{context}</context>", sanitize(query)),
        },
    ]
}
