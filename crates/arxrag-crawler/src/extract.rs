//! Listing and homepage parsing.
//!
//! A listing page is a `<dl>` of article entries: a `<dt>` header carrying the
//! abstract and download anchors, followed by a `<dd>` body holding the `div.meta`
//! block. Each record is built from one header/body pair, then cross-checked against
//! a document-wide enumeration of metadata blocks and download anchors.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::ExtractError;
use crate::types::{ArticleMetadata, CategoryTarget};

const ARTICLE_HEADER: &str = "dl > dt";
const META_BLOCK: &str = "div.meta";
const DOWNLOAD_ANCHOR: &str = r#"a[title="Download PDF"]"#;
const TITLE: &str = "div.list-title";
const AUTHORS: &str = "div.list-authors";
const TITLE_LABEL: &str = "Title:";
const AUTHORS_LABEL: &str = "Authors:";

fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector(format!("{css}: {e}")))
}

fn parse_base(base_url: &str) -> Result<Url, ExtractError> {
    Url::parse(base_url).map_err(|e| ExtractError::Link {
        href: base_url.to_owned(),
        reason: e.to_string(),
    })
}

fn resolve(base: &Url, href: &str) -> Result<String, ExtractError> {
    base.join(href)
        .map(String::from)
        .map_err(|e| ExtractError::Link {
            href: href.to_owned(),
            reason: e.to_string(),
        })
}

/// Trailing path segment of a download link, without query or fragment.
pub(crate) fn id_from_href(href: &str) -> Option<&str> {
    let path = href.split(['?', '#']).next().unwrap_or(href);
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

fn strip_label<'a>(text: &'a str, label: &str) -> &'a str {
    text.strip_prefix(label).unwrap_or(text).trim()
}

pub(crate) fn clean_title(raw: &str) -> String {
    let collapsed = collapse_whitespace(raw);
    strip_label(&collapsed, TITLE_LABEL).to_owned()
}

pub(crate) fn split_authors(raw: &str) -> Vec<String> {
    let collapsed = collapse_whitespace(raw);
    strip_label(&collapsed, AUTHORS_LABEL)
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_owned)
        .collect()
}

/// The `<dd>` body that follows an article header.
fn article_body<'a>(header: ElementRef<'a>) -> Option<ElementRef<'a>> {
    header
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .next()
        .filter(|el| el.value().name() == "dd")
}

/// Parse one category listing page into article records in document order.
///
/// # Errors
///
/// Fails when metadata blocks and download anchors disagree in count or identity,
/// when an article lacks an id or title, or when an id repeats.
pub fn extract_listing(
    html: &str,
    category: &str,
    base_url: &str,
) -> Result<Vec<ArticleMetadata>, ExtractError> {
    let doc = Html::parse_document(html);
    let header_sel = selector(ARTICLE_HEADER)?;
    let meta_sel = selector(META_BLOCK)?;
    let download_sel = selector(DOWNLOAD_ANCHOR)?;
    let title_sel = selector(TITLE)?;
    let authors_sel = selector(AUTHORS)?;
    let base = parse_base(base_url)?;

    let meta_blocks = doc.select(&meta_sel).count();
    let anchor_ids: Vec<&str> = doc
        .select(&download_sel)
        .filter_map(|a| a.attr("href").and_then(id_from_href))
        .collect();
    let download_links = doc.select(&download_sel).count();
    if meta_blocks != download_links {
        return Err(ExtractError::CountMismatch {
            meta_blocks,
            download_links,
        });
    }

    let mut articles = Vec::with_capacity(meta_blocks);
    let mut seen = HashSet::with_capacity(meta_blocks);

    for (index, header) in doc.select(&header_sel).enumerate() {
        let href = header
            .select(&download_sel)
            .next()
            .and_then(|a| a.attr("href"))
            .ok_or(ExtractError::MissingField {
                index,
                field: "download link",
            })?;
        let id = id_from_href(href).ok_or(ExtractError::MissingField { index, field: "id" })?;
        let meta = article_body(header)
            .and_then(|body| body.select(&meta_sel).next())
            .ok_or(ExtractError::MissingField {
                index,
                field: "metadata block",
            })?;

        let title = meta
            .select(&title_sel)
            .next()
            .map(|el| clean_title(&element_text(el)))
            .filter(|t| !t.is_empty())
            .ok_or(ExtractError::MissingField {
                index,
                field: "title",
            })?;
        let authors = meta
            .select(&authors_sel)
            .next()
            .map(|el| split_authors(&element_text(el)))
            .unwrap_or_default();

        if !seen.insert(id.to_owned()) {
            return Err(ExtractError::DuplicateId(id.to_owned()));
        }

        articles.push(ArticleMetadata {
            title,
            authors,
            id: id.to_owned(),
            link: resolve(&base, href)?,
            category: category.to_owned(),
        });
    }

    let anchor_set: HashSet<&str> = anchor_ids.iter().copied().collect();
    let missing: Vec<String> = anchor_ids
        .iter()
        .filter(|id| !seen.contains(**id))
        .map(|id| (*id).to_owned())
        .collect();
    let unexpected: Vec<String> = articles
        .iter()
        .filter(|a| !anchor_set.contains(a.id.as_str()))
        .map(|a| a.id.clone())
        .collect();
    if !missing.is_empty() || !unexpected.is_empty() || articles.len() != meta_blocks {
        return Err(ExtractError::IdMismatch {
            missing,
            unexpected,
        });
    }

    Ok(articles)
}

/// A label is used as a directory name, so it must be one plain path component.
pub(crate) fn is_safe_label(label: &str) -> bool {
    !label.is_empty()
        && label != "."
        && label != ".."
        && !label.contains(['/', '\\', '\0'])
}

/// Find category listing pages linked from the homepage.
///
/// Anchors whose `href` ends with `suffix` are targets; the category label is the
/// second token of their `aria-labelledby` attribute.
///
/// # Errors
///
/// Returns an error if `base_url` or a matching `href` cannot be resolved.
pub fn discover_targets(
    html: &str,
    base_url: &str,
    suffix: &str,
) -> Result<Vec<CategoryTarget>, ExtractError> {
    let doc = Html::parse_document(html);
    let anchor_sel = selector("a[href]")?;
    let base = parse_base(base_url)?;

    let mut seen = HashSet::new();
    let mut targets = Vec::new();
    for anchor in doc.select(&anchor_sel) {
        let Some(href) = anchor.attr("href").filter(|h| h.ends_with(suffix)) else {
            continue;
        };
        let label = anchor
            .attr("aria-labelledby")
            .and_then(|v| v.trim().split_once(char::is_whitespace))
            .map(|(_, rest)| rest.trim())
            .filter(|l| !l.is_empty());
        let Some(label) = label else {
            tracing::warn!(href, "listing anchor without category label, skipping");
            continue;
        };
        if !is_safe_label(label) {
            tracing::warn!(href, label, "unsafe category label, skipping");
            continue;
        }

        let listing_url = resolve(&base, href)?;
        if seen.insert(listing_url.clone()) {
            targets.push(CategoryTarget {
                listing_url,
                category: label.to_owned(),
            });
        }
    }

    Ok(targets)
}
