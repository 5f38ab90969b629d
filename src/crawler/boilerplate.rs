//! Boilerplate-stripped body text
//!
//! An independent, readability-style pass over the whole document: pick the
//! most likely main-content root, then keep text blocks that are not chrome
//! and are not dominated by link text. The result fills `body_text` only; it
//! never feeds `word_count`.

use super::extract::{clean_text, has_denied_class, STRIPPED_TAGS};
use scraper::{ElementRef, Html, Selector};

/// Candidate content roots, most specific first
const CONTENT_ROOTS: &[&str] = &["article", "main", "[role=main]", "body"];

/// Elements whose text is taken as one block
const TEXT_BLOCK_TAGS: &[&str] = &[
    "p", "li", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre", "dd", "dt", "figcaption",
];

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Blocks whose link text exceeds this share of their text are dropped
const MAX_LINK_DENSITY: f64 = 0.5;

/// Extracts the main body text of a document
///
/// Returns None when nothing survives the filters.
pub fn extract_body_text(document: &Html) -> Option<String> {
    let root = find_content_root(document)?;

    let mut blocks = Vec::new();
    collect_blocks(root, &mut blocks);

    if blocks.is_empty() {
        None
    } else {
        Some(blocks.join("\n\n"))
    }
}

fn find_content_root(document: &Html) -> Option<ElementRef<'_>> {
    CONTENT_ROOTS.iter().find_map(|candidate| {
        let selector = Selector::parse(candidate).ok()?;
        document
            .select(&selector)
            .find(|element| !clean_text(&element.text().collect::<String>()).is_empty())
    })
}

fn collect_blocks(element: ElementRef<'_>, blocks: &mut Vec<String>) {
    for child in element.children().filter_map(ElementRef::wrap) {
        let tag = child.value().name();

        if STRIPPED_TAGS.contains(&tag) || tag == "aside" || has_denied_class(&child) {
            continue;
        }

        if TEXT_BLOCK_TAGS.contains(&tag) {
            let text = clean_text(&child.text().collect::<String>());
            if text.is_empty() {
                continue;
            }
            if !HEADING_TAGS.contains(&tag) && link_density(&child, &text) > MAX_LINK_DENSITY {
                continue;
            }
            if blocks.last() != Some(&text) {
                blocks.push(text);
            }
        } else {
            collect_blocks(child, blocks);
        }
    }
}

/// Share of an element's text that sits inside anchors
fn link_density(element: &ElementRef<'_>, text: &str) -> f64 {
    if text.is_empty() {
        return 1.0;
    }

    let link_chars: usize = match Selector::parse("a") {
        Ok(selector) => element
            .select(&selector)
            .map(|a| clean_text(&a.text().collect::<String>()).chars().count())
            .sum(),
        Err(_) => 0,
    };

    link_chars as f64 / text.chars().count() as f64
}
