//! Static page extraction
//!
//! Walks the parsed DOM depth-first and classifies nodes into content
//! blocks (title, meta description, headings, paragraphs, lists). The block
//! sequence is serialized into the tagged `full_text` form:
//!
//! ```text
//! [TITLE]Home[/TITLE]
//!
//! [H1]Welcome[/H1]
//!
//! [P]First paragraph.[/P]
//!
//! [LIST]
//! [LIST_TITLE]Our services:[/LIST_TITLE]
//! - Design
//! - Hosting
//! [/LIST]
//! ```

use scraper::{ElementRef, Html};
use std::collections::HashSet;

/// Elements removed before traversal, subtree included
pub(crate) const STRIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "footer", "iframe", "form", "button", "input",
    "template", "svg",
];

/// Class-name fragments marking structural chrome rather than content
pub(crate) const DENIED_CLASS_FRAGMENTS: &[&str] = &[
    "nav", "menu", "footer", "header", "sidebar", "modal", "dialog", "popup",
];

/// Elements the walk descends into; anything else is either recorded as a
/// leaf block or ignored
const CONTAINER_TAGS: &[&str] = &[
    "html", "head", "body", "main", "article", "section", "div", "aside", "header", "figure",
    "blockquote", "center", "table", "thead", "tbody", "tfoot", "tr", "td", "th",
];

/// One classified piece of page content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    Title(String),
    Meta(String),
    H1(String),
    H2(String),
    /// `<h3>` and `<h4>`
    H3(String),
    Paragraph(String),
    List {
        title: Option<String>,
        items: Vec<String>,
    },
}

impl ContentBlock {
    /// Whitespace-delimited tokens in the block's text
    pub fn word_count(&self) -> usize {
        match self {
            Self::Title(text)
            | Self::Meta(text)
            | Self::H1(text)
            | Self::H2(text)
            | Self::H3(text)
            | Self::Paragraph(text) => count_words(text),
            Self::List { title, items } => {
                title.as_deref().map(count_words).unwrap_or(0)
                    + items.iter().map(|item| count_words(item)).sum::<usize>()
            }
        }
    }

    /// Serializes the block with its start/end markers
    pub fn to_tagged(&self) -> String {
        match self {
            Self::Title(text) => format!("[TITLE]{}[/TITLE]", text),
            Self::Meta(text) => format!("[META]{}[/META]", text),
            Self::H1(text) => format!("[H1]{}[/H1]", text),
            Self::H2(text) => format!("[H2]{}[/H2]", text),
            Self::H3(text) => format!("[H3]{}[/H3]", text),
            Self::Paragraph(text) => format!("[P]{}[/P]", text),
            Self::List { title, items } => {
                let mut out = String::from("[LIST]\n");
                if let Some(title) = title {
                    out.push_str(&format!("[LIST_TITLE]{}[/LIST_TITLE]\n", title));
                }
                for item in items {
                    out.push_str("- ");
                    out.push_str(item);
                    out.push('\n');
                }
                out.push_str("[/LIST]");
                out
            }
        }
    }
}

/// Everything the static walk learned about a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContent {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub h1: Option<String>,
    pub h2: Vec<String>,
    pub h3: Vec<String>,
    /// Content blocks in document order, deduplicated by text
    pub blocks: Vec<ContentBlock>,
}

impl PageContent {
    /// Blocks joined into the tagged, blank-line separated form
    pub fn full_text(&self) -> String {
        self.blocks
            .iter()
            .map(ContentBlock::to_tagged)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn word_count(&self) -> usize {
        self.blocks.iter().map(ContentBlock::word_count).sum()
    }

    /// Returns true when the static parse is too thin to trust
    ///
    /// A page escalates to a rendered parse if it has no title, no h1, or
    /// fewer than `min_word_count` words.
    pub fn needs_render(&self, min_word_count: usize) -> bool {
        self.title.is_none() || self.h1.is_none() || self.word_count() < min_word_count
    }
}

/// Parses HTML and runs the static walk
pub fn extract_content(html: &str) -> PageContent {
    extract_document(&Html::parse_document(html))
}

/// Runs the static walk over an already parsed document
pub fn extract_document(document: &Html) -> PageContent {
    let mut walker = Walker::default();
    walker.visit(document.root_element());
    walker.content
}

#[derive(Default)]
struct Walker {
    content: PageContent,
    seen_text: HashSet<String>,
    /// Block index pushed by the element visited just before, if it was a `<p>`
    last_paragraph: Option<usize>,
}

impl Walker {
    fn visit(&mut self, element: ElementRef<'_>) {
        let tag = element.value().name();
        let preceding_paragraph = self.last_paragraph.take();

        if STRIPPED_TAGS.contains(&tag) || has_denied_class(&element) {
            return;
        }

        match tag {
            "title" => {
                if let Some(text) = self.take_text(&element) {
                    self.content.title.get_or_insert_with(|| text.clone());
                    self.content.blocks.push(ContentBlock::Title(text));
                }
            }
            "meta" => self.visit_meta(&element),
            "h1" => {
                let text = clean_text(&element.text().collect::<String>());
                if !text.is_empty() && self.content.h1.is_none() {
                    self.content.h1 = Some(text.clone());
                }
                if self.is_new(&text) {
                    self.content.blocks.push(ContentBlock::H1(text));
                }
            }
            "h2" => {
                let text = clean_text(&element.text().collect::<String>());
                if !text.is_empty() {
                    self.content.h2.push(text.clone());
                }
                if self.is_new(&text) {
                    self.content.blocks.push(ContentBlock::H2(text));
                }
            }
            "h3" | "h4" => {
                let text = clean_text(&element.text().collect::<String>());
                if !text.is_empty() {
                    self.content.h3.push(text.clone());
                }
                if self.is_new(&text) {
                    self.content.blocks.push(ContentBlock::H3(text));
                }
            }
            "p" => {
                if let Some(text) = self.take_text(&element) {
                    self.content.blocks.push(ContentBlock::Paragraph(text));
                    self.last_paragraph = Some(self.content.blocks.len() - 1);
                }
            }
            "ul" | "ol" => self.visit_list(&element, preceding_paragraph),
            _ if CONTAINER_TAGS.contains(&tag) => {
                for child in element.children().filter_map(ElementRef::wrap) {
                    self.visit(child);
                }
            }
            _ => {}
        }
    }

    fn visit_meta(&mut self, element: &ElementRef<'_>) {
        let is_description = element
            .value()
            .attr("name")
            .is_some_and(|name| name.eq_ignore_ascii_case("description"));
        if !is_description {
            return;
        }

        let text = clean_text(element.value().attr("content").unwrap_or_default());
        if text.is_empty() {
            return;
        }
        self.content
            .meta_description
            .get_or_insert_with(|| text.clone());
        if self.is_new(&text) {
            self.content.blocks.push(ContentBlock::Meta(text));
        }
    }

    fn visit_list(&mut self, element: &ElementRef<'_>, preceding_paragraph: Option<usize>) {
        let mut items = Vec::new();
        for item in element
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|child| child.value().name() == "li")
        {
            let text = clean_text(&item.text().collect::<String>());
            if self.is_new(&text) {
                items.push(text);
            }
        }

        if items.is_empty() {
            return;
        }

        let title = self.take_caption(element, preceding_paragraph);
        self.content.blocks.push(ContentBlock::List { title, items });
    }

    /// Pops the paragraph immediately before a list to use as its caption
    ///
    /// Only a block pushed by the list's own preceding `<p>` sibling qualifies;
    /// a caption dropped as a duplicate leaves the list untitled.
    fn take_caption(
        &mut self,
        list: &ElementRef<'_>,
        preceding_paragraph: Option<usize>,
    ) -> Option<String> {
        let index = preceding_paragraph?;
        let previous = list.prev_siblings().find_map(ElementRef::wrap)?;
        if previous.value().name() != "p" || index + 1 != self.content.blocks.len() {
            return None;
        }

        match self.content.blocks.pop() {
            Some(ContentBlock::Paragraph(text)) => Some(text),
            Some(other) => {
                self.content.blocks.push(other);
                None
            }
            None => None,
        }
    }

    /// Cleaned text of the element if it has not been recorded yet
    fn take_text(&mut self, element: &ElementRef<'_>) -> Option<String> {
        let text = clean_text(&element.text().collect::<String>());
        self.is_new(&text).then_some(text)
    }

    /// Registers text with the page's dedup set
    ///
    /// Returns false for empty text and for text already recorded.
    fn is_new(&mut self, text: &str) -> bool {
        !text.is_empty() && self.seen_text.insert(text.to_string())
    }
}

/// Returns true if any class token contains a denied fragment
pub(crate) fn has_denied_class(element: &ElementRef<'_>) -> bool {
    element.value().classes().any(|class| {
        let class = class.to_ascii_lowercase();
        DENIED_CLASS_FRAGMENTS
            .iter()
            .any(|fragment| class.contains(fragment))
    })
}

/// Collapses all whitespace runs to single spaces and trims
pub(crate) fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}
