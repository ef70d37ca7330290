//! Cloze placeholder manager
//!
//! Fill-in-the-blank spans must survive the Markdown, math and mind-map
//! passes untouched. Before rendering, every cloze span is replaced by a pair
//! of private-use characters around its inner content, and the span's own
//! tag markup is recorded. After rendering, the pairs are turned back into
//! the original tags.
//!
//! Placeholders are drawn from a private-use range, skipping any symbol the
//! card already contains, so restoring never touches the card's own text.
//!
//! ```text
//! <span class="cloze">a <span class="cloze">b</span></span>
//!         │ placeholderize (children first)
//!         ▼
//! \u{e001}a \u{e000}b\u{e000}\u{e001}
//!         │ render passes
//!         ▼ restore (recording order)
//! <span class="cloze">a <span class="cloze">b</span></span>
//! ```

use std::mem;
use std::ops::RangeInclusive;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::error::ClozeError;
use crate::node::{Children, Element, Node};

/// Symbols placeholders are drawn from, in preference order
pub const CANDIDATES: RangeInclusive<char> = '\u{e000}'..='\u{e0fe}';
/// Maximum number of mappings one table holds
pub const ALPHABET_SIZE: usize = 64;

/// Inline wrapper around a lone placeholder, as left behind by math
/// typesetting (`<mi>\u{e000}</mi>`, `<span class="mord">\u{e000}</span>`).
static PLACEHOLDER_WRAPPER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"<(span|em|i|b|strong|mi|mo|mn|mtext|mrow)(?:\s[^>]*)?>\s*([\x{e000}-\x{e0fe}])\s*</(span|em|i|b|strong|mi|mo|mn|mtext|mrow)>",
    )
    .unwrap()
});

// =============================================================================
// ClozeTag
// =============================================================================

/// Recorded tag markup for one placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
struct ClozeTag {
    placeholder: char,
    open: String,
    close: String,
}

// =============================================================================
// ClozePlaceholders
// =============================================================================

/// Placeholder table for the cloze spans of one document.
///
/// A table is created per render and emptied by [`restore`](Self::restore),
/// so mappings never leak across documents.
#[derive(Debug, Default)]
pub struct ClozePlaceholders {
    tags: Vec<ClozeTag>,
}

impl ClozePlaceholders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded mappings
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Placeholder characters in recording order
    pub fn placeholders(&self) -> impl Iterator<Item = char> + '_ {
        self.tags.iter().map(|t| t.placeholder)
    }

    /// Replace every cloze span under `root` with a placeholder pair.
    ///
    /// Children are handled before their parent, so a nested span gets a
    /// lower index than the span containing it; siblings are numbered in
    /// document order. Returns the number of spans replaced.
    ///
    /// Fails without touching the tree when the spans would not fit in the
    /// remaining alphabet, or when the card's own text leaves too few
    /// candidate symbols unused.
    pub fn placeholderize(&mut self, root: &mut Element) -> Result<usize, ClozeError> {
        let found = count_clozes(root);
        let capacity = ALPHABET_SIZE - self.tags.len();
        if found > capacity {
            return Err(ClozeError::AlphabetExhausted { found, capacity });
        }
        if found == 0 {
            return Ok(0);
        }

        let free = self.free_symbols(root, found);
        if free.len() < found {
            return Err(ClozeError::AlphabetOccupied {
                found,
                free: free.len(),
            });
        }

        self.replace_children(root, &mut free.into_iter());
        debug!(count = found, "cloze spans placeholderized");
        Ok(found)
    }

    /// Up to `limit` candidates that neither occur under `root` nor are
    /// already mapped
    fn free_symbols(&self, root: &Element, limit: usize) -> Vec<char> {
        let mut used: FxHashSet<char> = root
            .inner_html()
            .chars()
            .filter(|ch| CANDIDATES.contains(ch))
            .collect();
        used.extend(self.placeholders());

        CANDIDATES.filter(|ch| !used.contains(ch)).take(limit).collect()
    }

    fn replace_children<I>(&mut self, elem: &mut Element, free: &mut I)
    where
        I: Iterator<Item = char>,
    {
        let old: Children = mem::take(&mut elem.children);
        let mut new: Children = SmallVec::with_capacity(old.len());

        for node in old {
            let Node::Element(mut child) = node else {
                new.push(node);
                continue;
            };

            self.replace_children(&mut child, free);

            if child.cloze_kind().is_none() {
                new.push(Node::Element(child));
                continue;
            }

            let Some(ch) = free.next() else {
                // Unreachable: `placeholderize` reserves one symbol per span
                new.push(Node::Element(child));
                continue;
            };
            let (open, close) = child.empty_markup();
            self.tags.push(ClozeTag {
                placeholder: ch,
                open,
                close,
            });

            new.push(Node::text(ch.to_string()));
            new.extend(mem::take(&mut child.children));
            new.push(Node::text(ch.to_string()));
        }

        elem.children = new;
    }

    /// Turn placeholder pairs under `root` back into their cloze tags.
    ///
    /// Pairs are processed in recording order. Each mapping is consumed;
    /// a placeholder whose pair went missing during rendering is logged and
    /// left as is.
    pub fn restore(&mut self, root: &mut Element) {
        if self.tags.is_empty() {
            return;
        }

        let mut html = root.inner_html();
        for tag in mem::take(&mut self.tags) {
            html = strip_wrappers(&html, tag.placeholder);
            match restore_pair(&html, &tag) {
                Some(restored) => html = restored,
                None => warn!(placeholder = ?tag.placeholder, "cloze placeholder pair not found"),
            }
        }
        root.set_inner_html(&html);
    }
}

fn count_clozes(elem: &Element) -> usize {
    elem.children_elements()
        .map(|child| count_clozes(child) + usize::from(child.cloze_kind().is_some()))
        .sum()
}

/// Remove inline wrappers around a lone `ch`, until none is left.
fn strip_wrappers(html: &str, ch: char) -> String {
    let mut current = html.to_string();
    loop {
        let next = PLACEHOLDER_WRAPPER
            .replace_all(&current, |caps: &Captures<'_>| {
                let lone = caps[2].chars().next() == Some(ch);
                if lone && caps[1] == caps[3] {
                    caps[2].to_string()
                } else {
                    caps[0].to_string()
                }
            })
            .into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Replace the first `ch ... ch` span with the recorded tag around its content.
fn restore_pair(html: &str, tag: &ClozeTag) -> Option<String> {
    let width = tag.placeholder.len_utf8();
    let start = html.find(tag.placeholder)?;
    let inner_start = start + width;
    let end = inner_start + html[inner_start..].find(tag.placeholder)?;

    let mut output = String::with_capacity(html.len() + tag.open.len() + tag.close.len());
    output.push_str(&html[..start]);
    output.push_str(&tag.open);
    output.push_str(&html[inner_start..end]);
    output.push_str(&tag.close);
    output.push_str(&html[end + width..]);
    Some(output)
}

// =============================================================================
// Tests
// =============================================================================
