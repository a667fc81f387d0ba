//! The fact-by-fact merge loop

use super::document::{Document, DocumentKind};
use super::error::MergeError;
use super::fact::{Anchor, Fact};
use std::collections::HashMap;
use tracing::debug;

/// Catalog tables in the order Gradle's own templates write them
const CATALOG_SECTIONS: &[&str] = &["versions", "libraries", "bundles", "plugins"];

/// Blocks that must precede `plugins {}` in a Gradle script
const LEADING_BLOCKS: &[&str] = &["buildscript", "pluginManagement"];

/// Result of a successful merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Merged text; identical to the input when nothing was inserted
    pub text: String,
    /// Keys of the facts that were missing, in insertion order
    pub inserted: Vec<String>,
}

impl MergeOutcome {
    pub fn changed(&self) -> bool {
        !self.inserted.is_empty()
    }
}

/// Guarantee every fact in `facts` is declared in `text`.
///
/// Existing lines are never removed or reordered. When every fact is already
/// present the input is returned byte-for-byte. Any fact that cannot be
/// anchored fails the whole merge.
pub fn merge(text: &str, kind: DocumentKind, facts: &[Fact]) -> Result<MergeOutcome, MergeError> {
    let mut doc = Document::parse(kind, text)?;
    let inserted = apply(&mut doc, facts)?;

    let text = if inserted.is_empty() {
        text.to_string()
    } else {
        doc.render()
    };

    Ok(MergeOutcome { text, inserted })
}

/// [`merge`] for raw file contents; non-UTF-8 input is rejected as binary
pub fn merge_bytes(
    bytes: &[u8],
    kind: DocumentKind,
    facts: &[Fact],
) -> Result<MergeOutcome, MergeError> {
    merge(super::document::decode(kind, bytes)?, kind, facts)
}

/// Keys of the facts `text` is missing, without modifying anything
pub fn missing_facts(
    text: &str,
    kind: DocumentKind,
    facts: &[Fact],
) -> Result<Vec<String>, MergeError> {
    Ok(merge(text, kind, facts)?.inserted)
}

fn apply(doc: &mut Document, facts: &[Fact]) -> Result<Vec<String>, MergeError> {
    let mut inserted = Vec::new();
    // Lines this merge already placed right under each section/block opener
    let mut placed: HashMap<String, usize> = HashMap::new();

    for fact in facts {
        if fact.is_present(doc)? {
            debug!(kind = %doc.kind(), fact = %fact.key, "already declared");
            continue;
        }

        // Resolved against the current lines; earlier insertions shift offsets
        let mut at = resolve_anchor(doc, fact)?;
        if let Anchor::Section(_) | Anchor::Block(_) = fact.anchor {
            let run = placed.entry(fact.anchor.describe()).or_default();
            // Keep table order: go below entries this merge put there
            at += *run;
            *run += fact.render.len();
        }
        doc.insert(at, &fact.render);
        debug!(kind = %doc.kind(), fact = %fact.key, line = at + 1, "inserted");

        debug_assert!(
            fact.is_present(doc).unwrap_or(false),
            "rendering of `{}` does not satisfy its own matcher",
            fact.key
        );
        inserted.push(fact.key.clone());
    }

    Ok(inserted)
}

/// Index at which the fact's rendering is inserted
fn resolve_anchor(doc: &mut Document, fact: &Fact) -> Result<usize, MergeError> {
    if !fact.anchor.supports(doc.kind()) {
        return Err(MergeError::UnsupportedAnchor {
            kind: doc.kind(),
            fact: fact.key.clone(),
            anchor: fact.anchor.kind_name(),
        });
    }

    match &fact.anchor {
        Anchor::Top => Ok(0),
        Anchor::End => Ok(doc.len()),
        Anchor::AfterLine(pattern) => doc
            .lines()
            .iter()
            .position(|line| pattern.is_match(line))
            .map(|idx| idx + 1)
            .ok_or_else(|| MergeError::MissingAnchor {
                kind: doc.kind(),
                fact: fact.key.clone(),
                anchor: fact.anchor.describe(),
            }),
        Anchor::Section(name) => {
            let header = match doc.find_section(name)? {
                Some(header) => header,
                None => create_section(doc, name),
            };
            Ok(header + 1)
        }
        Anchor::Block(name) => {
            let opener = match doc.find_block(name)? {
                Some(opener) => opener,
                None => create_block(doc, name),
            };
            Ok(opener + 1)
        }
    }
}

/// Insert an empty `[name]` table before the next canonical table, or at the end.
/// Returns the header's index.
fn create_section(doc: &mut Document, name: &str) -> usize {
    let rank = CATALOG_SECTIONS.iter().position(|s| *s == name);

    let next_header = rank.and_then(|rank| {
        doc.section_headers()
            .into_iter()
            .find(|(_, existing)| {
                CATALOG_SECTIONS
                    .iter()
                    .position(|s| s == existing)
                    .is_some_and(|r| r > rank)
            })
            .map(|(idx, _)| idx)
    });

    let header = format!("[{}]", name);
    match next_header {
        Some(at) => {
            doc.insert(at, &[header, String::new()]);
            debug!(section = name, line = at + 1, "created catalog section");
            at
        }
        None => append_with_separator(doc, &[header]),
    }
}

/// Insert an empty `name {}` block. `plugins` goes to the head of the script,
/// after imports and any blocks Gradle requires before it; everything else is
/// appended. Returns the opener's index.
fn create_block(doc: &mut Document, name: &str) -> usize {
    let lines = [format!("{} {{", name), "}".to_string()];

    if name != "plugins" {
        return append_with_separator(doc, &lines);
    }

    let at = head_position(doc);
    let mut block = lines.to_vec();
    if doc.lines().get(at).is_some_and(|l| !l.trim().is_empty()) {
        block.push(String::new());
    }
    if doc.follows_content(at) {
        block.insert(0, String::new());
        doc.insert(at, &block);
        debug!(block = name, line = at + 2, "created script block");
        return at + 1;
    }
    doc.insert(at, &block);
    debug!(block = name, line = at + 1, "created script block");
    at
}

/// First line after leading imports/comments and after any leading block
fn head_position(doc: &Document) -> usize {
    let after_leading_blocks = LEADING_BLOCKS
        .iter()
        .filter_map(|name| {
            doc.lines()
                .iter()
                .position(|line| super::document::opens_block(line, name))
                .and_then(|opener| doc.block_end(opener))
        })
        .max()
        .map(|end| end + 1);

    if let Some(at) = after_leading_blocks {
        return at;
    }

    doc.lines()
        .iter()
        .position(|line| {
            let t = line.trim();
            !(t.is_empty()
                || t.starts_with("import ")
                || t.starts_with("//")
                || t.starts_with("/*")
                || t.starts_with('*'))
        })
        .unwrap_or(doc.len())
}

/// Append `lines`, separated from preceding content by a blank line.
/// Returns the index of the first appended line.
fn append_with_separator(doc: &mut Document, lines: &[String]) -> usize {
    let mut at = doc.len();
    if doc.follows_content(at) {
        doc.insert(at, &[String::new()]);
        at += 1;
    }
    doc.insert(at, lines);
    at
}
