//! Required declarations and the rules for finding them

use super::document::{Document, DocumentKind};
use super::error::MergeError;
use regex::Regex;
use std::sync::LazyLock;

static PLUGIN_ACCESSOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"libs\.plugins\.([A-Za-z0-9_.\-]+)").expect("plugin accessor regex")
});

/// Where a missing fact's rendering goes
#[derive(Debug, Clone)]
pub enum Anchor {
    /// Line 0 of the document
    Top,
    /// After the last line
    End,
    /// Right after the first line matching the pattern; never synthesized
    AfterLine(Regex),
    /// Right after a catalog `[name]` header, created when missing
    Section(String),
    /// Right after a top-level `name {` opener, created when missing
    Block(String),
}

impl Anchor {
    pub fn after_line(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Anchor::AfterLine)
    }

    pub fn section(name: impl Into<String>) -> Self {
        Anchor::Section(name.into())
    }

    pub fn block(name: impl Into<String>) -> Self {
        Anchor::Block(name.into())
    }

    /// Short name of the anchor kind, for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Anchor::Top => "top",
            Anchor::End => "end",
            Anchor::AfterLine(_) => "after-line",
            Anchor::Section(_) => "section",
            Anchor::Block(_) => "block",
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Anchor::Top => "top of document".to_string(),
            Anchor::End => "end of document".to_string(),
            Anchor::AfterLine(pattern) => pattern.as_str().to_string(),
            Anchor::Section(name) => format!("[{}]", name),
            Anchor::Block(name) => format!("{} {{", name),
        }
    }

    pub(crate) fn supports(&self, kind: DocumentKind) -> bool {
        match self {
            Anchor::Top | Anchor::End | Anchor::AfterLine(_) => true,
            Anchor::Section(_) => kind.has_sections(),
            Anchor::Block(_) => kind.has_blocks(),
        }
    }
}

/// How to decide whether a fact is already declared
#[derive(Debug, Clone)]
pub enum Matcher {
    /// A `key = value` line inside the fact's catalog section; keys compared normalized
    CatalogKey,
    /// A `key=value` line anywhere; keys compared exactly
    PropertyKey,
    /// Any line matching the pattern, or containing an alias verbatim
    Pattern(Regex),
    /// A `libs.plugins.<accessor>` reference whose normalized accessor matches,
    /// the quoted plugin id, or an alias verbatim
    PluginReference { id: String },
}

/// A single declaration that must exist in a document
#[derive(Debug, Clone)]
pub struct Fact {
    /// Unique name of the declaration (catalog key, property, statement id)
    pub key: String,
    /// Other spellings that count as the same declaration
    pub aliases: Vec<String>,
    /// Lines inserted when the fact is missing
    pub render: Vec<String>,
    pub anchor: Anchor,
    pub matcher: Matcher,
}

impl Fact {
    pub fn new<I, S>(key: impl Into<String>, anchor: Anchor, matcher: Matcher, render: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into(),
            aliases: Vec::new(),
            render: render.into_iter().map(Into::into).collect(),
            anchor,
            matcher,
        }
    }

    /// `key = value` inside a catalog section
    pub fn catalog_entry(section: &str, key: &str, value: &str) -> Self {
        Self::new(
            key,
            Anchor::section(section),
            Matcher::CatalogKey,
            [format!("{} = {}", key, value)],
        )
    }

    /// `key=value` appended to a properties file
    pub fn property(key: &str, value: &str) -> Self {
        Self::new(
            key,
            Anchor::End,
            Matcher::PropertyKey,
            [format!("{}={}", key, value)],
        )
    }

    /// `alias(libs.plugins.<accessor>)<suffix>` inside the `plugins {}` block
    pub fn plugin_alias(key: &str, plugin_id: &str, suffix: &str) -> Self {
        Self::new(
            key,
            Anchor::block("plugins"),
            Matcher::PluginReference {
                id: plugin_id.to_string(),
            },
            [format!("    alias(libs.plugins.{}){}", accessor_path(key), suffix)],
        )
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Evaluate the presence predicate against the current document
    pub fn is_present(&self, doc: &Document) -> Result<bool, MergeError> {
        match &self.matcher {
            Matcher::CatalogKey => self.catalog_key_present(doc),
            Matcher::PropertyKey => Ok(doc.lines().iter().any(|line| {
                property_key(line).is_some_and(|k| k == self.key || self.aliases.iter().any(|a| a == k))
            })),
            Matcher::Pattern(pattern) => Ok(doc
                .lines()
                .iter()
                .any(|line| pattern.is_match(line) || self.contains_alias(line))),
            Matcher::PluginReference { id } => Ok(doc
                .lines()
                .iter()
                .any(|line| self.references_plugin(line, id))),
        }
    }

    fn catalog_key_present(&self, doc: &Document) -> Result<bool, MergeError> {
        let range = match &self.anchor {
            Anchor::Section(name) => match doc.find_section(name)? {
                Some(header) => doc.section_body(header),
                None => return Ok(false),
            },
            _ => 0..doc.len(),
        };

        Ok(doc.lines()[range]
            .iter()
            .filter_map(|line| assignment_key(line))
            .any(|key| self.matches_key(key)))
    }

    fn references_plugin(&self, line: &str, id: &str) -> bool {
        let code = line.split("//").next().unwrap_or(line);
        let by_accessor = PLUGIN_ACCESSOR
            .captures_iter(code)
            .filter_map(|caps| caps.get(1))
            .any(|m| self.matches_key(m.as_str().trim_end_matches('.')));
        let by_id = code.contains(&format!("\"{}\"", id)) || code.contains(&format!("'{}'", id));
        by_accessor || by_id || self.contains_alias(code)
    }

    /// Normalized comparison against the key and every alias
    fn matches_key(&self, candidate: &str) -> bool {
        let candidate = normalize_key(candidate);
        normalize_key(&self.key) == candidate
            || self.aliases.iter().any(|a| normalize_key(a) == candidate)
    }

    fn contains_alias(&self, line: &str) -> bool {
        self.aliases.iter().any(|alias| line.contains(alias.as_str()))
    }
}

/// Lowercase and drop `-`, `_` and `.`, so `android.application`,
/// `android-application` and `androidApplication` compare equal
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '-' | '_' | '.'))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Gradle's type-safe accessor path for a catalog alias (`android-application` -> `android.application`)
pub fn accessor_path(key: &str) -> String {
    key.replace(['-', '_'], ".")
}

/// Key of a TOML `key = value` line, unquoted
fn assignment_key(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.starts_with('#') || trimmed.starts_with('[') {
        return None;
    }
    let (key, _) = trimmed.split_once('=')?;
    let key = key.trim().trim_matches(|c| c == '"' || c == '\'');
    (!key.is_empty()).then_some(key)
}

/// Key of a `.properties` line (`key=value` or `key: value`)
fn property_key(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') || trimmed.starts_with('!') {
        return None;
    }
    let end = trimmed.find(['=', ':'])?;
    let key = trimmed[..end].trim();
    (!key.is_empty()).then_some(key)
}
