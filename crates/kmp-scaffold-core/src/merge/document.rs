//! Line-oriented view of a Gradle configuration file

use super::error::MergeError;
use std::fmt;

/// Which grammar a document follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// `gradle/libs.versions.toml`
    VersionCatalog,
    /// `settings.gradle(.kts)`
    SettingsScript,
    /// `build.gradle(.kts)` at the root or in a module
    BuildScript,
    /// `gradle.properties`
    Properties,
}

impl DocumentKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            DocumentKind::VersionCatalog => "version catalog",
            DocumentKind::SettingsScript => "settings script",
            DocumentKind::BuildScript => "build script",
            DocumentKind::Properties => "properties file",
        }
    }

    /// Catalogs are organized in `[section]` tables
    pub fn has_sections(&self) -> bool {
        matches!(self, DocumentKind::VersionCatalog)
    }

    /// Scripts are organized in top-level `name { ... }` blocks
    pub fn has_blocks(&self) -> bool {
        matches!(
            self,
            DocumentKind::SettingsScript | DocumentKind::BuildScript
        )
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

const BOM: char = '\u{feff}';

/// Line terminator used when a modified document is rendered again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }

    /// Pick whichever terminator the majority of lines use
    fn detect(text: &str) -> Self {
        let total = text.matches('\n').count();
        let crlf = text.matches("\r\n").count();
        if crlf > 0 && crlf * 2 >= total {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }
}

/// An ordered sequence of lines, parsed from text
#[derive(Debug, Clone)]
pub struct Document {
    kind: DocumentKind,
    lines: Vec<String>,
    line_ending: LineEnding,
    /// Input started with a UTF-8 byte-order mark, restored on render
    bom: bool,
}

impl Document {
    /// Split `text` into lines.
    ///
    /// One trailing terminator is consumed; any further blank lines at the end
    /// are kept as lines of their own. A leading byte-order mark is set aside
    /// so it cannot hide the first header or block opener.
    pub fn parse(kind: DocumentKind, text: &str) -> Result<Self, MergeError> {
        let (bom, text) = match text.strip_prefix(BOM) {
            Some(rest) => (true, rest),
            None => (false, text),
        };

        if let Some(offset) = text.find('\0') {
            return Err(MergeError::Binary {
                kind,
                reason: format!("NUL byte at offset {}", offset),
            });
        }

        let line_ending = LineEnding::detect(text);
        let lines = if text.is_empty() {
            Vec::new()
        } else {
            let body = text.strip_suffix('\n').unwrap_or(text);
            body.split('\n')
                .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
                .collect()
        };

        Ok(Self {
            kind,
            lines,
            line_ending,
            bom,
        })
    }

    /// Parse raw file contents, rejecting anything that is not UTF-8 text
    pub fn from_bytes(kind: DocumentKind, bytes: &[u8]) -> Result<Self, MergeError> {
        Self::parse(kind, decode(kind, bytes)?)
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Insert `new_lines` so the first of them ends up at index `at`
    pub(crate) fn insert(&mut self, at: usize, new_lines: &[String]) {
        let at = at.min(self.lines.len());
        self.lines.splice(at..at, new_lines.iter().cloned());
    }

    /// Whether the line before `at` exists and has content
    pub(crate) fn follows_content(&self, at: usize) -> bool {
        at > 0
            && self
                .lines
                .get(at - 1)
                .is_some_and(|line| !line.trim().is_empty())
    }

    /// Render back to text, always terminated by one line ending
    pub fn render(&self) -> String {
        let mut out = String::new();
        if self.bom {
            out.push(BOM);
        }
        if self.lines.is_empty() {
            return out;
        }
        let eol = self.line_ending.as_str();
        out.push_str(&self.lines.join(eol));
        out.push_str(eol);
        out
    }

    /// Index of the `[name]` header, erroring when it is declared twice
    pub(crate) fn find_section(&self, name: &str) -> Result<Option<usize>, MergeError> {
        let headers: Vec<usize> = self
            .lines
            .iter()
            .enumerate()
            .filter(|(_, line)| section_name(line) == Some(name))
            .map(|(idx, _)| idx)
            .collect();

        match headers.as_slice() {
            [] => Ok(None),
            [idx] => Ok(Some(*idx)),
            _ => Err(MergeError::DuplicateAnchor {
                kind: self.kind,
                anchor: format!("[{}]", name),
                count: headers.len(),
            }),
        }
    }

    /// Line range of a section's body (header excluded)
    pub(crate) fn section_body(&self, header: usize) -> std::ops::Range<usize> {
        let start = header + 1;
        let end = self.lines[start..]
            .iter()
            .position(|line| section_name(line).is_some())
            .map(|offset| start + offset)
            .unwrap_or(self.lines.len());
        start..end
    }

    /// All `(index, name)` section headers in document order
    pub(crate) fn section_headers(&self) -> Vec<(usize, &str)> {
        self.lines
            .iter()
            .enumerate()
            .filter_map(|(idx, line)| section_name(line).map(|name| (idx, name)))
            .collect()
    }

    /// Index of the top-level `name {` opener.
    ///
    /// Errors when the block is opened more than once at top level or when it
    /// closes on its opening line, since neither can be extended safely.
    pub(crate) fn find_block(&self, name: &str) -> Result<Option<usize>, MergeError> {
        let openers: Vec<usize> = self
            .lines
            .iter()
            .enumerate()
            .filter(|(_, line)| opens_block(line, name))
            .map(|(idx, _)| idx)
            .collect();

        let idx = match openers.as_slice() {
            [] => return Ok(None),
            [idx] => *idx,
            _ => {
                return Err(MergeError::DuplicateAnchor {
                    kind: self.kind,
                    anchor: format!("{} {{", name),
                    count: openers.len(),
                })
            }
        };

        if brace_delta(&self.lines[idx]) <= 0 {
            return Err(MergeError::InlineBlock {
                kind: self.kind,
                anchor: format!("{} {{", name),
                line: idx + 1,
            });
        }

        Ok(Some(idx))
    }

    /// Index of the line that closes the block opened at `opener`
    pub(crate) fn block_end(&self, opener: usize) -> Option<usize> {
        let mut depth = 0i64;
        for (idx, line) in self.lines.iter().enumerate().skip(opener) {
            depth += brace_delta(line);
            if depth <= 0 {
                return Some(idx);
            }
        }
        None
    }
}

/// View raw file contents as text
pub fn decode(kind: DocumentKind, bytes: &[u8]) -> Result<&str, MergeError> {
    std::str::from_utf8(bytes).map_err(|e| MergeError::Binary {
        kind,
        reason: format!("invalid UTF-8 at byte {}", e.valid_up_to()),
    })
}

/// Name of the catalog table a header line opens (`[versions]` -> `versions`)
pub(crate) fn section_name(line: &str) -> Option<&str> {
    let code = line.split('#').next().unwrap_or(line).trim();
    if code.starts_with("[[") {
        return None;
    }
    code.strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .map(str::trim)
}

/// Whether `line` is an unindented `name {` opener
pub(crate) fn opens_block(line: &str, name: &str) -> bool {
    if line.starts_with(char::is_whitespace) {
        return false;
    }
    line.strip_prefix(name)
        .is_some_and(|rest| rest.trim_start().starts_with('{'))
}

/// Net brace depth change of a script line, ignoring `//` comments and string literals
fn brace_delta(line: &str) -> i64 {
    let code = strip_line_comment(line);
    let mut delta = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for ch in code.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '{' => delta += 1,
            '}' => delta -= 1,
            _ => {}
        }
    }
    delta
}

fn strip_line_comment(line: &str) -> &str {
    match line.find("//") {
        // `https://` inside a string is not a comment
        Some(pos) if line[..pos].matches('"').count() % 2 == 0 => &line[..pos],
        _ => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_blank_trailing_lines() {
        let doc = Document::parse(DocumentKind::Properties, "a=1\n\n").unwrap();
        assert_eq!(doc.lines(), &["a=1".to_string(), String::new()]);
        assert_eq!(doc.render(), "a=1\n\n");
    }

    #[test]
    fn test_parse_empty_document() {
        let doc = Document::parse(DocumentKind::BuildScript, "").unwrap();
        assert!(doc.is_empty());
        assert_eq!(doc.render(), "");
    }

    #[test]
    fn test_byte_order_mark_set_aside_and_restored() {
        let doc = Document::parse(DocumentKind::VersionCatalog, "\u{feff}[versions]\n").unwrap();
        assert_eq!(doc.lines(), &["[versions]".to_string()]);
        assert_eq!(doc.find_section("versions").unwrap(), Some(0));
        assert_eq!(doc.render(), "\u{feff}[versions]\n");
    }

    #[test]
    fn test_render_adds_missing_terminator() {
        let doc = Document::parse(DocumentKind::Properties, "a=1").unwrap();
        assert_eq!(doc.render(), "a=1\n");
    }

    #[test]
    fn test_crlf_detected_and_preserved() {
        let doc = Document::parse(DocumentKind::Properties, "a=1\r\nb=2\r\n").unwrap();
        assert_eq!(doc.line_ending(), LineEnding::CrLf);
        assert_eq!(doc.lines(), &["a=1".to_string(), "b=2".to_string()]);
        assert_eq!(doc.render(), "a=1\r\nb=2\r\n");
    }

    #[test]
    fn test_binary_content_rejected() {
        let err = Document::parse(DocumentKind::VersionCatalog, "[versions]\0").unwrap_err();
        assert!(matches!(err, MergeError::Binary { .. }));

        let err = Document::from_bytes(DocumentKind::VersionCatalog, &[0xff, 0xfe, 0x00])
            .unwrap_err();
        assert!(matches!(err, MergeError::Binary { .. }));
    }

    #[test]
    fn test_section_name_parsing() {
        assert_eq!(section_name("[versions]"), Some("versions"));
        assert_eq!(section_name("  [ plugins ]  # tools"), Some("plugins"));
        assert_eq!(section_name("[[array]]"), None);
        assert_eq!(section_name("kotlin = \"1.9.22\""), None);
    }

    #[test]
    fn test_section_body_ends_at_next_header() {
        let doc = Document::parse(
            DocumentKind::VersionCatalog,
            "[versions]\nkotlin = \"1\"\n\n[plugins]\nx = 1\n",
        )
        .unwrap();
        assert_eq!(doc.section_body(0), 1..3);
        assert_eq!(doc.section_body(3), 4..5);
    }

    #[test]
    fn test_duplicate_section_is_an_error() {
        let doc =
            Document::parse(DocumentKind::VersionCatalog, "[versions]\n[versions]\n").unwrap();
        let err = doc.find_section("versions").unwrap_err();
        assert!(matches!(err, MergeError::DuplicateAnchor { count: 2, .. }));
    }

    #[test]
    fn test_opens_block_only_at_top_level() {
        assert!(opens_block("plugins {", "plugins"));
        assert!(opens_block("plugins{", "plugins"));
        assert!(!opens_block("    plugins {", "plugins"));
        assert!(!opens_block("pluginsExtra {", "plugins"));
        assert!(!opens_block("commonMain.dependencies {", "dependencies"));
    }

    #[test]
    fn test_inline_block_is_rejected() {
        let doc = Document::parse(
            DocumentKind::BuildScript,
            "plugins { id(\"com.android.application\") }\n",
        )
        .unwrap();
        let err = doc.find_block("plugins").unwrap_err();
        assert!(matches!(err, MergeError::InlineBlock { line: 1, .. }));
    }

    #[test]
    fn test_block_end_ignores_braces_in_strings() {
        let doc = Document::parse(
            DocumentKind::BuildScript,
            "buildscript {\n    val x = \"}\"\n}\nplugins {\n}\n",
        )
        .unwrap();
        assert_eq!(doc.block_end(0), Some(2));
    }
}
