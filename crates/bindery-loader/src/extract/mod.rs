//! Operation name extraction from raw fragment text.
//!
//! Fragments are self-describing: the canonical operation name lives
//! in the fragment's own source rather than in a separate manifest.
//! [`NameExtractor`] is the seam behind which extraction sits so a
//! stricter, structured extractor can replace the textual one without
//! touching the orchestrator. [`KeywordExtractor`] is the production
//! implementation: it returns the identifier following the first
//! standalone occurrence of the defining keyword.

/// Trait abstracting operation name extraction for replaceability.
///
/// # Example
///
/// ```
/// use bindery_loader::extract::{KeywordExtractor, NameExtractor};
///
/// let extractor = KeywordExtractor::default();
/// let name = extractor.extract("function Get-Thing {\n}\n");
/// assert_eq!(name.as_deref(), Some("Get-Thing"));
/// ```
pub trait NameExtractor {
    /// Returns the first operation name declared in `text`, or `None`
    /// when the fragment declares no exportable name.
    fn extract(&self, text: &str) -> Option<String>;
}

/// Extracts names by scanning for a defining keyword token.
///
/// `<# ... #>` comment blocks are skipped, so prose mentioning the
/// keyword in a leading synopsis cannot masquerade as a definition.
/// Outside comments the keyword must appear as a standalone
/// whitespace-delimited token; the name is the run of alphanumerics,
/// hyphens, and underscores at the start of the following token. A
/// fragment declaring several operations yields only the first; a
/// fragment declaring none yields an explicit miss rather than an
/// error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordExtractor {
    keyword: String,
}

impl KeywordExtractor {
    /// Creates an extractor for the given defining keyword.
    #[must_use]
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
        }
    }

    /// Returns the defining keyword this extractor searches for.
    #[must_use]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new("function")
    }
}

/// Removes every `<# ... #>` region; an unterminated block swallows
/// the remainder of the text.
fn without_comment_blocks(text: &str) -> String {
    let mut kept = String::with_capacity(text.len());
    let mut rest = text;
    while let Some((before, after)) = rest.split_once("<#") {
        kept.push_str(before);
        // Keep a separator so tokens cannot fuse across the excision.
        kept.push(' ');
        match after.split_once("#>") {
            Some((_, tail)) => rest = tail,
            None => return kept,
        }
    }
    kept.push_str(rest);
    kept
}

impl NameExtractor for KeywordExtractor {
    fn extract(&self, text: &str) -> Option<String> {
        let scannable = without_comment_blocks(text);
        let mut tokens = scannable.split_whitespace();
        while let Some(token) = tokens.next() {
            if token != self.keyword {
                continue;
            }
            let name: String = tokens
                .next()?
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
                .collect();
            if name.is_empty() {
                // Keyword followed by punctuation only; keep scanning.
                continue;
            }
            return Some(name);
        }
        None
    }
}
