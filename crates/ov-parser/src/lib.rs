//! Document parsing and chunking for OpenViking resource ingestion.
//!
//! A parser turns raw resource content into a flat list of [`Chunk`]s; the
//! server layers these into the L0/L1/L2/L3 context hierarchy described by
//! `ov-core::context::Level` — this crate only concerns itself with finding
//! sensible split points, not with context identity or storage.

pub mod chunker;
pub mod code;
pub mod markdown;
pub mod text;
pub mod traits;

#[cfg(test)]
mod tests;

use std::collections::HashMap;

pub use chunker::TextChunker;
pub use code::CodeParser;
pub use markdown::MarkdownParser;
pub use text::TextParser;
pub use traits::DocumentParser;

/// Structural role of a chunk within its parsed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkType {
    /// Plain prose with no finer structure.
    Text,
    /// A code block or syntactic unit (function, class, ...).
    Code,
    /// A paragraph.
    Paragraph,
    /// A heading-delimited section.
    Heading,
    /// Document frontmatter (e.g. YAML between `---` fences).
    Frontmatter,
}

/// A parsed span of a document, with enough metadata to re-embed and store
/// independently as an L3 chunk context.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub text: String,
    pub chunk_type: ChunkType,
    pub metadata: HashMap<String, String>,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl Chunk {
    /// Create a chunk spanning the whole of `text` by default; narrow with
    /// [`Self::with_offsets`] once the caller knows its position in the
    /// source document.
    pub fn new(text: impl Into<String>, chunk_type: ChunkType) -> Self {
        let text = text.into();
        let end_offset = text.len();
        Self {
            text,
            chunk_type,
            metadata: HashMap::new(),
            start_offset: 0,
            end_offset,
        }
    }

    pub fn with_offsets(mut self, start: usize, end: usize) -> Self {
        self.start_offset = start;
        self.end_offset = end;
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: &str) -> Self {
        self.metadata.insert(key.into(), value.to_string());
        self
    }
}

/// Output of a single parser run over one document.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub parser_name: String,
    pub source_format: String,
    pub chunks: Vec<Chunk>,
    pub metadata: HashMap<String, String>,
}

impl ParseResult {
    pub fn new(parser_name: impl Into<String>, source_format: impl Into<String>) -> Self {
        Self {
            parser_name: parser_name.into(),
            source_format: source_format.into(),
            chunks: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    /// Sum of estimated token counts across all chunks.
    pub fn total_tokens(&self) -> usize {
        self.chunks.iter().map(|c| estimate_tokens(&c.text)).sum()
    }
}

/// Rough token estimate: ~4 latin characters per token, one token per CJK
/// character. Good enough for chunk sizing decisions, not a tokenizer
/// replacement.
pub fn estimate_tokens(text: &str) -> usize {
    if text.trim().is_empty() {
        return 0;
    }
    text.split_whitespace()
        .map(|word| {
            let cjk = word.chars().filter(|c| is_cjk(*c)).count();
            let other = word.chars().count() - cjk;
            let other_tokens = if other == 0 { 0 } else { (other + 3) / 4 };
            cjk + other_tokens
        })
        .sum()
}

fn is_cjk(c: char) -> bool {
    matches!(
        c as u32,
        0x4E00..=0x9FFF | 0x3400..=0x4DBF | 0x3040..=0x30FF | 0xAC00..=0xD7A3
    )
}

/// Pick a parser by filename or URI extension, falling back to plain text
/// for anything unrecognized.
pub fn parser_for(name: &str) -> Box<dyn DocumentParser> {
    let code = CodeParser::new();
    if code.can_parse(name) {
        return Box::new(code);
    }
    let markdown = MarkdownParser::new();
    if markdown.can_parse(name) {
        return Box::new(markdown);
    }
    Box::new(TextParser::new())
}
