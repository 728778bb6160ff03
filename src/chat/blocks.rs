//! Fenced code block detection in a finished response.

use std::ops::Range;

const FENCE: &str = "```";

/// Language used when the tag is missing or not recognized.
pub const PLAIN_LANGUAGE: &str = "text";

/// Common abbreviations mapped to canonical language names.
const ALIASES: &[(&str, &str)] = &[
    ("py", "python"),
    ("python3", "python"),
    ("js", "javascript"),
    ("jsx", "javascript"),
    ("node", "javascript"),
    ("ts", "typescript"),
    ("tsx", "typescript"),
    ("cpp", "c++"),
    ("cxx", "c++"),
    ("hpp", "c++"),
    ("cc", "c++"),
    ("sh", "bash"),
    ("shell", "bash"),
    ("zsh", "bash"),
    ("console", "bash"),
    ("rs", "rust"),
    ("rb", "ruby"),
    ("golang", "go"),
    ("cs", "c#"),
    ("csharp", "c#"),
    ("yml", "yaml"),
    ("md", "markdown"),
    ("htm", "html"),
    ("txt", "text"),
    ("plaintext", "text"),
];

/// Languages whose tag line is consumed as a tag rather than shown as code.
const RECOGNIZED: &[&str] = &[
    "bash",
    "c",
    "c#",
    "c++",
    "css",
    "diff",
    "go",
    "haskell",
    "html",
    "java",
    "javascript",
    "json",
    "lua",
    "markdown",
    "php",
    "python",
    "ruby",
    "rust",
    "scala",
    "sql",
    "text",
    "typescript",
    "xml",
    "yaml",
];

/// Normalize a fence tag. Returns the language and whether it is recognized.
///
/// Anything not on the allow-list resolves to `"text"`.
pub fn resolve_language(tag: &str) -> (&'static str, bool) {
    let tag = tag.trim().to_ascii_lowercase();
    let canonical = ALIASES
        .iter()
        .find(|(alias, _)| *alias == tag)
        .map(|(_, name)| *name)
        .unwrap_or(tag.as_str());

    match RECOGNIZED.iter().find(|name| **name == canonical) {
        Some(name) => (*name, true),
        None => (PLAIN_LANGUAGE, false),
    }
}

/// A well-formed fenced block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Lines shown in the panel, without trailing newlines.
    pub body: Vec<String>,
    pub language: &'static str,
    pub recognized: bool,
}

/// A piece of the response, located by byte range in the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(Range<usize>),
    Code { span: Range<usize>, block: CodeBlock },
}

impl Segment {
    pub fn span(&self) -> &Range<usize> {
        match self {
            Segment::Text(span) => span,
            Segment::Code { span, .. } => span,
        }
    }
}

/// Split `text` into plain text and fenced blocks.
///
/// Fences are recognized only at the start of a line (indentation allowed).
/// An opening fence without a closing one is left as plain text, as is
/// everything after it.
pub fn parse(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut open: Option<(usize, String, Vec<String>)> = None;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        let content = line.trim_end_matches(['\n', '\r']);

        match open.take() {
            None => {
                if let Some(tag) = content.trim_start().strip_prefix(FENCE) {
                    open = Some((start, tag.to_string(), Vec::new()));
                }
            }
            Some((block_start, tag, mut body)) => {
                if is_closing_fence(content) {
                    if text_start < block_start {
                        segments.push(Segment::Text(text_start..block_start));
                    }
                    segments.push(Segment::Code {
                        span: block_start..offset,
                        block: build_block(tag, body),
                    });
                    text_start = offset;
                } else {
                    body.push(content.to_string());
                    open = Some((block_start, tag, body));
                }
            }
        }
    }

    if text_start < text.len() {
        segments.push(Segment::Text(text_start..text.len()));
    }
    segments
}

fn is_closing_fence(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= FENCE.len() && trimmed.chars().all(|c| c == '`')
}

fn build_block(tag_line: String, mut body: Vec<String>) -> CodeBlock {
    let (language, recognized) = resolve_language(&tag_line);
    // An unrecognized tag is content, e.g. a fence opened directly on code.
    if !recognized && !tag_line.trim().is_empty() {
        body.insert(0, tag_line);
    }
    CodeBlock {
        body,
        language,
        recognized,
    }
}
