//! Syntax highlighting for code panel rows.

use std::sync::OnceLock;

use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::as_24_bit_terminal_escaped;

use crate::chat::blocks::PLAIN_LANGUAGE;
use crate::error::RenderError;

const THEME_NAME: &str = "base16-eighties.dark";
const RESET: &str = "\x1b[0m";

/// Turns one line of code into terminal-styled text.
pub trait Highlighter {
    fn render(&self, line: &str, language: &str) -> Result<String, RenderError>;
}

struct SyntectAssets {
    syntax_set: SyntaxSet,
    theme: Option<Theme>,
}

fn syntect_assets() -> &'static SyntectAssets {
    static ASSETS: OnceLock<SyntectAssets> = OnceLock::new();
    ASSETS.get_or_init(|| {
        let syntax_set = SyntaxSet::load_defaults_nonewlines();
        let mut theme_set = ThemeSet::load_defaults();
        let theme = theme_set
            .themes
            .remove(THEME_NAME)
            .or_else(|| theme_set.themes.into_values().next());
        SyntectAssets { syntax_set, theme }
    })
}

/// 24-bit color highlighting with syntect's bundled syntaxes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntectHighlighter;

impl SyntectHighlighter {
    pub fn new() -> Self {
        Self
    }

    fn syntax_for<'s>(set: &'s SyntaxSet, language: &str) -> Option<&'s SyntaxReference> {
        // No bundled TypeScript grammar; JavaScript is close enough.
        let token = match language {
            "typescript" => "javascript",
            other => other,
        };
        set.find_syntax_by_token(token)
            .or_else(|| set.find_syntax_by_extension(token))
    }
}

impl Highlighter for SyntectHighlighter {
    fn render(&self, line: &str, language: &str) -> Result<String, RenderError> {
        if language == PLAIN_LANGUAGE {
            return Ok(line.to_string());
        }

        let assets = syntect_assets();
        let theme = assets
            .theme
            .as_ref()
            .ok_or_else(|| RenderError::Highlight("no theme available".to_string()))?;
        let syntax = Self::syntax_for(&assets.syntax_set, language)
            .ok_or_else(|| RenderError::UnknownLanguage(language.to_string()))?;

        let mut highlighter = HighlightLines::new(syntax, theme);
        let ranges = highlighter
            .highlight_line(line, &assets.syntax_set)
            .map_err(|e| RenderError::Highlight(e.to_string()))?;

        Ok(format!("{}{}", as_24_bit_terminal_escaped(&ranges, false), RESET))
    }
}
