//! Bordered, line-numbered code panels and terminal row arithmetic.

use tracing::debug;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::chat::blocks::CodeBlock;
use crate::chat::highlight::Highlighter;

const TAB_WIDTH: usize = 4;
/// Tab stop interval the terminal used when the raw text was echoed.
const TERMINAL_TAB_STOP: usize = 8;
const SEPARATOR: &str = " │ ";
const MIN_WIDTH: usize = 20;

/// Replace tabs with spaces so widths can be counted.
pub fn expand_tabs(line: &str) -> String {
    line.replace('\t', &" ".repeat(TAB_WIDTH))
}

/// Columns `text` occupies; wide glyphs take two.
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Trailing spaces that fill a row to `width`. Never negative.
pub fn padding_for(used: usize, width: usize) -> usize {
    width.saturating_sub(used)
}

/// Terminal rows taken by `text` once echoed, counting soft wraps at `width`.
///
/// A final line without a newline still occupies a row.
pub fn rows_for(text: &str, width: usize) -> usize {
    let width = width.max(1);
    text.split_inclusive('\n')
        .map(|line| echoed_rows(line.trim_end_matches(['\n', '\r']), width))
        .sum()
}

/// Rows one echoed line fills. A glyph that does not fit in what is left of
/// a row moves whole to the next one; tabs stop at the terminal's tab stops.
fn echoed_rows(line: &str, width: usize) -> usize {
    let mut rows = 1;
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            column = ((column / TERMINAL_TAB_STOP + 1) * TERMINAL_TAB_STOP).min(width);
            continue;
        }
        let glyph = c.width().unwrap_or(0);
        if column > 0 && column + glyph > width {
            rows += 1;
            column = 0;
        }
        column += glyph;
    }
    rows
}

/// Render `block` as panel rows, each exactly `width` columns before styling.
///
/// If any line fails to highlight, the whole block is rendered without
/// highlighting.
pub fn render_panel(block: &CodeBlock, highlighter: &dyn Highlighter, width: usize) -> Vec<String> {
    let width = width.max(MIN_WIDTH);
    let lines: Vec<String> = block.body.iter().map(|l| expand_tabs(l)).collect();
    let number_width = lines.len().max(1).to_string().len();

    let styled = match highlight_all(&lines, block.language, highlighter) {
        Some(styled) => styled,
        None => lines.clone(),
    };

    let mut rows = Vec::with_capacity(lines.len() + 2);
    rows.push(top_border(block.language, width));

    for (index, (raw, styled)) in lines.iter().zip(&styled).enumerate() {
        let gutter = format!("{:>number_width$}{SEPARATOR}", index + 1);
        let used = display_width(&gutter) + display_width(raw);
        let padding = " ".repeat(padding_for(used, width));
        rows.push(format!("{gutter}{styled}{padding}"));
    }

    rows.push("─".repeat(width));
    rows
}

fn highlight_all(
    lines: &[String],
    language: &str,
    highlighter: &dyn Highlighter,
) -> Option<Vec<String>> {
    let mut styled = Vec::with_capacity(lines.len());
    for line in lines {
        if line.trim().is_empty() {
            styled.push(line.clone());
            continue;
        }
        match highlighter.render(line, language) {
            Ok(text) => styled.push(text),
            Err(e) => {
                debug!("Highlighting {} failed, rendering plain: {}", language, e);
                return None;
            }
        }
    }
    Some(styled)
}

fn top_border(language: &str, width: usize) -> String {
    let label = format!("── {language} ");
    let fill = padding_for(display_width(&label), width);
    format!("{label}{}", "─".repeat(fill))
}
