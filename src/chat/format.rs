//! Repaints a finished response with its code blocks as panels.
//!
//! The live echo and the repaint share nothing but row counts: the echo
//! leaves the cursor at the start of the line after the response, and the
//! repaint walks back up over the rows that hold the first block onwards.

use std::io::{self, Write};

use crossterm::cursor::MoveToPreviousLine;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use tracing::debug;

use crate::chat::blocks::{CodeBlock, Segment, parse};
use crate::chat::highlight::Highlighter;
use crate::chat::panel::{render_panel, rows_for};

const DEFAULT_COLUMNS: usize = 80;
const DEFAULT_ROWS: usize = 24;

/// Visible terminal dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    pub columns: usize,
    pub rows: usize,
}

impl TerminalSize {
    /// Current size of the controlling terminal, or 80x24 when unknown.
    pub fn current() -> Self {
        match crossterm::terminal::size() {
            Ok((columns, rows)) if columns > 0 && rows > 0 => Self {
                columns: columns as usize,
                rows: rows as usize,
            },
            _ => Self {
                columns: DEFAULT_COLUMNS,
                rows: DEFAULT_ROWS,
            },
        }
    }
}

/// How a response was reformatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repaint {
    /// No well-formed block; the streamed text stands as-is.
    Unchanged,
    /// The echoed rows from the first block on were erased and redrawn.
    Replaced { erased_rows: usize, panels: usize },
    /// Too much had scrolled away to erase; panels were printed below.
    Appended { panels: usize },
}

pub struct CodeBlockFormatter<'h> {
    highlighter: &'h dyn Highlighter,
    size: TerminalSize,
}

impl<'h> CodeBlockFormatter<'h> {
    pub fn new(highlighter: &'h dyn Highlighter, size: TerminalSize) -> Self {
        Self { highlighter, size }
    }

    /// Reformat `text`, which has already been echoed to `out` and followed
    /// by a newline.
    ///
    /// Highlighting problems never surface here; they degrade to plain rows.
    pub fn format<W: Write>(&self, out: &mut W, text: &str) -> io::Result<Repaint> {
        let segments = parse(text);
        let Some(first_block) = segments
            .iter()
            .position(|s| matches!(s, Segment::Code { .. }))
        else {
            return Ok(Repaint::Unchanged);
        };

        let start = segments[first_block].span().start;
        let erase = rows_for(&text[start..], self.size.columns);
        let panels = segments
            .iter()
            .filter(|s| matches!(s, Segment::Code { .. }))
            .count();

        // The cursor sits on the last row, so at most rows - 1 are reachable.
        if erase >= self.size.rows {
            debug!(erase, rows = self.size.rows, "block scrolled off screen");
            for segment in &segments {
                if let Segment::Code { block, .. } = segment {
                    self.write_panel(out, block)?;
                }
            }
            out.flush()?;
            return Ok(Repaint::Appended { panels });
        }

        if erase > 0 {
            queue!(out, MoveToPreviousLine(erase as u16), Clear(ClearType::FromCursorDown))?;
        }

        for segment in &segments[first_block..] {
            match segment {
                Segment::Text(span) => {
                    let chunk = &text[span.clone()];
                    out.write_all(chunk.as_bytes())?;
                    if !chunk.ends_with('\n') {
                        writeln!(out)?;
                    }
                }
                Segment::Code { block, .. } => self.write_panel(out, block)?,
            }
        }
        out.flush()?;

        debug!(erase, panels, "repainted response");
        Ok(Repaint::Replaced {
            erased_rows: erase,
            panels,
        })
    }

    fn write_panel<W: Write>(&self, out: &mut W, block: &CodeBlock) -> io::Result<()> {
        for row in render_panel(block, self.highlighter, self.size.columns) {
            writeln!(out, "{row}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;

    struct Identity;

    impl Highlighter for Identity {
        fn render(&self, line: &str, _language: &str) -> Result<String, RenderError> {
            Ok(line.to_string())
        }
    }

    fn size(columns: usize, rows: usize) -> TerminalSize {
        TerminalSize { columns, rows }
    }

    fn format(text: &str, size: TerminalSize) -> (Repaint, String) {
        let mut out = Vec::new();
        let repaint = CodeBlockFormatter::new(&Identity, size)
            .format(&mut out, text)
            .unwrap();
        (repaint, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_unterminated_fence_writes_nothing() {
        let (repaint, out) = format("Look:\n```py\nprint(1)\n", size(40, 24));
        assert_eq!(repaint, Repaint::Unchanged);
        assert!(out.is_empty());
    }

    #[test]
    fn test_plain_text_writes_nothing() {
        let (repaint, out) = format("Just prose.\n", size(40, 24));
        assert_eq!(repaint, Repaint::Unchanged);
        assert!(out.is_empty());
    }

    #[test]
    fn test_python_block_replaced_by_panel() {
        let text = "Try this:\n```py\nprint(1)\n```";
        let (repaint, out) = format(text, size(30, 24));

        assert_eq!(
            repaint,
            Repaint::Replaced {
                erased_rows: 3,
                panels: 1
            }
        );
        // Move up three lines, clear to end of screen.
        assert!(out.starts_with("\x1b[3F\x1b[J"));
        assert!(out.contains("── python "));
        assert!(out.contains(&format!("{:<30}\n", "1 │ print(1)")));
        assert!(!out.contains("```"));
        assert!(!out.contains("Try this:"));
    }

    #[test]
    fn test_text_between_blocks_reprinted() {
        let text = "A\n```sh\nls\n```\nthen\n```rs\nfn x() {}\n```\nend";
        let (repaint, out) = format(text, size(30, 24));

        assert_eq!(
            repaint,
            Repaint::Replaced {
                erased_rows: 8,
                panels: 2
            }
        );
        let then = out.find("then\n").unwrap();
        assert!(out.find("── bash ").unwrap() < then);
        assert!(then < out.find("── rust ").unwrap());
        assert!(out.ends_with("end\n"));
    }

    #[test]
    fn test_wrapped_lines_counted_in_erase() {
        let text = format!("```\n{}\n```\n", "x".repeat(25));
        let (repaint, _) = format(&text, size(20, 24));
        assert_eq!(
            repaint,
            Repaint::Replaced {
                erased_rows: 4,
                panels: 1
            }
        );
    }

    #[test]
    fn test_wide_glyph_wraps_counted_in_erase() {
        let (repaint, out) = format("```\n日本語日本語日本\n```\n", size(10, 24));
        assert_eq!(
            repaint,
            Repaint::Replaced {
                erased_rows: 4,
                panels: 1
            }
        );
        assert!(out.starts_with("\x1b[4F\x1b[J"));
    }

    #[test]
    fn test_block_taller_than_screen_is_appended() {
        let body: String = (0..30).map(|i| format!("line {i}\n")).collect();
        let text = format!("```text\n{body}```\n");
        let (repaint, out) = format(&text, size(40, 10));

        assert_eq!(repaint, Repaint::Appended { panels: 1 });
        assert!(!out.contains("\x1b["));
        assert!(out.contains("30 │ line 29"));
    }
}
