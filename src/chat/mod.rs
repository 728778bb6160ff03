//! Interactive prompt/response console.
//!
//! Replies are echoed as they stream in; once the stream closes, fenced
//! code blocks are repainted as bordered, highlighted panels.

pub mod blocks;
pub mod format;
pub mod highlight;
pub mod panel;
pub mod session;
pub mod stream;

pub use blocks::{CodeBlock, Segment, resolve_language};
pub use format::{CodeBlockFormatter, Repaint, TerminalSize};
pub use highlight::{Highlighter, SyntectHighlighter};
pub use session::ChatSession;
pub use stream::{StreamOutcome, StreamRenderer, StreamedResponse};
