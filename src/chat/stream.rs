//! Live echo of a streamed reply.

use std::io::Write;

use futures::StreamExt;
use tracing::{debug, warn};

use crate::cancel::CancellationToken;
use crate::error::{ChatError, InferenceError};
use crate::llm::TextStream;

/// Accumulates fragments in arrival order and tracks how much was echoed.
#[derive(Debug, Default)]
pub struct StreamedResponse {
    chunks: Vec<String>,
    echoed: usize,
    complete: bool,
}

impl StreamedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: String) {
        self.chunks.push(chunk);
    }

    /// Chunks received but not yet written out.
    pub fn unechoed(&self) -> &[String] {
        &self.chunks[self.echoed..]
    }

    pub fn mark_echoed(&mut self) {
        self.echoed = self.chunks.len();
    }

    pub fn finish(&mut self) {
        self.complete = true;
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Everything received so far.
    pub fn text(&self) -> String {
        self.chunks.concat()
    }
}

/// Result of draining a stream. A mid-stream failure keeps what arrived.
#[derive(Debug)]
pub struct StreamOutcome {
    pub response: StreamedResponse,
    pub error: Option<InferenceError>,
}

/// Writes every fragment the moment it arrives.
pub struct StreamRenderer<'w, W: Write> {
    out: &'w mut W,
}

impl<'w, W: Write> StreamRenderer<'w, W> {
    pub fn new(out: &'w mut W) -> Self {
        Self { out }
    }

    /// Drain `stream`, echoing as it goes.
    ///
    /// The echoed output always ends at the start of a fresh line, so later
    /// row arithmetic can treat the response text as whole lines.
    pub async fn render(
        &mut self,
        mut stream: TextStream,
        cancel: &CancellationToken,
    ) -> Result<StreamOutcome, ChatError> {
        let mut response = StreamedResponse::new();
        let mut error = None;

        loop {
            match cancel.run(stream.next()).await? {
                Some(Ok(chunk)) => {
                    response.push(chunk);
                    self.echo(&mut response)?;
                }
                Some(Err(e)) => {
                    warn!("Stream failed after {} chunk(s): {}", response.chunk_count(), e);
                    error = Some(e);
                    break;
                }
                None => break,
            }
        }

        response.finish();
        if !response.text().ends_with('\n') {
            writeln!(self.out)?;
            self.out.flush()?;
        }
        debug!(chunks = response.chunk_count(), "stream closed");

        Ok(StreamOutcome { response, error })
    }

    fn echo(&mut self, response: &mut StreamedResponse) -> Result<(), ChatError> {
        for chunk in response.unechoed() {
            self.out.write_all(chunk.as_bytes())?;
        }
        self.out.flush()?;
        response.mark_echoed();
        Ok(())
    }
}
