//! Console sink for live debate output

use async_trait::async_trait;
use colored::Colorize;
use council_application::{SinkError, StreamSink};
use council_domain::{Persona, StreamChunk};
use std::io::Write;
use std::sync::Mutex;

/// Prints streamed debate text to stderr as it arrives
///
/// A header is written whenever the speaking persona changes. Critical
/// chunks (round markers, aborts) are written on a line of their own.
pub struct ConsoleStreamSink {
    current: Mutex<Option<Persona>>,
}

impl ConsoleStreamSink {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }

    /// Text to write for `chunk`, updating the current speaker.
    fn render(&self, chunk: &StreamChunk) -> String {
        let mut current = match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if chunk.is_critical() {
            *current = None;
            return format!("\n{}\n", chunk.text.trim_end().magenta().bold());
        }

        let mut out = String::new();
        if let Some(persona) = chunk.persona
            && *current != Some(persona)
        {
            *current = Some(persona);
            out.push_str(&format!(
                "\n{}\n",
                format!("[{}]", persona.display_name()).yellow().bold()
            ));
        }
        out.push_str(&chunk.text);
        out
    }
}

impl Default for ConsoleStreamSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StreamSink for ConsoleStreamSink {
    async fn send(&self, chunk: &StreamChunk) -> Result<(), SinkError> {
        let text = self.render(chunk);
        let mut stderr = std::io::stderr().lock();
        stderr
            .write_all(text.as_bytes())
            .and_then(|_| stderr.flush())
            .map_err(|e| SinkError::Write(e.to_string()))
    }
}
