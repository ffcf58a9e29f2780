use axum::body::Bytes;

use super::DONE_MARKER;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminatorState {
    /// No `data: [DONE]` seen yet.
    Awaiting,
    /// Marker forwarded; nothing more may be emitted.
    Terminated,
}

/// Watches a relayed byte stream for the termination marker.
///
/// Chunks go through [`Terminator::feed`] in arrival order; [`Terminator::finish`] is
/// called once the source ends. Together they guarantee the output carries the marker
/// exactly once: either the upstream's own (bytes after it are dropped) or a synthesized
/// one appended at the end. Only a line starting with the marker counts, so the same
/// text inside a JSON payload is relayed as ordinary data. A marker straddling two
/// chunks is still recognised.
#[derive(Debug)]
pub struct Terminator {
    state: TerminatorState,
    // Bytes of the current line matching the marker so far; `None` once the line diverged.
    line_match: Option<usize>,
    // Consecutive `\n` (ignoring `\r`) at the end of what has been forwarded.
    trailing_newlines: u8,
}

impl Default for Terminator {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminator {
    pub fn new() -> Self {
        Self {
            state: TerminatorState::Awaiting,
            line_match: Some(0),
            // Stream start counts as a fresh event boundary.
            trailing_newlines: 2,
        }
    }

    pub fn state(&self) -> TerminatorState {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        self.state == TerminatorState::Terminated
    }

    /// Returns the part of `chunk` to forward.
    pub fn feed(&mut self, chunk: Bytes) -> Bytes {
        if self.is_terminated() {
            return Bytes::new();
        }

        for (i, &b) in chunk.iter().enumerate() {
            self.track_newlines(b);
            if b == b'\n' {
                self.line_match = Some(0);
                continue;
            }
            self.line_match = match self.line_match {
                Some(k) if DONE_MARKER[k] == b => Some(k + 1),
                _ => None,
            };
            if self.line_match == Some(DONE_MARKER.len()) {
                self.state = TerminatorState::Terminated;
                // Keep the newlines that close the marker event.
                let mut end = i + 1;
                while end < chunk.len() && matches!(chunk[end], b'\r' | b'\n') {
                    end += 1;
                }
                return chunk.slice(..end);
            }
        }
        chunk
    }

    /// Called when the source is exhausted; yields the synthesized marker if still owed.
    ///
    /// An unterminated last line or event is closed first so the marker stands alone.
    pub fn finish(&mut self) -> Option<Bytes> {
        match self.state {
            TerminatorState::Terminated => None,
            TerminatorState::Awaiting => {
                self.state = TerminatorState::Terminated;
                let pad = 2usize.saturating_sub(self.trailing_newlines as usize);
                let done = super::done_frame();
                if pad == 0 {
                    return Some(done);
                }
                let mut out = Vec::with_capacity(pad + done.len());
                out.resize(pad, b'\n');
                out.extend_from_slice(&done);
                Some(Bytes::from(out))
            }
        }
    }

    fn track_newlines(&mut self, b: u8) {
        match b {
            b'\n' => self.trailing_newlines = self.trailing_newlines.saturating_add(1),
            b'\r' => {}
            _ => self.trailing_newlines = 0,
        }
    }
}
