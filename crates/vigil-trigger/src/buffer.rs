//! Rolling buffer of recent decoded output for persistent matching.
//!
//! Text arrives as already-decoded, ANSI-stripped chunks. The buffer
//! splits them into lines, keeps the most recent `cap` complete lines,
//! and carries an unterminated trailing line separately so eviction
//! never removes a partial line.

use std::collections::VecDeque;

/// Bounded, line-evicting accumulator of recent text for one session.
pub struct RollingBuffer {
    /// Complete lines, oldest first.
    lines: VecDeque<String>,
    /// Maximum complete lines retained.
    cap: usize,
    /// Accumulator for text after the last newline.
    partial: String,
}

impl RollingBuffer {
    /// Create a buffer retaining at most `cap` complete lines.
    pub fn new(cap: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(cap.min(1024)),
            cap,
            partial: String::new(),
        }
    }

    /// Append a chunk of text, splitting into lines and evicting the
    /// oldest complete lines beyond the cap.
    pub fn append(&mut self, text: &str) {
        for segment in text.split_inclusive('\n') {
            match segment.strip_suffix('\n') {
                Some(rest) => {
                    self.partial.push_str(rest);
                    let line = std::mem::take(&mut self.partial);
                    self.push_line(line);
                }
                None => self.partial.push_str(segment),
            }
        }
    }

    /// The current window as one string, without mutating state.
    ///
    /// Complete lines joined with `\n`, followed by the unterminated
    /// trailing line if there is one.
    pub fn snapshot(&self) -> String {
        let mut out = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(line);
        }
        if !self.partial.is_empty() {
            if !self.lines.is_empty() {
                out.push('\n');
            }
            out.push_str(&self.partial);
        }
        out
    }

    /// Number of complete lines currently retained. Never exceeds the cap.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.partial.is_empty()
    }

    fn push_line(&mut self, line: String) {
        if self.cap == 0 {
            return;
        }
        if self.lines.len() >= self.cap {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }
}
