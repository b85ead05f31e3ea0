//! Stateful ANSI escape sequence stripping.
//!
//! Terminal output is full of escape codes for colors, cursor movement,
//! and window titles, and a sequence can be split across two reads. The
//! filter keeps its parse state between feeds so split sequences are
//! still removed cleanly.
//!
//! Handles CSI (`ESC [ ... <final>`), OSC (`ESC ] ... ST`, where ST is
//! `ESC \` or BEL), simple two-character escapes, the C1 CSI character
//! (U+009B), and carriage returns.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ground,
    Escape,
    Csi,
    Osc,
    OscEscape,
}

/// Streaming ANSI/control sequence filter.
pub struct AnsiFilter {
    state: State,
}

impl AnsiFilter {
    pub fn new() -> Self {
        Self {
            state: State::Ground,
        }
    }

    /// Filter one chunk of decoded text, returning the clean remainder.
    /// Parse state carries over to the next call.
    pub fn feed(&mut self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        for c in input.chars() {
            match self.state {
                State::Ground => match c {
                    '\u{1b}' => self.state = State::Escape,
                    '\u{9b}' => self.state = State::Csi,
                    '\r' => {}
                    _ => out.push(c),
                },
                State::Escape => match c {
                    '[' => self.state = State::Csi,
                    ']' => self.state = State::Osc,
                    // Two-character escape (ESC M, ESC 7, ...): consumed.
                    _ => self.state = State::Ground,
                },
                State::Csi => {
                    if ('\u{40}'..='\u{7e}').contains(&c) {
                        // Final byte ends the sequence.
                        self.state = State::Ground;
                    } else if !('\u{20}'..='\u{3f}').contains(&c) {
                        // Neither parameter nor intermediate: malformed,
                        // abandon the sequence.
                        self.state = State::Ground;
                    }
                }
                State::Osc => match c {
                    '\u{07}' => self.state = State::Ground,
                    '\u{1b}' => self.state = State::OscEscape,
                    _ => {}
                },
                State::OscEscape => {
                    self.state = if c == '\\' { State::Ground } else { State::Osc };
                }
            }
        }
        out
    }
}

impl Default for AnsiFilter {
    fn default() -> Self {
        Self::new()
    }
}
