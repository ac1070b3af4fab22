//! Code-fence aware terminal coloring.
//!
//! Replies arrive in fragments that can split anywhere, including inside a
//! fence marker, so the highlighter is a small state machine fed one
//! character at a time. Text between ``` fences is rendered cyan. A fence
//! only toggles once its line is complete, so marker characters are styled
//! with the state they were emitted under.

use crossterm::style::Stylize;

const FENCE: &str = "```";

#[derive(Default)]
pub struct Highlighter {
    in_code: bool,
    line: String,
}

impl Highlighter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_code(&self) -> bool {
        self.in_code
    }

    /// Style one character of the reply and advance the fence state.
    pub fn style_char(&mut self, ch: char) -> String {
        let styled = if self.in_code && ch != '\n' {
            ch.to_string().cyan().to_string()
        } else {
            ch.to_string()
        };
        if ch == '\n' {
            if self.line.trim_start().starts_with(FENCE) {
                self.in_code = !self.in_code;
            }
            self.line.clear();
        } else {
            self.line.push(ch);
        }
        styled
    }

    /// Flush the trailing line; streams do not always end with a newline.
    pub fn finish(&mut self) {
        if self.line.trim_start().starts_with(FENCE) {
            self.in_code = !self.in_code;
        }
        self.line.clear();
    }
}
