//! Incremental JSON array element extraction from streamed model output.
//!
//! Model output arrives in arbitrary text chunks and may be wrapped in
//! markdown fences, an outer object, or conversational text. The scanner
//! locates the first top-level JSON array and hands back each object element
//! as soon as its closing brace arrives, tracking string literals (including
//! escaped characters) so braces inside strings do not confuse it.

use std::fmt;

/// Why a finished stream did not yield a well-formed array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// No JSON array with object elements was found in the output.
    NoArray,
    /// The output ended inside an element.
    Truncated,
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::NoArray => f.write_str("no JSON array found in output"),
            ScanError::Truncated => f.write_str("output ended in the middle of an element"),
        }
    }
}

impl std::error::Error for ScanError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Looking for the opening `[`. `depth` counts enclosing `{` so a wrapper
    /// object such as `{"batches": [` is walked into.
    Seeking { depth: usize },
    /// Inside the array, between elements.
    BetweenElements,
    /// Inside an element, at the given nesting depth.
    InElement { depth: usize },
    /// The array closed after yielding at least one element.
    Done,
}

/// Push-driven scanner over streamed text.
#[derive(Debug)]
pub struct ArrayElementScanner {
    state: State,
    in_string: bool,
    escape_next: bool,
    element: String,
    emitted: usize,
}

impl Default for ArrayElementScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl ArrayElementScanner {
    pub fn new() -> Self {
        Self {
            state: State::Seeking { depth: 0 },
            in_string: false,
            escape_next: false,
            element: String::new(),
            emitted: 0,
        }
    }

    /// Number of elements produced so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Feed the next chunk and return every element completed by it, in order.
    pub fn feed(&mut self, chunk: &str) -> Vec<String> {
        let mut completed = Vec::new();

        for ch in chunk.chars() {
            match self.state {
                State::Seeking { depth } => self.seek(ch, depth),
                State::BetweenElements => match ch {
                    '{' => {
                        self.element.push(ch);
                        self.state = State::InElement { depth: 1 };
                    }
                    ']' if self.emitted == 0 => {
                        // Empty or non-object array (e.g. `[1]` in prose): keep looking.
                        self.state = State::Seeking { depth: 0 };
                    }
                    ']' => self.state = State::Done,
                    _ => {}
                },
                State::InElement { depth } => {
                    self.element.push(ch);
                    if let Some(element) = self.advance_element(ch, depth) {
                        self.emitted += 1;
                        completed.push(element);
                    }
                }
                State::Done => break,
            }
        }

        completed
    }

    /// Signal end of output.
    pub fn finish(&self) -> Result<(), ScanError> {
        match self.state {
            State::InElement { .. } => Err(ScanError::Truncated),
            _ if self.emitted == 0 => Err(ScanError::NoArray),
            _ => Ok(()),
        }
    }

    fn seek(&mut self, ch: char, depth: usize) {
        // Outside any object, quotes are prose and carry no meaning.
        if depth > 0 && self.skip_string_char(ch) {
            return;
        }
        match ch {
            '"' if depth > 0 => self.in_string = true,
            '{' => self.state = State::Seeking { depth: depth + 1 },
            '}' => {
                self.state = State::Seeking {
                    depth: depth.saturating_sub(1),
                }
            }
            '[' => self.state = State::BetweenElements,
            _ => {}
        }
    }

    fn advance_element(&mut self, ch: char, depth: usize) -> Option<String> {
        if self.skip_string_char(ch) {
            return None;
        }
        match ch {
            '"' => self.in_string = true,
            '{' | '[' => self.state = State::InElement { depth: depth + 1 },
            '}' | ']' if depth == 1 => {
                self.state = State::BetweenElements;
                return Some(std::mem::take(&mut self.element));
            }
            '}' | ']' => self.state = State::InElement { depth: depth - 1 },
            _ => {}
        }
        None
    }

    /// Consume `ch` if it belongs to a string literal. Returns true when the
    /// character was part of (or closed) a string.
    fn skip_string_char(&mut self, ch: char) -> bool {
        if !self.in_string {
            return false;
        }
        if self.escape_next {
            self.escape_next = false;
        } else if ch == '\\' {
            self.escape_next = true;
        } else if ch == '"' {
            self.in_string = false;
        }
        true
    }
}
