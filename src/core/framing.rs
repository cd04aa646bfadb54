//! Newline framing for device byte streams.
//!
//! Each device owns one [`LineFramer`]. Raw reads are appended with
//! [`LineFramer::push`] and complete lines are pulled out with
//! [`LineFramer::extract`]. A line is everything before a `\n`, minus one
//! trailing `\r`; empty lines are dropped. When the unterminated remainder grows
//! past the ceiling it is discarded wholesale, since the partial message is never
//! going to complete.

use std::fmt;

/// Default buffer ceiling in bytes
pub const DEFAULT_BUFFER_CEILING: usize = 2048;

/// One extracted line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramedMessage(String);

impl FramedMessage {
    fn from_bytes(bytes: &[u8]) -> Self {
        Self(String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for FramedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Output of one extraction pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramerEvent {
    Message(FramedMessage),
    /// The residual buffer exceeded the ceiling and was cleared
    Overflow { discarded: usize },
}

/// Per-device line accumulator
#[derive(Debug)]
pub struct LineFramer {
    buffer: Vec<u8>,
    ceiling: usize,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::with_ceiling(DEFAULT_BUFFER_CEILING)
    }

    pub fn with_ceiling(ceiling: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(ceiling.min(DEFAULT_BUFFER_CEILING)),
            ceiling,
        }
    }

    /// Append raw bytes read from the device
    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Lazily drain every complete line currently buffered.
    ///
    /// The ceiling check runs once the iterator reaches the incomplete
    /// remainder. Dropping the iterator early leaves the unread lines buffered.
    pub fn extract(&mut self) -> Extract<'_> {
        Extract {
            framer: self,
            checked: false,
        }
    }

    /// Convenience for `push` followed by a full `extract`
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<FramerEvent> {
        self.push(bytes);
        self.extract().collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn next_line(&mut self) -> Option<Option<FramedMessage>> {
        let pos = self.buffer.iter().position(|&b| b == b'\n')?;

        let mut line = &self.buffer[..pos];
        if let Some((&b'\r', rest)) = line.split_last() {
            line = rest;
        }
        let message = if line.is_empty() {
            None
        } else {
            Some(FramedMessage::from_bytes(line))
        };

        self.buffer.drain(..=pos);
        Some(message)
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator returned by [`LineFramer::extract`]
pub struct Extract<'a> {
    framer: &'a mut LineFramer,
    checked: bool,
}

impl Iterator for Extract<'_> {
    type Item = FramerEvent;

    fn next(&mut self) -> Option<Self::Item> {
        if self.checked {
            return None;
        }

        while let Some(line) = self.framer.next_line() {
            if let Some(message) = line {
                return Some(FramerEvent::Message(message));
            }
        }

        self.checked = true;
        if self.framer.buffer.len() > self.framer.ceiling {
            let discarded = self.framer.buffer.len();
            self.framer.buffer.clear();
            return Some(FramerEvent::Overflow { discarded });
        }
        None
    }
}
