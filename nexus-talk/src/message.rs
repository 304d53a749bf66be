//! The text message moved through the pipeline.

use core::fmt;

/// Line that ends a session: `!` followed by a line terminator.
pub const SENTINEL: &str = "!\n";

/// One line of text, as typed locally or as received from the peer.
///
/// The text is kept as-is, line terminator included, so what the peer
/// prints is exactly what was typed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message {
    text: String,
}

impl Message {
    /// Wraps `text` without modification.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Builds a message from a received datagram. Invalid UTF-8 is replaced
    /// with `U+FFFD`.
    pub fn from_datagram(bytes: &[u8]) -> Self {
        Self::new(String::from_utf8_lossy(bytes).into_owned())
    }

    /// The session-ending message.
    pub fn sentinel() -> Self {
        Self::new(SENTINEL)
    }

    /// Returns `true` if this message is exactly `!` plus a line terminator.
    ///
    /// `!` without a terminator, or followed by anything else, is ordinary text.
    pub fn is_sentinel(&self) -> bool {
        matches!(self.text.as_str(), "!\n" | "!\r\n")
    }

    /// Returns the text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns the wire representation.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// Returns the length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Returns `true` if the text is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Unwraps the text.
    pub fn into_string(self) -> String {
        self.text
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
