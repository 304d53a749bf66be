//! Local line input and message output.

use std::io::{self, BufRead, Write};

use crate::message::Message;

/// Prefix written in front of every received message.
pub const RECEIVED_PREFIX: &str = "Received message: ";

/// A source of input lines.
///
/// Implemented for every [`BufRead`]. Lines keep their terminator; invalid
/// UTF-8 is replaced with `U+FFFD`.
pub trait LineSource: Send {
    /// Reads the next line. Returns `Ok(None)` at end of input.
    fn next_line(&mut self) -> io::Result<Option<String>>;
}

impl<R: BufRead + Send> LineSource for R {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut buf = Vec::new();
        match self.read_until(b'\n', &mut buf)? {
            0 => Ok(None),
            _ => Ok(Some(String::from_utf8_lossy(&buf).into_owned())),
        }
    }
}

/// Where received messages end up.
pub trait MessageSink: Send {
    /// Presents one message to the user.
    fn deliver(&mut self, message: &Message) -> io::Result<()>;
}

/// Writes `Received message: <text>` lines to any writer and flushes after each.
#[derive(Debug)]
pub struct Console<W> {
    out: W,
}

impl<W: Write> Console<W> {
    /// Wraps `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Returns a reference to the writer.
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Unwraps the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> MessageSink for Console<W> {
    fn deliver(&mut self, message: &Message) -> io::Result<()> {
        self.out.write_all(RECEIVED_PREFIX.as_bytes())?;
        self.out.write_all(message.as_bytes())?;
        if !message.as_str().ends_with('\n') {
            self.out.write_all(b"\n")?;
        }
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn lines_keep_terminators_then_none() {
        let mut source = Cursor::new("one\ntwo\r\nlast");

        assert_eq!(source.next_line().unwrap().as_deref(), Some("one\n"));
        assert_eq!(source.next_line().unwrap().as_deref(), Some("two\r\n"));
        assert_eq!(source.next_line().unwrap().as_deref(), Some("last"));
        assert_eq!(source.next_line().unwrap(), None);
        assert_eq!(source.next_line().unwrap(), None);
    }

    #[test]
    fn invalid_utf8_line_is_replaced() {
        let mut source = Cursor::new(vec![b'o', 0xfe, b'k', b'\n']);
        assert_eq!(source.next_line().unwrap().as_deref(), Some("o\u{fffd}k\n"));
    }

    #[test]
    fn console_prefixes_and_terminates() {
        let mut console = Console::new(Vec::new());

        console.deliver(&Message::new("hi\n")).unwrap();
        console.deliver(&Message::new("no newline")).unwrap();

        let out = String::from_utf8(console.into_inner()).unwrap();
        assert_eq!(out, "Received message: hi\nReceived message: no newline\n");
    }
}
