//! External peer channel
//!
//! The peer is a newline-delimited stream of decimal numbers. Reads are
//! blocking; a read returning `Ok(None)` means the stream reached EOF.

use crate::{Error, Result};
use std::collections::VecDeque;
use std::io::{BufRead, Write};
use tracing::trace;

/// Blocking source of values from the external peer
pub trait PeerReader: Send {
    /// Read the next value. `Ok(None)` on end of stream.
    fn read_value(&mut self) -> Result<Option<f64>>;
}

/// Sink of values towards the external peer
pub trait PeerWriter: Send {
    /// Write one value followed by a newline
    fn write_value(&mut self, value: f64) -> Result<()>;
}

/// Format a value the way it is written to the peer (`2.0`, `3.14`, `-0.5`)
pub fn format_value(value: f64) -> String {
    format!("{:?}", value)
}

/// Reads whitespace-separated numbers from a buffered reader
///
/// Several numbers on one line are returned one per call; blank lines are
/// skipped.
pub struct LinePeerReader<R> {
    reader: R,
    pending: VecDeque<String>,
    prompt: Option<(String, Box<dyn Write + Send>)>,
}

impl<R: BufRead + Send> LinePeerReader<R> {
    /// Create a reader over `reader`
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: VecDeque::new(),
            prompt: None,
        }
    }

    /// Write `prompt` to `out` every time a new line is about to be read
    pub fn with_prompt(mut self, prompt: impl Into<String>, out: impl Write + Send + 'static) -> Self {
        self.prompt = Some((prompt.into(), Box::new(out)));
        self
    }

    fn show_prompt(&mut self) -> Result<()> {
        if let Some((prompt, out)) = self.prompt.as_mut() {
            out.write_all(prompt.as_bytes())?;
            out.flush()?;
        }
        Ok(())
    }
}

impl<R: BufRead + Send> PeerReader for LinePeerReader<R> {
    fn read_value(&mut self) -> Result<Option<f64>> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                trace!("Peer token: {}", token);
                return token
                    .parse::<f64>()
                    .map(Some)
                    .map_err(|_| Error::Parse { token });
            }

            self.show_prompt()?;
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.pending
                .extend(line.split_whitespace().map(ToString::to_string));
        }
    }
}

/// Writes `<prefix><value>\n` to any writer, flushing after each value
pub struct LinePeerWriter<W> {
    writer: W,
    prefix: String,
}

impl<W: Write + Send> LinePeerWriter<W> {
    /// Create a writer with no prefix
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            prefix: String::new(),
        }
    }

    /// Set the text written in front of every value
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Consume the writer and return the inner sink
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> PeerWriter for LinePeerWriter<W> {
    fn write_value(&mut self, value: f64) -> Result<()> {
        writeln!(self.writer, "{}{}", self.prefix, format_value(value))?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_values_across_lines() {
        let mut reader = LinePeerReader::new(Cursor::new("1.5\n\n  2 -3.25\n4e2\n"));
        assert_eq!(reader.read_value().unwrap(), Some(1.5));
        assert_eq!(reader.read_value().unwrap(), Some(2.0));
        assert_eq!(reader.read_value().unwrap(), Some(-3.25));
        assert_eq!(reader.read_value().unwrap(), Some(400.0));
        assert_eq!(reader.read_value().unwrap(), None);
    }

    #[test]
    fn test_rejects_non_numeric_token() {
        let mut reader = LinePeerReader::new(Cursor::new("1.0 abc\n"));
        assert_eq!(reader.read_value().unwrap(), Some(1.0));
        match reader.read_value() {
            Err(Error::Parse { token }) => assert_eq!(token, "abc"),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_prompt_written_per_line() {
        let out = SharedBuf::default();
        let mut reader =
            LinePeerReader::new(Cursor::new("1 2\n3\n")).with_prompt("> ", out.clone());
        for _ in 0..3 {
            reader.read_value().unwrap();
        }
        assert_eq!(out.contents(), "> > ");
    }

    #[test]
    fn test_writer_formats_values() {
        let mut writer = LinePeerWriter::new(Vec::new());
        writer.write_value(2.0).unwrap();
        writer.write_value(3.14).unwrap();
        let mut prefixed = LinePeerWriter::new(Vec::new()).with_prefix("Output to other: ");
        prefixed.write_value(-0.5).unwrap();

        assert_eq!(String::from_utf8(writer.into_inner()).unwrap(), "2.0\n3.14\n");
        assert_eq!(
            String::from_utf8(prefixed.into_inner()).unwrap(),
            "Output to other: -0.5\n"
        );
    }

    #[derive(Clone, Default)]
    struct SharedBuf(std::sync::Arc<parking_lot::Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
