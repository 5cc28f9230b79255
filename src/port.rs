//! Interactive I/O for the Input and Output instructions.
//!
//! The CPU never touches stdin/stdout directly; it talks to a [`Port`].
//! [`StdioPort`] implements the console protocol over any buffered reader
//! and writer, so tests can drive it from memory.

use std::io::{self, BufRead, Write};

/// Prompt printed before every input attempt.
pub const INPUT_PROMPT: &str = "IN: ";

/// Label printed before every output value.
pub const OUTPUT_LABEL: &str = "OUT: ";

/// Source of input values and sink for output values.
pub trait Port {
    /// Block until a value is available.
    ///
    /// Returns `Ok(None)` once input is exhausted.
    fn input(&mut self) -> io::Result<Option<i8>>;

    /// Emit a value.
    fn output(&mut self, value: i8) -> io::Result<()>;
}

/// Line-oriented console port.
///
/// Input is one signed decimal per line. Lines that do not parse, or whose
/// value does not fit in -128..=127, are skipped and the prompt is repeated.
pub struct StdioPort<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> StdioPort<R, W> {
    /// Create a port over a reader and writer.
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Take back the reader and writer.
    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

impl StdioPort<io::StdinLock<'static>, io::Stdout> {
    /// A port bound to the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Port for StdioPort<R, W> {
    fn input(&mut self) -> io::Result<Option<i8>> {
        let mut buf = Vec::new();
        loop {
            write!(self.writer, "{}", INPUT_PROMPT)?;
            self.writer.flush()?;

            buf.clear();
            if self.reader.read_until(b'\n', &mut buf)? == 0 {
                return Ok(None);
            }

            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line.trim(),
                Err(_) => {
                    log::debug!("input is not valid UTF-8");
                    continue;
                }
            };

            match line.parse::<i64>() {
                Ok(value) => match i8::try_from(value) {
                    Ok(value) => return Ok(Some(value)),
                    Err(_) => log::debug!("input {} out of range", value),
                },
                Err(_) => log::debug!("malformed input {:?}", line),
            }
        }
    }

    fn output(&mut self, value: i8) -> io::Result<()> {
        writeln!(self.writer, "{}{}", OUTPUT_LABEL, value)?;
        self.writer.flush()
    }
}
