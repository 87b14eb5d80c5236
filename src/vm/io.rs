// Character IO: single-character output, line-buffered single-character input

use std::collections::VecDeque;
use std::io::{self, BufRead, Read, Write};

/// Where `out` writes and `in` reads
pub trait IoChannel {
    fn write_char(&mut self, code: u8) -> io::Result<()>;

    /// Next input character; `None` once input is exhausted
    fn read_char(&mut self) -> io::Result<Option<u8>>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Channel that pulls a whole line from its reader whenever the buffer runs dry
pub struct LineChannel<R, W> {
    input: R,
    output: W,
    pending: VecDeque<u8>,
}

pub type StdIo = LineChannel<StdinLines, io::Stdout>;

impl StdIo {
    pub fn stdio() -> Self {
        LineChannel::new(StdinLines::default(), io::stdout())
    }
}

/// Stdin reader that takes one line per refill, so the program and the debug
/// console can both read stdin without either buffering the other's lines
#[derive(Debug, Default)]
pub struct StdinLines {
    buf: Vec<u8>,
    pos: usize,
}

impl Read for StdinLines {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let n = available.len().min(out.len());
        out[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

impl BufRead for StdinLines {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.pos >= self.buf.len() {
            self.buf.clear();
            self.pos = 0;
            io::stdin().lock().read_until(b'\n', &mut self.buf)?;
        }
        Ok(&self.buf[self.pos..])
    }

    fn consume(&mut self, amt: usize) {
        self.pos = (self.pos + amt).min(self.buf.len());
    }
}

impl<R: BufRead, W: Write> LineChannel<R, W> {
    pub fn new(input: R, output: W) -> Self {
        LineChannel {
            input,
            output,
            pending: VecDeque::new(),
        }
    }

    pub fn into_parts(self) -> (R, W) {
        (self.input, self.output)
    }
}

impl<R: BufRead, W: Write> IoChannel for LineChannel<R, W> {
    fn write_char(&mut self, code: u8) -> io::Result<()> {
        self.output.write_all(&[code])?;
        if code == b'\n' {
            self.output.flush()?;
        }
        Ok(())
    }

    fn read_char(&mut self) -> io::Result<Option<u8>> {
        if self.pending.is_empty() {
            // Whatever is waiting for input should be visible first
            self.output.flush()?;
            let mut line = Vec::new();
            if self.input.read_until(b'\n', &mut line)? == 0 {
                return Ok(None);
            }
            self.pending.extend(line);
        }
        Ok(self.pending.pop_front())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.output.flush()
    }
}

/// In-memory channel: scripted input, captured output
#[derive(Debug, Default)]
pub struct BufferedIo {
    pub input: VecDeque<u8>,
    pub output: Vec<u8>,
}

impl BufferedIo {
    pub fn with_input(input: &str) -> Self {
        BufferedIo {
            input: input.bytes().collect(),
            output: Vec::new(),
        }
    }

    pub fn output_string(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

impl IoChannel for BufferedIo {
    fn write_char(&mut self, code: u8) -> io::Result<()> {
        self.output.push(code);
        Ok(())
    }

    fn read_char(&mut self) -> io::Result<Option<u8>> {
        Ok(self.input.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_line_channel_reads_line_by_line() {
        let mut chan = LineChannel::new(Cursor::new("go\nn\n"), Vec::new());
        let mut read = Vec::new();
        while let Some(c) = chan.read_char().unwrap() {
            read.push(c);
        }
        assert_eq!(read, b"go\nn\n");
        assert_eq!(chan.read_char().unwrap(), None);
    }

    #[test]
    fn test_line_channel_writes() {
        let mut chan = LineChannel::new(Cursor::new(""), Vec::new());
        for c in b"hi\n" {
            chan.write_char(*c).unwrap();
        }
        let (_, out) = chan.into_parts();
        assert_eq!(out, b"hi\n");
    }

    #[test]
    fn test_buffered_io() {
        let mut io = BufferedIo::with_input("a");
        assert_eq!(io.read_char().unwrap(), Some(b'a'));
        assert_eq!(io.read_char().unwrap(), None);
        io.write_char(b'Z').unwrap();
        assert_eq!(io.output_string(), "Z");
    }
}
