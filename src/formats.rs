//! Support for reading and writing text files.
//!
//! ### Alignment text format (reading and writing)
//!
//! The input of the compressor is a tab-separated text file with one [`Alignment`] per line.
//! See [`crate::alignment`] for the fields.
//!
//! * [`AlignmentReader`]: Iterate over the alignments in a file.
//! * [`write_alignment`]: Write an alignment line.
//!
//! ### Reads (writing)
//!
//! Decompressed reads are written in a FASTA-like format with two lines per read.
//!
//! * [`write_read`]: Write a `>name` line and a sequence line.

use crate::{Alignment, ReadzipError, Result};
use crate::utils;

use std::io::{BufRead, Write};
use std::path::Path;


//-----------------------------------------------------------------------------

/// An iterator over the alignments in the alignment text format.
///
/// Empty lines are skipped.
/// Parse errors are reported with the line number.
///
/// # Examples
///
/// ```
/// use readzip::formats::AlignmentReader;
///
/// let input = b"r1\tchr1\t1\t5\t0\tF\t2 C\n\nr2\t*\t0\t0\t0\tF\t1 a\n";
/// let mut reader = AlignmentReader::new(&input[..]);
/// assert_eq!(reader.next().unwrap().unwrap().name, "r1");
/// assert_eq!(reader.next().unwrap().unwrap().name, "r2");
/// assert!(reader.next().is_none());
/// assert_eq!(reader.line_num(), 3);
/// ```
pub struct AlignmentReader<R: BufRead> {
    inner: R,
    buf: Vec<u8>,
    line_num: usize,
    failed: bool,
}

impl AlignmentReader<Box<dyn BufRead>> {
    /// Opens the file, which may be gzip-compressed.
    pub fn open<P: AsRef<Path>>(filename: P) -> Result<Self> {
        let inner = utils::open_file(filename)?;
        Ok(Self::new(inner))
    }
}

impl<R: BufRead> AlignmentReader<R> {
    /// Creates a new reader.
    pub fn new(inner: R) -> Self {
        AlignmentReader {
            inner,
            buf: Vec::new(),
            line_num: 0,
            failed: false,
        }
    }

    /// Returns the number of lines read so far.
    #[inline]
    pub fn line_num(&self) -> usize {
        self.line_num
    }

    fn read_alignment(&mut self) -> Result<Option<Alignment>> {
        loop {
            self.buf.clear();
            let len = self.inner.read_until(b'\n', &mut self.buf)?;
            if len == 0 {
                return Ok(None);
            }
            self.line_num += 1;
            if self.buf.iter().all(|c| c.is_ascii_whitespace()) {
                continue;
            }
            return Alignment::from_line(&self.buf).map(Some).map_err(|err| match err {
                ReadzipError::Data(message) => ReadzipError::Data(format!("Line {}: {}", self.line_num, message)),
                err => err,
            });
        }
    }
}

impl<R: BufRead> Iterator for AlignmentReader<R> {
    type Item = Result<Alignment>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let result = self.read_alignment();
        if result.is_err() {
            self.failed = true;
        }
        result.transpose()
    }
}

//-----------------------------------------------------------------------------

/// Writes the alignment as a line in the alignment text format.
pub fn write_alignment<W: Write>(alignment: &Alignment, output: &mut W) -> Result<()> {
    writeln!(output, "{}", alignment.to_line())?;
    Ok(())
}

/// Writes a read as a `>name` line followed by a sequence line.
pub fn write_read<W: Write>(name: &str, sequence: &[u8], output: &mut W) -> Result<()> {
    output.write_all(b">")?;
    output.write_all(name.as_bytes())?;
    output.write_all(b"\n")?;
    output.write_all(sequence)?;
    output.write_all(b"\n")?;
    Ok(())
}

//-----------------------------------------------------------------------------
