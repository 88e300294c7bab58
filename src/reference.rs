//! Reference sequences and the chromosome code table.
//!
//! A [`Reference`] stores the sequences of a multi-FASTA file together with their names in file order.
//! It is read-only after construction and shared by reference between the compressor and the reconstructor.
//!
//! A [`ChromosomeCodes`] table assigns each chromosome a fixed-width code.
//! The table is never stored in the compressed stream.
//! It is rebuilt from the same reference at decompression time, which makes the construction deterministic by necessity.

use crate::{ReadzipError, Result};
use crate::bitstream::{BitReader, BitWriter};
use crate::utils;

use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::Path;

use log::{debug, warn};
use simple_sds::bits;

//-----------------------------------------------------------------------------

/// Reference sequences indexed by chromosome name.
///
/// # Examples
///
/// ```
/// use readzip::Reference;
///
/// let fasta = b">chr2 second\nGATT\nACA\n>chr1\nacgt\n";
/// let reference = Reference::from_reader(&fasta[..]).unwrap();
/// assert_eq!(reference.names(), &["chr2", "chr1"]);
/// assert_eq!(reference.sequence("chr2"), Some(&b"GATTACA"[..]));
/// assert_eq!(reference.sequence("chr1"), Some(&b"ACGT"[..]));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reference {
    names: Vec<String>,
    sequences: HashMap<String, Vec<u8>>,
}

impl Reference {
    /// Loads the reference from a multi-FASTA file, which may be gzip-compressed.
    pub fn load<P: AsRef<Path>>(filename: P) -> Result<Self> {
        let reader = utils::open_file(&filename)?;
        let reference = Self::from_reader(reader)?;
        debug!("Loaded {} reference sequences from {}", reference.len(), filename.as_ref().display());
        Ok(reference)
    }

    /// Parses a multi-FASTA file from the reader.
    ///
    /// The name of a sequence ends at the first whitespace character in the header line.
    /// Sequence lines are concatenated and converted to upper case.
    /// Returns an error if a sequence line precedes the first header, a name is empty, or a name occurs twice.
    pub fn from_reader<R: BufRead>(mut reader: R) -> Result<Self> {
        let mut result = Reference::default();
        let mut current: Option<(String, Vec<u8>)> = None;
        let mut line_num = 0;
        let mut buf: Vec<u8> = Vec::new();
        loop {
            buf.clear();
            let len = reader.read_until(b'\n', &mut buf)?;
            if len == 0 {
                break;
            }
            line_num += 1;
            while buf.last().map_or(false, |c| c.is_ascii_whitespace()) {
                buf.pop();
            }
            if buf.is_empty() {
                continue;
            }
            if buf[0] == b'>' {
                if let Some((name, sequence)) = current.take() {
                    result.insert(name, sequence)?;
                }
                let header = &buf[1..];
                let end = header.iter().position(|c| c.is_ascii_whitespace()).unwrap_or(header.len());
                if end == 0 {
                    return Err(ReadzipError::Data(format!("Empty sequence name on FASTA line {}", line_num)));
                }
                let name = String::from_utf8(header[..end].to_vec()).map_err(|err| {
                    ReadzipError::Data(format!("Invalid sequence name on FASTA line {}: {}", line_num, err))
                })?;
                current = Some((name, Vec::new()));
            } else {
                match current.as_mut() {
                    Some((_, sequence)) => sequence.extend(buf.iter().map(|c| c.to_ascii_uppercase())),
                    None => return Err(ReadzipError::Data(format!("FASTA line {} is not preceded by a header", line_num))),
                }
            }
        }
        if let Some((name, sequence)) = current.take() {
            result.insert(name, sequence)?;
        }
        Ok(result)
    }

    /// Builds a reference from (name, sequence) pairs.
    ///
    /// The sequences are used as given.
    /// Returns an error if a name occurs twice.
    pub fn from_sequences<I, S, T>(sequences: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<Vec<u8>>,
    {
        let mut result = Reference::default();
        for (name, sequence) in sequences {
            result.insert(name.into(), sequence.into())?;
        }
        Ok(result)
    }

    fn insert(&mut self, name: String, sequence: Vec<u8>) -> Result<()> {
        if self.sequences.contains_key(&name) {
            return Err(ReadzipError::Data(format!("Duplicate reference sequence name: {}", name)));
        }
        self.names.push(name.clone());
        self.sequences.insert(name, sequence);
        Ok(())
    }

    /// Returns the number of sequences.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if there are no sequences.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the sequence names in file order.
    #[inline]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns the sequence with the given name.
    pub fn sequence(&self, name: &str) -> Option<&[u8]> {
        self.sequences.get(name).map(|x| x.as_slice())
    }
}

//-----------------------------------------------------------------------------

/// A deterministic mapping from chromosome names to fixed-width codes.
///
/// The names are sorted lexicographically and assigned codes `0..n` in that order.
/// Code `n` is reserved for the unaligned sentinel [`ChromosomeCodes::SENTINEL_NAME`].
/// Codes are stored using `ceil(log2(n + 1))` bits.
///
/// # Examples
///
/// ```
/// use readzip::ChromosomeCodes;
///
/// let codes = ChromosomeCodes::from_names(["chr2", "chr10", "chr1"]);
/// assert_eq!(codes.len(), 3);
/// assert_eq!(codes.code("chr1"), Some(0));
/// assert_eq!(codes.code("chr10"), Some(1));
/// assert_eq!(codes.code("chr2"), Some(2));
/// assert_eq!(codes.code("*"), Some(3));
/// assert_eq!(codes.sentinel(), 3);
/// assert_eq!(codes.width(), 2);
/// assert_eq!(codes.name(1), Some("chr10"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChromosomeCodes {
    // Sorted names; the code is the index.
    names: Vec<String>,
    codes: HashMap<String, u64>,
    width: usize,
}

impl ChromosomeCodes {
    /// Name used for the chromosome of unaligned reads.
    pub const SENTINEL_NAME: &'static str = "*";

    /// Builds the code table from the sequence names in the reference.
    pub fn new(reference: &Reference) -> Self {
        Self::from_names(reference.names())
    }

    /// Builds the code table from the given names.
    ///
    /// Duplicate names are collapsed.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<String> = names.into_iter().map(|name| String::from(name.as_ref())).collect();
        let original_len = names.len();
        names.sort_unstable();
        names.dedup();
        if names.len() < original_len {
            warn!("Collapsed {} duplicate chromosome names", original_len - names.len());
        }

        let codes: HashMap<String, u64> = names.iter().enumerate().map(|(code, name)| {
            (name.clone(), code as u64)
        }).collect();
        let width = if names.is_empty() { 0 } else { bits::bit_len(names.len() as u64) };
        debug!("Chromosome code table: {} names, {}-bit codes", names.len(), width);

        ChromosomeCodes { names, codes, width }
    }

    /// Returns the number of chromosomes, excluding the sentinel.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if there are no chromosomes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the width of a code in bits.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the code reserved for unaligned reads.
    #[inline]
    pub fn sentinel(&self) -> u64 {
        self.names.len() as u64
    }

    /// Returns the code for the chromosome, or [`None`] if there is no such chromosome.
    ///
    /// The sentinel name maps to the sentinel code.
    pub fn code(&self, name: &str) -> Option<u64> {
        if name == Self::SENTINEL_NAME {
            return Some(self.sentinel());
        }
        self.codes.get(name).copied()
    }

    /// Returns the chromosome name for the code, or [`None`] if the code is out of range.
    ///
    /// The sentinel code maps to the sentinel name.
    pub fn name(&self, code: u64) -> Option<&str> {
        if code == self.sentinel() {
            return Some(Self::SENTINEL_NAME);
        }
        self.names.get(code as usize).map(|x| x.as_str())
    }

    /// Returns the code for the chromosome or a data error if there is no such chromosome.
    pub fn require_code(&self, name: &str) -> Result<u64> {
        self.code(name).ok_or_else(|| ReadzipError::Data(format!("Unknown chromosome: {}", name)))
    }

    /// Writes the code as a fixed-width field.
    pub fn write_code<W: Write>(&self, writer: &mut BitWriter<W>, code: u64) -> Result<()> {
        writer.write_int(code, self.width)
    }

    /// Reads a code and returns the corresponding chromosome name.
    ///
    /// Returns [`None`] if the stream ends in the middle of the code.
    /// Returns an error if the code is out of range.
    pub fn read_code<R: BufRead>(&self, reader: &mut BitReader<R>) -> Result<Option<(u64, &str)>> {
        let code = match reader.read_int(self.width)? {
            Some(code) => code,
            None => return Ok(None),
        };
        let name = self.name(code).ok_or_else(|| {
            ReadzipError::Format(format!("Invalid chromosome code {} with {} chromosomes", code, self.len()))
        })?;
        Ok(Some((code, name)))
    }
}

//-----------------------------------------------------------------------------


//-----------------------------------------------------------------------------
