//! Aligned reads and sequence reconstruction.
//!
//! An [`Alignment`] describes a read as a window of a reference chromosome together with a list of [`Edit`] operations.
//! The read can be rebuilt from the reference with [`Alignment::reconstruct`].
//!
//! Reads the aligner could not place are stored with chromosome [`Alignment::UNALIGNED`] and an edit list that inserts every base of the read.
//! See [`Alignment::unaligned`].
//!
//! ### Alignment text format
//!
//! Alignments can be read from and written to a tab-separated text format with one alignment per line:
//!
//! 1. read name
//! 2. chromosome name, or `*` for unaligned reads
//! 3. start offset (1-based; `0` for unaligned reads)
//! 4. end offset, with `end - start` being the length of the reference window
//! 5. alignment score (ignored)
//! 6. strand (`F` or `+` for forward, `R` or `-` for reverse)
//! 7. edits as space-separated `position symbol` pairs (optional), with positions as offsets in the reference window
//!
//! See [`EditTag`] for the edit symbols.

use crate::{ReadzipError, Reference, Result};
use crate::utils;

use std::fmt::Display;
use std::str;

pub mod edit;

pub use edit::{Edit, EditTag};


//-----------------------------------------------------------------------------

/// Strand of the reference an alignment is on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Strand {
    /// The read matches the reference as is.
    #[default]
    Forward,
    /// The read is the reverse complement of the reference window.
    Reverse,
}

impl Strand {
    /// Returns the wire bit for the strand: `true` for forward, `false` for reverse.
    #[inline]
    pub fn to_bit(self) -> bool {
        self == Strand::Forward
    }

    /// Returns the strand encoded by the wire bit.
    #[inline]
    pub fn from_bit(bit: bool) -> Self {
        if bit { Strand::Forward } else { Strand::Reverse }
    }

    /// Returns the text symbol for the strand.
    pub fn symbol(self) -> u8 {
        match self {
            Strand::Forward => b'F',
            Strand::Reverse => b'R',
        }
    }

    /// Parses a text symbol, or returns [`None`] if the symbol is not recognized.
    pub fn from_symbol(symbol: u8) -> Option<Self> {
        match symbol {
            b'F' | b'+' => Some(Strand::Forward),
            b'R' | b'-' => Some(Strand::Reverse),
            _ => None,
        }
    }
}

impl Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol() as char)
    }
}

//-----------------------------------------------------------------------------

/// A read aligned to a window of a reference chromosome.
///
/// # Examples
///
/// ```
/// use readzip::{Alignment, Edit, EditTag, Reference, Strand};
///
/// let reference = Reference::from_sequences([("chr1", "ACGTACGT")]).unwrap();
/// let alignment = Alignment {
///     name: String::from("read"),
///     strand: Strand::Forward,
///     length: 8,
///     chromosome: String::from("chr1"),
///     start: 1,
///     edits: vec![Edit::new(3, EditTag::MismatchG)],
/// };
/// assert_eq!(alignment.reconstruct(&reference).unwrap(), b"ACGGACGT".to_vec());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alignment {
    /// Name of the read.
    pub name: String,
    /// Strand the read was aligned to.
    pub strand: Strand,
    /// Length of the reference window.
    pub length: usize,
    /// Chromosome name, or [`Alignment::UNALIGNED`].
    pub chromosome: String,
    /// Start of the reference window (1-based), or `0` for unaligned reads.
    pub start: usize,
    /// Edits relative to the reference window in increasing order of position.
    pub edits: Vec<Edit>,
}

impl Alignment {
    /// Chromosome name used for unaligned reads.
    pub const UNALIGNED: &'static str = "*";

    /// Creates an unaligned record for the given read sequence.
    ///
    /// The record inserts every base of the read, so that the read can be rebuilt without the reference.
    /// Lower case bases are converted to upper case.
    /// Returns an error if the read contains a symbol other than `ACGTN`.
    pub fn unaligned(name: &str, sequence: &[u8]) -> Result<Self> {
        let mut edits = Vec::with_capacity(sequence.len());
        for (i, base) in sequence.iter().enumerate() {
            let tag = EditTag::insertion(base.to_ascii_uppercase()).ok_or_else(|| {
                ReadzipError::Data(format!("Invalid base {} in read {}", *base as char, name))
            })?;
            edits.push(Edit::new(i, tag));
        }
        Ok(Alignment {
            name: String::from(name),
            strand: Strand::Forward,
            length: 0,
            chromosome: String::from(Self::UNALIGNED),
            start: 0,
            edits,
        })
    }

    /// Returns `true` if the read is not aligned to a reference window.
    ///
    /// This is the case when the chromosome is [`Alignment::UNALIGNED`] or the window is empty.
    #[inline]
    pub fn is_unaligned(&self) -> bool {
        self.chromosome == Self::UNALIGNED || self.length == 0
    }

    /// Returns the end of the reference window (exclusive, 1-based).
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

//-----------------------------------------------------------------------------

// Sequence reconstruction.

impl Alignment {
    /// Rebuilds the read sequence from the reference.
    ///
    /// Takes the reference window, applies the edits, and reverse-complements the result for reads on the reverse strand.
    /// Unaligned reads are built from their edits alone.
    ///
    /// Returns an error if the chromosome is not in the reference, the window does not fit in the chromosome, an edit is outside the window or out of order, or the result cannot be complemented.
    pub fn reconstruct(&self, reference: &Reference) -> Result<Vec<u8>> {
        let mut result = if self.is_unaligned() {
            self.apply_to_empty()?
        } else {
            let sequence = reference.sequence(&self.chromosome).ok_or_else(|| {
                ReadzipError::Data(format!("Unknown chromosome {} for read {}", self.chromosome, self.name))
            })?;
            let window = self.window(sequence)?;
            self.apply_to_window(window)?
        };
        if self.strand == Strand::Reverse {
            utils::reverse_complement_in_place(&mut result)?;
        }
        Ok(result)
    }

    // Returns the reference window for an aligned read.
    fn window<'a>(&self, sequence: &'a [u8]) -> Result<&'a [u8]> {
        if self.start == 0 {
            return Err(ReadzipError::Data(format!("Aligned read {} starts at offset 0", self.name)));
        }
        let end = (self.start - 1).checked_add(self.length).filter(|end| *end <= sequence.len());
        match end {
            Some(end) => Ok(&sequence[self.start - 1..end]),
            None => Err(ReadzipError::Data(format!(
                "Window {}..{} of read {} exceeds chromosome {} of length {}",
                self.start, self.start.saturating_add(self.length), self.name, self.chromosome, sequence.len()
            ))),
        }
    }

    // Unaligned reads: every base-introducing edit appends its base.
    fn apply_to_empty(&self) -> Result<Vec<u8>> {
        let mut result = Vec::with_capacity(self.edits.len());
        for edit in self.edits.iter() {
            match edit.tag.base() {
                Some(base) => result.push(base),
                None => return Err(ReadzipError::Data(format!("Deletion in unaligned read {}", self.name))),
            }
        }
        Ok(result)
    }

    // Merges the window with the edits.
    // An edit at position `i` applies to window offset `i`, or inserts before it.
    // The cursor is the first window offset not yet consumed.
    fn apply_to_window(&self, window: &[u8]) -> Result<Vec<u8>> {
        let mut result = Vec::with_capacity(window.len() + self.edits.len());
        let mut cursor = 0;
        for edit in self.edits.iter() {
            let target = edit.pos;
            if target < cursor {
                return Err(ReadzipError::Data(format!(
                    "Edit {}{} is out of order in read {}", edit.pos, edit.tag, self.name
                )));
            }
            if target > window.len() || (target == window.len() && !edit.tag.is_insertion()) {
                return Err(ReadzipError::Data(format!(
                    "Edit {}{} is outside the window of length {} in read {}", edit.pos, edit.tag, window.len(), self.name
                )));
            }
            result.extend_from_slice(&window[cursor..target]);
            cursor = target;
            match edit.tag.base() {
                Some(base) => {
                    result.push(base);
                    if edit.tag.is_mismatch() {
                        cursor += 1;
                    }
                },
                None => cursor += 1,
            }
        }
        result.extend_from_slice(&window[cursor..]);
        Ok(result)
    }
}

//-----------------------------------------------------------------------------

// Alignment text format.

impl Alignment {
    // Number of mandatory fields in a line.
    const MANDATORY_FIELDS: usize = 6;

    // Parses a string field.
    fn parse_string(field: &[u8], field_name: &str) -> Result<String> {
        String::from_utf8(field.to_vec()).map_err(|err| {
            ReadzipError::Data(format!("Invalid {}: {}", field_name, err))
        })
    }

    // Parses an unsigned integer field.
    fn parse_usize(field: &[u8], field_name: &str) -> Result<usize> {
        let number = str::from_utf8(field).map_err(|err| {
            ReadzipError::Data(format!("Invalid {}: {}", field_name, err))
        })?;
        number.parse().map_err(|err| {
            ReadzipError::Data(format!("Invalid {} {}: {}", field_name, number, err))
        })
    }

    // Parses a strand field.
    fn parse_strand(field: &[u8]) -> Result<Strand> {
        if field.len() != 1 {
            return Err(ReadzipError::Data(format!("Invalid strand: {}", String::from_utf8_lossy(field))));
        }
        Strand::from_symbol(field[0]).ok_or_else(|| {
            ReadzipError::Data(format!("Invalid strand: {}", field[0] as char))
        })
    }

    // Parses space-separated position-symbol pairs.
    fn parse_edits(field: &[u8]) -> Result<Vec<Edit>> {
        let tokens: Vec<&[u8]> = field.split(|c| *c == b' ').filter(|x| !x.is_empty()).collect();
        if tokens.len() % 2 != 0 {
            return Err(ReadzipError::Data(format!("Odd number of tokens in edits: {}", String::from_utf8_lossy(field))));
        }
        let mut result = Vec::with_capacity(tokens.len() / 2);
        for pair in tokens.chunks_exact(2) {
            let pos = Self::parse_usize(pair[0], "edit position")?;
            let tag = if pair[1].len() == 1 { EditTag::from_symbol(pair[1][0]) } else { None };
            let tag = tag.ok_or_else(|| {
                ReadzipError::Data(format!("Invalid edit symbol: {}", String::from_utf8_lossy(pair[1])))
            })?;
            if result.last().map_or(false, |prev: &Edit| prev.pos > pos) {
                return Err(ReadzipError::Data(format!("Invalid edit position: {}", pos)));
            }
            result.push(Edit::new(pos, tag));
        }
        Ok(result)
    }

    /// Parses an alignment from a line in the alignment text format.
    ///
    /// The line may end with an endline character, which is ignored.
    /// Fields beyond the seventh are ignored.
    /// Returns an error if the line cannot be parsed.
    ///
    /// # Examples
    ///
    /// ```
    /// use readzip::{Alignment, Edit, EditTag, Strand};
    ///
    /// let alignment = Alignment::from_line(b"read1\tchr2\t11\t19\t0\tR\t3 G 5 a\n").unwrap();
    /// assert_eq!(alignment.name, "read1");
    /// assert_eq!(alignment.chromosome, "chr2");
    /// assert_eq!(alignment.start, 11);
    /// assert_eq!(alignment.length, 8);
    /// assert_eq!(alignment.strand, Strand::Reverse);
    /// assert_eq!(alignment.edits, vec![Edit::new(3, EditTag::MismatchG), Edit::new(5, EditTag::InsertionA)]);
    /// assert_eq!(alignment.to_line(), "read1\tchr2\t11\t19\t0\tR\t3 G 5 a");
    /// ```
    pub fn from_line(line: &[u8]) -> Result<Self> {
        let mut line = line;
        while let Some(c) = line.last() {
            if *c == b'\n' || *c == b'\r' {
                line = &line[..line.len() - 1];
            } else {
                break;
            }
        }

        let fields: Vec<&[u8]> = line.split(|c| *c == b'\t').collect();
        if fields.len() < Self::MANDATORY_FIELDS {
            let line = String::from_utf8_lossy(line);
            return Err(ReadzipError::Data(format!("Line with fewer than {} fields: {}", Self::MANDATORY_FIELDS, line)));
        }

        let name = Self::parse_string(fields[0], "read name")?;
        let chromosome = Self::parse_string(fields[1], "chromosome name")?;
        let start = Self::parse_usize(fields[2], "start offset")?;
        let end = Self::parse_usize(fields[3], "end offset")?;
        if end < start {
            return Err(ReadzipError::Data(format!("End offset {} is before start offset {}", end, start)));
        }
        let length = end - start;
        if chromosome == Self::UNALIGNED && (start != 0 || length != 0) {
            return Err(ReadzipError::Data(format!("Unaligned read {} has a reference window", name)));
        }
        let strand = Self::parse_strand(fields[5])?;
        let edits = match fields.get(6) {
            Some(field) => Self::parse_edits(field)?,
            None => Vec::new(),
        };

        Ok(Alignment { name, strand, length, chromosome, start, edits })
    }

    /// Returns the alignment as a line in the alignment text format, without an endline.
    ///
    /// The score is written as `0`.
    pub fn to_line(&self) -> String {
        let edits: Vec<String> = self.edits.iter().map(|edit| format!("{} {}", edit.pos, edit.tag)).collect();
        format!(
            "{}\t{}\t{}\t{}\t0\t{}\t{}",
            self.name, self.chromosome, self.start, self.end(), self.strand, edits.join(" ")
        )
    }
}

//-----------------------------------------------------------------------------
