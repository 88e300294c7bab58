//! Methods C and D for paired-end reads.
//!
//! Both mates of a pair must be on the same chromosome, which is stored once per pair.
//!
//! Method C keeps the pairs in input order.
//! Each pair is written as the chromosome code followed by the mates as
//!
//! 1. strand bit
//! 2. start offset (gamma)
//! 3. window length (gamma)
//! 4. edit list
//!
//! The second mate stores its start offset as a delta from the start of the first mate, so the second mate must not start before the first.
//!
//! Method D buffers all pairs and sorts them by chromosome code and the start offset of the first mate.
//! Each pair is written as
//!
//! 1. chromosome code
//! 2. start offset of the first mate as a delta from the previous pair on the same chromosome (gamma)
//! 3. window length, strand bit, and edit list of the first mate
//! 4. direction bit: `1` if the second mate starts before the first mate
//! 5. distance between the start offsets (gamma)
//! 6. window length, strand bit, and edit list of the second mate
//!
//! Neither method pads the records.
//! The stream is padded once at the end.

use super::{read_chromosome, read_strand, read_usize, record_name, write_strand, write_usize};
use super::Method;

use crate::{Alignment, ChromosomeCodes, ReadzipError, Result, Strand};
use crate::alignment::edit::{self, Edit};
use crate::bitstream::{BitReader, BitWriter};

use std::io::{BufRead, Write};

use log::debug;

//-----------------------------------------------------------------------------

/// Compresses paired-end alignments with method C or D and writes the stream to the output.
///
/// The two inputs contain the first and the second mates in the same order.
/// Returns the number of pairs.
/// Returns a consistency error if the mates of a pair are on different chromosomes, if the second mate starts before the first with method C, or if the inputs have different lengths.
/// In that case, the output may contain an incomplete stream.
///
/// # Examples
///
/// ```
/// use readzip::{Alignment, ChromosomeCodes, Method, Reference};
/// use readzip::methods::{compress_paired_end, PairedEndDecoder};
///
/// let reference = Reference::from_sequences([("chr1", "GATTACA")]).unwrap();
/// let codes = ChromosomeCodes::new(&reference);
/// let first = vec![Alignment::from_line(b"p/1\tchr1\t1\t4\t0\tF").unwrap()];
/// let second = vec![Alignment::from_line(b"p/2\tchr1\t4\t8\t0\tR").unwrap()];
///
/// let mut stream: Vec<u8> = Vec::new();
/// let count = compress_paired_end(
///     Method::C, first.into_iter().map(Ok), second.into_iter().map(Ok), &codes, &mut stream
/// ).unwrap();
/// assert_eq!(count, 1);
///
/// let mut decoder = PairedEndDecoder::new(Method::C, &stream[..], &codes).unwrap();
/// let (mate1, mate2) = decoder.next().unwrap().unwrap();
/// assert_eq!(mate1.name, "Read_1");
/// assert_eq!(mate2.name, "Read_1");
/// assert_eq!(mate1.reconstruct(&reference).unwrap(), b"GAT".to_vec());
/// assert_eq!(mate2.reconstruct(&reference).unwrap(), b"TGTA".to_vec());
/// assert!(decoder.next().is_none());
/// ```
pub fn compress_paired_end<I, J, W>(method: Method, first: I, second: J, codes: &ChromosomeCodes, output: W) -> Result<usize>
where
    I: IntoIterator<Item = Result<Alignment>>,
    J: IntoIterator<Item = Result<Alignment>>,
    W: Write,
{
    if !method.is_paired() {
        return Err(ReadzipError::Data(format!("Method {} is not for paired-end reads", method)));
    }

    let pairs = Pairs {
        first: first.into_iter(),
        second: second.into_iter(),
        codes,
    };
    let mut writer = BitWriter::new(output);
    let count = if method == Method::C {
        write_ordered(pairs, codes, &mut writer)?
    } else {
        write_sorted(pairs, codes, &mut writer)?
    };
    debug!("Method {}: {} pairs in {} bits", method, count, writer.bits_written());
    writer.finish()?;
    Ok(count)
}

// Iterates over the mates of both inputs in lockstep.
// Yields the chromosome code with each pair after checking that the mates share it.
struct Pairs<'a, I, J> {
    first: I,
    second: J,
    codes: &'a ChromosomeCodes,
}

impl<'a, I, J> Pairs<'a, I, J>
where
    I: Iterator<Item = Result<Alignment>>,
    J: Iterator<Item = Result<Alignment>>,
{
    fn next_pair(&mut self) -> Result<Option<(u64, Alignment, Alignment)>> {
        let (mate1, mate2) = match (self.first.next(), self.second.next()) {
            (None, None) => return Ok(None),
            (Some(mate1), Some(mate2)) => (mate1?, mate2?),
            (Some(mate1), None) => {
                let mate1 = mate1?;
                return Err(ReadzipError::consistency(&mate1.name, "the second mate file ended first"));
            },
            (None, Some(mate2)) => {
                let mate2 = mate2?;
                return Err(ReadzipError::consistency(&mate2.name, "the first mate file ended first"));
            },
        };
        if mate1.chromosome != mate2.chromosome {
            return Err(ReadzipError::consistency(&mate1.name, format!(
                "mates are on chromosomes {} and {}", mate1.chromosome, mate2.chromosome
            )));
        }
        let code = self.codes.require_code(&mate1.chromosome)?;
        Ok(Some((code, mate1, mate2)))
    }
}

impl<'a, I, J> Iterator for Pairs<'a, I, J>
where
    I: Iterator<Item = Result<Alignment>>,
    J: Iterator<Item = Result<Alignment>>,
{
    type Item = Result<(u64, Alignment, Alignment)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_pair().transpose()
    }
}

fn write_ordered<P, W>(pairs: P, codes: &ChromosomeCodes, writer: &mut BitWriter<W>) -> Result<usize>
where
    P: Iterator<Item = Result<(u64, Alignment, Alignment)>>,
    W: Write,
{
    let mut count = 0;
    for pair in pairs {
        let (code, mate1, mate2) = pair?;
        if mate2.start < mate1.start {
            return Err(ReadzipError::consistency(&mate1.name, format!(
                "the second mate starts at {} before the first mate at {}", mate2.start, mate1.start
            )));
        }
        codes.write_code(writer, code)?;
        write_strand(writer, mate1.strand)?;
        write_usize(writer, mate1.start)?;
        write_usize(writer, mate1.length)?;
        edit::write_edits(writer, &mate1.edits)?;
        write_strand(writer, mate2.strand)?;
        write_usize(writer, mate2.start - mate1.start)?;
        write_usize(writer, mate2.length)?;
        edit::write_edits(writer, &mate2.edits)?;
        count += 1;
    }
    Ok(count)
}

fn write_sorted<P, W>(pairs: P, codes: &ChromosomeCodes, writer: &mut BitWriter<W>) -> Result<usize>
where
    P: Iterator<Item = Result<(u64, Alignment, Alignment)>>,
    W: Write,
{
    let mut records: Vec<(u64, Alignment, Alignment)> = pairs.collect::<Result<Vec<_>>>()?;
    records.sort_by_key(|(code, mate1, _)| (*code, mate1.start));
    debug!("Method D: sorted {} pairs", records.len());

    let mut prev: Option<(u64, usize)> = None;
    for (code, mate1, mate2) in records.iter() {
        let base = match prev {
            Some((prev_code, prev_start)) if prev_code == *code => prev_start,
            _ => 0,
        };
        codes.write_code(writer, *code)?;
        write_usize(writer, mate1.start - base)?;
        write_usize(writer, mate1.length)?;
        write_strand(writer, mate1.strand)?;
        edit::write_edits(writer, &mate1.edits)?;
        let before = mate2.start < mate1.start;
        writer.write_bit(before)?;
        write_usize(writer, mate1.start.abs_diff(mate2.start))?;
        write_usize(writer, mate2.length)?;
        write_strand(writer, mate2.strand)?;
        edit::write_edits(writer, &mate2.edits)?;
        prev = Some((*code, mate1.start));
    }
    Ok(records.len())
}

//-----------------------------------------------------------------------------

/// An iterator over the pairs in a method C or D stream.
///
/// Both mates of the `n`th pair are named `Read_n`.
/// The iterator stops after the first error.
pub struct PairedEndDecoder<'a, R: BufRead> {
    reader: BitReader<R>,
    codes: &'a ChromosomeCodes,
    method: Method,
    // Chromosome code and first mate start offset of the previous pair.
    prev: Option<(u64, usize)>,
    count: usize,
    failed: bool,
}

impl<'a, R: BufRead> PairedEndDecoder<'a, R> {
    /// Creates a decoder for a method C or D stream.
    ///
    /// The code table must be built from the same reference as during compression.
    /// Returns an error if the method is not for paired-end reads.
    pub fn new(method: Method, input: R, codes: &'a ChromosomeCodes) -> Result<Self> {
        if !method.is_paired() {
            return Err(ReadzipError::Data(format!("Method {} is not for paired-end reads", method)));
        }
        Ok(PairedEndDecoder {
            reader: BitReader::new(input),
            codes,
            method,
            prev: None,
            count: 0,
            failed: false,
        })
    }

    /// Returns the number of pairs decoded so far.
    #[inline]
    pub fn decoded(&self) -> usize {
        self.count
    }

    // Both mates are named after the pair being decoded.
    fn mate(&self, chromosome: &str, strand: Strand, start: usize, length: usize, edits: Vec<Edit>) -> Alignment {
        Alignment {
            name: record_name(self.count + 1),
            strand, length,
            chromosome: String::from(chromosome),
            start, edits,
        }
    }

    fn read_ordered(&mut self, chromosome: &str) -> Result<(Alignment, Alignment)> {
        let strand = read_strand(&mut self.reader)?;
        let start = read_usize(&mut self.reader, "start offset")?;
        let length = read_usize(&mut self.reader, "window length")?;
        let edits = edit::read_edits(&mut self.reader)?;
        let mate1 = self.mate(chromosome, strand, start, length, edits);

        let strand = read_strand(&mut self.reader)?;
        let delta = read_usize(&mut self.reader, "mate distance")?;
        let start = start.checked_add(delta).ok_or_else(|| {
            ReadzipError::Format(String::from("Start offset overflow"))
        })?;
        let length = read_usize(&mut self.reader, "window length")?;
        let edits = edit::read_edits(&mut self.reader)?;
        let mate2 = self.mate(chromosome, strand, start, length, edits);

        Ok((mate1, mate2))
    }

    fn read_sorted(&mut self, code: u64, chromosome: &str) -> Result<(Alignment, Alignment)> {
        let delta = read_usize(&mut self.reader, "start offset")?;
        let base = match self.prev {
            Some((prev_code, prev_start)) if prev_code == code => prev_start,
            _ => 0,
        };
        let start = base.checked_add(delta).ok_or_else(|| {
            ReadzipError::Format(String::from("Start offset overflow"))
        })?;
        let length = read_usize(&mut self.reader, "window length")?;
        let strand = read_strand(&mut self.reader)?;
        let edits = edit::read_edits(&mut self.reader)?;
        let mate1 = self.mate(chromosome, strand, start, length, edits);
        self.prev = Some((code, start));

        let before = self.reader.read_bit()?.ok_or(ReadzipError::UnexpectedEnd("mate direction"))?;
        let distance = read_usize(&mut self.reader, "mate distance")?;
        let start = if before { start.checked_sub(distance) } else { start.checked_add(distance) };
        let start = start.ok_or_else(|| {
            ReadzipError::Format(format!("Invalid mate distance {}", distance))
        })?;
        let length = read_usize(&mut self.reader, "window length")?;
        let strand = read_strand(&mut self.reader)?;
        let edits = edit::read_edits(&mut self.reader)?;
        let mate2 = self.mate(chromosome, strand, start, length, edits);

        Ok((mate1, mate2))
    }

    fn read_pair(&mut self) -> Result<Option<(Alignment, Alignment)>> {
        let (code, chromosome) = match read_chromosome(&mut self.reader, self.codes)? {
            Some(result) => result,
            None => return Ok(None),
        };
        let pair = if self.method == Method::C {
            self.read_ordered(&chromosome)?
        } else {
            self.read_sorted(code, &chromosome)?
        };
        self.count += 1;
        Ok(Some(pair))
    }
}

impl<'a, R: BufRead> Iterator for PairedEndDecoder<'a, R> {
    type Item = Result<(Alignment, Alignment)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let result = self.read_pair();
        if result.is_err() {
            self.failed = true;
        }
        result.transpose()
    }
}

//-----------------------------------------------------------------------------
