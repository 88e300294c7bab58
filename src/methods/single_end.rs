//! Methods A and B for single-end reads.
//!
//! Method A writes each record as
//!
//! 1. chromosome code
//! 2. strand bit
//! 3. start offset (gamma)
//! 4. window length (gamma)
//! 5. edit list
//!
//! and pads it to a byte boundary.
//! The records are in input order and the encoder streams them.
//!
//! Method B buffers all records and sorts them by chromosome code and start offset.
//! Each record is written as
//!
//! 1. chromosome code
//! 2. start offset as a delta from the previous record on the same chromosome (gamma)
//! 3. window length (gamma)
//! 4. strand bit
//! 5. edit list
//!
//! and padded to a byte boundary.
//! The first record on each chromosome stores the start offset itself.
//! Unaligned reads have the largest code, so they come last.

use super::{read_chromosome, read_strand, read_usize, record_name, write_strand, write_usize};
use super::Method;

use crate::{Alignment, ChromosomeCodes, ReadzipError, Result};
use crate::alignment::edit;
use crate::bitstream::{BitReader, BitWriter};

use std::io::{BufRead, Write};

use log::debug;

//-----------------------------------------------------------------------------

/// Compresses single-end alignments with method A or B and writes the stream to the output.
///
/// Returns the number of reads.
/// Returns an error if the method is not for single-end reads, an alignment is on an unknown chromosome, or the input iterator fails.
///
/// # Examples
///
/// ```
/// use readzip::{Alignment, ChromosomeCodes, Method, Reference};
/// use readzip::methods::{compress_single_end, SingleEndDecoder};
///
/// let reference = Reference::from_sequences([("chr1", "GATTACA")]).unwrap();
/// let codes = ChromosomeCodes::new(&reference);
/// let input = vec![
///     Alignment::from_line(b"r1\tchr1\t2\t6\t0\tF\t2 C").unwrap(),
///     Alignment::unaligned("r2", b"ACGT").unwrap(),
/// ];
///
/// let mut stream: Vec<u8> = Vec::new();
/// let count = compress_single_end(Method::A, input.into_iter().map(Ok), &codes, &mut stream).unwrap();
/// assert_eq!(count, 2);
///
/// let decoder = SingleEndDecoder::new(Method::A, &stream[..], &codes).unwrap();
/// let reads: Vec<Vec<u8>> = decoder.map(|x| x.unwrap().reconstruct(&reference).unwrap()).collect();
/// assert_eq!(reads, vec![b"ATCA".to_vec(), b"ACGT".to_vec()]);
/// ```
pub fn compress_single_end<I, W>(method: Method, alignments: I, codes: &ChromosomeCodes, output: W) -> Result<usize>
where
    I: IntoIterator<Item = Result<Alignment>>,
    W: Write,
{
    let mut writer = BitWriter::new(output);
    let count = match method {
        Method::A => write_ordered(alignments, codes, &mut writer)?,
        Method::B => write_sorted(alignments, codes, &mut writer)?,
        _ => return Err(ReadzipError::Data(format!("Method {} is not for single-end reads", method))),
    };
    debug!("Method {}: {} reads in {} bits", method, count, writer.bits_written());
    writer.finish()?;
    Ok(count)
}

fn write_ordered<I: IntoIterator<Item = Result<Alignment>>, W: Write>(
    alignments: I, codes: &ChromosomeCodes, writer: &mut BitWriter<W>
) -> Result<usize> {
    let mut count = 0;
    for alignment in alignments {
        let alignment = alignment?;
        let code = codes.require_code(&alignment.chromosome)?;
        codes.write_code(writer, code)?;
        write_strand(writer, alignment.strand)?;
        write_usize(writer, alignment.start)?;
        write_usize(writer, alignment.length)?;
        edit::write_edits(writer, &alignment.edits)?;
        writer.align()?;
        count += 1;
    }
    Ok(count)
}

fn write_sorted<I: IntoIterator<Item = Result<Alignment>>, W: Write>(
    alignments: I, codes: &ChromosomeCodes, writer: &mut BitWriter<W>
) -> Result<usize> {
    let mut records: Vec<(u64, Alignment)> = Vec::new();
    for alignment in alignments {
        let alignment = alignment?;
        let code = codes.require_code(&alignment.chromosome)?;
        records.push((code, alignment));
    }
    records.sort_by_key(|(code, alignment)| (*code, alignment.start));
    debug!("Method B: sorted {} reads", records.len());

    let mut prev: Option<(u64, usize)> = None;
    for (code, alignment) in records.iter() {
        let base = match prev {
            Some((prev_code, prev_start)) if prev_code == *code => prev_start,
            _ => 0,
        };
        codes.write_code(writer, *code)?;
        write_usize(writer, alignment.start - base)?;
        write_usize(writer, alignment.length)?;
        write_strand(writer, alignment.strand)?;
        edit::write_edits(writer, &alignment.edits)?;
        writer.align()?;
        prev = Some((*code, alignment.start));
    }
    Ok(records.len())
}

//-----------------------------------------------------------------------------

/// An iterator over the records in a method A or B stream.
///
/// The records are named `Read_1`, `Read_2`, and so on in stream order.
/// The iterator stops after the first error.
pub struct SingleEndDecoder<'a, R: BufRead> {
    reader: BitReader<R>,
    codes: &'a ChromosomeCodes,
    method: Method,
    // Chromosome code and start offset of the previous record.
    prev: Option<(u64, usize)>,
    count: usize,
    failed: bool,
}

impl<'a, R: BufRead> SingleEndDecoder<'a, R> {
    /// Creates a decoder for a method A or B stream.
    ///
    /// The code table must be built from the same reference as during compression.
    /// Returns an error if the method is not for single-end reads.
    pub fn new(method: Method, input: R, codes: &'a ChromosomeCodes) -> Result<Self> {
        if method.is_paired() {
            return Err(ReadzipError::Data(format!("Method {} is not for single-end reads", method)));
        }
        Ok(SingleEndDecoder {
            reader: BitReader::new(input),
            codes,
            method,
            prev: None,
            count: 0,
            failed: false,
        })
    }

    /// Returns the number of records decoded so far.
    #[inline]
    pub fn decoded(&self) -> usize {
        self.count
    }

    fn read_record(&mut self) -> Result<Option<Alignment>> {
        let (code, chromosome) = match read_chromosome(&mut self.reader, self.codes)? {
            Some(result) => result,
            None => return Ok(None),
        };
        let (strand, start, length) = if self.method == Method::A {
            let strand = read_strand(&mut self.reader)?;
            let start = read_usize(&mut self.reader, "start offset")?;
            let length = read_usize(&mut self.reader, "window length")?;
            (strand, start, length)
        } else {
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
            self.prev = Some((code, start));
            (strand, start, length)
        };
        let edits = edit::read_edits(&mut self.reader)?;
        self.reader.align();

        self.count += 1;
        Ok(Some(Alignment {
            name: record_name(self.count),
            strand, length, chromosome, start, edits,
        }))
    }
}

impl<'a, R: BufRead> Iterator for SingleEndDecoder<'a, R> {
    type Item = Result<Alignment>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let result = self.read_record();
        if result.is_err() {
            self.failed = true;
        }
        result.transpose()
    }
}

//-----------------------------------------------------------------------------
