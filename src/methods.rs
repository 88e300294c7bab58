//! Record layouts for compressed streams.
//!
//! A compressed stream is a sequence of bit-packed records in one of four layouts.
//! The stream has no header, so the [`Method`] and the reference must be supplied again when decompressing.
//!
//! * [`Method::A`]: Single-end reads in input order, each record padded to a byte boundary.
//! * [`Method::B`]: Single-end reads sorted by position, with delta-coded start offsets.
//! * [`Method::C`]: Paired-end reads in input order, with the second mate relative to the first.
//! * [`Method::D`]: Paired-end reads sorted by the position of the first mate.
//!
//! Methods C and D pad the stream only once at the end.
//! In all methods, a stream ends normally when only zero padding remains at a record boundary.
//!
//! See [`single_end`] and [`paired_end`] for the encoders and decoders.
//! [`compress_files`] and [`decompress_files`] work with files directly.

use crate::{Alignment, ChromosomeCodes, ReadzipError, Reference, Result, Strand};
use crate::bitstream::{BitReader, BitWriter, GammaRead, GammaWrite};
use crate::formats::{self, AlignmentReader};
use crate::utils;

use std::fmt::Display;
use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;

use log::{debug, info};

pub mod paired_end;
pub mod single_end;

pub use paired_end::{compress_paired_end, PairedEndDecoder};
pub use single_end::{compress_single_end, SingleEndDecoder};


//-----------------------------------------------------------------------------

/// Layout of a compressed stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    /// Single-end reads in input order.
    A,
    /// Single-end reads sorted by position.
    B,
    /// Paired-end reads in input order.
    C,
    /// Paired-end reads sorted by position.
    D,
}

impl Method {
    /// All methods.
    pub const ALL: [Method; 4] = [Method::A, Method::B, Method::C, Method::D];

    /// Parses the method from its name `a`, `b`, `c`, or `d` (case-insensitive).
    ///
    /// # Examples
    ///
    /// ```
    /// use readzip::Method;
    ///
    /// let method = Method::from_name("c").unwrap();
    /// assert_eq!(method, Method::C);
    /// assert!(method.is_paired());
    /// assert!(method.preserves_order());
    /// assert_eq!(Method::from_name("e"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "a" | "A" => Some(Method::A),
            "b" | "B" => Some(Method::B),
            "c" | "C" => Some(Method::C),
            "d" | "D" => Some(Method::D),
            _ => None,
        }
    }

    /// Returns `true` if the method stores paired-end reads.
    pub fn is_paired(self) -> bool {
        matches!(self, Method::C | Method::D)
    }

    /// Returns `true` if the method keeps the reads in input order.
    pub fn preserves_order(self) -> bool {
        matches!(self, Method::A | Method::C)
    }

    /// Returns the number of input files for compression, which is also the number of output files for decompression.
    pub fn files(self) -> usize {
        if self.is_paired() { 2 } else { 1 }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Method::A => "A",
            Method::B => "B",
            Method::C => "C",
            Method::D => "D",
        };
        write!(f, "{}", name)
    }
}

/// What to write for each decompressed read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputType {
    /// `>name` and sequence lines with the reconstructed read.
    #[default]
    Reads,
    /// Decoded alignments in the alignment text format.
    Alignments,
}

//-----------------------------------------------------------------------------

// Fields shared by the record layouts.

// Name of the `n`th decoded record (1-based).
fn record_name(n: usize) -> String {
    format!("Read_{}", n)
}

fn write_usize<W: Write>(writer: &mut BitWriter<W>, value: usize) -> Result<()> {
    writer.write_gamma(value as u64)
}

// Reads a gamma-coded field in the middle of a record.
fn read_usize<R: BufRead>(reader: &mut BitReader<R>, field: &'static str) -> Result<usize> {
    let value = reader.read_gamma()?.ok_or(ReadzipError::UnexpectedEnd(field))?;
    usize::try_from(value).map_err(|_| {
        ReadzipError::Format(format!("Value {} of {} does not fit in usize", value, field))
    })
}

fn write_strand<W: Write>(writer: &mut BitWriter<W>, strand: Strand) -> Result<()> {
    writer.write_bit(strand.to_bit())
}

fn read_strand<R: BufRead>(reader: &mut BitReader<R>) -> Result<Strand> {
    let bit = reader.read_bit()?.ok_or(ReadzipError::UnexpectedEnd("strand"))?;
    Ok(Strand::from_bit(bit))
}

// Reads the chromosome code at the start of a record.
// Returns `None` if the stream ends cleanly before the record.
fn read_chromosome<R: BufRead>(reader: &mut BitReader<R>, codes: &ChromosomeCodes) -> Result<Option<(u64, String)>> {
    if reader.at_clean_end()? {
        return Ok(None);
    }
    let (code, name) = codes.read_code(reader)?.ok_or(ReadzipError::UnexpectedEnd("chromosome code"))?;
    Ok(Some((code, String::from(name))))
}

//-----------------------------------------------------------------------------

/// Compresses the alignment files into the output file.
///
/// Single-end methods take one input file and paired-end methods take two.
/// The output is first written to a temporary file, which is renamed only if compression succeeds and removed otherwise.
/// Returns the number of reads or pairs.
pub fn compress_files<P: AsRef<Path>, Q: AsRef<Path>>(
    method: Method, inputs: &[P], output: Q, codes: &ChromosomeCodes
) -> Result<usize> {
    if inputs.len() != method.files() {
        return Err(ReadzipError::Data(format!(
            "Method {} needs {} input files, got {}", method, method.files(), inputs.len()
        )));
    }

    let output = output.as_ref();
    let partial = utils::partial_file_name(output);
    let result = compress_into(method, inputs, &partial, codes);
    match result {
        Ok(count) => {
            fs::rename(&partial, output).map_err(|err| ReadzipError::resource(output, err))?;
            info!("Compressed {} {} with method {} into {}", count, if method.is_paired() { "pairs" } else { "reads" }, method, output.display());
            Ok(count)
        },
        Err(err) => {
            if fs::remove_file(&partial).is_ok() {
                debug!("Removed partial output {}", partial.display());
            }
            Err(err)
        },
    }
}

fn compress_into<P: AsRef<Path>>(method: Method, inputs: &[P], output: &Path, codes: &ChromosomeCodes) -> Result<usize> {
    let first = AlignmentReader::open(&inputs[0])?;
    let writer = utils::create_file(output)?;
    if method.is_paired() {
        let second = AlignmentReader::open(&inputs[1])?;
        compress_paired_end(method, first, second, codes, writer)
    } else {
        compress_single_end(method, first, codes, writer)
    }
}

/// Decompresses the input file into the output files.
///
/// Single-end methods write one output file and paired-end methods write one file per mate.
/// Output files that were already written are left as they are if decompression fails.
/// Returns the number of reads or pairs.
pub fn decompress_files<P: AsRef<Path>, Q: AsRef<Path>>(
    method: Method, input: P, outputs: &[Q],
    reference: &Reference, codes: &ChromosomeCodes, output_type: OutputType
) -> Result<usize> {
    if outputs.len() != method.files() {
        return Err(ReadzipError::Data(format!(
            "Method {} needs {} output files, got {}", method, method.files(), outputs.len()
        )));
    }

    let reader = utils::open_binary(&input)?;
    let count = if method.is_paired() {
        let mut first = utils::create_file(&outputs[0])?;
        let mut second = utils::create_file(&outputs[1])?;
        let mut decoder = PairedEndDecoder::new(method, reader, codes)?;
        for pair in decoder.by_ref() {
            let (mate1, mate2) = pair?;
            write_record(&mate1, reference, output_type, &mut first)?;
            write_record(&mate2, reference, output_type, &mut second)?;
        }
        first.flush()?;
        second.flush()?;
        decoder.decoded()
    } else {
        let mut output = utils::create_file(&outputs[0])?;
        let mut decoder = SingleEndDecoder::new(method, reader, codes)?;
        for alignment in decoder.by_ref() {
            write_record(&alignment?, reference, output_type, &mut output)?;
        }
        output.flush()?;
        decoder.decoded()
    };

    info!("Decompressed {} {} with method {} from {}", count, if method.is_paired() { "pairs" } else { "reads" }, method, input.as_ref().display());
    Ok(count)
}

fn write_record<W: Write>(alignment: &Alignment, reference: &Reference, output_type: OutputType, output: &mut W) -> Result<()> {
    match output_type {
        OutputType::Reads => {
            let sequence = alignment.reconstruct(reference)?;
            formats::write_read(&alignment.name, &sequence, output)
        },
        OutputType::Alignments => formats::write_alignment(alignment, output),
    }
}

//-----------------------------------------------------------------------------
