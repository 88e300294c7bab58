//! # readzip: reference-based compression of aligned short reads.
//!
//! Short reads that have been aligned to a reference genome can be stored as positions in the reference and a few edits.
//! This crate packs such alignments into compact bit streams and rebuilds the read sequences from the reference.
//!
//! ### Basic concepts
//!
//! An [`Alignment`] places a read in a window of a reference chromosome.
//! The differences between the read and the window are stored as [`Edit`] operations, each with an offset in the window and an [`EditTag`].
//! Reads the aligner could not place are stored with the chromosome name `*` and an edit list that inserts every base.
//! [`Alignment::reconstruct`] rebuilds the read from a [`Reference`].
//!
//! Chromosome names are replaced with fixed-width codes from a [`ChromosomeCodes`] table.
//! The table is derived from the reference and never stored, so the same reference is needed for decompression.
//!
//! ### Compressed streams
//!
//! Integers are written using the bit-level I/O and gamma coding in [`bitstream`].
//! The record layouts are described in [`methods`]:
//!
//! * [`Method::A`] and [`Method::B`] store single-end reads in input order or sorted by position.
//! * [`Method::C`] and [`Method::D`] store paired-end reads in input order or sorted by position.
//!
//! The stream does not identify the method, which must be supplied when decompressing.
//!
//! ### Files
//!
//! The input alignments are read from a tab-separated text format using [`formats::AlignmentReader`].
//! [`methods::compress_files`] and [`methods::decompress_files`] handle complete files.
//! The `readzip` binary provides a command-line interface for them.

pub mod alignment;
pub mod bitstream;
pub mod error;
pub mod formats;
pub mod methods;
pub mod reference;
pub mod utils;

pub use alignment::{Alignment, Edit, EditTag, Strand};
pub use error::{ReadzipError, Result};
pub use methods::{Method, OutputType};
pub use reference::{ChromosomeCodes, Reference};
