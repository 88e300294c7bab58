//! Utility functions and structures.

use crate::{ReadzipError, Result};

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::io::{BufRead, BufReader, BufWriter, Read};

use flate2::read::MultiGzDecoder;

//-----------------------------------------------------------------------------

/// Returns the full file name for a specific test file.
pub fn get_test_data(filename: &'static str) -> PathBuf {
    let mut buf = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    buf.push("test-data");
    buf.push(filename);
    buf
}

//-----------------------------------------------------------------------------

// Utilities for working with files.

const SIZE_UNITS: [(f64, &str); 6] = [
    (1.0, "B"),
    (1024.0, "KiB"),
    (1024.0 * 1024.0, "MiB"),
    (1024.0 * 1024.0 * 1024.0, "GiB"),
    (1024.0 * 1024.0 * 1024.0 * 1024.0, "TiB"),
    (1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0, "PiB"),
];

/// Returns a human-readable representation of the given number of bytes.
pub fn human_readable_size(bytes: usize) -> String {
    let mut unit = 0;
    let value = bytes as f64;
    while unit + 1 < SIZE_UNITS.len() && value >= SIZE_UNITS[unit + 1].0 {
        unit += 1;
    }
    format!("{:.3} {}", value / SIZE_UNITS[unit].0, SIZE_UNITS[unit].1)
}

/// Returns the size of the file in bytes, or [`None`] if the file cannot be accessed.
pub fn file_len<P: AsRef<Path>>(filename: P) -> Option<usize> {
    fs::metadata(filename).ok().map(|metadata| metadata.len() as usize)
}

/// Returns a human-readable size of the file.
pub fn file_size<P: AsRef<Path>>(filename: P) -> Option<String> {
    file_len(filename).map(human_readable_size)
}

/// Returns `true` if the file exists.
pub fn file_exists<P: AsRef<Path>>(filename: P) -> bool {
    fs::metadata(filename).is_ok()
}

/// Returns `true` if the file appears to be gzip-compressed.
pub fn is_gzipped<P: AsRef<Path>>(filename: P) -> bool {
    let file = File::open(filename).ok();
    if file.is_none() {
        return false;
    }
    let mut reader = BufReader::new(file.unwrap());
    let mut magic = [0; 2];
    let len = reader.read(&mut magic).ok();
    len == Some(2) && magic == [0x1F, 0x8B]
}

/// Returns a buffered reader for the file, which may be gzip-compressed.
pub fn open_file<P: AsRef<Path>>(filename: P) -> Result<Box<dyn BufRead>> {
    let file = File::open(&filename).map_err(|err| ReadzipError::resource(filename.as_ref(), err))?;
    let inner = BufReader::new(file);
    if is_gzipped(&filename) {
        let inner = MultiGzDecoder::new(inner);
        Ok(Box::new(BufReader::new(inner)))
    } else {
        Ok(Box::new(inner))
    }
}

/// Returns a buffered reader for an uncompressed binary file.
pub fn open_binary<P: AsRef<Path>>(filename: P) -> Result<BufReader<File>> {
    let file = File::open(&filename).map_err(|err| ReadzipError::resource(filename.as_ref(), err))?;
    Ok(BufReader::new(file))
}

/// Creates the file and returns a buffered writer for it.
pub fn create_file<P: AsRef<Path>>(filename: P) -> Result<BufWriter<File>> {
    let file = File::create(&filename).map_err(|err| ReadzipError::resource(filename.as_ref(), err))?;
    Ok(BufWriter::new(file))
}

/// Returns the name of a temporary file next to the given file.
pub fn partial_file_name<P: AsRef<Path>>(filename: P) -> PathBuf {
    let mut name = filename.as_ref().as_os_str().to_os_string();
    name.push(".partial");
    PathBuf::from(name)
}

//-----------------------------------------------------------------------------

// Operations on bases.

/// Returns the complement of a base in `ACGTN`, or [`None`] for any other symbol.
pub fn complement_base(base: u8) -> Option<u8> {
    match base {
        b'A' => Some(b'T'),
        b'C' => Some(b'G'),
        b'G' => Some(b'C'),
        b'T' => Some(b'A'),
        b'N' => Some(b'N'),
        _ => None,
    }
}

/// Reverse-complements the sequence in place.
///
/// Returns an error if the sequence contains a symbol other than `ACGTN`.
/// The sequence may be partially modified in that case.
pub fn reverse_complement_in_place(sequence: &mut [u8]) -> Result<()> {
    sequence.reverse();
    for base in sequence.iter_mut() {
        *base = complement_base(*base).ok_or_else(|| {
            ReadzipError::Data(format!("Cannot complement symbol {}", *base as char))
        })?;
    }
    Ok(())
}

/// Returns the reverse complement of the sequence.
///
/// Returns an error if the sequence contains a symbol other than `ACGTN`.
pub fn reverse_complement(sequence: &[u8]) -> Result<Vec<u8>> {
    let mut result = sequence.to_vec();
    reverse_complement_in_place(&mut result)?;
    Ok(result)
}

//-----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strand_reversal() {
        let result = reverse_complement(b"AACG");
        assert!(result.is_ok(), "Failed to reverse complement: {}", result.unwrap_err());
        assert_eq!(result.unwrap(), b"CGTT".to_vec(), "Wrong reverse complement");

        let palindrome = b"GAATTC";
        assert_eq!(reverse_complement(palindrome).unwrap(), palindrome.to_vec(), "Wrong reverse complement for a palindrome");
        assert_eq!(reverse_complement(b"NNAN").unwrap(), b"NTNN".to_vec(), "Wrong reverse complement with N");
        assert!(reverse_complement(b"").unwrap().is_empty(), "Non-empty reverse complement for an empty sequence");
    }

    #[test]
    fn invalid_symbols() {
        for sequence in [&b"ACGX"[..], b"acgt", b"AC-T", b"R"] {
            let result = reverse_complement(sequence);
            assert!(matches!(result, Err(ReadzipError::Data(_))), "Complemented {}", String::from_utf8_lossy(sequence));
        }
    }

    #[test]
    fn human_readable_sizes() {
        assert_eq!(human_readable_size(0), "0.000 B", "Wrong size for 0 bytes");
        assert_eq!(human_readable_size(1536), "1.500 KiB", "Wrong size for 1536 bytes");
        assert_eq!(human_readable_size(3 * 1024 * 1024), "3.000 MiB", "Wrong size for 3 MiB");
    }

    #[test]
    fn partial_names() {
        let name = partial_file_name("out/reads.rz");
        assert_eq!(name, PathBuf::from("out/reads.rz.partial"), "Wrong partial file name");
    }
}

//-----------------------------------------------------------------------------
