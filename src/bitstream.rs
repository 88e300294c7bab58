//! Sequential bit-level I/O and gamma coding.
//!
//! [`BitWriter`] packs bits into bytes most significant bit first and writes the bytes into an inner [`Write`].
//! [`BitReader`] reverses this over an inner [`BufRead`].
//! Fixed-width fields are stored most significant bit first.
//! Both sides can pad to the next byte boundary, which isolates records from each other.
//!
//! The reader reports the end of the stream as [`None`] instead of an error.
//! The caller decides whether running out of bits is normal termination or a truncated record.
//! [`BitReader::at_clean_end`] tells whether only zero padding remains.
//!
//! Variable-length non-negative integers use Elias gamma coding through the [`GammaWrite`] and [`GammaRead`] traits.
//!
//! # Examples
//!
//! ```
//! use readzip::bitstream::{BitReader, BitWriter, GammaRead, GammaWrite};
//!
//! let mut writer = BitWriter::new(Vec::new());
//! writer.write_bit(true).unwrap();
//! writer.write_int(5, 3).unwrap();
//! writer.write_gamma(42).unwrap();
//! let bytes = writer.finish().unwrap();
//!
//! let mut reader = BitReader::new(&bytes[..]);
//! assert_eq!(reader.read_bit().unwrap(), Some(true));
//! assert_eq!(reader.read_int(3).unwrap(), Some(5));
//! assert_eq!(reader.read_gamma().unwrap(), Some(42));
//! assert!(reader.at_clean_end().unwrap());
//! ```

use crate::{ReadzipError, Result};

use std::io::{BufRead, Write};

use simple_sds::bits;

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// Maximum width of a fixed-width field in bits.
pub const MAX_WIDTH: usize = 64;

/// Writes individual bits and fixed-width fields into a byte stream.
///
/// Call [`BitWriter::finish`] when done; dropping the writer loses the final partial byte.
pub struct BitWriter<W: Write> {
    inner: W,
    // Bits are accumulated from the high end.
    buffer: u8,
    // Number of bits in the buffer.
    used: usize,
    bits_written: u64,
}

impl<W: Write> BitWriter<W> {
    /// Creates a new writer over the given byte sink.
    pub fn new(inner: W) -> Self {
        BitWriter {
            inner,
            buffer: 0,
            used: 0,
            bits_written: 0,
        }
    }

    /// Returns the number of bits written so far, including padding.
    #[inline]
    pub fn bits_written(&self) -> u64 {
        self.bits_written
    }

    /// Returns `true` if the writer is at a byte boundary.
    #[inline]
    pub fn is_aligned(&self) -> bool {
        self.used == 0
    }

    /// Writes a single bit.
    pub fn write_bit(&mut self, bit: bool) -> Result<()> {
        if bit {
            self.buffer |= 0x80 >> self.used;
        }
        self.used += 1;
        self.bits_written += 1;
        if self.used == 8 {
            self.inner.write_all(&[self.buffer])?;
            self.buffer = 0;
            self.used = 0;
        }
        Ok(())
    }

    /// Writes the lowest `width` bits of `value`, most significant bit first.
    ///
    /// Returns an error if the width is too large or the value does not fit in the field.
    pub fn write_int(&mut self, value: u64, width: usize) -> Result<()> {
        if width > MAX_WIDTH {
            return Err(ReadzipError::Data(format!("Field width {} exceeds {} bits", width, MAX_WIDTH)));
        }
        if width < MAX_WIDTH && (value >> width) != 0 {
            return Err(ReadzipError::Data(format!("Value {} does not fit in {} bits", value, width)));
        }
        for i in (0..width).rev() {
            self.write_bit((value >> i) & 1 != 0)?;
        }
        Ok(())
    }

    /// Pads the stream with zero bits to the next byte boundary.
    pub fn align(&mut self) -> Result<()> {
        while !self.is_aligned() {
            self.write_bit(false)?;
        }
        Ok(())
    }

    /// Pads the final byte, flushes the inner writer, and returns it.
    pub fn finish(mut self) -> Result<W> {
        self.align()?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

//-----------------------------------------------------------------------------

/// Reads individual bits and fixed-width fields from a byte stream.
///
/// All read operations return [`None`] when the stream ends before the request can be satisfied.
pub struct BitReader<R: BufRead> {
    inner: R,
    // The current byte.
    buffer: u8,
    // Number of unread low bits in the buffer.
    remaining: usize,
    bits_read: u64,
}

impl<R: BufRead> BitReader<R> {
    /// Creates a new reader over the given byte source.
    pub fn new(inner: R) -> Self {
        BitReader {
            inner,
            buffer: 0,
            remaining: 0,
            bits_read: 0,
        }
    }

    /// Returns the number of bits consumed so far, including skipped padding.
    #[inline]
    pub fn bits_read(&self) -> u64 {
        self.bits_read
    }

    /// Returns `true` if the reader is at a byte boundary.
    #[inline]
    pub fn is_aligned(&self) -> bool {
        self.remaining == 0
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        let buf = self.inner.fill_buf()?;
        if buf.is_empty() {
            return Ok(None);
        }
        let byte = buf[0];
        self.inner.consume(1);
        Ok(Some(byte))
    }

    /// Reads a single bit.
    pub fn read_bit(&mut self) -> Result<Option<bool>> {
        if self.remaining == 0 {
            match self.next_byte()? {
                Some(byte) => {
                    self.buffer = byte;
                    self.remaining = 8;
                },
                None => return Ok(None),
            }
        }
        self.remaining -= 1;
        self.bits_read += 1;
        Ok(Some((self.buffer >> self.remaining) & 1 != 0))
    }

    /// Reads a `width`-bit field stored most significant bit first.
    ///
    /// Returns an error if the width is too large.
    pub fn read_int(&mut self, width: usize) -> Result<Option<u64>> {
        if width > MAX_WIDTH {
            return Err(ReadzipError::Format(format!("Field width {} exceeds {} bits", width, MAX_WIDTH)));
        }
        let mut value: u64 = 0;
        for _ in 0..width {
            match self.read_bit()? {
                Some(bit) => value = (value << 1) | (bit as u64),
                None => return Ok(None),
            }
        }
        Ok(Some(value))
    }

    /// Skips the remaining bits of the current byte.
    pub fn align(&mut self) {
        self.bits_read += self.remaining as u64;
        self.remaining = 0;
    }

    /// Returns `true` if the rest of the stream consists only of zero padding in the current byte.
    ///
    /// This is the normal way for a stream to end at a record boundary.
    pub fn at_clean_end(&mut self) -> Result<bool> {
        if self.remaining > 0 {
            let mask = (1u16 << self.remaining) - 1;
            if (self.buffer as u16) & mask != 0 {
                return Ok(false);
            }
        }
        Ok(self.inner.fill_buf()?.is_empty())
    }
}

//-----------------------------------------------------------------------------

/// Returns the length of the gamma code for the given value in bits.
///
/// Returns [`None`] for `u64::MAX`, which cannot be encoded.
pub fn gamma_len(value: u64) -> Option<usize> {
    let len = bits::bit_len(value.checked_add(1)?) - 1;
    Some(2 * len + 1)
}

/// Elias gamma encoding of non-negative integers.
///
/// Value `0` is encoded as a single `0` bit.
/// Any other value `v` with `L = floor(log2(v + 1))` is encoded as `L` one-bits, a zero-bit, and `v + 1 - 2^L` as an `L`-bit field.
pub trait GammaWrite {
    /// Writes the gamma code for the value.
    ///
    /// Returns an error if the value is `u64::MAX`.
    fn write_gamma(&mut self, value: u64) -> Result<()>;
}

/// Elias gamma decoding of non-negative integers.
///
/// See [`GammaWrite`] for the encoding.
pub trait GammaRead {
    /// Reads a gamma-coded value.
    ///
    /// Returns [`None`] if the stream ends in the middle of the code.
    /// Returns an error if the code is too long to be valid.
    fn read_gamma(&mut self) -> Result<Option<u64>>;
}

impl<W: Write> GammaWrite for BitWriter<W> {
    fn write_gamma(&mut self, value: u64) -> Result<()> {
        if value == u64::MAX {
            return Err(ReadzipError::Data(format!("Cannot gamma-encode value {}", value)));
        }
        if value == 0 {
            return self.write_bit(false);
        }
        let len = bits::bit_len(value + 1) - 1;
        for _ in 0..len {
            self.write_bit(true)?;
        }
        self.write_bit(false)?;
        self.write_int(value + 1 - (1u64 << len), len)
    }
}

impl<R: BufRead> GammaRead for BitReader<R> {
    fn read_gamma(&mut self) -> Result<Option<u64>> {
        let mut len = 0;
        loop {
            match self.read_bit()? {
                Some(true) => len += 1,
                Some(false) => break,
                None => return Ok(None),
            }
            if len >= 64 {
                return Err(ReadzipError::Format(String::from("Gamma code with a prefix of 64 or more ones")));
            }
        }
        if len == 0 {
            return Ok(Some(0));
        }
        let offset = self.read_int(len)?;
        Ok(offset.map(|offset| offset + (1u64 << len) - 1))
    }
}

//-----------------------------------------------------------------------------
