use super::*;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

//-----------------------------------------------------------------------------

// Tests for `BitWriter` and `BitReader`.

#[derive(Clone, Copy, Debug, PartialEq)]
enum Op {
    Bit(bool),
    Int(u64, usize),
    Align,
}

fn write_ops(ops: &[Op]) -> (Vec<u8>, u64) {
    let mut writer = BitWriter::new(Vec::new());
    for op in ops.iter() {
        let result = match op {
            Op::Bit(bit) => writer.write_bit(*bit),
            Op::Int(value, width) => writer.write_int(*value, *width),
            Op::Align => writer.align(),
        };
        assert!(result.is_ok(), "Failed to write {:?}: {}", op, result.unwrap_err());
    }
    let bits = writer.bits_written();
    let bytes = writer.finish();
    assert!(bytes.is_ok(), "Failed to finish the stream: {}", bytes.err().unwrap());
    (bytes.unwrap(), bits)
}

fn check_ops(ops: &[Op], bytes: &[u8], name: &str) -> u64 {
    let mut reader = BitReader::new(bytes);
    for (i, op) in ops.iter().enumerate() {
        match op {
            Op::Bit(bit) => {
                let result = reader.read_bit().unwrap();
                assert_eq!(result, Some(*bit), "Wrong bit at operation {} in {}", i, name);
            },
            Op::Int(value, width) => {
                let result = reader.read_int(*width).unwrap();
                assert_eq!(result, Some(*value), "Wrong {}-bit field at operation {} in {}", width, i, name);
            },
            Op::Align => reader.align(),
        }
    }
    let bits = reader.bits_read();
    assert!(reader.at_clean_end().unwrap(), "Expected a clean end in {}", name);
    bits
}

#[test]
fn empty_stream() {
    let (bytes, bits) = write_ops(&[]);
    assert!(bytes.is_empty(), "Empty stream produced {} bytes", bytes.len());
    assert_eq!(bits, 0, "Empty stream reported written bits");
    let mut reader = BitReader::new(&bytes[..]);
    assert!(reader.at_clean_end().unwrap(), "Empty stream does not end cleanly");
    assert_eq!(reader.read_bit().unwrap(), None, "Read a bit from an empty stream");
    assert_eq!(reader.read_int(3).unwrap(), None, "Read a field from an empty stream");
}

#[test]
fn bit_order() {
    let ops = [
        Op::Bit(true), Op::Bit(false), Op::Bit(true), Op::Bit(true),
        Op::Int(0b0110, 4),
        Op::Int(0xABC, 12),
    ];
    let (bytes, bits) = write_ops(&ops);
    assert_eq!(bits, 20, "Wrong number of bits written");
    assert_eq!(bytes, vec![0b1011_0110, 0xAB, 0xC0], "Bits are not packed MSB-first");
    let read = check_ops(&ops, &bytes, "bit order");
    assert_eq!(read, bits, "Wrong number of bits read");
}

#[test]
fn zero_width_and_full_width() {
    let ops = [
        Op::Int(0, 0),
        Op::Int(u64::MAX, 64),
        Op::Bit(true),
        Op::Int(0, 0),
        Op::Int(1u64 << 63, 64),
    ];
    let (bytes, _) = write_ops(&ops);
    assert_eq!(bytes.len(), 17, "Wrong number of bytes for 129 bits");
    check_ops(&ops, &bytes, "zero and full width");
}

#[test]
fn invalid_fields() {
    let mut writer = BitWriter::new(Vec::new());
    assert!(writer.write_int(8, 3).is_err(), "Wrote a value that does not fit in the field");
    assert!(writer.write_int(0, 65).is_err(), "Wrote a field wider than 64 bits");
    let mut reader = BitReader::new(&[0u8; 16][..]);
    assert!(reader.read_int(65).is_err(), "Read a field wider than 64 bits");
}

#[test]
fn alignment_padding() {
    let ops = [
        Op::Bit(true), Op::Align,
        Op::Int(5, 3), Op::Bit(false), Op::Align,
        Op::Align,
        Op::Int(0xFF, 8), Op::Align,
        Op::Int(1, 1),
    ];
    let (bytes, bits) = write_ops(&ops);
    assert_eq!(bytes, vec![0x80, 0xA0, 0xFF, 0x80], "Wrong padding");
    assert_eq!(bits, 25, "Wrong number of bits written");
    let read = check_ops(&ops, &bytes, "alignment padding");
    assert_eq!(read, bits, "Reader and writer disagree on the number of bits");
}

#[test]
fn random_operations() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    for round in 0..20 {
        let mut ops = Vec::new();
        for _ in 0..rng.gen_range(0..500) {
            let op = match rng.gen_range(0..10) {
                0 => Op::Align,
                1..=4 => Op::Bit(rng.gen()),
                _ => {
                    let width = rng.gen_range(0..=64);
                    let value = if width == 64 { rng.gen() } else { rng.gen::<u64>() & ((1u64 << width) - 1) };
                    Op::Int(value, width)
                },
            };
            ops.push(op);
        }
        let (bytes, bits) = write_ops(&ops);
        assert_eq!(bytes.len() as u64, (bits + 7) / 8, "Wrong stream length in round {}", round);
        let read = check_ops(&ops, &bytes, &format!("round {}", round));
        assert_eq!(read, bits, "Reader and writer disagree on the number of bits in round {}", round);
    }
}

#[test]
fn clean_end() {
    // A single one-bit followed by padding.
    let bytes = [0x80];
    let mut reader = BitReader::new(&bytes[..]);
    assert!(!reader.at_clean_end().unwrap(), "Unread data reported as a clean end");
    assert_eq!(reader.read_bit().unwrap(), Some(true), "Wrong first bit");
    assert!(reader.at_clean_end().unwrap(), "Padding not reported as a clean end");

    // Nonzero bits after the current position.
    let bytes = [0x81];
    let mut reader = BitReader::new(&bytes[..]);
    let _ = reader.read_bit().unwrap();
    assert!(!reader.at_clean_end().unwrap(), "Nonzero bits reported as a clean end");

    // More bytes after a zero byte.
    let bytes = [0x80, 0x00];
    let mut reader = BitReader::new(&bytes[..]);
    let _ = reader.read_bit().unwrap();
    assert!(!reader.at_clean_end().unwrap(), "A following byte reported as a clean end");
    assert!(!reader.is_aligned(), "Reader at a byte boundary after one bit");
    reader.align();
    assert!(reader.is_aligned(), "Reader not at a byte boundary after alignment");
    assert!(!reader.at_clean_end().unwrap(), "A following byte reported as a clean end after alignment");
}

//-----------------------------------------------------------------------------

// Tests for gamma coding.

fn gamma_bits(value: u64) -> Vec<bool> {
    let mut writer = BitWriter::new(Vec::new());
    writer.write_gamma(value).unwrap();
    let len = writer.bits_written() as usize;
    let bytes = writer.finish().unwrap();
    let mut reader = BitReader::new(&bytes[..]);
    (0..len).map(|_| reader.read_bit().unwrap().unwrap()).collect()
}

fn check_gamma(values: &[u64], name: &str) {
    let mut writer = BitWriter::new(Vec::new());
    let mut expected_len = 0;
    for value in values.iter() {
        let result = writer.write_gamma(*value);
        assert!(result.is_ok(), "Failed to encode {} in {}: {}", value, name, result.unwrap_err());
        expected_len += gamma_len(*value).unwrap() as u64;
    }
    assert_eq!(writer.bits_written(), expected_len, "Wrong total code length in {}", name);
    let bytes = writer.finish().unwrap();

    let mut reader = BitReader::new(&bytes[..]);
    for value in values.iter() {
        let result = reader.read_gamma();
        assert!(result.is_ok(), "Failed to decode {} in {}: {}", value, name, result.unwrap_err());
        assert_eq!(result.unwrap(), Some(*value), "Wrong decoded value in {}", name);
    }
    assert!(reader.at_clean_end().unwrap(), "Extra bits after the codes in {}", name);
}

#[test]
fn gamma_known_codes() {
    let truth: [(u64, &str); 8] = [
        (0, "0"),
        (1, "100"),
        (2, "101"),
        (3, "11000"),
        (4, "11001"),
        (6, "11011"),
        (7, "1110000"),
        (14, "1110111"),
    ];
    for (value, code) in truth.iter() {
        let expected: Vec<bool> = code.bytes().map(|c| c == b'1').collect();
        assert_eq!(gamma_bits(*value), expected, "Wrong gamma code for {}", value);
        assert_eq!(gamma_len(*value), Some(code.len()), "Wrong gamma code length for {}", value);
    }
}

#[test]
fn gamma_boundaries() {
    let mut values = Vec::new();
    for len in 0..63 {
        let low = (1u64 << len) - 1;
        values.push(low);
        values.push(low + 1);
        if low > 0 {
            values.push(low - 1);
        }
    }
    values.push(u64::MAX - 1);
    check_gamma(&values, "boundaries");

    let mut writer = BitWriter::new(Vec::new());
    assert!(writer.write_gamma(u64::MAX).is_err(), "Encoded u64::MAX");
    assert_eq!(gamma_len(u64::MAX), None, "Code length for u64::MAX");
}

#[test]
fn gamma_random_values() {
    let mut rng = StdRng::seed_from_u64(31);
    let values: Vec<u64> = (0..10000).map(|_| rng.gen_range(0..(1u64 << 31))).collect();
    check_gamma(&values, "random values");
    let small: Vec<u64> = (0..10000).map(|_| rng.gen_range(0..64)).collect();
    check_gamma(&small, "small random values");
}

#[test]
fn gamma_truncated() {
    let mut writer = BitWriter::new(Vec::new());
    writer.write_int(0b1111_1111, 8).unwrap();
    let bytes = writer.finish().unwrap();
    let mut reader = BitReader::new(&bytes[..]);
    assert_eq!(reader.read_gamma().unwrap(), None, "Decoded a truncated prefix");

    // Prefix 110 needs two more bits.
    let bytes = [0b1100_0000];
    let mut reader = BitReader::new(&bytes[..]);
    assert_eq!(reader.read_gamma().unwrap(), Some(3), "Wrong value before the padding");
    let bytes = [0b0001_1110];
    let mut reader = BitReader::new(&bytes[..]);
    for _ in 0..3 {
        assert_eq!(reader.read_gamma().unwrap(), Some(0), "Wrong zero code");
    }
    assert_eq!(reader.read_gamma().unwrap(), None, "Decoded a code truncated in the field");
}

#[test]
fn gamma_too_long() {
    let bytes = [0xFF; 9];
    let mut reader = BitReader::new(&bytes[..]);
    assert!(reader.read_gamma().is_err(), "Accepted a prefix of 64 ones");
}

//-----------------------------------------------------------------------------
