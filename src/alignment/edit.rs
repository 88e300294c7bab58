//! Edit operations and their binary encoding.
//!
//! An [`Edit`] is a point difference between a read and the reference window it was aligned to.
//! Each edit has a position in the reference window and an [`EditTag`].
//! Position `i` refers to the base at offset `i` of the window, counting from 0.
//! Tags are stored as 4-bit codes and positions as gamma-coded deltas.

use crate::bitstream::{BitReader, BitWriter, GammaRead, GammaWrite};
use crate::{ReadzipError, Result};

use std::fmt::Display;
use std::io::{BufRead, Write};

//-----------------------------------------------------------------------------

/// The kind of an edit operation.
///
/// The tag determines both the operation and the base it introduces.
/// Each tag has a fixed 4-bit wire code and a one-character text symbol:
///
/// | Tag | Code | Symbol |
/// |-----|-----:|:------:|
/// | mismatch A, C, G, T, N | 0-4 | `A` `C` `G` `T` `N` |
/// | insertion A, C, G, T, N | 5-9 | `a` `c` `g` `t` `n` |
/// | deletion | 10 | `D` |
///
/// Codes 11 to 15 are unused.
///
/// # Examples
///
/// ```
/// use readzip::EditTag;
///
/// let tag = EditTag::from_symbol(b'g').unwrap();
/// assert_eq!(tag, EditTag::InsertionG);
/// assert_eq!(tag.code(), 7);
/// assert_eq!(tag.base(), Some(b'G'));
/// assert_eq!(EditTag::from_code(tag.code()), Some(tag));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EditTag {
    MismatchA,
    MismatchC,
    MismatchG,
    MismatchT,
    MismatchN,
    InsertionA,
    InsertionC,
    InsertionG,
    InsertionT,
    InsertionN,
    Deletion,
}

impl EditTag {
    /// Width of the wire code in bits.
    pub const WIDTH: usize = 4;

    /// All tags in wire code order.
    pub const ALL: [EditTag; 11] = [
        EditTag::MismatchA, EditTag::MismatchC, EditTag::MismatchG, EditTag::MismatchT, EditTag::MismatchN,
        EditTag::InsertionA, EditTag::InsertionC, EditTag::InsertionG, EditTag::InsertionT, EditTag::InsertionN,
        EditTag::Deletion,
    ];

    /// Returns the wire code of the tag.
    pub fn code(self) -> u64 {
        match self {
            EditTag::MismatchA => 0,
            EditTag::MismatchC => 1,
            EditTag::MismatchG => 2,
            EditTag::MismatchT => 3,
            EditTag::MismatchN => 4,
            EditTag::InsertionA => 5,
            EditTag::InsertionC => 6,
            EditTag::InsertionG => 7,
            EditTag::InsertionT => 8,
            EditTag::InsertionN => 9,
            EditTag::Deletion => 10,
        }
    }

    /// Returns the tag with the given wire code, or [`None`] if the code is unused.
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(EditTag::MismatchA),
            1 => Some(EditTag::MismatchC),
            2 => Some(EditTag::MismatchG),
            3 => Some(EditTag::MismatchT),
            4 => Some(EditTag::MismatchN),
            5 => Some(EditTag::InsertionA),
            6 => Some(EditTag::InsertionC),
            7 => Some(EditTag::InsertionG),
            8 => Some(EditTag::InsertionT),
            9 => Some(EditTag::InsertionN),
            10 => Some(EditTag::Deletion),
            _ => None,
        }
    }

    /// Returns the text symbol of the tag.
    pub fn symbol(self) -> u8 {
        match self {
            EditTag::MismatchA => b'A',
            EditTag::MismatchC => b'C',
            EditTag::MismatchG => b'G',
            EditTag::MismatchT => b'T',
            EditTag::MismatchN => b'N',
            EditTag::InsertionA => b'a',
            EditTag::InsertionC => b'c',
            EditTag::InsertionG => b'g',
            EditTag::InsertionT => b't',
            EditTag::InsertionN => b'n',
            EditTag::Deletion => b'D',
        }
    }

    /// Returns the tag with the given text symbol, or [`None`] if the symbol is not recognized.
    pub fn from_symbol(symbol: u8) -> Option<Self> {
        match symbol {
            b'A' => Some(EditTag::MismatchA),
            b'C' => Some(EditTag::MismatchC),
            b'G' => Some(EditTag::MismatchG),
            b'T' => Some(EditTag::MismatchT),
            b'N' => Some(EditTag::MismatchN),
            b'a' => Some(EditTag::InsertionA),
            b'c' => Some(EditTag::InsertionC),
            b'g' => Some(EditTag::InsertionG),
            b't' => Some(EditTag::InsertionT),
            b'n' => Some(EditTag::InsertionN),
            b'D' => Some(EditTag::Deletion),
            _ => None,
        }
    }

    /// Returns the mismatch tag for the given base, or [`None`] if the base is not in `ACGTN`.
    pub fn mismatch(base: u8) -> Option<Self> {
        match base {
            b'A' => Some(EditTag::MismatchA),
            b'C' => Some(EditTag::MismatchC),
            b'G' => Some(EditTag::MismatchG),
            b'T' => Some(EditTag::MismatchT),
            b'N' => Some(EditTag::MismatchN),
            _ => None,
        }
    }

    /// Returns the insertion tag for the given base, or [`None`] if the base is not in `ACGTN`.
    pub fn insertion(base: u8) -> Option<Self> {
        Self::mismatch(base).map(|tag| Self::ALL[tag.code() as usize + 5])
    }

    /// Returns the base introduced by the edit, or [`None`] for a deletion.
    pub fn base(self) -> Option<u8> {
        match self {
            EditTag::MismatchA | EditTag::InsertionA => Some(b'A'),
            EditTag::MismatchC | EditTag::InsertionC => Some(b'C'),
            EditTag::MismatchG | EditTag::InsertionG => Some(b'G'),
            EditTag::MismatchT | EditTag::InsertionT => Some(b'T'),
            EditTag::MismatchN | EditTag::InsertionN => Some(b'N'),
            EditTag::Deletion => None,
        }
    }

    /// Returns `true` if the tag is a mismatch.
    #[inline]
    pub fn is_mismatch(self) -> bool {
        self.code() < 5
    }

    /// Returns `true` if the tag is an insertion.
    #[inline]
    pub fn is_insertion(self) -> bool {
        (5..10).contains(&self.code())
    }

    /// Returns `true` if the tag is a deletion.
    #[inline]
    pub fn is_deletion(self) -> bool {
        self == EditTag::Deletion
    }
}

impl Display for EditTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol() as char)
    }
}

//-----------------------------------------------------------------------------

/// An edit operation at an offset of the reference window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edit {
    /// Offset of the edited base in the reference window.
    ///
    /// Insertions go before the base, and an insertion at the window length appends to the read.
    pub pos: usize,
    /// The operation.
    pub tag: EditTag,
}

impl Edit {
    /// Creates a new edit.
    pub fn new(pos: usize, tag: EditTag) -> Self {
        Edit { pos, tag }
    }
}

//-----------------------------------------------------------------------------

// Conversions between wire integers and positions.

fn to_wire(value: usize) -> u64 {
    value as u64
}

fn from_wire(value: u64, field: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| {
        ReadzipError::Format(format!("Value {} of {} does not fit in usize", value, field))
    })
}

/// Writes a single edit operation as a gamma-coded relative position followed by a 4-bit tag.
pub fn write_edit_op<W: Write>(writer: &mut BitWriter<W>, relative_pos: usize, tag: EditTag) -> Result<()> {
    writer.write_gamma(to_wire(relative_pos))?;
    writer.write_int(tag.code(), EditTag::WIDTH)
}

/// Reads a single edit operation written with [`write_edit_op`].
///
/// Returns the relative position and the tag.
/// Running out of bits is an error, as an edit operation is always in the middle of a record.
pub fn read_edit_op<R: BufRead>(reader: &mut BitReader<R>) -> Result<(usize, EditTag)> {
    let delta = reader.read_gamma()?.ok_or(ReadzipError::UnexpectedEnd("edit position"))?;
    let delta = from_wire(delta, "edit position")?;
    let code = reader.read_int(EditTag::WIDTH)?.ok_or(ReadzipError::UnexpectedEnd("edit tag"))?;
    let tag = EditTag::from_code(code).ok_or_else(|| {
        ReadzipError::Data(format!("Invalid edit tag code: {}", code))
    })?;
    Ok((delta, tag))
}

/// Writes an edit list as a gamma-coded count followed by the edits.
///
/// Each position is stored as a delta from the previous position.
/// Returns an error if the positions decrease.
pub fn write_edits<W: Write>(writer: &mut BitWriter<W>, edits: &[Edit]) -> Result<()> {
    writer.write_gamma(to_wire(edits.len()))?;
    let mut prev = 0;
    for edit in edits.iter() {
        if edit.pos < prev {
            return Err(ReadzipError::Data(format!("Edit positions decrease from {} to {}", prev, edit.pos)));
        }
        write_edit_op(writer, edit.pos - prev, edit.tag)?;
        prev = edit.pos;
    }
    Ok(())
}

/// Reads an edit list written with [`write_edits`].
pub fn read_edits<R: BufRead>(reader: &mut BitReader<R>) -> Result<Vec<Edit>> {
    let count = reader.read_gamma()?.ok_or(ReadzipError::UnexpectedEnd("edit count"))?;
    let count = from_wire(count, "edit count")?;
    // The count comes from the stream, so it is not trusted for preallocation.
    let mut result = Vec::with_capacity(count.min(1024));
    let mut pos: usize = 0;
    for _ in 0..count {
        let (delta, tag) = read_edit_op(reader)?;
        pos = pos.checked_add(delta).ok_or_else(|| {
            ReadzipError::Format(String::from("Edit position overflow"))
        })?;
        result.push(Edit::new(pos, tag));
    }
    Ok(result)
}

//-----------------------------------------------------------------------------


//-----------------------------------------------------------------------------
