//! Interface for reading and writing glyph tables.

use core::{error, fmt, ops::RangeInclusive};

#[cfg(feature = "std")]
use crate::glyph::GlyphBitmap;
use crate::glyph::Glyph;

/// The number of bytes preceding the first glyph record.
pub const HEADER_SIZE: usize = 4;
/// The first character stored in a [`GlyphTable`].
pub const FIRST_CODE_POINT: char = ' ';
/// The last character stored in a [`GlyphTable`].
pub const LAST_CODE_POINT: char = '~';
/// The number of glyph records stored in a [`GlyphTable`].
pub const GLYPH_COUNT: usize = 95;

/// Returns the characters stored in a [`GlyphTable`], in record order.
pub const fn code_points() -> RangeInclusive<char> {
    FIRST_CODE_POINT..=LAST_CODE_POINT
}

/// Returns the index of the record storing `c`, or `None` if `c` is not part of a
/// [`GlyphTable`].
pub fn glyph_index(c: char) -> Option<usize> {
    if !code_points().contains(&c) {
        return None;
    }

    usize::try_from(u32::from(c) - u32::from(FIRST_CODE_POINT)).ok()
}

/// The dimensions, in pixels, of the cell shared by every glyph in a [`GlyphTable`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct CellSize {
    /// The width of each glyph.
    width: u8,
    /// The height of each glyph.
    height: u8,
}

impl CellSize {
    /// Creates a new [`CellSize`], returning `None` if either dimension is zero.
    pub const fn new(width: u8, height: u8) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }

        Some(Self { width, height })
    }

    /// Returns the width of a glyph in pixels.
    pub const fn width(&self) -> u8 {
        self.width
    }

    /// Returns the height of a glyph in pixels.
    pub const fn height(&self) -> u8 {
        self.height
    }

    /// Returns the number of bytes in a single row of a glyph.
    pub fn row_byte_count(&self) -> usize {
        usize::from(self.width.div_ceil(8))
    }

    /// Returns the number of bytes in a single glyph record.
    pub fn glyph_byte_count(&self) -> usize {
        self.row_byte_count() * usize::from(self.height)
    }

    /// Returns the total size of a [`GlyphTable`] with this [`CellSize`], header included.
    pub fn table_size(&self) -> usize {
        HEADER_SIZE + GLYPH_COUNT * self.glyph_byte_count()
    }

    /// Returns the header of a [`GlyphTable`] with this [`CellSize`].
    pub const fn header(&self) -> [u8; HEADER_SIZE] {
        [self.width, self.height, 0, 0]
    }
}

impl fmt::Display for CellSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A read-only view of a dumped glyph table.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct GlyphTable<'buffer> {
    /// The glyph records, header excluded.
    records: &'buffer [u8],
    /// The cell size of every glyph.
    cell: CellSize,
}

impl<'buffer> GlyphTable<'buffer> {
    /// Creates a new [`GlyphTable`] from a dumped blob.
    ///
    /// # Errors
    ///
    /// Returns [`TableError`] if the header is truncated or invalid, or if the blob does not
    /// hold exactly [`GLYPH_COUNT`] records.
    pub fn from_dump(dump: &'buffer [u8]) -> Result<Self, TableError> {
        let Some((header, records)) = dump.split_first_chunk::<HEADER_SIZE>() else {
            return Err(TableError::TruncatedHeader {
                actual_size: dump.len(),
            });
        };

        let [width, height, reserved_0, reserved_1] = *header;
        let cell =
            CellSize::new(width, height).ok_or(TableError::InvalidCellSize { width, height })?;
        if reserved_0 != 0 || reserved_1 != 0 {
            return Err(TableError::NonZeroReserved([reserved_0, reserved_1]));
        }

        if dump.len() != cell.table_size() {
            return Err(TableError::LengthMismatch {
                actual_size: dump.len(),
                expected_size: cell.table_size(),
            });
        }

        Ok(Self { records, cell })
    }

    /// Returns the [`CellSize`] of every [`Glyph`] in this [`GlyphTable`].
    pub const fn cell_size(&self) -> CellSize {
        self.cell
    }

    /// Returns the number of [`Glyph`]s in this [`GlyphTable`].
    pub const fn glyph_count(&self) -> usize {
        GLYPH_COUNT
    }

    /// Returns the [`Glyph`] at `index` or `None` if out of bounds.
    pub fn get(&self, index: usize) -> Option<Glyph<'buffer>> {
        let glyph_byte_count = self.cell.glyph_byte_count();
        let start = index.checked_mul(glyph_byte_count)?;
        let buffer = self.records.get(start..start.checked_add(glyph_byte_count)?)?;

        Some(Glyph::new(buffer, self.cell))
    }

    /// Returns the [`Glyph`] for `c` or `None` if `c` is not printable ASCII.
    pub fn glyph(&self, c: char) -> Option<Glyph<'buffer>> {
        self.get(glyph_index(c)?)
    }

    /// Returns an [`Iterator`] over every character and its [`Glyph`], in record order.
    pub fn glyphs(&self) -> impl Iterator<Item = (char, Glyph<'buffer>)> + '_ {
        code_points().filter_map(|c| Some((c, self.glyph(c)?)))
    }
}

/// Various errors that can occur when reading a [`GlyphTable`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum TableError {
    /// The blob is too small to hold a header.
    TruncatedHeader {
        /// The size of the blob.
        actual_size: usize,
    },
    /// The header declares a zero-sized cell.
    InvalidCellSize {
        /// The declared width.
        width: u8,
        /// The declared height.
        height: u8,
    },
    /// The reserved header bytes are not zero.
    NonZeroReserved([u8; 2]),
    /// The blob does not hold exactly [`GLYPH_COUNT`] records.
    LengthMismatch {
        /// The size of the blob.
        actual_size: usize,
        /// The size required by the header.
        expected_size: usize,
    },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TruncatedHeader { actual_size } => write!(
                f,
                "header is truncated: expected {HEADER_SIZE} bytes but got {actual_size} bytes"
            ),
            Self::InvalidCellSize { width, height } => {
                write!(f, "invalid cell size: {width}x{height}")
            }
            Self::NonZeroReserved([reserved_0, reserved_1]) => write!(
                f,
                "reserved header bytes are not zero: {reserved_0:02X} {reserved_1:02X}"
            ),
            Self::LengthMismatch {
                actual_size,
                expected_size,
            } => write!(
                f,
                "table size mismatch: expected {expected_size} bytes but got {actual_size} bytes"
            ),
        }
    }
}

impl error::Error for TableError {}

/// Builder for a valid [`GlyphTable`] dump.
#[cfg(feature = "std")]
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct GlyphTableWriter {
    /// The dump, header included.
    buffer: Vec<u8>,
    /// The cell size every pushed glyph must have.
    cell: CellSize,
    /// The number of glyphs pushed.
    count: usize,
}

#[cfg(feature = "std")]
impl GlyphTableWriter {
    /// Creates a new [`GlyphTableWriter`] for glyphs of `cell` size.
    pub fn new(cell: CellSize) -> Self {
        let mut buffer = Vec::with_capacity(cell.table_size());
        buffer.extend_from_slice(&cell.header());

        Self {
            buffer,
            cell,
            count: 0,
        }
    }

    /// Appends the record for `bitmap`, inverting every byte so that ink is stored as `0`.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::TableFull`] if [`GLYPH_COUNT`] glyphs were already pushed, and
    /// [`WriteError::MismatchedCellSize`] if `bitmap` does not match the table's cell.
    pub fn push(&mut self, bitmap: &GlyphBitmap) -> Result<(), WriteError> {
        if self.count == GLYPH_COUNT {
            return Err(WriteError::TableFull);
        }

        if bitmap.cell_size() != self.cell {
            return Err(WriteError::MismatchedCellSize {
                expected: self.cell,
                actual: bitmap.cell_size(),
            });
        }

        self.buffer
            .extend(bitmap.as_bytes().iter().map(|byte| byte ^ 0xFF));
        self.count += 1;
        Ok(())
    }

    /// Returns the finished dump.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::Incomplete`] if fewer than [`GLYPH_COUNT`] glyphs were pushed.
    pub fn finish(self) -> Result<Vec<u8>, WriteError> {
        if self.count != GLYPH_COUNT {
            return Err(WriteError::Incomplete { count: self.count });
        }

        Ok(self.buffer)
    }
}

/// Various errors that can occur when building a [`GlyphTable`] dump.
#[cfg(feature = "std")]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum WriteError {
    /// Every record has already been written.
    TableFull,
    /// A glyph does not fill exactly one cell.
    MismatchedCellSize {
        /// The cell size of the table.
        expected: CellSize,
        /// The cell size of the glyph.
        actual: CellSize,
    },
    /// The table was finished before every record was written.
    Incomplete {
        /// The number of records written.
        count: usize,
    },
}

#[cfg(feature = "std")]
impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TableFull => write!(f, "table already holds {GLYPH_COUNT} glyphs"),
            Self::MismatchedCellSize { expected, actual } => {
                write!(f, "glyph is {actual} but the table cell is {expected}")
            }
            Self::Incomplete { count } => {
                write!(f, "table holds {count} of {GLYPH_COUNT} glyphs")
            }
        }
    }
}

#[cfg(feature = "std")]
impl error::Error for WriteError {}
