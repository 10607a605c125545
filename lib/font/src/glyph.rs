//! Interface for interacting with glyphs.
//!
//! Stored records use inverted polarity: a `0` bit is ink. [`Glyph`] undoes the inversion, so
//! every pixel [`Iterator`] in this module yields `true` for ink.

use core::fmt;

use crate::table::CellSize;

/// Stores the on/off layout of a specific glyph in a [`GlyphTable`][gt].
///
/// [gt]: crate::table::GlyphTable
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Glyph<'buffer> {
    /// The record of this glyph.
    buffer: &'buffer [u8],
    /// The cell size of the glyph.
    cell: CellSize,
}

impl<'buffer> Glyph<'buffer> {
    /// Creates a new [`Glyph`] over a single stored record.
    pub(crate) const fn new(buffer: &'buffer [u8], cell: CellSize) -> Self {
        Self { buffer, cell }
    }

    /// Returns the [`CellSize`] of the [`Glyph`].
    pub const fn cell_size(&self) -> CellSize {
        self.cell
    }

    /// Returns the stored record, with ink as `0` bits.
    pub const fn as_bytes(&self) -> &'buffer [u8] {
        self.buffer
    }

    /// Returns whether the pixel at (`x`, `y`) is ink, or `None` if out of bounds.
    pub fn get(&self, x: u8, y: u8) -> Option<bool> {
        if x >= self.cell.width() || y >= self.cell.height() {
            return None;
        }

        let index = usize::from(y) * self.cell.row_byte_count() + usize::from(x / 8);
        Some(self.buffer[index] & pixel_mask(x) == 0)
    }
}

impl<'buffer> IntoIterator for Glyph<'buffer> {
    type IntoIter = GlyphRowsIter<'buffer>;
    type Item = GlyphRow<'buffer>;

    fn into_iter(self) -> Self::IntoIter {
        GlyphRowsIter {
            buffer: self.buffer,
            cell: self.cell,
            index: 0,
        }
    }
}

impl fmt::Display for Glyph<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in *self {
            for ink in row {
                f.write_str(if ink { "#" } else { "." })?;
            }
            f.write_str("\n")?;
        }

        Ok(())
    }
}

/// An [`Iterator`] over the rows of a [`Glyph`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct GlyphRowsIter<'buffer> {
    /// The record of the glyph.
    buffer: &'buffer [u8],
    /// The cell size of the glyph.
    cell: CellSize,
    /// The index of the row that will be returned next.
    index: u8,
}

impl<'buffer> Iterator for GlyphRowsIter<'buffer> {
    type Item = GlyphRow<'buffer>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.cell.height() {
            return None;
        }

        let row_byte_count = self.cell.row_byte_count();
        let row_index = row_byte_count * usize::from(self.index);

        self.index += 1;
        let row = GlyphRow {
            buffer: &self.buffer[row_index..row_index + row_byte_count],
            width: self.cell.width(),
        };
        Some(row)
    }
}

/// A row in the [`Glyph`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct GlyphRow<'buffer> {
    /// The buffer utilized to store the glyph row.
    buffer: &'buffer [u8],
    /// The width of the row.
    width: u8,
}

impl<'buffer> IntoIterator for GlyphRow<'buffer> {
    type Item = bool;
    type IntoIter = GlyphRowIter<'buffer>;

    fn into_iter(self) -> Self::IntoIter {
        GlyphRowIter {
            buffer: self.buffer,
            width: self.width,
            index: 0,
        }
    }
}

/// An [`Iterator`] over the pixels in a [`GlyphRow`], yielding `true` for ink.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct GlyphRowIter<'buffer> {
    /// The buffer used to store the glyph's row.
    buffer: &'buffer [u8],
    /// The width of the row.
    width: u8,
    /// The index of the pixel value to be returned.
    index: u8,
}

impl Iterator for GlyphRowIter<'_> {
    type Item = bool;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.width {
            return None;
        }

        let byte = self.buffer[usize::from(self.index / 8)];
        let ink = byte & pixel_mask(self.index) == 0;

        self.index += 1;
        Some(ink)
    }
}

/// An owned, uninverted raster of a single glyph cell.
///
/// Rows are stored MSB first and padded to a whole byte; padding bits are always clear.
#[cfg(feature = "std")]
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct GlyphBitmap {
    /// The raster, `1` bits are ink.
    buffer: Box<[u8]>,
    /// The cell size of the raster.
    cell: CellSize,
}

#[cfg(feature = "std")]
impl GlyphBitmap {
    /// Creates a new [`GlyphBitmap`] of `cell` size without any ink.
    pub fn new(cell: CellSize) -> Self {
        Self {
            buffer: vec![0; cell.glyph_byte_count()].into_boxed_slice(),
            cell,
        }
    }

    /// Returns the [`CellSize`] of the [`GlyphBitmap`].
    pub const fn cell_size(&self) -> CellSize {
        self.cell
    }

    /// Returns the raw rows of the [`GlyphBitmap`].
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Returns an [`Iterator`] over the raw bytes of each row.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.buffer.chunks_exact(self.cell.row_byte_count())
    }

    /// Returns whether the pixel at (`x`, `y`) is ink, or `None` if out of bounds.
    pub fn get(&self, x: u8, y: u8) -> Option<bool> {
        let index = self.byte_index(x, y)?;
        Some(self.buffer[index] & pixel_mask(x) != 0)
    }

    /// Marks the pixel at (`x`, `y`) as ink or background.
    ///
    /// # Panics
    ///
    /// Panics if (`x`, `y`) lies outside of the cell.
    pub fn set(&mut self, x: u8, y: u8, ink: bool) {
        let Some(index) = self.byte_index(x, y) else {
            panic!("pixel ({x}, {y}) is outside of a {} cell", self.cell);
        };

        if ink {
            self.buffer[index] |= pixel_mask(x);
        } else {
            self.buffer[index] &= !pixel_mask(x);
        }
    }

    /// Returns the index of the byte storing the pixel at (`x`, `y`).
    fn byte_index(&self, x: u8, y: u8) -> Option<usize> {
        if x >= self.cell.width() || y >= self.cell.height() {
            return None;
        }

        Some(usize::from(y) * self.cell.row_byte_count() + usize::from(x / 8))
    }
}

#[cfg(feature = "std")]
impl fmt::Display for GlyphBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.cell.height() {
            for x in 0..self.cell.width() {
                let ink = self.get(x, y).unwrap_or(false);
                f.write_str(if ink { "#" } else { "." })?;
            }
            f.write_str("\n")?;
        }

        Ok(())
    }
}

/// Returns the mask selecting pixel `x` within its byte.
const fn pixel_mask(x: u8) -> u8 {
    0x80 >> (x % 8)
}
