//! Tool for converting BDF bitmap fonts into the fixed-width [`GlyphTable`][gt] dump format.
//!
//! [gt]: font::table::GlyphTable

use core::{error, fmt};
use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use anyhow::{Context, Result};
use font::{
    glyph::GlyphBitmap,
    table::{CellSize, GLYPH_COUNT, GlyphTableWriter, WriteError, code_points},
};
use log::{Level, debug, info, log_enabled};

pub mod bdf_source;
pub mod output;

pub use bdf_source::BdfFont;

/// A font that can provide every glyph of a [`GlyphTable`][gt] rasterized into a single cell.
///
/// [gt]: font::table::GlyphTable
pub trait FontSource {
    /// Returns the width and height of the bounding box shared by every glyph.
    fn bounding_box(&self) -> (u32, u32);

    /// Returns the glyph for `code_point` rasterized into the bounding box, or `None` if the
    /// font has no such glyph.
    fn glyph(&self, code_point: char) -> Option<GlyphBitmap>;
}

/// Converts every printable ASCII glyph of `source` into a [`GlyphTable`][gt] dump.
///
/// # Errors
///
/// Returns [`ConvertError`] if the bounding box does not fit in a byte per dimension, if a
/// glyph is missing, or if a glyph does not fill exactly one cell.
///
/// [gt]: font::table::GlyphTable
pub fn convert<S: FontSource + ?Sized>(source: &S) -> Result<Vec<u8>, ConvertError> {
    let (width, height) = source.bounding_box();
    let cell = u8::try_from(width)
        .ok()
        .zip(u8::try_from(height).ok())
        .and_then(|(width, height)| CellSize::new(width, height))
        .ok_or(ConvertError::CellSizeOutOfRange { width, height })?;

    info!("converting {GLYPH_COUNT} glyphs into {cell} cells");

    let mut writer = GlyphTableWriter::new(cell);
    for code_point in code_points() {
        let bitmap = source
            .glyph(code_point)
            .ok_or(ConvertError::MissingGlyph(code_point))?;
        if bitmap.cell_size() != cell {
            return Err(ConvertError::MismatchedGlyph {
                code_point,
                expected: cell,
                actual: bitmap.cell_size(),
            });
        }

        if log_enabled!(Level::Debug) {
            debug!(
                "{code_point:?} (U+{:04X}) {}\n{bitmap}",
                u32::from(code_point),
                hex_rows(&bitmap)
            );
        }

        writer.push(&bitmap)?;
    }

    Ok(writer.finish()?)
}

/// Parses `reader` as a BDF font and converts it into a [`GlyphTable`][gt] dump.
///
/// # Errors
///
/// Returns [`Err`] if `reader` is not a valid BDF font or if [`convert`] fails.
///
/// [gt]: font::table::GlyphTable
pub fn convert_bdf<R: Read>(reader: R) -> Result<Vec<u8>> {
    let font = BdfFont::read(reader)?;
    Ok(convert(&font)?)
}

/// Converts the BDF font at `input` and writes the [`GlyphTable`][gt] dump to `output`.
///
/// The whole table is produced before `output` is touched, and `output` is replaced atomically,
/// so a failed conversion leaves any previous `output` in place.
///
/// # Errors
///
/// Returns [`Err`] if `input` cannot be read or converted, or if `output` cannot be written.
///
/// [gt]: font::table::GlyphTable
pub fn convert_file(input: &Path, output: &Path) -> Result<()> {
    let file = File::open(input).with_context(|| format!("error opening {}", input.display()))?;
    let table = convert_bdf(BufReader::new(file))
        .with_context(|| format!("error converting {}", input.display()))?;

    output::write_atomically(output, &table)
        .with_context(|| format!("error writing {}", output.display()))?;
    info!("wrote {} bytes to {}", table.len(), output.display());
    Ok(())
}

/// Returns the raw rows of `bitmap` as space separated uppercase hex.
fn hex_rows(bitmap: &GlyphBitmap) -> String {
    bitmap
        .rows()
        .map(|row| row.iter().map(|byte| format!("{byte:02X}")).collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Various errors that can occur while converting a [`FontSource`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConvertError {
    /// The bounding box is empty or does not fit in a byte per dimension.
    CellSizeOutOfRange {
        /// The width of the bounding box.
        width: u32,
        /// The height of the bounding box.
        height: u32,
    },
    /// The font has no glyph for a printable ASCII character.
    MissingGlyph(char),
    /// A glyph was not rasterized into exactly one cell.
    MismatchedGlyph {
        /// The character of the offending glyph.
        code_point: char,
        /// The cell size of the font.
        expected: CellSize,
        /// The cell size of the glyph.
        actual: CellSize,
    },
    /// The glyph table could not be built.
    Table(WriteError),
}

impl From<WriteError> for ConvertError {
    fn from(value: WriteError) -> Self {
        Self::Table(value)
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CellSizeOutOfRange { width, height } => write!(
                f,
                "bounding box {width}x{height} is outside of the supported 1x1 to 255x255 range"
            ),
            Self::MissingGlyph(code_point) => write!(
                f,
                "font has no glyph for {code_point:?} (U+{:04X})",
                u32::from(*code_point)
            ),
            Self::MismatchedGlyph {
                code_point,
                expected,
                actual,
            } => write!(
                f,
                "glyph for {code_point:?} is {actual} but the font cell is {expected}"
            ),
            Self::Table(error) => write!(f, "error building glyph table: {error}"),
        }
    }
}

impl error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Table(error) => Some(error),
            _ => None,
        }
    }
}
