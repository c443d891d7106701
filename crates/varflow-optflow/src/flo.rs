use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use varflow_image::{Image, ImageSize};

use crate::error::FlowError;
use crate::field::FlowField;

/// The tag opening every `.flo` file, `PIEH` when read as bytes.
pub const FLO_MAGIC: f32 = 202021.25;

// sanity bound on each dimension read from a file
const MAX_DIMENSION: usize = 1 << 16;

/// Write a flow field in the Middlebury `.flo` format.
///
/// The file holds the magic number, the width and height as little endian `i32`
/// and the interleaved `(u, v)` pairs as little endian `f32`, row by row.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_flo(path: impl AsRef<Path>, flow: &FlowField) -> Result<(), FlowError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_flo_to(&mut writer, flow)?;
    writer.flush()?;
    Ok(())
}

/// Write a flow field in the `.flo` format to any writer.
///
/// # Errors
///
/// Returns an error if writing fails or the field is too large for the format.
pub fn write_flo_to<W: Write>(writer: &mut W, flow: &FlowField) -> Result<(), FlowError> {
    let size = flow.size();
    let width = i32::try_from(size.width)
        .map_err(|_| FlowError::InvalidFloFile(format!("width {} does not fit", size.width)))?;
    let height = i32::try_from(size.height)
        .map_err(|_| FlowError::InvalidFloFile(format!("height {} does not fit", size.height)))?;

    writer.write_all(&FLO_MAGIC.to_le_bytes())?;
    writer.write_all(&width.to_le_bytes())?;
    writer.write_all(&height.to_le_bytes())?;

    let cols = size.width.max(1);
    let mut row = Vec::with_capacity(cols * 8);
    let (u, v) = (flow.u().as_slice(), flow.v().as_slice());
    for (row_u, row_v) in u.chunks_exact(cols).zip(v.chunks_exact(cols)) {
        row.clear();
        for (&du, &dv) in row_u.iter().zip(row_v) {
            row.extend_from_slice(&(du as f32).to_le_bytes());
            row.extend_from_slice(&(dv as f32).to_le_bytes());
        }
        writer.write_all(&row)?;
    }
    Ok(())
}

/// Read a flow field from a Middlebury `.flo` file.
///
/// # Errors
///
/// Returns [`FlowError::InvalidFloFile`] if the file is truncated, does not start
/// with [`FLO_MAGIC`] or declares an invalid size.
pub fn read_flo(path: impl AsRef<Path>) -> Result<FlowField, FlowError> {
    let mut reader = BufReader::new(File::open(path)?);
    read_flo_from(&mut reader)
}

fn read_4<R: Read>(reader: &mut R, what: &str) -> Result<[u8; 4], FlowError> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => {
            FlowError::InvalidFloFile(format!("truncated while reading {what}"))
        }
        _ => FlowError::Io(e),
    })?;
    Ok(buf)
}

fn read_dimension<R: Read>(reader: &mut R, what: &str) -> Result<usize, FlowError> {
    let value = i32::from_le_bytes(read_4(reader, what)?);
    match usize::try_from(value) {
        Ok(d) if (1..=MAX_DIMENSION).contains(&d) => Ok(d),
        _ => Err(FlowError::InvalidFloFile(format!("invalid {what} {value}"))),
    }
}

/// Read a flow field in the `.flo` format from any reader.
///
/// # Errors
///
/// See [`read_flo`].
pub fn read_flo_from<R: Read>(reader: &mut R) -> Result<FlowField, FlowError> {
    let magic = f32::from_le_bytes(read_4(reader, "magic")?);
    if magic != FLO_MAGIC {
        return Err(FlowError::InvalidFloFile(format!(
            "bad magic {magic}, expected {FLO_MAGIC}"
        )));
    }
    let width = read_dimension(reader, "width")?;
    let height = read_dimension(reader, "height")?;
    let size = ImageSize { width, height };

    let mut u = Image::from_size_val(size, 0.0)?;
    let mut v = Image::from_size_val(size, 0.0)?;
    for (du, dv) in u.as_slice_mut().iter_mut().zip(v.as_slice_mut()) {
        *du = f32::from_le_bytes(read_4(reader, "flow data")?) as f64;
        *dv = f32::from_le_bytes(read_4(reader, "flow data")?) as f64;
    }

    FlowField::new(u, v)
}
