//! PLY file loading into columnar records
//!
//! The header is parsed by `ply-rs`; the `vertex` payload is decoded straight into
//! typed column vectors so memory stays close to the on-disk size.

use super::{VERTEX_ELEMENT, scalar_kind};
use crate::cloud::{Column, ColumnData, PointCloud};
use crate::error::DataError;
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Encoding, PropertyType};
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::path::Path;
use tracing::{debug, info, warn};

/// Upper bound on rows reserved up front, since the header count is untrusted.
const PREALLOCATE_ROWS: usize = 1 << 22;

/// Load the `vertex` element of a PLY file as a columnar record.
///
/// Every scalar property becomes a column with its on-disk type, in header order.
/// Other elements are ignored.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn read_point_cloud(path: &Path) -> Result<PointCloud, DataError> {
    debug!("Loading PLY record from: {}", path.display());
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    read_point_cloud_from(&mut reader)
}

/// Same as [`read_point_cloud`] for an already open source.
pub fn read_point_cloud_from<R: BufRead>(reader: &mut R) -> Result<PointCloud, DataError> {
    let parser = Parser::<DefaultElement>::new();
    let header = parser.read_header(reader).map_err(|e| {
        warn!("Failed to parse PLY header: {}", e);
        DataError::Format(e.to_string())
    })?;

    let element = header.elements.get(VERTEX_ELEMENT).ok_or_else(|| {
        DataError::Format(format!("no '{}' element in header", VERTEX_ELEMENT))
    })?;

    let capacity = element.count.min(PREALLOCATE_ROWS);
    let mut columns = Vec::with_capacity(element.properties.len());
    for (name, property) in element.properties.iter() {
        let kind = match &property.data_type {
            PropertyType::Scalar(scalar) => scalar_kind(scalar),
            PropertyType::List(..) => {
                return Err(DataError::Format(format!(
                    "list property '{}' is not supported in '{}'",
                    name, VERTEX_ELEMENT
                )));
            }
        };
        columns.push(Column::new(name.clone(), ColumnData::with_capacity(kind, capacity)));
    }

    // elements are stored in header order, so anything declared first must be consumed
    for (name, preceding) in header.elements.iter() {
        if name == VERTEX_ELEMENT {
            break;
        }
        debug!("Skipping {} '{}' rows before vertices", preceding.count, name);
        parser
            .read_payload_for_element(reader, preceding, &header)
            .map_err(|e| DataError::Format(format!("element '{}': {}", name, e)))?;
    }

    match header.encoding {
        Encoding::Ascii => read_ascii_rows(reader, &mut columns, element.count)?,
        Encoding::BinaryLittleEndian => read_binary_rows(reader, &mut columns, element.count, false)?,
        Encoding::BinaryBigEndian => read_binary_rows(reader, &mut columns, element.count, true)?,
    }

    let skipped: Vec<&str> = header
        .elements
        .keys()
        .map(String::as_str)
        .filter(|name| *name != VERTEX_ELEMENT)
        .collect();
    if !skipped.is_empty() {
        debug!("Ignoring non-vertex elements: {:?}", skipped);
    }

    let cloud = PointCloud::new(columns)?;
    info!(
        "PLY file parsed: {} vertices, {} fields",
        cloud.len(),
        cloud.columns().len()
    );
    Ok(cloud)
}

/// One whitespace separated line per vertex, values in header order.
fn read_ascii_rows<R: BufRead>(
    reader: &mut R,
    columns: &mut [Column],
    count: usize,
) -> Result<(), DataError> {
    let mut line = String::new();
    for i in 0..count {
        line.clear();
        let read = reader
            .read_line(&mut line)
            .map_err(|e| DataError::Format(format!("vertex {}: {}", i, e)))?;
        if read == 0 {
            return Err(truncated(i, count));
        }

        let mut tokens = line.split_whitespace();
        for column in columns.iter_mut() {
            let token = tokens.next().ok_or_else(|| {
                DataError::Format(format!("missing '{}' at vertex {}", column.name, i))
            })?;
            if !push_token(&mut column.data, token) {
                return Err(DataError::Format(format!(
                    "'{}' at vertex {} is not a valid {}: {:?}",
                    column.name,
                    i,
                    column.data.kind().name(),
                    token
                )));
            }
        }
        if tokens.next().is_some() {
            return Err(DataError::Format(format!(
                "vertex {} has more values than declared properties",
                i
            )));
        }
    }
    Ok(())
}

/// Fixed-size records, properties packed in header order without padding.
fn read_binary_rows<R: Read>(
    reader: &mut R,
    columns: &mut [Column],
    count: usize,
    big_endian: bool,
) -> Result<(), DataError> {
    let row_size: usize = columns.iter().map(|c| c.data.kind().size()).sum();
    let mut row = vec![0u8; row_size];
    for i in 0..count {
        reader.read_exact(&mut row).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => truncated(i, count),
            _ => DataError::Io(e),
        })?;

        let mut offset = 0;
        for column in columns.iter_mut() {
            let size = column.data.kind().size();
            push_bytes(&mut column.data, &row[offset..offset + size], big_endian);
            offset += size;
        }
    }
    Ok(())
}

fn truncated(read: usize, count: usize) -> DataError {
    DataError::Format(format!(
        "payload ends after {} of {} vertices",
        read, count
    ))
}

fn push_token(data: &mut ColumnData, token: &str) -> bool {
    macro_rules! parse_into {
        ($values:ident, $ty:ty) => {
            match token.parse::<$ty>() {
                Ok(value) => $values.push(value),
                Err(_) => return false,
            }
        };
    }

    match data {
        ColumnData::I8(values) => parse_into!(values, i8),
        ColumnData::U8(values) => parse_into!(values, u8),
        ColumnData::I16(values) => parse_into!(values, i16),
        ColumnData::U16(values) => parse_into!(values, u16),
        ColumnData::I32(values) => parse_into!(values, i32),
        ColumnData::U32(values) => parse_into!(values, u32),
        ColumnData::F32(values) => parse_into!(values, f32),
        ColumnData::F64(values) => parse_into!(values, f64),
    }
    true
}

// `bytes` is exactly one value wide; the row layout is derived from the same kinds.
fn push_bytes(data: &mut ColumnData, bytes: &[u8], big_endian: bool) {
    macro_rules! decode_into {
        ($values:ident, $ty:ty) => {{
            let mut raw = [0u8; std::mem::size_of::<$ty>()];
            raw.copy_from_slice(bytes);
            $values.push(if big_endian {
                <$ty>::from_be_bytes(raw)
            } else {
                <$ty>::from_le_bytes(raw)
            });
        }};
    }

    match data {
        ColumnData::I8(values) => decode_into!(values, i8),
        ColumnData::U8(values) => decode_into!(values, u8),
        ColumnData::I16(values) => decode_into!(values, i16),
        ColumnData::U16(values) => decode_into!(values, u16),
        ColumnData::I32(values) => decode_into!(values, i32),
        ColumnData::U32(values) => decode_into!(values, u32),
        ColumnData::F32(values) => decode_into!(values, f32),
        ColumnData::F64(values) => decode_into!(values, f64),
    }
}
