//! PLY file writing from columnar records

use super::{VERTEX_ELEMENT, scalar_type};
use crate::cloud::PointCloud;
use crate::error::DataError;
use ply_rs::ply::{DefaultElement, ElementDef, Encoding, Header, PropertyDef, PropertyType};
use ply_rs::writer::Writer;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Write `cloud` as a binary little endian PLY with a single `vertex` element.
///
/// Returns the number of bytes written.
#[tracing::instrument(skip_all, fields(path = %path.display(), points = cloud.len()))]
pub fn write_point_cloud(cloud: &PointCloud, path: &Path) -> Result<usize, DataError> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    let written = write_point_cloud_to(cloud, &mut out)?;
    out.flush()?;
    debug!("Wrote {} bytes to {}", written, path.display());
    Ok(written)
}

/// Same as [`write_point_cloud`] for an arbitrary sink.
pub fn write_point_cloud_to<W: Write>(cloud: &PointCloud, out: &mut W) -> Result<usize, DataError> {
    let mut header = Header::new();
    header.encoding = Encoding::BinaryLittleEndian;

    let mut element = ElementDef::new(VERTEX_ELEMENT.to_string());
    for column in cloud.columns() {
        let data_type = PropertyType::Scalar(scalar_type(column.data.kind()));
        element
            .properties
            .insert(column.name.clone(), PropertyDef::new(column.name.clone(), data_type));
    }
    element.count = cloud.len();
    header.elements.insert(VERTEX_ELEMENT.to_string(), element);

    let writer = Writer::<DefaultElement>::new();
    let mut written = writer.write_header(out, &header)?;

    let row_size: usize = cloud.columns().iter().map(|c| c.data.kind().size()).sum();
    let mut row = Vec::with_capacity(row_size);
    for i in 0..cloud.len() {
        row.clear();
        for column in cloud.columns() {
            column.data.extend_le_bytes(i, &mut row);
        }
        out.write_all(&row)?;
        written += row.len();
    }
    Ok(written)
}
