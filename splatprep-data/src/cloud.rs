//! Columnar point-cloud records.
//!
//! A [`PointCloud`] is an ordered list of named, typed columns that all share the
//! same length. The column set comes from the source file, so nothing here knows
//! about splat-specific fields beyond the `x`/`y`/`z` convenience accessors.

use crate::error::DataError;
use glam::Vec3;
use std::collections::HashSet;

/// Scalar type stored in a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl ScalarKind {
    /// PLY spelling of the type.
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::I8 => "char",
            ScalarKind::U8 => "uchar",
            ScalarKind::I16 => "short",
            ScalarKind::U16 => "ushort",
            ScalarKind::I32 => "int",
            ScalarKind::U32 => "uint",
            ScalarKind::F32 => "float",
            ScalarKind::F64 => "double",
        }
    }

    /// Width of one value in bytes.
    pub fn size(self) -> usize {
        match self {
            ScalarKind::I8 | ScalarKind::U8 => 1,
            ScalarKind::I16 | ScalarKind::U16 => 2,
            ScalarKind::I32 | ScalarKind::U32 | ScalarKind::F32 => 4,
            ScalarKind::F64 => 8,
        }
    }
}

/// Typed values of a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    I32(Vec<i32>),
    U32(Vec<u32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

macro_rules! dispatch {
    ($data:expr, $values:ident => $body:expr) => {
        match $data {
            ColumnData::I8($values) => $body,
            ColumnData::U8($values) => $body,
            ColumnData::I16($values) => $body,
            ColumnData::U16($values) => $body,
            ColumnData::I32($values) => $body,
            ColumnData::U32($values) => $body,
            ColumnData::F32($values) => $body,
            ColumnData::F64($values) => $body,
        }
    };
}

macro_rules! map_same {
    ($data:expr, $values:ident => $body:expr) => {
        match $data {
            ColumnData::I8($values) => ColumnData::I8($body),
            ColumnData::U8($values) => ColumnData::U8($body),
            ColumnData::I16($values) => ColumnData::I16($body),
            ColumnData::U16($values) => ColumnData::U16($body),
            ColumnData::I32($values) => ColumnData::I32($body),
            ColumnData::U32($values) => ColumnData::U32($body),
            ColumnData::F32($values) => ColumnData::F32($body),
            ColumnData::F64($values) => ColumnData::F64($body),
        }
    };
}

fn select<T: Copy>(values: &[T], mask: &[bool]) -> Vec<T> {
    values
        .iter()
        .zip(mask)
        .filter(|(_, keep)| **keep)
        .map(|(value, _)| *value)
        .collect()
}

impl ColumnData {
    /// Empty column of the given kind with room for `capacity` values.
    pub fn with_capacity(kind: ScalarKind, capacity: usize) -> Self {
        match kind {
            ScalarKind::I8 => ColumnData::I8(Vec::with_capacity(capacity)),
            ScalarKind::U8 => ColumnData::U8(Vec::with_capacity(capacity)),
            ScalarKind::I16 => ColumnData::I16(Vec::with_capacity(capacity)),
            ScalarKind::U16 => ColumnData::U16(Vec::with_capacity(capacity)),
            ScalarKind::I32 => ColumnData::I32(Vec::with_capacity(capacity)),
            ScalarKind::U32 => ColumnData::U32(Vec::with_capacity(capacity)),
            ScalarKind::F32 => ColumnData::F32(Vec::with_capacity(capacity)),
            ScalarKind::F64 => ColumnData::F64(Vec::with_capacity(capacity)),
        }
    }

    pub fn kind(&self) -> ScalarKind {
        match self {
            ColumnData::I8(_) => ScalarKind::I8,
            ColumnData::U8(_) => ScalarKind::U8,
            ColumnData::I16(_) => ScalarKind::I16,
            ColumnData::U16(_) => ScalarKind::U16,
            ColumnData::I32(_) => ScalarKind::I32,
            ColumnData::U32(_) => ScalarKind::U32,
            ColumnData::F32(_) => ScalarKind::F32,
            ColumnData::F64(_) => ScalarKind::F64,
        }
    }

    pub fn len(&self) -> usize {
        dispatch!(self, values => values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `index` widened to `f64`.
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        dispatch!(self, values => values.get(index).map(|v| f64::from(*v)))
    }

    /// All values widened to `f64`.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        dispatch!(self, values => values.iter().map(|v| f64::from(*v)).collect())
    }

    /// Append the little endian bytes of the value at `index`. Panics when out of range.
    pub fn extend_le_bytes(&self, index: usize, out: &mut Vec<u8>) {
        dispatch!(self, values => out.extend_from_slice(&values[index].to_le_bytes()))
    }

    /// Keep only the entries whose mask slot is `true`. The mask must match the column length.
    pub fn select(&self, mask: &[bool]) -> Self {
        map_same!(self, values => select(values, mask))
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// An ordered set of equally long, uniquely named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointCloud {
    columns: Vec<Column>,
    len: usize,
}

impl PointCloud {
    /// Build a record, checking that names are unique and all columns have the same length.
    pub fn new(columns: Vec<Column>) -> Result<Self, DataError> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(DataError::Schema(format!(
                    "duplicate field '{}'",
                    column.name
                )));
            }
        }

        let len = columns.first().map(|c| c.data.len()).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.data.len() != len) {
            return Err(DataError::Schema(format!(
                "field '{}' has {} values, expected {}",
                bad.name,
                bad.data.len(),
                len
            )));
        }

        Ok(Self { columns, len })
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Field names in file order.
    pub fn field_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// New record holding only the rows where `mask` is `true`.
    ///
    /// Column order, names and types are preserved.
    pub fn select_rows(&self, mask: &[bool]) -> Result<Self, DataError> {
        if mask.len() != self.len {
            return Err(DataError::MaskLength {
                mask: mask.len(),
                points: self.len,
            });
        }

        let columns = self
            .columns
            .iter()
            .map(|c| Column::new(c.name.clone(), c.data.select(mask)))
            .collect();
        let len = mask.iter().filter(|keep| **keep).count();
        Ok(Self { columns, len })
    }

    /// Point positions from the `x`, `y` and `z` fields, if all three are present.
    pub fn positions(&self) -> Option<Vec<Vec3>> {
        let x = self.column("x")?.data.to_f64_vec();
        let y = self.column("y")?.data.to_f64_vec();
        let z = self.column("z")?.data.to_f64_vec();
        Some(
            x.iter()
                .zip(&y)
                .zip(&z)
                .map(|((x, y), z)| Vec3::new(*x as f32, *y as f32, *z as f32))
                .collect(),
        )
    }

    /// Axis-aligned bounds of the point positions.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let positions = self.positions()?;
        let first = *positions.first()?;
        Some(
            positions
                .iter()
                .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PointCloud {
        PointCloud::new(vec![
            Column::new("x", ColumnData::F32(vec![0.0, 1.0, 2.0, 3.0])),
            Column::new("y", ColumnData::F32(vec![0.0, -1.0, 4.0, 1.0])),
            Column::new("z", ColumnData::F64(vec![1.0, 1.0, 1.0, -2.0])),
            Column::new("red", ColumnData::U8(vec![10, 20, 30, 40])),
            Column::new("opacity", ColumnData::F32(vec![-3.0, 0.5, 2.0, 0.0])),
        ])
        .unwrap()
    }

    #[test]
    fn test_new_rejects_ragged_columns() {
        let err = PointCloud::new(vec![
            Column::new("x", ColumnData::F32(vec![0.0, 1.0])),
            Column::new("y", ColumnData::F32(vec![0.0])),
        ])
        .unwrap_err();
        assert!(matches!(err, DataError::Schema(_)));
    }

    #[test]
    fn test_extend_le_bytes_matches_kind_size() {
        let cloud = sample();
        let mut row = Vec::new();
        for column in cloud.columns() {
            column.data.extend_le_bytes(2, &mut row);
        }

        let row_size: usize = cloud.columns().iter().map(|c| c.data.kind().size()).sum();
        assert_eq!(row.len(), row_size);
        assert_eq!(&row[..4], &2.0f32.to_le_bytes());
        assert_eq!(&row[8..16], &1.0f64.to_le_bytes());
        assert_eq!(row[16], 30);
    }

    #[test]
    fn test_new_rejects_duplicate_names() {
        let err = PointCloud::new(vec![
            Column::new("x", ColumnData::F32(vec![0.0])),
            Column::new("x", ColumnData::F64(vec![0.0])),
        ])
        .unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn test_empty_record() {
        let cloud = PointCloud::new(Vec::new()).unwrap();
        assert!(cloud.is_empty());
        assert!(cloud.field_names().is_empty());
    }

    #[test]
    fn test_select_rows_keeps_order_and_types() {
        let cloud = sample();
        let filtered = cloud.select_rows(&[true, false, true, false]).unwrap();

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.field_names(), cloud.field_names());
        assert_eq!(
            filtered.column("red").unwrap().data,
            ColumnData::U8(vec![10, 30])
        );
        assert_eq!(
            filtered.column("z").unwrap().data,
            ColumnData::F64(vec![1.0, 1.0])
        );
    }

    #[test]
    fn test_select_rows_rejects_wrong_mask() {
        let err = sample().select_rows(&[true]).unwrap_err();
        assert!(matches!(err, DataError::MaskLength { mask: 1, points: 4 }));
    }

    #[test]
    fn test_get_f64_widens() {
        let cloud = sample();
        assert_eq!(cloud.column("red").unwrap().data.get_f64(3), Some(40.0));
        assert_eq!(cloud.column("red").unwrap().data.get_f64(4), None);
    }

    #[test]
    fn test_bounds() {
        let (min, max) = sample().bounds().unwrap();
        assert_eq!(min, Vec3::new(0.0, -1.0, -2.0));
        assert_eq!(max, Vec3::new(3.0, 4.0, 1.0));
    }

    #[test]
    fn test_positions_missing_axis() {
        let cloud = PointCloud::new(vec![Column::new("x", ColumnData::F32(vec![1.0]))]).unwrap();
        assert!(cloud.positions().is_none());
    }
}
