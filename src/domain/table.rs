use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{RedshiftError, Result};

/// Typed cell storage for one column.
///
/// Masked cells keep a fill value (0 or the empty string) so that every
/// variant stays serializable; the mask on [`Column`] is authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dtype", content = "values", rename_all = "lowercase")]
pub enum ColumnData {
    Float64(Vec<f64>),
    Float32(Vec<f32>),
    Int64(Vec<i64>),
    Text(Vec<String>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Float64(v) => v.len(),
            ColumnData::Float32(v) => v.len(),
            ColumnData::Int64(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ColumnData::Float64(_) | ColumnData::Float32(_))
    }

    pub fn dtype(&self) -> &'static str {
        match self {
            ColumnData::Float64(_) => "float64",
            ColumnData::Float32(_) => "float32",
            ColumnData::Int64(_) => "int64",
            ColumnData::Text(_) => "text",
        }
    }

    /// Numeric cell widened to f64; `None` for text columns
    pub fn as_f64(&self, row: usize) -> Option<f64> {
        match self {
            ColumnData::Float64(v) => v.get(row).copied(),
            ColumnData::Float32(v) => v.get(row).map(|x| *x as f64),
            ColumnData::Int64(v) => v.get(row).map(|x| *x as f64),
            ColumnData::Text(_) => None,
        }
    }

    pub fn as_i64(&self, row: usize) -> Option<i64> {
        match self {
            ColumnData::Int64(v) => v.get(row).copied(),
            _ => None,
        }
    }

    pub fn as_str(&self, row: usize) -> Option<&str> {
        match self {
            ColumnData::Text(v) => v.get(row).map(String::as_str),
            _ => None,
        }
    }

    fn select(&self, keep: &[bool]) -> ColumnData {
        fn pick<T: Clone>(values: &[T], keep: &[bool]) -> Vec<T> {
            values
                .iter()
                .zip(keep)
                .filter(|(_, k)| **k)
                .map(|(v, _)| v.clone())
                .collect()
        }
        match self {
            ColumnData::Float64(v) => ColumnData::Float64(pick(v, keep)),
            ColumnData::Float32(v) => ColumnData::Float32(pick(v, keep)),
            ColumnData::Int64(v) => ColumnData::Int64(pick(v, keep)),
            ColumnData::Text(v) => ColumnData::Text(pick(v, keep)),
        }
    }

    fn widened(&self) -> Option<Vec<f64>> {
        match self {
            ColumnData::Float64(v) => Some(v.clone()),
            ColumnData::Float32(v) => Some(v.iter().map(|x| *x as f64).collect()),
            ColumnData::Int64(v) => Some(v.iter().map(|x| *x as f64).collect()),
            ColumnData::Text(_) => None,
        }
    }

    /// Append `other`, widening numeric types the way a vertical stack does:
    /// mixed float/int columns become float64.
    fn append(&mut self, other: &ColumnData) -> std::result::Result<(), String> {
        let (lhs_dtype, rhs_dtype) = (self.dtype(), other.dtype());
        match (self, other) {
            (ColumnData::Float64(a), ColumnData::Float64(b)) => a.extend_from_slice(b),
            (ColumnData::Float32(a), ColumnData::Float32(b)) => a.extend_from_slice(b),
            (ColumnData::Int64(a), ColumnData::Int64(b)) => a.extend_from_slice(b),
            (ColumnData::Text(a), ColumnData::Text(b)) => a.extend(b.iter().cloned()),
            (ColumnData::Text(_), _) | (_, ColumnData::Text(_)) => {
                return Err(format!("cannot stack {} onto {}", rhs_dtype, lhs_dtype));
            }
            (lhs, rhs) => {
                let mut merged = lhs.widened().unwrap_or_default();
                merged.extend(rhs.widened().unwrap_or_default());
                *lhs = ColumnData::Float64(merged);
            }
        }
        Ok(())
    }
}

/// One named, described, unit-tagged, maskable column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub unit: Option<String>,
    /// Number of decimals declared by the source format, when known
    #[serde(default)]
    pub precision: Option<u32>,
    pub data: ColumnData,
    pub mask: Vec<bool>,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        let mask = vec![false; data.len()];
        Self {
            name: name.into(),
            description: String::new(),
            unit: None,
            precision: None,
            data,
            mask,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn with_mask(mut self, mask: Vec<bool>) -> Self {
        self.mask = mask;
        self
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_masked(&self, row: usize) -> bool {
        self.mask.get(row).copied().unwrap_or(true)
    }

    pub fn all_masked(&self) -> bool {
        self.mask.iter().all(|m| *m)
    }

    /// Unmasked numeric value
    pub fn f64_at(&self, row: usize) -> Option<f64> {
        if self.is_masked(row) {
            None
        } else {
            self.data.as_f64(row)
        }
    }

    pub fn i64_at(&self, row: usize) -> Option<i64> {
        if self.is_masked(row) {
            None
        } else {
            self.data.as_i64(row)
        }
    }

    pub fn str_at(&self, row: usize) -> Option<&str> {
        if self.is_masked(row) {
            None
        } else {
            self.data.as_str(row)
        }
    }

    fn select(&self, keep: &[bool]) -> Column {
        Column {
            name: self.name.clone(),
            description: self.description.clone(),
            unit: self.unit.clone(),
            precision: self.precision,
            data: self.data.select(keep),
            mask: self
                .mask
                .iter()
                .zip(keep)
                .filter(|(_, k)| **k)
                .map(|(m, _)| *m)
                .collect(),
        }
    }
}

/// A semantic container of rows with named, typed, unit-tagged columns.
///
/// Column names are unique and every column has the same number of rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogTable {
    /// Identifying name of the dataset (catalog identifier or service name)
    pub name: String,
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
    columns: Vec<Column>,
}

impl CatalogTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            meta: BTreeMap::new(),
            columns: Vec::new(),
        }
    }

    /// Build a table from columns, enforcing unique names and equal lengths
    pub fn from_columns(name: impl Into<String>, columns: Vec<Column>) -> Result<Self> {
        let mut table = Self::new(name);
        for column in columns {
            table.add_column(column)?;
        }
        Ok(table)
    }

    pub fn add_column(&mut self, column: Column) -> Result<()> {
        if self.has_column(&column.name) {
            return Err(RedshiftError::Table(format!(
                "column '{}' already exists in '{}'",
                column.name, self.name
            )));
        }
        if column.mask.len() != column.data.len() {
            return Err(RedshiftError::Table(format!(
                "column '{}' has {} values but {} mask entries",
                column.name,
                column.data.len(),
                column.mask.len()
            )));
        }
        if !self.columns.is_empty() && column.len() != self.num_rows() {
            return Err(RedshiftError::Table(format!(
                "column '{}' has {} rows, table '{}' has {}",
                column.name,
                column.len(),
                self.name,
                self.num_rows()
            )));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Re-check the invariants, e.g. after deserializing
    pub fn validate(&self) -> Result<()> {
        let mut seen = CatalogTable::new(self.name.clone());
        for column in &self.columns {
            seen.add_column(column.clone())?;
        }
        Ok(())
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name).ok_or_else(|| {
            RedshiftError::Table(format!("table '{}' has no column '{}'", self.name, name))
        })
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        let index = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(index))
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        if from == to {
            return self.require_column(from).map(|_| ());
        }
        if self.has_column(to) {
            return Err(RedshiftError::Table(format!(
                "cannot rename '{}' to '{}': name already taken in '{}'",
                from, to, self.name
            )));
        }
        let name = self.name.clone();
        let column = self.column_mut(from).ok_or_else(|| {
            RedshiftError::Table(format!("table '{}' has no column '{}'", name, from))
        })?;
        column.name = to.to_string();
        Ok(())
    }

    /// New table holding only `names`, in that order
    pub fn select_columns(&self, names: &[&str]) -> Result<CatalogTable> {
        let mut selected = CatalogTable::new(self.name.clone());
        selected.meta = self.meta.clone();
        for name in names {
            selected.add_column(self.require_column(name)?.clone())?;
        }
        Ok(selected)
    }

    /// Keep the rows whose `keep` flag is set
    pub fn retain_rows(&mut self, keep: &[bool]) -> Result<()> {
        if keep.len() != self.num_rows() {
            return Err(RedshiftError::Table(format!(
                "row selection has {} entries, table '{}' has {} rows",
                keep.len(),
                self.name,
                self.num_rows()
            )));
        }
        self.columns = self.columns.iter().map(|c| c.select(keep)).collect();
        Ok(())
    }

    pub fn remove_rows(&mut self, rows: &[usize]) -> Result<()> {
        let mut keep = vec![true; self.num_rows()];
        for row in rows {
            match keep.get_mut(*row) {
                Some(flag) => *flag = false,
                None => {
                    return Err(RedshiftError::Table(format!(
                        "row {} out of range for '{}'",
                        row, self.name
                    )))
                }
            }
        }
        self.retain_rows(&keep)
    }

    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.meta.insert(key.into(), value.into());
    }

    /// Vertical concatenation. Every table must carry the same column names;
    /// the first table fixes column order, descriptions and units.
    pub fn vstack(name: impl Into<String>, tables: Vec<CatalogTable>) -> Result<CatalogTable> {
        let mut tables = tables.into_iter();
        let mut stacked = tables
            .next()
            .ok_or_else(|| RedshiftError::Table("nothing to stack".to_string()))?;
        stacked.name = name.into();

        for table in tables {
            if table.columns.len() != stacked.columns.len() {
                return Err(RedshiftError::Table(format!(
                    "cannot stack '{}': {} columns, expected {}",
                    table.name,
                    table.columns.len(),
                    stacked.columns.len()
                )));
            }
            for column in &mut stacked.columns {
                let other = table.require_column(&column.name)?;
                column
                    .data
                    .append(&other.data)
                    .map_err(|e| RedshiftError::Table(format!("column '{}': {}", column.name, e)))?;
                column.mask.extend_from_slice(&other.mask);
            }
        }
        Ok(stacked)
    }
}
