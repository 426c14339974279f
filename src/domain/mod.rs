// Domain data shapes shared across layers

pub mod sky;
pub mod table;

pub use sky::{SkyPosition, Target};
pub use table::{CatalogTable, Column, ColumnData};

use serde::{Deserialize, Serialize};

use crate::constants::{DEC_COLUMN, ORIGIN_COLUMN, RA_COLUMN, REDSHIFT_COLUMN};
use crate::error::Result;

/// The canonical record every source is reduced to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedshiftRow {
    /// Degrees
    pub ra: f64,
    /// Degrees
    pub dec: f64,
    /// Dimensionless
    pub redshift: f64,
    /// Catalog or service the measurement came from
    pub origin: String,
}

impl RedshiftRow {
    /// Build a homogenized table (`RA`, `DEC`, `Redshift`, `Origin`) from rows
    pub fn into_table(name: impl Into<String>, rows: &[RedshiftRow]) -> Result<CatalogTable> {
        CatalogTable::from_columns(
            name,
            vec![
                Column::new(
                    RA_COLUMN,
                    ColumnData::Float64(rows.iter().map(|r| r.ra).collect()),
                )
                .with_unit("deg"),
                Column::new(
                    DEC_COLUMN,
                    ColumnData::Float64(rows.iter().map(|r| r.dec).collect()),
                )
                .with_unit("deg"),
                Column::new(
                    REDSHIFT_COLUMN,
                    ColumnData::Float64(rows.iter().map(|r| r.redshift).collect()),
                ),
                Column::new(
                    ORIGIN_COLUMN,
                    ColumnData::Text(rows.iter().map(|r| r.origin.clone()).collect()),
                ),
            ],
        )
    }

    /// Read the homogenized columns back out; rows without a redshift are skipped
    pub fn from_table(table: &CatalogTable) -> Result<Vec<RedshiftRow>> {
        let ra = table.require_column(RA_COLUMN)?;
        let dec = table.require_column(DEC_COLUMN)?;
        let redshift = table.require_column(REDSHIFT_COLUMN)?;
        let origin = table.require_column(ORIGIN_COLUMN)?;

        Ok((0..table.num_rows())
            .filter_map(|row| {
                Some(RedshiftRow {
                    ra: ra.f64_at(row)?,
                    dec: dec.f64_at(row)?,
                    redshift: redshift.f64_at(row)?,
                    origin: origin.str_at(row).unwrap_or_default().to_string(),
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_through_table() {
        let rows = vec![
            RedshiftRow {
                ra: 10.0,
                dec: -5.0,
                redshift: 0.123,
                origin: "NED".into(),
            },
            RedshiftRow {
                ra: 10.1,
                dec: -5.1,
                redshift: 0.456,
                origin: "VII/250/2dfgrs".into(),
            },
        ];
        let table = RedshiftRow::into_table("grand", &rows).unwrap();
        assert_eq!(table.column_names(), vec!["RA", "DEC", "Redshift", "Origin"]);
        assert_eq!(RedshiftRow::from_table(&table).unwrap(), rows);
    }
}
