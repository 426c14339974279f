use tracing::debug;

use crate::constants::CONVERTED_SUFFIX;
use crate::domain::{CatalogTable, Column, ColumnData};
use crate::units::speed_of_light_in;

/// Velocity column re-expressed as a dimensionless redshift, z = v / c.
///
/// Returns `None` when the column has no unit, a unit that is not a speed,
/// or non-numeric data; that is "does not apply", never an error.
pub fn velocity_to_redshift(column: &Column) -> Option<Column> {
    let c = speed_of_light_in(column.unit.as_deref()?)?;
    let values: Vec<f64> = match &column.data {
        ColumnData::Float64(v) => v.iter().map(|x| x / c).collect(),
        ColumnData::Float32(v) => v.iter().map(|x| *x as f64 / c).collect(),
        ColumnData::Int64(v) => v.iter().map(|x| *x as f64 / c).collect(),
        ColumnData::Text(_) => return None,
    };

    Some(Column {
        name: column.name.clone(),
        description: format!("{}{}", column.description, CONVERTED_SUFFIX),
        unit: None,
        precision: None,
        data: ColumnData::Float64(values),
        mask: column.mask.clone(),
    })
}

/// Replace `column` in place with its redshift equivalent when it holds
/// velocities. Returns whether a conversion happened.
pub fn normalize(table: &mut CatalogTable, column: &str) -> bool {
    let Some(slot) = table.column_mut(column) else {
        return false;
    };
    match velocity_to_redshift(slot) {
        Some(converted) => {
            debug!(
                "Converted column {} from {} to redshift",
                column,
                slot.unit.as_deref().unwrap_or_default()
            );
            *slot = converted;
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(column: Column) -> CatalogTable {
        CatalogTable::from_columns("t", vec![column]).unwrap()
    }

    #[test]
    fn test_velocity_becomes_redshift() {
        let mut table = table_with(
            Column::new("cz", ColumnData::Float64(vec![29_979.2458, 0.0]))
                .with_unit("km/s")
                .with_description("Heliocentric velocity")
                .with_mask(vec![false, true]),
        );

        assert!(normalize(&mut table, "cz"));

        let column = table.column("cz").unwrap();
        assert!((column.f64_at(0).unwrap() - 0.1).abs() < 1e-12);
        assert!(column.is_masked(1));
        assert_eq!(column.unit, None);
        assert_eq!(
            column.description,
            "Heliocentric velocity, converted to redshift"
        );
    }

    #[test]
    fn test_integer_velocities_converted() {
        let column = Column::new("v", ColumnData::Int64(vec![299_792_458])).with_unit("m/s");
        let converted = velocity_to_redshift(&column).unwrap();
        assert!((converted.f64_at(0).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_dimensionless_is_noop_and_idempotent() {
        let original = Column::new("z", ColumnData::Float64(vec![0.1234]))
            .with_description("Redshift");
        let mut table = table_with(original.clone());

        assert!(!normalize(&mut table, "z"));
        assert_eq!(table.column("z").unwrap(), &original);

        // A converted column is dimensionless afterwards, so a second pass does nothing
        let mut velocity = table_with(
            Column::new("v", ColumnData::Float64(vec![3000.0])).with_unit("km/s"),
        );
        assert!(normalize(&mut velocity, "v"));
        let once = velocity.clone();
        assert!(!normalize(&mut velocity, "v"));
        assert_eq!(velocity, once);
    }

    #[test]
    fn test_unrelated_unit_is_noop() {
        let original = Column::new("mag", ColumnData::Float64(vec![18.5])).with_unit("mag");
        let mut table = table_with(original.clone());
        assert!(!normalize(&mut table, "mag"));
        assert_eq!(table.column("mag").unwrap(), &original);
    }

    #[test]
    fn test_missing_column_is_noop() {
        let mut table = table_with(Column::new("z", ColumnData::Float64(vec![0.1])));
        assert!(!normalize(&mut table, "nope"));
    }
}
