//! Tab-separated response parsing.
//!
//! Two shapes are understood. The catalog aggregator's `asu-tsv` output
//! carries several tables, each preceded by `#Table`/`#Name`/`#Column`
//! comment lines that describe the columns (format, description), then a
//! header line, a units line and a dashed separator before the data. The
//! extragalactic database's `ascii_tab` output is a single table: free
//! text, then a header line, then rows.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::warn;

use crate::domain::{CatalogTable, Column, ColumnData};
use crate::error::{RedshiftError, Result};

/// Fortran-style display format such as `F7.4`, `E10.3`, `I5` or `A12`
static FORMAT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(?([AEFDI])(\d+)(?:\.(\d+))?\)?$").expect("valid format regex"));

/// Name with a parenthesized unit, e.g. `RA(deg)`
static NAME_UNIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)\s*\(([^)]*)\)$").expect("valid name/unit regex"));

#[derive(Debug, Clone, Copy, PartialEq)]
enum Kind {
    Float,
    Int,
    Text,
}

#[derive(Debug, Clone, Default)]
struct ColumnMeta {
    description: String,
    kind: Option<Kind>,
    precision: Option<u32>,
}

fn parse_format(format: &str) -> (Option<Kind>, Option<u32>) {
    let Some(caps) = FORMAT_RE.captures(format.trim()) else {
        return (None, None);
    };
    let decimals = caps.get(3).and_then(|m| m.as_str().parse().ok());
    match &caps[1] {
        "F" => (Some(Kind::Float), decimals),
        "E" | "D" => (Some(Kind::Float), None),
        "I" => (Some(Kind::Int), None),
        _ => (Some(Kind::Text), None),
    }
}

/// Build a typed column from raw cells; blank or unparsable cells are masked
fn build_column(name: &str, cells: Vec<String>, kind: Option<Kind>) -> Column {
    let kind = kind.unwrap_or_else(|| infer_kind(&cells));
    let mut mask = Vec::with_capacity(cells.len());
    let data = match kind {
        Kind::Float => ColumnData::Float64(
            cells
                .iter()
                .map(|c| match c.trim().parse::<f64>() {
                    Ok(v) if !v.is_nan() => {
                        mask.push(false);
                        v
                    }
                    _ => {
                        mask.push(true);
                        0.0
                    }
                })
                .collect(),
        ),
        Kind::Int => ColumnData::Int64(
            cells
                .iter()
                .map(|c| match c.trim().parse::<i64>() {
                    Ok(v) => {
                        mask.push(false);
                        v
                    }
                    Err(_) => {
                        mask.push(true);
                        0
                    }
                })
                .collect(),
        ),
        Kind::Text => ColumnData::Text(
            cells
                .into_iter()
                .map(|c| {
                    let c = c.trim().to_string();
                    mask.push(c.is_empty());
                    c
                })
                .collect(),
        ),
    };
    Column::new(name, data).with_mask(mask)
}

fn infer_kind(cells: &[String]) -> Kind {
    let filled: Vec<&str> = cells
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();
    if filled.iter().all(|c| c.parse::<f64>().is_ok()) {
        Kind::Float
    } else {
        Kind::Text
    }
}

fn split_fields(line: &str) -> Vec<String> {
    line.split('\t').map(|f| f.trim().to_string()).collect()
}

fn is_separator(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c == '-' || c == '\t' || c == ' ')
}

#[derive(Default)]
struct PendingTable {
    name: Option<String>,
    meta: HashMap<String, ColumnMeta>,
    header: Vec<String>,
    units: Vec<String>,
    rows: Vec<Vec<String>>,
    in_data: bool,
}

impl PendingTable {
    fn finish(self, fallback_name: &str) -> Result<Option<CatalogTable>> {
        if self.header.is_empty() {
            return Ok(None);
        }
        let name = self.name.unwrap_or_else(|| fallback_name.to_string());
        let mut columns = Vec::with_capacity(self.header.len());
        for (i, column_name) in self.header.iter().enumerate() {
            let cells = self
                .rows
                .iter()
                .map(|row| row.get(i).cloned().unwrap_or_default())
                .collect();
            let meta = self.meta.get(column_name).cloned().unwrap_or_default();
            let mut column = build_column(column_name, cells, meta.kind)
                .with_description(meta.description);
            if let Some(unit) = self.units.get(i).filter(|u| !u.is_empty()) {
                column = column.with_unit(unit.clone());
            }
            column.precision = meta.precision;
            columns.push(column);
        }
        CatalogTable::from_columns(name, columns).map(Some)
    }
}

/// Parse a multi-table `asu-tsv` response into one table per catalog.
/// A table that cannot be assembled (e.g. repeated column names) is skipped.
pub fn parse_vizier_tsv(text: &str) -> Result<Vec<CatalogTable>> {
    let mut tables = Vec::new();
    let mut pending: Option<PendingTable> = None;
    let mut resource_name = String::from("unnamed");

    let mut flush = |pending: &mut Option<PendingTable>, resource: &str| {
        let Some(table) = pending.take() else {
            return;
        };
        let name = table.name.clone().unwrap_or_else(|| resource.to_string());
        match table.finish(resource) {
            Ok(Some(done)) => tables.push(done),
            Ok(None) => {}
            Err(e) => warn!("{}: table skipped, {}", name, e),
        }
    };

    for line in text.lines() {
        if let Some(comment) = line.strip_prefix('#') {
            if comment.starts_with("Table") {
                flush(&mut pending, &resource_name);
                pending = Some(PendingTable::default());
            } else if let Some(name) = comment.strip_prefix("Name:") {
                match pending.as_mut() {
                    Some(table) if table.name.is_none() => table.name = Some(name.trim().to_string()),
                    Some(_) => {}
                    None => resource_name = name.trim().to_string(),
                }
            } else if let Some(spec) = comment.strip_prefix("Column") {
                let fields: Vec<&str> = spec.split('\t').map(str::trim).collect();
                // fields: "", name, (format), description, [ucd=...]
                let table = pending.get_or_insert_with(PendingTable::default);
                if let Some(name) = fields.get(1).filter(|n| !n.is_empty()) {
                    let (kind, precision) = fields.get(2).map(|f| parse_format(f)).unwrap_or((None, None));
                    table.meta.insert(
                        name.to_string(),
                        ColumnMeta {
                            description: fields.get(3).map(|d| d.to_string()).unwrap_or_default(),
                            kind,
                            precision,
                        },
                    );
                }
            }
            continue;
        }

        if line.trim().is_empty() {
            if pending.as_ref().map(|t| t.in_data).unwrap_or(false) {
                flush(&mut pending, &resource_name);
            }
            continue;
        }

        let table = pending.get_or_insert_with(PendingTable::default);
        if table.header.is_empty() {
            table.header = split_fields(line);
        } else if !table.in_data {
            if is_separator(line) {
                table.in_data = true;
            } else {
                table.units = split_fields(line);
            }
        } else {
            table.rows.push(line.split('\t').map(str::to_string).collect());
        }
    }
    flush(&mut pending, &resource_name);

    Ok(tables)
}

/// Parse a single-table tab-separated response whose header line contains
/// `required_column`. Header names of the form `Name(unit)` become a column
/// `Name` with that unit.
pub fn parse_delimited(text: &str, name: &str, required_column: &str) -> Result<CatalogTable> {
    let mut lines = text.lines();
    let header = lines
        .by_ref()
        .map(split_fields)
        .find(|fields| {
            fields.len() > 1
                && fields.iter().any(|f| {
                    f == required_column
                        || NAME_UNIT_RE
                            .captures(f)
                            .map(|c| &c[1] == required_column)
                            .unwrap_or(false)
                })
        })
        .ok_or_else(|| {
            RedshiftError::Parse(format!(
                "no header with column '{}' in {} response",
                required_column, name
            ))
        })?;

    let rows: Vec<Vec<String>> = lines
        .take_while(|line| !line.trim().is_empty())
        .map(|line| line.split('\t').map(str::to_string).collect())
        .collect();

    let mut columns = Vec::with_capacity(header.len());
    for (i, raw_name) in header.iter().enumerate() {
        if raw_name.is_empty() {
            continue;
        }
        let (column_name, unit) = match NAME_UNIT_RE.captures(raw_name) {
            Some(caps) if !caps[1].is_empty() => (caps[1].to_string(), Some(caps[2].to_string())),
            _ => (raw_name.clone(), None),
        };
        let cells = rows
            .iter()
            .map(|row| row.get(i).cloned().unwrap_or_default())
            .collect();
        let mut column = build_column(&column_name, cells, None);
        column.unit = unit.filter(|u| !u.is_empty());
        columns.push(column);
    }
    CatalogTable::from_columns(name, columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIZIER: &str = "#
#   VizieR Astronomical Server vizier.cds.unistra.fr
#
#RESOURCE=yCat_7250
#Name: VII/250
#Title: The 2dF Galaxy Redshift Survey
#Table\tVII_250_2dfgrs:
#Name: VII/250/2dfgrs
#Title: The 2dFGRS catalogue
#Column\t_RAJ2000\t(F10.6)\tRight ascension (FK5, Equinox=J2000.0) (computed by VizieR)\t[ucd=pos.eq.ra;meta.main]
#Column\t_DEJ2000\t(F10.6)\tDeclination (FK5, Equinox=J2000.0) (computed by VizieR)\t[ucd=pos.eq.dec;meta.main]
#Column\tz\t(F7.4)\tRedshift\t[ucd=src.redshift]
#Column\tq_z\t(I1)\tRedshift quality\t[ucd=meta.code.qual]
_RAJ2000\t_DEJ2000\tz\tq_z
deg\tdeg\t\t
----------\t----------\t-------\t-
150.123456\t+02.123456\t0.1234\t4
150.223456\t+02.223456\t      \t3

#Table\tJ_MNRAS_1_t1:
#Name: J/MNRAS/1/t1
#Column\t_RAJ2000\t(F10.6)\tRight ascension\t[ucd=pos.eq.ra]
#Column\t_DEJ2000\t(F10.6)\tDeclination\t[ucd=pos.eq.dec]
#Column\tHRV\t(I6)\tHeliocentric velocity\t[ucd=spect.dopplerVeloc.opt]
_RAJ2000\t_DEJ2000\tHRV
deg\tdeg\tkm/s
----------\t----------\t------
150.1\t+02.1\t 30000
";

    #[test]
    fn test_parse_two_vizier_tables() {
        let tables = parse_vizier_tsv(VIZIER).unwrap();
        assert_eq!(tables.len(), 2);

        let first = &tables[0];
        assert_eq!(first.name, "VII/250/2dfgrs");
        assert_eq!(first.num_rows(), 2);
        let z = first.column("z").unwrap();
        assert_eq!(z.description, "Redshift");
        assert_eq!(z.precision, Some(4));
        assert_eq!(z.unit, None);
        assert_eq!(z.f64_at(0), Some(0.1234));
        assert!(z.is_masked(1));
        assert_eq!(first.column("q_z").unwrap().data.dtype(), "int64");
        assert_eq!(first.column("_RAJ2000").unwrap().unit.as_deref(), Some("deg"));

        let second = &tables[1];
        assert_eq!(second.name, "J/MNRAS/1/t1");
        let hrv = second.column("HRV").unwrap();
        assert_eq!(hrv.unit.as_deref(), Some("km/s"));
        assert_eq!(hrv.i64_at(0), Some(30000));
    }

    #[test]
    fn test_repeated_header_skips_only_that_table() {
        let text = "#Table\tJ_AJ_1_t1:
#Name: J/AJ/1/t1
#Column\tz\t(F7.4)\tRedshift
z\tz
\t
-------\t-------
0.1234\t0.2345

#Table\tJ_AJ_2_t2:
#Name: J/AJ/2/t2
#Column\tz\t(F7.4)\tRedshift
z
-------
0.3456
";
        let tables = parse_vizier_tsv(text).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "J/AJ/2/t2");
        assert_eq!(tables[0].column("z").unwrap().f64_at(0), Some(0.3456));
    }

    #[test]
    fn test_empty_response() {
        assert!(parse_vizier_tsv("#\n# No table found\n").unwrap().is_empty());
    }

    #[test]
    fn test_format_descriptor() {
        assert_eq!(parse_format("(F7.4)"), (Some(Kind::Float), Some(4)));
        assert_eq!(parse_format("E10.3"), (Some(Kind::Float), None));
        assert_eq!(parse_format("(A20)"), (Some(Kind::Text), None));
        assert_eq!(parse_format("weird"), (None, None));
    }

    #[test]
    fn test_parse_delimited_with_units() {
        let text = "Search results\n\nNo.\tObject Name\tRA(deg)\tDEC(deg)\tType\tRedshift\tRedshift Flag\n\
                    1\tNGC 1\t150.1\t2.1\tG\t0.01\t\n\
                    2\tABELL 1\t150.2\t2.2\tGClstr\t\tPHOT\n";
        let table = parse_delimited(text, "NED", "Object Name").unwrap();
        assert_eq!(table.num_rows(), 2);
        let ra = table.column("RA").unwrap();
        assert_eq!(ra.unit.as_deref(), Some("deg"));
        assert_eq!(ra.f64_at(1), Some(150.2));
        assert_eq!(table.column("Object Name").unwrap().str_at(0), Some("NGC 1"));
        assert!(table.column("Redshift").unwrap().is_masked(1));
        assert_eq!(table.column("Redshift Flag").unwrap().str_at(1), Some("PHOT"));
    }

    #[test]
    fn test_parse_delimited_without_header() {
        assert!(parse_delimited("nothing here\n", "NED", "Object Name").is_err());
    }
}
