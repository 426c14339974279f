use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

use crate::app::ports::TableStorePort;
use crate::domain::CatalogTable;
use crate::error::{RedshiftError, Result};

const FORMAT_VERSION: u32 = 1;

/// On-disk envelope around one table
#[derive(Debug, Serialize, Deserialize)]
struct TableDocument {
    format_version: u32,
    written_at: DateTime<Utc>,
    table: CatalogTable,
}

/// One pretty-printed JSON document per table. Floats round-trip exactly.
#[derive(Debug, Default, Clone)]
pub struct JsonTableStore;

impl TableStorePort for JsonTableStore {
    fn save(&self, table: &CatalogTable, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let document = TableDocument {
            format_version: FORMAT_VERSION,
            written_at: Utc::now(),
            table: table.clone(),
        };

        // Write beside the target, then move into place
        let tmp = path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(fs::File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut writer, &document)?;
            writer.flush()?;
        }
        fs::rename(&tmp, path)?;

        debug!(
            "Wrote {} ({} rows) to {}",
            table.name,
            table.num_rows(),
            path.display()
        );
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<CatalogTable> {
        let reader = BufReader::new(fs::File::open(path)?);
        let document: TableDocument = serde_json::from_reader(reader)?;
        if document.format_version != FORMAT_VERSION {
            return Err(RedshiftError::Table(format!(
                "{}: unsupported format version {}",
                path.display(),
                document.format_version
            )));
        }
        document.table.validate()?;
        Ok(document.table)
    }
}
