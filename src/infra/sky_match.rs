use tracing::debug;

use crate::app::ports::CrossMatchPort;
use crate::constants::{DEC_COLUMN, GROUP_ID_COLUMN, GROUP_SIZE_COLUMN, RA_COLUMN};
use crate::domain::{CatalogTable, Column, ColumnData, SkyPosition};
use crate::error::Result;
use crate::units::Angle;

/// In-process friends-of-friends matcher: rows closer than the tolerance,
/// directly or through a chain of neighbours, share a group.
#[derive(Debug, Default)]
pub struct SkyMatcher;

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Lower index becomes the root so ids follow table order
            let (root, child) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[child] = root;
        }
    }
}

impl SkyMatcher {
    /// Group id per row (`-1` for rows without a neighbour) and group sizes
    pub fn group(&self, table: &CatalogTable, tolerance: Angle) -> Result<(Vec<i64>, Vec<i64>)> {
        let ra = table.require_column(RA_COLUMN)?;
        let dec = table.require_column(DEC_COLUMN)?;
        let rows = table.num_rows();
        let tolerance = tolerance.degrees();

        let mut positioned: Vec<(usize, SkyPosition)> = (0..rows)
            .filter_map(|row| {
                Some((
                    row,
                    SkyPosition {
                        ra: ra.f64_at(row)?,
                        dec: dec.f64_at(row)?,
                    },
                ))
            })
            .collect();
        positioned.sort_by(|a, b| a.1.dec.total_cmp(&b.1.dec));

        let mut sets = UnionFind::new(rows);
        for (i, (row_a, pos_a)) in positioned.iter().enumerate() {
            for (row_b, pos_b) in &positioned[i + 1..] {
                if pos_b.dec - pos_a.dec > tolerance {
                    break;
                }
                if pos_a.separation(pos_b) <= tolerance {
                    sets.union(*row_a, *row_b);
                }
            }
        }

        let roots: Vec<usize> = (0..rows).map(|row| sets.find(row)).collect();
        let mut sizes = vec![0i64; rows];
        for root in &roots {
            sizes[*root] += 1;
        }

        let mut next_id = 0i64;
        let mut root_ids = vec![-1i64; rows];
        let mut group_ids = vec![-1i64; rows];
        let mut group_sizes = vec![1i64; rows];
        for (row, root) in roots.iter().enumerate() {
            if sizes[*root] < 2 {
                continue;
            }
            if root_ids[*root] < 0 {
                root_ids[*root] = next_id;
                next_id += 1;
            }
            group_ids[row] = root_ids[*root];
            group_sizes[row] = sizes[*root];
        }
        debug!("{}: {} groups within {} deg", table.name, next_id, tolerance);
        Ok((group_ids, group_sizes))
    }
}

impl CrossMatchPort for SkyMatcher {
    fn identify(&self, table: &CatalogTable, tolerance: Angle) -> Result<Option<CatalogTable>> {
        let (group_ids, group_sizes) = self.group(table, tolerance)?;
        if group_ids.iter().all(|id| *id < 0) {
            return Ok(None);
        }

        let mut annotated = table.clone();
        annotated.remove_column(GROUP_ID_COLUMN);
        annotated.remove_column(GROUP_SIZE_COLUMN);
        annotated.add_column(
            Column::new(GROUP_ID_COLUMN, ColumnData::Int64(group_ids))
                .with_description("Group identifier, -1 for unmatched rows"),
        )?;
        annotated.add_column(
            Column::new(GROUP_SIZE_COLUMN, ColumnData::Int64(group_sizes))
                .with_description("Number of rows in the group"),
        )?;
        Ok(Some(annotated))
    }
}
