use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::a1::A1Range;
use crate::backend::TabularBackend;
use crate::error::{TabularError, TabularResult};

type Grid = Vec<Vec<String>>;

/// Process-local tabular store.
///
/// Serves `LOCAL_DEV` runs and tests. Follows the remote store's observable
/// behaviour: appends land after the last non-empty row, reads drop trailing
/// blanks.
#[derive(Debug, Default)]
pub struct InMemoryTabularBackend {
    tabs: Mutex<HashMap<String, Grid>>,
}

impl InMemoryTabularBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a tab with rows starting at row 1
    pub fn with_rows(self, tab: &str, rows: Vec<Vec<String>>) -> Self {
        self.tabs.lock().insert(tab.to_string(), rows);
        self
    }

    /// Snapshot of a tab, row 1 first
    pub fn rows(&self, tab: &str) -> Vec<Vec<String>> {
        self.tabs.lock().get(tab).cloned().unwrap_or_default()
    }
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|cell| cell.is_empty())
}

fn to_index(one_based: u32) -> usize {
    (one_based as usize).saturating_sub(1)
}

fn write_cells(grid: &mut Grid, row_index: usize, start_col: usize, values: Vec<String>) {
    if grid.len() <= row_index {
        grid.resize_with(row_index + 1, Vec::new);
    }
    if let Some(target) = grid.get_mut(row_index) {
        let needed = start_col + values.len();
        if target.len() < needed {
            target.resize(needed, String::new());
        }
        for (offset, value) in values.into_iter().enumerate() {
            if let Some(slot) = target.get_mut(start_col + offset) {
                *slot = value;
            }
        }
    }
}

#[async_trait]
impl TabularBackend for InMemoryTabularBackend {
    async fn append_row(&self, range: &str, row: Vec<String>) -> TabularResult<()> {
        let range = A1Range::parse(range)?;
        let mut tabs = self.tabs.lock();
        let grid = tabs.entry(range.tab).or_default();
        while grid.last().is_some_and(|last| is_blank(last)) {
            grid.pop();
        }
        let row_index = grid.len();
        write_cells(grid, row_index, range.start_col as usize, row);
        Ok(())
    }

    async fn read_range(&self, range: &str) -> TabularResult<Vec<Vec<String>>> {
        let range = A1Range::parse(range)?;
        let tabs = self.tabs.lock();
        let Some(grid) = tabs.get(&range.tab) else {
            return Ok(Vec::new());
        };

        let first_row = range.start_row.map_or(0, to_index);
        let last_row = range.end_row.map_or(grid.len(), |row| (row as usize).min(grid.len()));
        let first_col = range.start_col as usize;

        let mut values: Vec<Vec<String>> = grid
            .get(first_row..last_row.max(first_row))
            .unwrap_or_default()
            .iter()
            .map(|row| {
                let last_col = range
                    .end_col
                    .map_or(row.len(), |col| (col as usize + 1).min(row.len()));
                let mut cells: Vec<String> = row
                    .get(first_col..last_col.max(first_col))
                    .unwrap_or_default()
                    .to_vec();
                while cells.last().is_some_and(String::is_empty) {
                    cells.pop();
                }
                cells
            })
            .collect();
        while values.last().is_some_and(Vec::is_empty) {
            values.pop();
        }
        Ok(values)
    }

    async fn update_row(&self, range: &str, row: Vec<String>) -> TabularResult<()> {
        let parsed = A1Range::parse(range)?;
        let start_row = parsed
            .start_row
            .ok_or_else(|| TabularError::InvalidRange(range.to_string()))?;
        let mut tabs = self.tabs.lock();
        let grid = tabs.entry(parsed.tab).or_default();
        write_cells(grid, to_index(start_row), parsed.start_col as usize, row);
        Ok(())
    }

    async fn clear_range(&self, range: &str) -> TabularResult<()> {
        let range = A1Range::parse(range)?;
        let mut tabs = self.tabs.lock();
        let Some(grid) = tabs.get_mut(&range.tab) else {
            return Ok(());
        };

        let first_row = range.start_row.map_or(0, to_index);
        let last_row = range.end_row.map_or(grid.len(), |row| row as usize);
        let first_col = range.start_col as usize;
        for row in grid.iter_mut().take(last_row).skip(first_row) {
            let last_col = range.end_col.map_or(row.len(), |col| col as usize + 1);
            for cell in row.iter_mut().take(last_col).skip(first_col) {
                cell.clear();
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| (*c).to_string()).collect()
    }

    #[tokio::test]
    async fn test_append_then_read_skips_header() {
        let backend = InMemoryTabularBackend::new().with_rows("animals", vec![row(&["chip", "farm", "name"])]);
        backend.append_row("animals!A1", row(&["1", "F", "Hanako"])).await.unwrap();
        backend.append_row("animals!A1", row(&["2", "", "Taro"])).await.unwrap();

        let values = backend.read_range("animals!A2:G").await.unwrap();
        assert_eq!(values, vec![row(&["1", "F", "Hanako"]), row(&["2", "", "Taro"])]);
    }

    #[tokio::test]
    async fn test_read_single_column() {
        let backend = InMemoryTabularBackend::new().with_rows(
            "records",
            vec![row(&["animal", "id"]), row(&["1", "r1", "x"]), row(&["1", "r2", "y"])],
        );
        let ids = backend.read_range("records!B2:B").await.unwrap();
        assert_eq!(ids, vec![row(&["r1"]), row(&["r2"])]);
    }

    #[tokio::test]
    async fn test_update_and_clear_row() {
        let backend = InMemoryTabularBackend::new().with_rows(
            "records",
            vec![row(&["h"]), row(&["1", "r1", "old"]), row(&["1", "r2", "keep"])],
        );
        backend.update_row("records!A2:M2", row(&["1", "r1", "new"])).await.unwrap();
        backend.clear_range("records!A3:M3").await.unwrap();

        let values = backend.read_range("records!A2:M").await.unwrap();
        assert_eq!(values, vec![row(&["1", "r1", "new"])]);
    }

    #[tokio::test]
    async fn test_append_after_cleared_tail_reuses_row() {
        let backend = InMemoryTabularBackend::new().with_rows("records", vec![row(&["h"]), row(&["1", "r1"])]);
        backend.clear_range("records!A2:M2").await.unwrap();
        backend.append_row("records!A1", row(&["1", "r2"])).await.unwrap();
        assert_eq!(backend.rows("records").len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_tab_reads_empty() {
        let backend = InMemoryTabularBackend::new();
        assert!(backend.read_range("nothing!A2:G").await.unwrap().is_empty());
        assert!(backend.read_range("bad range").await.is_err());
    }
}
