use async_trait::async_trait;

use crate::error::TabularResult;

/// Row-oriented access to a remote tabular store.
///
/// Ranges are A1 strings (see [`crate::a1::A1Range`]). Cell values travel as
/// plain strings; implementations must store them literally.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait TabularBackend: Send + Sync {
    /// Append one row after the last non-empty row of the range's tab
    async fn append_row(&self, range: &str, row: Vec<String>) -> TabularResult<()>;

    /// Read a range; trailing empty cells and rows are omitted
    async fn read_range(&self, range: &str) -> TabularResult<Vec<Vec<String>>>;

    /// Overwrite the cells starting at the range's top-left corner
    async fn update_row(&self, range: &str, row: Vec<String>) -> TabularResult<()>;

    /// Blank every cell in the range
    async fn clear_range(&self, range: &str) -> TabularResult<()>;

    /// Backend name for logs and health output
    fn name(&self) -> &'static str;
}
