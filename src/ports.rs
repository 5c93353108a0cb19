use std::path::Path;

use crate::adapters::drive::UploadError;
use crate::adapters::sheets::SpreadsheetError;
use crate::domain::source_row::SourceRow;

/// Source of the row to fill the form from.
#[async_trait::async_trait]
pub trait RowFetcher: Send + Sync {
    /// Last data row of the sheet, in sheet order. "Most recent" is
    /// positional, never derived from a timestamp column.
    async fn latest_row(&self) -> error_stack::Result<SourceRow, SpreadsheetError>;
}

/// Remote storage for the filled document.
#[async_trait::async_trait]
pub trait Uploader: Send + Sync {
    /// Stores the file remotely and returns an opaque remote identifier.
    async fn upload(&self, path: &Path) -> error_stack::Result<String, UploadError>;
}
