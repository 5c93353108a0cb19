use std::fmt::Debug;

use error_stack::{report, ResultExt};
use google_sheets4::{hyper, hyper_rustls, oauth2, Sheets};
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use crate::adapters::http_client::http_client;
use crate::domain::source_row::SourceRow;
use crate::ports::RowFetcher;

#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("failed to authorize against the Sheets API")]
    AuthFailed,
    #[error("no data found in the spreadsheet")]
    NoData,
    #[error("spreadsheet has no worksheets")]
    NoWorksheet,
    #[error("failed to fetch values from the spreadsheet")]
    FetchFailed,
}

pub struct SpreadsheetManager {
    spreadsheet_id: String,
    hub: Sheets<hyper_rustls::HttpsConnector<hyper::client::HttpConnector>>,
}

impl Debug for SpreadsheetManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SpreadsheetManager {{ spreadsheet_id: {:?} }}",
            self.spreadsheet_id
        )
    }
}

impl SpreadsheetManager {
    /// Builds an authorized Sheets hub from service-account key JSON.
    #[instrument(skip(credentials_json))]
    pub async fn connect(
        credentials_json: &str,
        spreadsheet_id: String,
    ) -> error_stack::Result<Self, SpreadsheetError> {
        let key = oauth2::parse_service_account_key(credentials_json)
            .change_context(SpreadsheetError::AuthFailed)?;
        let client = http_client();
        let auth = oauth2::ServiceAccountAuthenticator::with_client(key, client.clone())
            .build()
            .await
            .change_context(SpreadsheetError::AuthFailed)?;

        Ok(SpreadsheetManager {
            spreadsheet_id,
            hub: Sheets::new(client, auth),
        })
    }

    /// Title of the first worksheet, the only one this service reads.
    #[instrument]
    async fn first_sheet_title(&self) -> error_stack::Result<String, SpreadsheetError> {
        let (_, spreadsheet) = self
            .hub
            .spreadsheets()
            .get(&self.spreadsheet_id)
            .doit()
            .await
            .change_context(SpreadsheetError::FetchFailed)?;

        spreadsheet
            .sheets
            .and_then(|sheets| sheets.into_iter().next())
            .and_then(|sheet| sheet.properties)
            .and_then(|properties| properties.title)
            .ok_or_else(|| report!(SpreadsheetError::NoWorksheet))
    }

    /// All cell values of the first worksheet, header row included.
    #[instrument]
    async fn all_values(&self) -> error_stack::Result<Vec<Vec<Value>>, SpreadsheetError> {
        let title = self.first_sheet_title().await?;
        let range = quote_sheet_title(&title);
        let (_, value_range) = self
            .hub
            .spreadsheets()
            .values_get(&self.spreadsheet_id, &range)
            .doit()
            .await
            .change_context(SpreadsheetError::FetchFailed)
            .attach_printable_lazy(|| format!("range {range}"))?;

        Ok(value_range.values.unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl RowFetcher for SpreadsheetManager {
    #[instrument]
    async fn latest_row(&self) -> error_stack::Result<SourceRow, SpreadsheetError> {
        let values = self.all_values().await?;
        last_record(&values).ok_or_else(|| report!(SpreadsheetError::NoData))
    }
}

/// A sheet title used on its own as an A1 range must be quoted.
fn quote_sheet_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Last data row zipped with the header row. Returns `None` when the sheet
/// holds no data rows; a row shorter than the header simply omits the
/// trailing columns, which default downstream to empty strings.
fn last_record(values: &[Vec<Value>]) -> Option<SourceRow> {
    let (header, records) = values.split_first()?;
    let last = records.last()?;

    let mut row = SourceRow::new();
    for (name, cell) in header.iter().zip(last.iter()) {
        row.push(cell_label(name), cell.clone());
    }
    Some(row)
}

fn cell_label(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
