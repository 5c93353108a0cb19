#[derive(serde::Deserialize, Debug, Clone)]
pub struct SheetsConfig {
    /// Spreadsheet title as it appears in Drive, not a spreadsheet id.
    /// Only the first worksheet is ever read.
    pub spreadsheet_name: Box<str>,
}
