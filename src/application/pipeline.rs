use std::path::PathBuf;

use error_stack::{Report, ResultExt};
use thiserror::Error;
use tracing::instrument;

use crate::adapters::credentials;
use crate::adapters::drive::DriveManager;
use crate::adapters::form_filler::{FormFillError, FormFiller};
use crate::adapters::sheets::{SpreadsheetError, SpreadsheetManager};
use crate::config::app_config::AppConfig;
use crate::domain::field_map::map_fields;
use crate::ports::{RowFetcher, Uploader};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("credential decoding or authorization failed")]
    Auth,
    #[error("no data found in the spreadsheet")]
    NoData,
    #[error("failed to read the spreadsheet")]
    SheetRead,
    #[error("failed to open the PDF template")]
    TemplateRead,
    #[error("failed to write the filled PDF")]
    FormWrite,
    #[error("upload failed")]
    Upload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Uploading is disabled.
    Skipped,
    Uploaded { file_id: String },
    /// The fill succeeded but the upload did not. Reported next to the
    /// success instead of masking it, unless `upload_failure_fatal` is set.
    Failed { message: String },
}

#[derive(Debug, Clone)]
pub struct FillOutcome {
    pub output_path: PathBuf,
    pub upload: UploadOutcome,
}

/// Runs the whole pipeline against the real Google services. Credentials
/// are decoded fresh on every call; nothing is cached across requests.
#[instrument(skip(config))]
pub async fn run(config: &AppConfig) -> error_stack::Result<FillOutcome, PipelineError> {
    let credentials = credentials::credentials_json().change_context(PipelineError::Auth)?;

    let drive = DriveManager::connect(&credentials, config.drive.folder_id.to_string())
        .await
        .change_context(PipelineError::Auth)?;
    let spreadsheet_id = drive
        .find_spreadsheet(&config.sheets.spreadsheet_name)
        .await
        .change_context(PipelineError::SheetRead)?;
    let sheets = SpreadsheetManager::connect(&credentials, spreadsheet_id)
        .await
        .change_context(PipelineError::Auth)?;

    let uploader = config
        .drive
        .upload_enabled
        .then_some(&drive as &dyn Uploader);
    run_with(config, &sheets, uploader).await
}

/// Pipeline core: fetch, map, fill, optionally upload. Strictly sequential;
/// any stage failure aborts the rest. Generic over the external
/// collaborators so tests can substitute them.
pub async fn run_with(
    config: &AppConfig,
    rows: &dyn RowFetcher,
    uploader: Option<&dyn Uploader>,
) -> error_stack::Result<FillOutcome, PipelineError> {
    let row = rows.latest_row().await.map_err(lift_sheet_error)?;
    let fields = map_fields(&row);
    tracing::info!(
        columns = row.len(),
        fields = fields.len(),
        "mapped latest row onto form fields"
    );

    let filler = FormFiller::new(config.pdf.clone());
    let output_path = filler.fill(&fields).map_err(lift_fill_error)?;
    tracing::info!(path = %output_path.display(), "filled PDF written");

    let upload = match uploader {
        None => UploadOutcome::Skipped,
        Some(uploader) => match uploader.upload(&output_path).await {
            Ok(file_id) => {
                tracing::info!(%file_id, "filled PDF uploaded");
                UploadOutcome::Uploaded { file_id }
            }
            Err(report) => {
                tracing::error!("upload failed: {report:?}");
                if config.drive.upload_failure_fatal {
                    return Err(report.change_context(PipelineError::Upload));
                }
                UploadOutcome::Failed {
                    message: report.current_context().to_string(),
                }
            }
        },
    };

    Ok(FillOutcome {
        output_path,
        upload,
    })
}

fn lift_sheet_error(report: Report<SpreadsheetError>) -> Report<PipelineError> {
    let kind = match report.current_context() {
        SpreadsheetError::NoData => PipelineError::NoData,
        SpreadsheetError::AuthFailed => PipelineError::Auth,
        SpreadsheetError::NoWorksheet | SpreadsheetError::FetchFailed => PipelineError::SheetRead,
    };
    report.change_context(kind)
}

fn lift_fill_error(report: Report<FormFillError>) -> Report<PipelineError> {
    let kind = match report.current_context() {
        FormFillError::TemplateRead => PipelineError::TemplateRead,
        FormFillError::FormWrite => PipelineError::FormWrite,
    };
    report.change_context(kind)
}
