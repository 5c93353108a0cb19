use std::fmt::Debug;
use std::path::Path;

use error_stack::{report, ResultExt};
use google_drive3::{hyper, hyper_rustls, oauth2, DriveHub};
use thiserror::Error;
use tracing::instrument;

use crate::adapters::http_client::http_client;
use crate::ports::Uploader;

#[derive(Error, Debug)]
pub enum DriveError {
    #[error("failed to authorize against the Drive API")]
    AuthFailed,
    #[error("spreadsheet {0:?} not found in Drive")]
    SpreadsheetNotFound(String),
    #[error("failed to query Drive")]
    QueryFailed,
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("failed to open the local file for upload")]
    LocalRead,
    #[error("failed to create the remote file")]
    CreateFailed,
}

pub struct DriveManager {
    folder_id: String,
    hub: DriveHub<hyper_rustls::HttpsConnector<hyper::client::HttpConnector>>,
}

impl Debug for DriveManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DriveManager {{ folder_id: {:?} }}", self.folder_id)
    }
}

impl DriveManager {
    /// Builds an authorized Drive hub from service-account key JSON.
    #[instrument(skip(credentials_json))]
    pub async fn connect(
        credentials_json: &str,
        folder_id: String,
    ) -> error_stack::Result<Self, DriveError> {
        let key = oauth2::parse_service_account_key(credentials_json)
            .change_context(DriveError::AuthFailed)?;
        let client = http_client();
        let auth = oauth2::ServiceAccountAuthenticator::with_client(key, client.clone())
            .build()
            .await
            .change_context(DriveError::AuthFailed)?;

        Ok(DriveManager {
            folder_id,
            hub: DriveHub::new(client, auth),
        })
    }

    /// Drive file id of the spreadsheet with the given title, mirroring how
    /// gspread opens spreadsheets by name. The first match wins.
    #[instrument]
    pub async fn find_spreadsheet(&self, name: &str) -> error_stack::Result<String, DriveError> {
        let query = format!(
            "name = '{}' and mimeType = 'application/vnd.google-apps.spreadsheet' and trashed = false",
            name.replace('\'', "\\'")
        );
        let (_, list) = self
            .hub
            .files()
            .list()
            .q(&query)
            .doit()
            .await
            .change_context(DriveError::QueryFailed)
            .attach_printable_lazy(|| format!("query {query:?}"))?;

        list.files
            .and_then(|files| files.into_iter().next())
            .and_then(|file| file.id)
            .ok_or_else(|| report!(DriveError::SpreadsheetNotFound(name.to_string())))
    }
}

#[async_trait::async_trait]
impl Uploader for DriveManager {
    /// Creates the file inside the configured folder, named after the local
    /// file's base name, and returns the Drive file id.
    #[instrument]
    async fn upload(&self, path: &Path) -> error_stack::Result<String, UploadError> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let metadata = google_drive3::api::File {
            name: Some(name),
            parents: Some(vec![self.folder_id.clone()]),
            ..Default::default()
        };
        let content = std::fs::File::open(path)
            .change_context(UploadError::LocalRead)
            .attach_printable_lazy(|| format!("path {}", path.display()))?;

        let (_, file) = self
            .hub
            .files()
            .create(metadata)
            .upload(content, mime::APPLICATION_PDF)
            .await
            .change_context(UploadError::CreateFailed)?;

        file.id
            .ok_or_else(|| report!(UploadError::CreateFailed))
            .attach_printable("Drive response carried no file id")
    }
}
