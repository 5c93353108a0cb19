#[derive(serde::Deserialize, Debug, Clone)]
pub struct DriveConfig {
    /// Drive folder the filled PDF is uploaded into.
    pub folder_id: Box<str>,
    pub upload_enabled: bool,
    /// When false (the default posture), a failed upload is reported in the
    /// response next to the successful fill instead of failing the request.
    pub upload_failure_fatal: bool,
}
