#[derive(serde::Deserialize, Debug, Clone)]
pub struct PdfConfig {
    /// AcroForm template; read-only, never modified.
    pub template_path: Box<str>,
    /// Overwritten on every run.
    pub output_path: Box<str>,
}
