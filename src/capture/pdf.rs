use super::{CaptureError, CaptureResult};
use std::path::Path;
use tokio::process::Command;

/// Hands a URL to an external HTML-to-PDF renderer
///
/// The program is invoked as `<program> <url> <output file>`.
#[derive(Debug, Clone)]
pub struct PdfExporter {
    program: String,
}

impl PdfExporter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub async fn export(&self, url: &str, output: &Path) -> CaptureResult<()> {
        tracing::info!("Exporting {} to {}", url, output.display());

        let result = Command::new(&self.program)
            .arg(url)
            .arg(output)
            .output()
            .await
            .map_err(|e| CaptureError::Pdf(format!("failed to run {}: {}", self.program, e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(CaptureError::Pdf(format!(
                "{} exited with {}: {}",
                self.program,
                result.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

impl Default for PdfExporter {
    fn default() -> Self {
        Self::new("wkhtmltopdf")
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_successful_export() {
        let exporter = PdfExporter::new("true");
        exporter
            .export("https://example.com", Path::new("/tmp/unused.pdf"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_failing_renderer() {
        let err = PdfExporter::new("false")
            .export("https://example.com", Path::new("/tmp/unused.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::Pdf(_)));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let err = PdfExporter::new("deepshot-no-such-renderer")
            .export("https://example.com", Path::new("/tmp/unused.pdf"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to run"));
    }
}
