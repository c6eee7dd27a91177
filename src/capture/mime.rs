//! Downloadable content classification
//!
//! A node is captured as a raw download instead of a screenshot when it is
//! flagged as an attachment or its URL path ends in an extension whose MIME
//! type is in the fixed downloadable set.

use crate::state::ContentClass;
use url::Url;

/// Extensions mapping to the generic downloadable types
const GENERIC_TYPES: &[(&str, &str)] = &[
    ("pdf", "application/pdf"),
    ("ics", "text/calendar"),
    ("bin", "application/octet-stream"),
    ("exe", "application/octet-stream"),
    ("dll", "application/octet-stream"),
    ("so", "application/octet-stream"),
    ("o", "application/octet-stream"),
    ("obj", "application/octet-stream"),
    ("a", "application/octet-stream"),
];

/// Microsoft Office document types
///
/// See <http://filext.com/faq/office_mime_types.php>
pub const OFFICE_TYPES: &[(&str, &str)] = &[
    ("doc", "application/msword"),
    ("dot", "application/msword"),
    ("docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
    ("dotx", "application/vnd.openxmlformats-officedocument.wordprocessingml.template"),
    ("docm", "application/vnd.ms-word.document.macroEnabled.12"),
    ("dotm", "application/vnd.ms-word.template.macroEnabled.12"),
    ("xls", "application/vnd.ms-excel"),
    ("xlt", "application/vnd.ms-excel"),
    ("xla", "application/vnd.ms-excel"),
    ("xlsx", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
    ("xltx", "application/vnd.openxmlformats-officedocument.spreadsheetml.template"),
    ("xlsm", "application/vnd.ms-excel.sheet.macroEnabled.12"),
    ("xltm", "application/vnd.ms-excel.template.macroEnabled.12"),
    ("xlam", "application/vnd.ms-excel.addin.macroEnabled.12"),
    ("xlsb", "application/vnd.ms-excel.sheet.binary.macroEnabled.12"),
    ("ppt", "application/vnd.ms-powerpoint"),
    ("pot", "application/vnd.ms-powerpoint"),
    ("pps", "application/vnd.ms-powerpoint"),
    ("ppa", "application/vnd.ms-powerpoint"),
    ("pptx", "application/vnd.openxmlformats-officedocument.presentationml.presentation"),
    ("potx", "application/vnd.openxmlformats-officedocument.presentationml.template"),
    ("ppsx", "application/vnd.openxmlformats-officedocument.presentationml.slideshow"),
    ("ppam", "application/vnd.ms-powerpoint.addin.macroEnabled.12"),
    ("pptm", "application/vnd.ms-powerpoint.presentation.macroEnabled.12"),
    ("potm", "application/vnd.ms-powerpoint.template.macroEnabled.12"),
    ("ppsm", "application/vnd.ms-powerpoint.slideshow.macroEnabled.12"),
];

/// Infers the MIME type from the URL path extension
///
/// Only types in the downloadable set are known; anything else is None.
pub fn guess_mime(url: &str) -> Option<&'static str> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or(url).to_string(),
    };

    let file_name = path.rsplit('/').next()?;
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();

    GENERIC_TYPES
        .iter()
        .chain(OFFICE_TYPES)
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
}

/// Decides whether a node should be downloaded rather than rendered
pub fn is_downloadable(url: &str, content_class: Option<ContentClass>) -> bool {
    if content_class == Some(ContentClass::Attachment) {
        return true;
    }
    guess_mime(url).is_some()
}

/// Unique downloadable MIME types, in table order
///
/// Browsers are told to save these straight to disk.
pub fn downloadable_mime_types() -> Vec<&'static str> {
    let mut types: Vec<&'static str> = Vec::new();
    for (_, mime) in GENERIC_TYPES.iter().chain(OFFICE_TYPES) {
        if !types.contains(mime) {
            types.push(mime);
        }
    }
    types
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime("https://x.com/files/report.PDF"), Some("application/pdf"));
        assert_eq!(
            guess_mime("https://x.com/a/sheet.xlsx?version=2"),
            Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")
        );
        assert_eq!(guess_mime("https://x.com/invite.ics"), Some("text/calendar"));
        assert_eq!(guess_mime("https://x.com/page.html"), None);
        assert_eq!(guess_mime("https://x.com/docs"), None);
        assert_eq!(guess_mime("https://x.com/v1.2/page"), None);
    }

    #[test]
    fn test_attachment_always_downloadable() {
        assert!(is_downloadable(
            "https://x.com/download/attachments/1/file?download=true",
            Some(ContentClass::Attachment)
        ));
        assert!(!is_downloadable("https://x.com/page", None));
        assert!(is_downloadable("https://x.com/slides.pptx", None));
    }

    #[test]
    fn test_downloadable_mime_types_unique() {
        let types = downloadable_mime_types();
        assert!(types.contains(&"application/pdf"));
        assert!(types.contains(&"application/msword"));
        let mut deduped = types.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), types.len());
    }
}
