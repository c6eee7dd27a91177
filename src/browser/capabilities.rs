use crate::capture::downloadable_mime_types;
use serde_json::{json, Value};
use std::path::Path;

/// Browser requested from the WebDriver endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BrowserKind {
    #[default]
    Firefox,
    Chrome,
}

impl BrowserKind {
    /// Extension of in-progress download files
    pub fn partial_download_extension(&self) -> &'static str {
        match self {
            Self::Firefox => "part",
            Self::Chrome => "crdownload",
        }
    }
}

/// Builds the `POST /session` body
///
/// Both browsers are configured to save the downloadable MIME set straight
/// into `download_dir` without prompting and without opening PDFs inline.
pub fn session_capabilities(kind: BrowserKind, download_dir: &Path) -> Value {
    let dir = download_dir.display().to_string();

    let always_match = match kind {
        BrowserKind::Firefox => json!({
            "browserName": "firefox",
            "moz:firefoxOptions": {
                "prefs": {
                    "browser.download.folderList": 2,
                    "browser.download.manager.showWhenStarting": false,
                    "browser.download.dir": dir,
                    "browser.helperApps.neverAsk.saveToDisk": downloadable_mime_types().join(","),
                    "pdfjs.disabled": true,
                    "plugin.scan.plid.all": false
                }
            }
        }),
        BrowserKind::Chrome => json!({
            "browserName": "chrome",
            "goog:chromeOptions": {
                "prefs": {
                    "download.default_directory": dir,
                    "download.prompt_for_download": false,
                    "download.directory_upgrade": true,
                    "plugins.always_open_pdf_externally": true
                }
            }
        }),
    };

    json!({ "capabilities": { "alwaysMatch": always_match } })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_firefox_capabilities() {
        let caps = session_capabilities(BrowserKind::Firefox, Path::new("/tmp/out/main"));
        let prefs = &caps["capabilities"]["alwaysMatch"]["moz:firefoxOptions"]["prefs"];
        assert_eq!(caps["capabilities"]["alwaysMatch"]["browserName"], "firefox");
        assert_eq!(prefs["browser.download.dir"], "/tmp/out/main");
        assert_eq!(prefs["browser.download.folderList"], 2);
        let never_ask = prefs["browser.helperApps.neverAsk.saveToDisk"].as_str().unwrap();
        assert!(never_ask.contains("application/pdf"));
        assert!(never_ask.contains("application/vnd.ms-excel"));
    }

    #[test]
    fn test_chrome_capabilities() {
        let caps = session_capabilities(BrowserKind::Chrome, Path::new("/tmp/dl"));
        let prefs = &caps["capabilities"]["alwaysMatch"]["goog:chromeOptions"]["prefs"];
        assert_eq!(prefs["download.default_directory"], "/tmp/dl");
        assert_eq!(prefs["plugins.always_open_pdf_externally"], true);
    }

    #[test]
    fn test_partial_download_extension() {
        assert_eq!(BrowserKind::Firefox.partial_download_extension(), "part");
        assert_eq!(BrowserKind::Chrome.partial_download_extension(), "crdownload");
    }
}
