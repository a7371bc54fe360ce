//! Embedded Node automation scripts.
//!
//! The three Puppeteer scripts ship inside the binary and are installed
//! into the configured script directory at backend construction, so the
//! deployment only needs `node` and the `puppeteer` package on disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

/// Script executed for the `screenshot` action.
pub const SCREENSHOT: &str = include_str!("scripts/screenshot.js");
/// Script executed for the `pdf` action.
pub const PDF: &str = include_str!("scripts/pdf.js");
/// Script executed for the `extract` action.
pub const EXTRACT: &str = include_str!("scripts/extract.js");

/// File names the scripts are installed under.
pub const SCRIPT_FILES: [(&str, &str); 3] = [
    ("screenshot.js", SCREENSHOT),
    ("pdf.js", PDF),
    ("extract.js", EXTRACT),
];

/// Install the embedded scripts into `dir`, creating it if needed.
///
/// Idempotent: existing script files are left untouched, so an operator
/// can patch them in place without the gateway overwriting the edits.
pub fn install_scripts(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)?;

    for (name, contents) in SCRIPT_FILES {
        let path = dir.join(name);
        if !path.exists() {
            fs::write(&path, contents)?;
            info!("Installed browser script {}", path.display());
        }
    }

    Ok(())
}

/// Resolve the on-disk path of an installed script.
pub fn script_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(name)
}
