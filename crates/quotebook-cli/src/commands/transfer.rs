//! Import and export command handlers

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use quotebook_core::transfer::EXPORT_FILE_NAME;
use quotebook_core::App;

use crate::output::Output;

/// Write every quote to a pretty-printed JSON file
pub fn export(app: &App, path: Option<&Path>, output: &Output) -> Result<()> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(EXPORT_FILE_NAME));
    let written = app
        .export_to(&path)
        .with_context(|| format!("Failed to export to {}", path.display()))?;

    if output.is_quiet() {
        println!("{}", written.display());
    } else {
        output.success(&format!(
            "Exported {} quotes to {}",
            app.store().len(),
            written.display()
        ));
    }
    Ok(())
}

/// Append quotes from a JSON file; nothing is added if any entry is invalid
pub fn import(app: &mut App, path: &Path, output: &Output) -> Result<()> {
    let count = app
        .import_file(path)
        .with_context(|| format!("Failed to import {}", path.display()))?;
    output.success(&format!("Imported {} quotes successfully!", count));
    Ok(())
}
