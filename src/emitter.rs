//! Output emission.
//!
//! Writes the assembled script atomically: content goes to a named
//! temporary file in the destination directory, then a rename moves it into
//! place. A failed write leaves any previous output file untouched and
//! cleans up the temporary file.

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use log::info;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Write the generated script to its final path.
pub fn emit_script(output_path: &Path, contents: &str) -> Result<()> {
    let directory = output_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp_file = NamedTempFile::new_in(directory).wrap_err_with(|| {
        format!("Failed to create temporary file in '{}'", directory.display())
    })?;
    temp_file
        .write_all(contents.as_bytes())
        .wrap_err("Failed to write generated script")?;
    temp_file.persist(output_path).map_err(|error| {
        eyre!(
            "Failed to move generated script into place at '{}': {}",
            output_path.display(),
            error
        )
    })?;

    info!("Wrote generated script to {}", output_path.display());
    Ok(())
}
