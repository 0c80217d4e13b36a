// ABOUTME: Removes the intermediate dump file after a successful load
// ABOUTME: A file that cannot be removed is a hard error

use crate::error::EltError;
use std::fs;
use std::path::Path;

pub fn cleanup(path: &Path) -> Result<(), EltError> {
    fs::remove_file(path).map_err(|source| EltError::Cleanup {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!("Intermediate dump file removed successfully.");
    Ok(())
}
