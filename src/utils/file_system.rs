use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub fn ensure_dir_exists(path: &Path) -> Result<(), String> {
    if !path.exists() {
        fs::create_dir_all(path)
            .map_err(|e| format!("Failed to create directory {:?}: {}", path, e))?;
        log::info!("Created directory: {:?}", path);
    }
    Ok(())
}

/// Removes `path` and everything below it. Returns whether anything was removed.
pub fn remove_dir_if_exists(path: &Path) -> Result<bool, String> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(path)
        .map_err(|e| format!("Failed to remove directory {:?}: {}", path, e))?;
    log::info!("Removed directory: {:?}", path);
    Ok(true)
}

/// Deletes and recreates `path` so nothing from a previous configuration survives.
pub fn recreate_dir(path: &Path) -> Result<(), String> {
    remove_dir_if_exists(path)?;
    ensure_dir_exists(path)
}

/// Every file below `dir` with the given extension, sorted.
pub fn find_files_by_extension(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().map_or(false, |ext| ext == extension))
        .map(|e| e.into_path())
        .collect();
    found.sort();
    found
}
