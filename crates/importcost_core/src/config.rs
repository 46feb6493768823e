use anyhow::{Result, anyhow};
use log::{debug, trace};
use std::path::{Path, PathBuf};

/// Markers that identify a project root, checked in every ancestor of the start directory.
const ROOT_MARKERS: &[&str] = &[".git", "package.json"];

/// Nearest ancestor of `start` (inclusive) holding a `.git` directory or a
/// `package.json`. Bounds the `node_modules` search of an analyzer.
pub fn find_project_root(start: &Path) -> Result<PathBuf> {
    debug!("Searching for project root from {:?}", start);
    let mut current_dir = start;

    loop {
        for marker in ROOT_MARKERS {
            let candidate = current_dir.join(marker);
            trace!("Checking for {} at: {:?}", marker, candidate);
            if candidate.exists() {
                debug!("Found project root at: {:?}", current_dir);
                return Ok(current_dir.to_path_buf());
            }
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent,
            None => {
                debug!("No project root above {:?}", start);
                return Err(anyhow!(
                    "Could not find .git or package.json above {}",
                    start.display()
                ));
            }
        }
    }
}
