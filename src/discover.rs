use std::{
    fs, io,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use tracing::debug;

/// Lists regular files in `dir` (not recursing) whose name ends with
/// `suffix`, leaving out `output` so a rerun never reads its own result.
/// Paths come back sorted.
pub fn discover(dir: &Path, suffix: &str, output: &Path) -> io::Result<Vec<PathBuf>> {
    // Output usually does not exist yet on a first run
    let output = fs::canonicalize(output).ok();
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        // follows symlinks, a dangling link is not a file
        if !path.is_file() {
            continue;
        }
        let name_matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |n| n.ends_with(suffix));
        if !name_matches {
            continue;
        }
        if output.is_some() && fs::canonicalize(&path).ok() == output {
            debug!(path = %path.display(), "skipping output file");
            continue;
        }
        found.push(path);
    }
    Ok(found.into_iter().sorted().collect())
}
