use std::path::{Path, PathBuf};

use crate::foundation::error::{SdBatchError, SdBatchResult};

pub const IMAGE_EXTENSION: &str = "png";

/// First unused path among `{prefix}_{seed}.png`, `{prefix}_{seed}_1.png`, `{prefix}_{seed}_2.png`, ...
///
/// This is a check-then-create scan, not a reservation: two processes writing the same
/// prefix and seed into one directory can still collide.
pub fn next_output_path(dir: &Path, prefix: &str, seed: u64) -> SdBatchResult<PathBuf> {
    let base = dir.join(format!("{prefix}_{seed}.{IMAGE_EXTENSION}"));
    if !exists(&base)? {
        return Ok(base);
    }

    let mut n: u64 = 1;
    loop {
        let candidate = dir.join(format!("{prefix}_{seed}_{n}.{IMAGE_EXTENSION}"));
        if !exists(&candidate)? {
            return Ok(candidate);
        }
        n += 1;
    }
}

fn exists(path: &Path) -> SdBatchResult<bool> {
    path.try_exists()
        .map_err(|e| SdBatchError::io(format!("error checking file {}", path.display()), e))
}

#[cfg(test)]
#[path = "../../tests/unit/output/naming.rs"]
mod tests;
