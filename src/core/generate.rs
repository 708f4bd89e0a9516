use std::fs;
use std::path::Path;

use rand::Rng;

use crate::core::error::BatchError;

pub const DEFAULT_GENERATE_COUNT: usize = 1000;

/// Writes `input_file_{1..=count}.txt` sample inputs holding one random
/// number each. Existing files are left untouched. Returns how many files
/// were created.
pub fn generate_inputs(dir: &Path, count: usize) -> Result<usize, BatchError> {
    fs::create_dir_all(dir).map_err(|e| BatchError::filesystem(dir, e))?;

    let mut rng = rand::thread_rng();
    let mut created = 0;
    for i in 1..=count {
        let path = dir.join(format!("input_file_{i}.txt"));
        if path.exists() {
            continue;
        }
        let value: u32 = rng.gen_range(0..=999_999_999);
        fs::write(&path, value.to_string()).map_err(|e| BatchError::filesystem(&path, e))?;
        created += 1;
    }

    tracing::info!(dir = %dir.display(), created, "generated sample inputs");
    Ok(created)
}
