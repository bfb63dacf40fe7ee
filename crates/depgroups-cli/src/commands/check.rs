use super::{json_pretty, load_manifest, EXIT_STALE_LOCK, EXIT_SUCCESS};
use depgroups_schema::{DependencyGroupResolver, Freshness, LockFile};
use std::path::{Path, PathBuf};

fn default_lock_path(manifest_path: &Path) -> PathBuf {
    manifest_path
        .parent()
        .map_or_else(|| PathBuf::from("pdm.lock"), |dir| dir.join("pdm.lock"))
}

pub fn run(manifest_path: &Path, lock_path: Option<&Path>, json: bool) -> Result<u8, String> {
    let manifest = load_manifest(manifest_path)?;
    let lock_path = lock_path.map_or_else(|| default_lock_path(manifest_path), Path::to_path_buf);
    let lock = LockFile::read_from_file(&lock_path)
        .map_err(|e| format!("{}: {e}", lock_path.display()))?;

    let freshness = lock
        .check(&DependencyGroupResolver::new(&manifest))
        .map_err(|e| format!("lock check: {e}"))?;

    if json {
        println!("{}", json_pretty(&freshness)?);
    } else {
        match &freshness {
            Freshness::Fresh => println!("lock is up to date"),
            Freshness::Stale { recorded, computed } => {
                println!("lock is stale: recorded {recorded}, manifest {computed}");
            }
            Freshness::Unrecorded => println!("lock has no content hash"),
        }
    }

    if freshness.is_fresh() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_STALE_LOCK)
    }
}
