use super::{json_pretty, load_manifest, EXIT_SUCCESS};
use depgroups_schema::{format_content_hash, DependencyGroupResolver, HashAlgorithm};
use std::path::Path;

pub fn run(manifest_path: &Path, algo: HashAlgorithm, json: bool) -> Result<u8, String> {
    let manifest = load_manifest(manifest_path)?;
    let digest = DependencyGroupResolver::new(&manifest)
        .content_hash(algo)
        .map_err(|e| format!("content hash: {e}"))?;
    let content_hash = format_content_hash(algo, &digest);

    if json {
        let payload = serde_json::json!({
            "manifest": manifest_path,
            "algorithm": algo.as_str(),
            "content_hash": content_hash,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("{content_hash}");
    }
    Ok(EXIT_SUCCESS)
}
