use super::{json_pretty, load_manifest, EXIT_SUCCESS};
use depgroups_schema::DependencyGroupResolver;
use std::path::Path;

pub fn run(
    manifest_path: &Path,
    group: &str,
    requirements: &[String],
    json: bool,
) -> Result<u8, String> {
    let mut manifest = load_manifest(manifest_path)?;

    let mut resolver = DependencyGroupResolver::new(&mut manifest);
    let mut table = resolver.dependency_groups_table();
    if let Some(advisory) = table.advisory() {
        eprintln!("warning: {advisory}");
    }
    let location = table.location().path().join(".");

    let entries = table.group_mut(group);
    let mut added = Vec::new();
    for requirement in requirements {
        if entries.iter().any(|e| e.as_str() == Some(requirement.as_str())) {
            continue;
        }
        entries.push(requirement.as_str());
        added.push(requirement.as_str());
    }

    // Reject edits that leave the groups unresolvable before touching disk.
    resolver
        .resolved_groups()
        .map_err(|e| format!("dependency groups: {e}"))?;
    drop(resolver);

    manifest
        .write(manifest_path)
        .map_err(|e| format!("write manifest: {e}"))?;

    if json {
        let payload = serde_json::json!({
            "manifest": manifest_path,
            "table": location,
            "group": group,
            "added": added,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "added {} requirement(s) to '{group}' in [{location}]",
            added.len()
        );
    }
    Ok(EXIT_SUCCESS)
}
