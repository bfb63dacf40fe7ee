use super::{json_pretty, load_manifest, EXIT_SUCCESS};
use depgroups_schema::{DependencyGroupResolver, GroupName};
use std::path::Path;

pub fn run(manifest_path: &Path, name: Option<&str>, json: bool) -> Result<u8, String> {
    let manifest = load_manifest(manifest_path)?;
    let resolver = DependencyGroupResolver::new(&manifest);
    let groups = resolver
        .resolved_groups()
        .map_err(|e| format!("dependency groups: {e}"))?;

    if let Some(name) = name {
        let Some(requirements) = groups.get(&GroupName::normalized(name)) else {
            return Err(format!("dependency group '{name}' not found"));
        };
        if json {
            println!("{}", json_pretty(requirements)?);
        } else {
            for requirement in requirements {
                println!("{requirement}");
            }
        }
        return Ok(EXIT_SUCCESS);
    }

    if let Some(advisory) = resolver.groups_location().advisory {
        eprintln!("warning: {advisory}");
    }

    if json {
        println!("{}", json_pretty(&groups)?);
    } else if groups.is_empty() {
        println!("no dependency groups");
    } else {
        for (group, requirements) in &groups {
            println!("{group}: {}", requirements.join(", "));
        }
    }
    Ok(EXIT_SUCCESS)
}
