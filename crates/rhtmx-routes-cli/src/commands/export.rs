use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;

use crate::workspace::Workspace;

pub fn execute(workspace: &Workspace, output: Option<&Path>) -> Result<()> {
    let json = workspace.table.to_cache_json()?;

    let Some(path) = output.or(workspace.config.cache.as_deref()) else {
        println!("{}", json);
        return Ok(());
    };

    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {:?}", dir))?;
    }
    fs::write(path, json).with_context(|| format!("Failed to write route cache: {:?}", path))?;

    println!(
        "  {} {} routes written to {}",
        "✓".green(),
        workspace.table.len(),
        path.display()
    );

    Ok(())
}
