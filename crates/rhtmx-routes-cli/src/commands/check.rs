use anyhow::Result;
use colored::Colorize;

use crate::workspace::Workspace;

pub fn execute(workspace: &Workspace) -> Result<()> {
    println!("{}", "Checking routes...".green().bold());
    println!();

    for entry in workspace.table.iter() {
        let methods = if entry.methods().is_empty() {
            "ANY".to_string()
        } else {
            entry.methods().iter().cloned().collect::<Vec<_>>().join(" ")
        };

        println!(
            "  {} {} {} [{}]",
            "✓".green(),
            entry.id().bold(),
            entry.controller().cyan(),
            methods
        );
        for (lang, route) in entry.routes() {
            println!("      {:<4} /{}", lang, route.original());
        }
        for (label, value) in entry.options() {
            println!("      {} {} = {}", "option".dimmed(), label, value);
        }
    }

    println!();
    println!(
        "{}",
        format!("{} routes loaded", workspace.table.len()).green().bold()
    );

    Ok(())
}
