use anyhow::Result;
use colored::Colorize;
use rhtmx_i18n_router::RequestContext;

use crate::workspace::Workspace;

pub fn execute(workspace: &Workspace, path: &str, method: &str) -> Result<()> {
    let mut router = workspace.router(RequestContext::new().with_method(method));
    let route = router.find(path);

    if route.is_empty() {
        println!("{} No route matches {} {}", "✗".red(), method.to_uppercase(), path);
        anyhow::bail!("No route found");
    }

    println!("{} {}", "✓".green(), route.id().bold());
    println!("  Language:   {}", route.lang().cyan());
    println!("  Controller: {}", route.controller().cyan());

    if !route.rewrite_params().is_empty() {
        println!("  Params:");
        for (name, value) in route.rewrite_params() {
            println!("    {} = {}", name, value);
        }
    }
    if !route.query_params().is_empty() {
        println!("  Query:");
        for (name, value) in route.query_params() {
            println!("    {} = {}", name, value);
        }
    }

    Ok(())
}
