mod commands;
mod workspace;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rhtmx-routes")]
#[command(version, about = "Translated route tables for RHTMX projects", long_about = None)]
struct Cli {
    /// Router configuration file
    #[arg(short, long, global = true, default_value = "routes.toml")]
    config: PathBuf,

    /// Route file to load instead of the configured sources (repeatable)
    #[arg(short, long, global = true)]
    source: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load every route and report the table
    Check,

    /// Match a path against the table
    Find {
        /// Path to match, query string allowed
        path: String,

        /// HTTP method of the request
        #[arg(short, long, default_value = "GET")]
        method: String,
    },

    /// Generate the URL of a route
    Url {
        /// Route id
        id: String,

        /// Language (defaults to the configured one)
        #[arg(short, long)]
        lang: Option<String>,

        /// Rewrite parameter as name=value (repeatable)
        #[arg(short, long = "param", value_parser = parse_pair)]
        params: Vec<(String, String)>,

        /// Query parameter as name=value (repeatable)
        #[arg(short, long = "query", value_parser = parse_pair)]
        queries: Vec<(String, String)>,

        /// Prefix the URL with http://<host>
        #[arg(long)]
        host: Option<String>,
    },

    /// Write the compiled table as a JSON cache
    Export {
        /// Output file (defaults to the configured cache, then stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let workspace = workspace::Workspace::load(&cli.config, &cli.source)?;

    match cli.command {
        Commands::Check => {
            commands::check::execute(&workspace)?;
        }
        Commands::Find { path, method } => {
            commands::find::execute(&workspace, &path, &method)?;
        }
        Commands::Url {
            id,
            lang,
            params,
            queries,
            host,
        } => {
            commands::url::execute(
                &workspace,
                &id,
                lang.as_deref(),
                params,
                queries,
                host.as_deref(),
            )?;
        }
        Commands::Export { output } => {
            commands::export::execute(&workspace, output.as_deref())?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_pair() {
        assert_eq!(parse_pair("slug=a=b").unwrap(), ("slug".to_string(), "a=b".to_string()));
        assert_eq!(parse_pair("empty=").unwrap(), ("empty".to_string(), String::new()));
        assert!(parse_pair("=value").is_err());
        assert!(parse_pair("novalue").is_err());
    }

    #[test]
    fn test_cli_parses_url_command() {
        let cli = Cli::parse_from([
            "rhtmx-routes", "url", "NEWS", "-l", "EN", "-p", "slug=hello", "-q", "ref=home",
        ]);
        assert_eq!(cli.config, PathBuf::from("routes.toml"));
        match cli.command {
            Commands::Url { id, lang, params, queries, host } => {
                assert_eq!(id, "NEWS");
                assert_eq!(lang.as_deref(), Some("EN"));
                assert_eq!(params, vec![("slug".to_string(), "hello".to_string())]);
                assert_eq!(queries, vec![("ref".to_string(), "home".to_string())]);
                assert_eq!(host, None);
            }
            _ => panic!("expected the url command"),
        }
    }
}
