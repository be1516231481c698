use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "registrar")]
#[command(author, version, about = "Student management back end")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create or upgrade the database schema, then exit
    Migrate,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses --config if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,

    /// Generate a random admin API key
    GenerateApiKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_flags_override_optional() {
        let cli = Cli::parse_from(["registrar", "start", "--port", "9000"]);
        match cli.command {
            Commands::Start { host, port } => {
                assert_eq!(host, None);
                assert_eq!(port, Some(9000));
            }
            _ => panic!("expected start"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["registrar", "migrate", "-v", "--config", "reg.json"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("reg.json")));
        assert!(matches!(cli.command, Commands::Migrate));
    }
}
