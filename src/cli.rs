use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "soilcorrect",
    version,
    about = "Soil and leaf test report builder"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to config.yaml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v for info, -vv for debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive report builder (default)
    Tui {
        /// Extraction JSON to open instead of starting empty
        file: Option<PathBuf>,
    },
    /// Print nutrient status, ratios and health score for an extraction JSON file
    Analyze {
        file: PathBuf,
    },
    /// Send a PDF to the extraction service and print the extracted JSON
    Extract {
        pdf: PathBuf,
        /// Write the response to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List fertilizer products
    Catalog {
        /// Only products supplying this nutrient
        #[arg(short, long)]
        nutrient: Option<String>,
        /// Release type (fast, moderate, slow, very-slow, controlled)
        #[arg(short, long)]
        release: Option<String>,
        /// Case-insensitive label search
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Ranked products and capped rates for one deficient nutrient
    Recommend {
        file: PathBuf,
        /// Nutrient name as it appears on the report, or an element
        #[arg(short, long)]
        nutrient: String,
        /// Paddock key when the report has several analyses
        #[arg(short, long)]
        paddock: Option<String>,
    },
    /// Compose general comments for a report
    Comments {
        file: PathBuf,
        #[arg(short, long)]
        paddock: Option<String>,
        /// Skip the comments service and use the template paragraphs only
        #[arg(long)]
        offline: bool,
    },
    /// Write the report export JSON, auto-selecting the top product per correction
    Export {
        file: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long)]
        paddock: Option<String>,
    },
    /// Re-run interactive setup
    Init,
    /// Validate config and test connections
    Check,
}

impl Cli {
    /// Filter directive for the log subscriber.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_recommend() {
        let cli = Cli::parse_from([
            "soilcorrect",
            "-vv",
            "recommend",
            "report.json",
            "--nutrient",
            "Calcium",
        ]);
        assert_eq!(cli.log_level(), "debug");
        match cli.command {
            Some(Commands::Recommend { nutrient, paddock, .. }) => {
                assert_eq!(nutrient, "Calcium");
                assert!(paddock.is_none());
            }
            _ => panic!("expected recommend"),
        }
    }

    #[test]
    fn no_subcommand_means_tui() {
        let cli = Cli::parse_from(["soilcorrect"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level(), "warn");
    }
}
