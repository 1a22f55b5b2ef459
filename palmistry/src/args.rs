use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Palm photo analysis from the terminal
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to palmistry.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub subcommand: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a palm photo to the analysis backend and print the result
    Analyze(AnalyzeArgs),
    /// Show how many images the upload proxy currently holds
    Stats {
        /// Upload proxy URL
        #[arg(long)]
        server: Option<String>,
    },
}

#[derive(clap::Args, Debug)]
pub struct AnalyzeArgs {
    pub image: PathBuf,

    /// Upload proxy URL
    #[arg(long)]
    pub server: Option<String>,

    /// Analysis backend URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Send the image as a data URL instead of uploading it
    #[arg(long)]
    pub inline: bool,

    /// Send the file as it is, without rotating, resizing or re-encoding
    #[arg(long)]
    pub no_prepare: bool,

    /// Print the backend response as JSON
    #[arg(long)]
    pub json: bool,

    /// Write the annotated result image to this path
    #[arg(long)]
    pub save_image: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze() {
        let args = Args::parse_from([
            "palmistry",
            "analyze",
            "palm.jpg",
            "--inline",
            "--api-url",
            "http://backend:8000",
        ]);
        let Commands::Analyze(analyze) = args.subcommand else {
            panic!("expected analyze");
        };
        assert_eq!(analyze.image, PathBuf::from("palm.jpg"));
        assert!(analyze.inline);
        assert!(!analyze.no_prepare);
        assert_eq!(analyze.api_url.as_deref(), Some("http://backend:8000"));
        assert_eq!(analyze.server, None);
    }

    #[test]
    fn test_parse_stats_with_global_config() {
        let args = Args::parse_from([
            "palmistry",
            "stats",
            "--config",
            "palmistry.toml",
            "--server",
            "http://localhost:8512",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("palmistry.toml")));
        assert!(matches!(
            args.subcommand,
            Commands::Stats { server: Some(ref s) } if s == "http://localhost:8512"
        ));
    }
}
