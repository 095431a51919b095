use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Save web articles as PDFs and keep them on a reading list
#[derive(Parser, Debug)]
#[command(name = "shelf")]
#[command(author = "Shelf Contributors")]
#[command(version)]
#[command(about = "Save web articles as clean PDFs", long_about = None)]
pub struct Args {
    /// Data directory (overrides SHELF_DATA_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Fetch, extract and archive one or more URLs
    Add {
        #[arg(value_name = "URL", required = true)]
        urls: Vec<String>,
    },
    /// Show the reading list, newest first
    List {
        /// Page number (1-based)
        #[arg(long, default_value_t = 1, value_name = "N")]
        page: usize,

        /// Print every record as a JSON array instead
        #[arg(long)]
        json: bool,
    },
    /// Show one article's metadata
    Show { id: String },
    /// Print the path of an article's PDF
    Path { id: String },
    /// Delete an article and its PDF
    Delete { id: String },
    /// Remove PDFs no article refers to
    Sweep {
        /// Only remove files at least this old
        #[arg(long, default_value_t = 300, value_name = "SECS")]
        min_age_secs: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_add_with_many_urls() {
        let args = Args::try_parse_from(["shelf", "add", "https://a.org", "https://b.org"]).unwrap();
        assert_eq!(
            args.command,
            Command::Add {
                urls: vec!["https://a.org".into(), "https://b.org".into()]
            }
        );
    }

    #[test]
    fn add_requires_a_url() {
        assert!(Args::try_parse_from(["shelf", "add"]).is_err());
    }

    #[test]
    fn global_data_dir_after_subcommand() {
        let args = Args::try_parse_from(["shelf", "list", "--page", "3", "--data-dir", "/tmp/s"]).unwrap();
        assert_eq!(args.data_dir, Some(PathBuf::from("/tmp/s")));
        assert_eq!(args.command, Command::List { page: 3, json: false });
    }

    #[test]
    fn sweep_has_grace_period_by_default() {
        let args = Args::try_parse_from(["shelf", "sweep"]).unwrap();
        assert_eq!(args.command, Command::Sweep { min_age_secs: 300 });
    }
}
