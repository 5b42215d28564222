//! Command-line surface of the `postgrab` binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgGroup, Parser};
use engine_logging::{LevelFilter, LogDestination};
use postgrab_engine::{ListOptions, MediaSourceSettings, DEFAULT_API_BASE};

/// Download posts into one directory per shortcode.
#[derive(Parser, Debug)]
#[command(name = "postgrab")]
#[command(about = "Download posts (images/videos) into one directory per shortcode")]
#[command(version)]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .args(["target", "shortcode", "post_url", "shortcodes_file"])
))]
pub struct Cli {
    /// Your account name, for access to private profiles (prompts for a password)
    #[arg(short = 'u', long)]
    pub username: Option<String>,

    /// Profile to download posts from
    #[arg(short = 't', long)]
    pub target: Option<String>,

    /// Number of recent posts to download (0 for all)
    #[arg(short = 'c', long, default_value_t = 0)]
    pub count: usize,

    /// Directory the per-post directories are created in
    #[arg(short = 'd', long, default_value = ".")]
    pub directory: PathBuf,

    /// Download only posts (no stories, highlights, etc.)
    #[arg(short = 'p', long)]
    pub posts_only: bool,

    /// Shortcode of a specific post to download
    #[arg(short = 's', long)]
    pub shortcode: Option<String>,

    /// URL of a specific post to download
    #[arg(short = 'P', long = "post-url")]
    pub post_url: Option<String>,

    /// File containing shortcodes to download, one per line
    #[arg(long = "shortcodes-file")]
    pub shortcodes_file: Option<PathBuf>,

    /// Base URL of the media gateway
    #[arg(long = "api-base", env = "POSTGRAB_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Per-request timeout in seconds
    #[arg(long = "timeout-secs", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Also write the log to this file
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Write the run summary as JSON to this file
    #[arg(long = "summary-json")]
    pub summary_json: Option<PathBuf>,
}

/// The one input form selected for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Profile(String),
    Shortcode(String),
    PostUrl(String),
    ShortcodesFile(PathBuf),
}

impl Cli {
    pub fn input_mode(&self) -> Option<InputMode> {
        if let Some(target) = &self.target {
            return Some(InputMode::Profile(target.clone()));
        }
        if let Some(code) = &self.shortcode {
            return Some(InputMode::Shortcode(code.clone()));
        }
        if let Some(url) = &self.post_url {
            return Some(InputMode::PostUrl(url.clone()));
        }
        self.shortcodes_file.clone().map(InputMode::ShortcodesFile)
    }

    pub fn list_options(&self) -> ListOptions {
        ListOptions {
            posts_only: self.posts_only,
        }
    }

    pub fn source_settings(&self) -> MediaSourceSettings {
        MediaSourceSettings {
            base_url: self.api_base.clone(),
            request_timeout: Duration::from_secs(self.timeout_secs),
            ..MediaSourceSettings::default()
        }
    }

    pub fn log_destination(&self) -> LogDestination {
        match &self.log_file {
            Some(path) => LogDestination::TerminalAndFile(path.clone()),
            None => LogDestination::Terminal,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn profile_mode_with_flags() {
        let cli = Cli::parse_from(["postgrab", "-t", "alice", "-c", "5", "-p", "-d", "out"]);
        assert_eq!(cli.input_mode(), Some(InputMode::Profile("alice".to_string())));
        assert_eq!(cli.count, 5);
        assert!(cli.list_options().posts_only);
        assert_eq!(cli.directory, PathBuf::from("out"));
    }

    #[test]
    fn defaults_are_unbounded_and_current_dir() {
        let cli = Cli::parse_from(["postgrab", "-s", "AAA111"]);
        assert_eq!(cli.count, 0);
        assert_eq!(cli.directory, PathBuf::from("."));
        assert!(!cli.posts_only);
        assert_eq!(cli.username, None);
        assert_eq!(cli.log_level(), LevelFilter::Info);
    }

    #[test]
    fn post_url_and_file_modes() {
        let cli = Cli::parse_from(["postgrab", "-P", "instagram.com/p/XyZ_123/"]);
        assert_eq!(
            cli.input_mode(),
            Some(InputMode::PostUrl("instagram.com/p/XyZ_123/".to_string()))
        );

        let cli = Cli::parse_from(["postgrab", "--shortcodes-file", "codes.txt", "-u", "me"]);
        assert_eq!(
            cli.input_mode(),
            Some(InputMode::ShortcodesFile(PathBuf::from("codes.txt")))
        );
        assert_eq!(cli.username.as_deref(), Some("me"));
    }

    #[test]
    fn missing_input_is_a_usage_error() {
        let err = Cli::try_parse_from(["postgrab", "-u", "me"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn two_inputs_are_a_usage_error() {
        let err = Cli::try_parse_from(["postgrab", "-t", "alice", "-s", "AAA111"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn log_file_selects_combined_destination() {
        let cli = Cli::parse_from(["postgrab", "-s", "A1", "--log-file", "run.log", "-v"]);
        assert_eq!(
            cli.log_destination(),
            LogDestination::TerminalAndFile(PathBuf::from("run.log"))
        );
        assert_eq!(cli.log_level(), LevelFilter::Debug);
    }

    #[test]
    fn timeout_flows_into_source_settings() {
        let cli = Cli::parse_from(["postgrab", "-s", "A1", "--timeout-secs", "5"]);
        assert_eq!(cli.source_settings().request_timeout, Duration::from_secs(5));
    }
}
