use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "arbor",
    about = "arbor: tree status and merge status between changesets",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Repository manifest (TOML, or JSON by extension)
    #[arg(short, long, global = true, default_value = "arbor.toml")]
    pub manifest: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show changes between two changesets
    Status(StatusArgs),
    /// Show how a merge relates to its parents and their common ancestor
    Mstatus(MstatusArgs),
    /// List the changesets in the manifest
    Show(ShowArgs),
}

#[derive(Args)]
pub struct StatusArgs {
    /// Changeset name or id prefix
    pub from: String,
    pub to: String,
    #[arg(long)]
    pub unsorted: bool,
    /// Restrict to items by path, or `gid:<gid>`
    #[arg(long = "filter", value_name = "PATH|gid:GID")]
    pub filters: Vec<String>,
    /// Levels below a filtered directory to report
    #[arg(long, requires = "filters")]
    pub depth: Option<usize>,
}

#[derive(Args)]
pub struct MstatusArgs {
    pub merge: String,
    /// Fail on single-parent changesets instead of comparing with the parent
    #[arg(long)]
    pub no_fallback: bool,
    #[arg(long)]
    pub unsorted: bool,
}

#[derive(Args)]
pub struct ShowArgs {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_status() {
        let cli = Cli::try_parse_from(["arbor", "status", "base", "left"]).unwrap();
        if let Command::Status(args) = cli.command {
            assert_eq!(args.from, "base");
            assert_eq!(args.to, "left");
            assert!(!args.unsorted);
            assert!(args.filters.is_empty());
        } else {
            panic!("wrong command");
        }
        assert_eq!(cli.manifest, PathBuf::from("arbor.toml"));
    }

    #[test]
    fn parse_filtered_status() {
        let cli = Cli::try_parse_from([
            "arbor", "status", "a", "b", "--filter", "dir", "--filter", "gid:f1", "--depth", "1",
        ])
        .unwrap();
        if let Command::Status(args) = cli.command {
            assert_eq!(args.filters, ["dir", "gid:f1"]);
            assert_eq!(args.depth, Some(1));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn depth_needs_a_filter() {
        assert!(Cli::try_parse_from(["arbor", "status", "a", "b", "--depth", "1"]).is_err());
    }

    #[test]
    fn parse_mstatus() {
        let cli = Cli::try_parse_from(["arbor", "mstatus", "merge", "--no-fallback"]).unwrap();
        if let Command::Mstatus(args) = cli.command {
            assert_eq!(args.merge, "merge");
            assert!(args.no_fallback);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from([
            "arbor", "show", "--manifest", "repo.json", "--format", "json", "-v",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Show(_)));
        assert_eq!(cli.manifest, PathBuf::from("repo.json"));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.verbose);
    }
}
