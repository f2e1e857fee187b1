use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ide-sync")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Synchronise IDE exports with Mahara and Moodle", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: <config dir>/ide-sync/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sync accounts and groups through the Mahara web services
    Mahara(MaharaArgs),

    /// Write Mahara bulk-upload CSV files
    MaharaCsv(MaharaCsvArgs),

    /// Write Moodle bulk-upload CSV files
    MoodleCsv(MoodleCsvArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Shared
// ============================================================================

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// The Identity Data Extract CSV file for input
    #[arg(short, long, default_value = "ide.csv", value_name = "IDE_FILE")]
    pub file: PathBuf,

    /// Registered domain name of the school (e.g. hogwarts.school.nz)
    #[arg(short = 'n', long, value_name = "SCHOOL_DOMAIN")]
    pub domain: Option<String>,

    /// Default password for new accounts
    #[arg(short, long, value_name = "PASSWORD")]
    pub password: Option<String>,
}

// ============================================================================
// Mahara (web services)
// ============================================================================

#[derive(Args, Debug, Clone)]
pub struct MaharaArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Process creates
    #[arg(short, long)]
    pub create: bool,

    /// Process updates
    #[arg(short, long)]
    pub update: bool,

    /// Process deletes
    #[arg(short, long)]
    pub delete: bool,

    /// Process groups
    #[arg(short, long)]
    pub groups: bool,

    /// Base URL of the Mahara site
    #[arg(short = 'm', long = "url", value_name = "MAHARA_URL")]
    pub url: Option<String>,

    /// OAuth consumer key
    #[arg(short = 'k', long, env = "IDESYNC_CONSUMER_KEY", hide_env_values = true)]
    pub consumer_key: Option<String>,

    /// OAuth consumer secret
    #[arg(short = 's', long, env = "IDESYNC_CONSUMER_SECRET", hide_env_values = true)]
    pub consumer_secret: Option<String>,

    /// File holding the OAuth access token
    #[arg(long, value_name = "PATH")]
    pub token_file: Option<PathBuf>,

    /// Show what would change without calling Mahara
    #[arg(long)]
    pub dry_run: bool,

    /// Apply without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

// ============================================================================
// CSV outputs
// ============================================================================

#[derive(Args, Debug, Clone)]
pub struct MaharaCsvArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Write the user file
    #[arg(short, long)]
    pub users: bool,

    /// Write the group and group member files
    #[arg(short, long)]
    pub groups: bool,

    /// Generate new passwords
    #[arg(short = 'z', long)]
    pub genpassword: bool,

    /// Default admin user for all groups
    #[arg(short, long, value_name = "ADMIN")]
    pub admin: Option<String>,

    /// Directory the files are written to
    #[arg(short, long, default_value = ".", value_name = "DIR")]
    pub output_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct MoodleCsvArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Write the user file
    #[arg(short, long)]
    pub users: bool,

    /// Write the course file
    #[arg(short, long)]
    pub courses: bool,

    /// Add course enrolment columns to the user file
    #[arg(short, long)]
    pub enrol: bool,

    /// Mark every user row as deleted
    #[arg(short, long)]
    pub delete: bool,

    /// Generate new passwords
    #[arg(short = 'z', long)]
    pub genpassword: bool,

    /// Leave the password column empty (for user updates)
    #[arg(short = 'x', long)]
    pub emptypassword: bool,

    /// Default admin user for all groups
    #[arg(short, long, value_name = "ADMIN")]
    pub admin: Option<String>,

    /// Directory the files are written to
    #[arg(short, long, default_value = ".", value_name = "DIR")]
    pub output_dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_mahara_flags() {
        let cli = Cli::try_parse_from([
            "ide-sync",
            "mahara",
            "-f",
            "export.csv",
            "-n",
            "hogwarts.school.nz",
            "-c",
            "-u",
            "-d",
            "-g",
            "-k",
            "key",
            "-s",
            "secret",
        ])
        .unwrap();

        let Command::Mahara(args) = cli.command else {
            panic!("expected mahara");
        };
        assert_eq!(args.input.file, PathBuf::from("export.csv"));
        assert_eq!(args.input.domain.as_deref(), Some("hogwarts.school.nz"));
        assert!(args.create && args.update && args.delete && args.groups);
        assert_eq!(args.consumer_key.as_deref(), Some("key"));
        assert!(!args.dry_run);
    }

    #[test]
    fn test_csv_defaults() {
        let cli = Cli::try_parse_from(["ide-sync", "-vv", "moodle-csv", "-u", "-e"]).unwrap();
        assert_eq!(cli.verbose, 2);

        let Command::MoodleCsv(args) = cli.command else {
            panic!("expected moodle-csv");
        };
        assert_eq!(args.input.file, PathBuf::from("ide.csv"));
        assert_eq!(args.output_dir, PathBuf::from("."));
        assert!(args.users && args.enrol);
        assert!(!args.courses && !args.delete);
    }
}
