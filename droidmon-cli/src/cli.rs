//! CLI argument parsing types using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// `droidmon` command-line interface for Android device telemetry
#[derive(Parser)]
#[command(name = "droidmon")]
#[command(author, version, about = "Android device telemetry over adb")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration directory
    #[arg(short, long, global = true, env = "DROIDMON_CONFIG_DIR")]
    pub config: Option<PathBuf>,

    /// Device serial, as listed by `adb devices`
    #[arg(short, long, global = true, env = "ANDROID_SERIAL")]
    pub serial: Option<String>,

    /// Path to the adb executable
    #[arg(long, global = true, value_name = "PATH")]
    pub adb: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except results
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Take one system snapshot
    #[command(about = "Read CPU, memory, disk, network and thermal figures once")]
    Snapshot {
        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,

        /// Seconds between the two reads used for rates (0 skips rates)
        #[arg(short, long, default_value = "1")]
        interval: u8,
    },

    /// Stream system metrics
    #[command(about = "Poll system metrics until interrupted")]
    Watch {
        /// Output format (json emits one object per line)
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,

        /// Poll interval in seconds (1-30); defaults to the configured value
        #[arg(short, long)]
        interval: Option<u8>,

        /// Stop after this many updates
        #[arg(short = 'n', long)]
        count: Option<u32>,
    },

    /// Show the busiest processes
    #[command(about = "Show a refreshing process table")]
    Top {
        /// Output format (json emits one table per line)
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,

        /// Rows to show
        #[arg(short, long, default_value = "15")]
        limit: usize,

        /// Only show installed app processes
        #[arg(long)]
        apps: bool,

        /// Poll interval in seconds (1-30); defaults to the configured value
        #[arg(short, long)]
        interval: Option<u8>,

        /// Stop after this many tables
        #[arg(short = 'n', long)]
        count: Option<u32>,
    },

    /// Show device properties
    #[command(about = "Show model, Android version, ABI and uptime")]
    Info {
        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Connect to a device over TCP/IP
    #[command(about = "Run `adb connect` against a host:port")]
    Connect {
        /// Device address, e.g. 192.168.1.20:5555
        address: String,
    },

    /// Install an APK
    #[command(about = "Install or replace an APK on the device")]
    Install {
        /// Path to the APK
        apk: PathBuf,
    },

    /// Uninstall a package
    #[command(about = "Uninstall a package from the device")]
    Uninstall {
        /// Package name
        package: String,
    },

    /// Kill a process
    #[command(about = "Send SIGTERM to a process on the device")]
    Kill {
        /// Process id
        pid: u32,
    },

    /// List installed packages
    #[command(about = "List installed packages")]
    Packages {
        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,

        /// Include system packages
        #[arg(long)]
        all: bool,

        /// Measure each package's code size (slow)
        #[arg(long)]
        sizes: bool,
    },

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    #[command(about = "Generate shell completion scripts")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Configuration subcommands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write a default configuration file
    #[command(about = "Write a config.toml with default settings")]
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective settings
    #[command(about = "Print the effective settings as TOML or JSON")]
    Show {
        /// Print JSON instead of TOML
        #[arg(long)]
        json: bool,
    },

    /// Print the configuration file path
    #[command(about = "Print the path of config.toml")]
    Path,
}

/// Output format for results
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Display as formatted table
    Table,
    /// Output as JSON
    Json,
}
