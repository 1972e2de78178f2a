// CLI Layer
// ユーザー入力の受付とコマンドルーティング

pub mod command_context;
pub mod commands;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// 出力フォーマット
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// Structured JSON output
    Json,
}

/// dbferry - Bulk PostgreSQL Database Migrator
///
/// Copies every user database from one PostgreSQL server to another
/// using pg_dump and psql.
#[derive(Parser, Debug)]
#[command(name = "dbferry")]
#[command(author = "dbferry Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Bulk PostgreSQL database migration tool")]
#[command(long_about = "dbferry - Bulk PostgreSQL Database Migrator

Copies user databases from a source PostgreSQL server to a destination
server. Each database is exported with pg_dump, created on the
destination and restored with psql.

dbferry helps you:
  • Check that both servers are reachable before migrating
  • Compare the database lists of two servers
  • Migrate all databases at once, or a single one
  • Keep going when one database fails, with a per-database report")]
#[command(propagate_version = true)]
#[command(after_help = "GETTING STARTED:
  1. Check connectivity:      dbferry --source-host old --dest-host new test
  2. Compare servers:         dbferry --source-host old --dest-host new compare
  3. Migrate everything:      dbferry --source-host old --dest-host new migrate-all
  4. Migrate one database:    dbferry --source-host old --dest-host new migrate-single app

Connection settings can also be stored in .dbferry.yaml.
For detailed help on each command, use: dbferry <command> --help")]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Use INSERT statements instead of COPY in dumps (slower, more portable)
    #[arg(long, global = true)]
    pub use_inserts: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory for temporary dump files
    #[arg(long, global = true, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Output format (text or json)
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// サーバー接続オプション
///
/// どれも任意で、指定したものだけが設定ファイルの値を上書きします。
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionArgs {
    /// Source server host
    #[arg(long, global = true, value_name = "HOST")]
    pub source_host: Option<String>,

    /// Source server port
    #[arg(long, global = true, value_name = "PORT")]
    pub source_port: Option<u16>,

    /// Source server user
    #[arg(long, global = true, value_name = "USER")]
    pub source_user: Option<String>,

    /// Source server password
    #[arg(long, global = true, value_name = "PASSWORD")]
    pub source_password: Option<String>,

    /// Destination server host
    #[arg(long, global = true, value_name = "HOST")]
    pub dest_host: Option<String>,

    /// Destination server port
    #[arg(long, global = true, value_name = "PORT")]
    pub dest_port: Option<u16>,

    /// Destination server user
    #[arg(long, global = true, value_name = "USER")]
    pub dest_user: Option<String>,

    /// Destination server password
    #[arg(long, global = true, value_name = "PASSWORD")]
    pub dest_password: Option<String>,

    /// Port for both servers (overridden by --source-port / --dest-port)
    #[arg(long, global = true, value_name = "PORT")]
    pub port: Option<u16>,

    /// Administrative database used for catalog queries and DDL
    #[arg(long, global = true, value_name = "NAME")]
    pub admin_db: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Test connections to both servers
    ///
    /// Connects to the source and destination servers and reports
    /// success or failure for each. Both servers are always checked.
    ///
    /// EXAMPLES:
    ///   dbferry --source-host old --dest-host new test
    Test,

    /// Compare database lists between servers
    ///
    /// Lists user databases on each server and shows which exist only
    /// on the source, only on the destination, or on both.
    ///
    /// EXAMPLES:
    ///   dbferry --source-host old --dest-host new compare
    ///
    ///   # Machine-readable output
    ///   dbferry --source-host old --dest-host new --format json compare
    Compare,

    /// Migrate all databases from source to destination
    ///
    /// Databases that already exist on the destination are skipped
    /// unless --overwrite is given. A failure in one database does not
    /// stop the others.
    ///
    /// EXAMPLES:
    ///   # Migrate everything except two databases
    ///   dbferry --source-host old --dest-host new migrate-all --exclude legacy scratch
    ///
    ///   # Replace existing databases without confirmation
    ///   dbferry --source-host old --dest-host new migrate-all --overwrite --yes
    MigrateAll {
        /// Databases to exclude (names may contain commas)
        #[arg(long, value_name = "NAME", num_args = 1..)]
        exclude: Vec<String>,

        /// Drop and recreate databases that already exist on the destination
        #[arg(long)]
        overwrite: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Migrate a single database
    ///
    /// EXAMPLES:
    ///   dbferry --source-host old --dest-host new migrate-single app
    ///
    ///   # Replace the existing copy on the destination
    ///   dbferry --source-host old --dest-host new migrate-single app --overwrite
    MigrateSingle {
        /// Name of the database to migrate
        #[arg(value_name = "DATABASE")]
        database: String,

        /// Drop and recreate the database if it exists on the destination
        #[arg(long)]
        overwrite: bool,
    },
}
