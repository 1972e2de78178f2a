use anyhow::{Context, Result};
use clap::Parser;
use colored::control as color_control;
use dbferry::cli::command_context::CommandContext;
use dbferry::cli::commands::compare::{CompareCommand, CompareCommandHandler};
use dbferry::cli::commands::migrate_all::{MigrateAllCommand, MigrateAllCommandHandler};
use dbferry::cli::commands::migrate_single::{MigrateSingleCommand, MigrateSingleCommandHandler};
use dbferry::cli::commands::test::{TestCommand, TestCommandHandler};
use dbferry::cli::commands::{CommandReport, StdinPrompt};
use dbferry::cli::{Cli, Commands};
use dbferry::core::transfer::{DumpFormat, TransferOptions};
use std::env;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    // CLIをパースして実行
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    // --no-color フラグの処理
    if cli.no_color {
        color_control::set_override(false);
    }

    // 非同期ランタイムを作成して実行
    let runtime = tokio::runtime::Runtime::new()
        .context("Failed to create Tokio runtime")
        .unwrap_or_else(|e| {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        });

    let result = runtime.block_on(run_command(cli));

    match result {
        Ok(report) => {
            if !report.output.is_empty() {
                println!("{}", report.output);
            }
            if !report.success {
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// ログ出力を初期化する
///
/// RUST_LOG が設定されていればそれに従い、なければ --verbose で debug、既定は warn。
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "dbferry=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// コマンドを実行する
async fn run_command(cli: Cli) -> Result<CommandReport> {
    let project_path = env::current_dir()?;

    // --config フラグの処理（絶対パスに変換）
    let config_path: Option<PathBuf> = cli.config.map(|p| {
        if p.is_absolute() {
            p
        } else {
            project_path.join(p)
        }
    });

    let context = CommandContext::load(&project_path, config_path, &cli.connection, cli.work_dir)?;
    let format = DumpFormat::from_use_inserts(cli.use_inserts);

    match cli.command {
        Commands::Test => {
            let handler = TestCommandHandler::new();
            let command = TestCommand { format: cli.format };
            let tools = context.locate_tools().await;
            handler
                .execute(&context.orchestrator(), &tools, &command)
                .await
        }

        Commands::Compare => {
            let handler = CompareCommandHandler::new();
            let command = CompareCommand { format: cli.format };
            handler.execute(&context.orchestrator(), &command).await
        }

        Commands::MigrateAll {
            exclude,
            overwrite,
            yes,
        } => {
            let orchestrator = context.migration_orchestrator().await?;
            let handler = MigrateAllCommandHandler::new();
            let command = MigrateAllCommand {
                exclude,
                options: TransferOptions::new(format, overwrite),
                assume_yes: yes,
                format: cli.format,
            };
            handler
                .execute(&orchestrator, &command, &StdinPrompt::new())
                .await
        }

        Commands::MigrateSingle {
            database,
            overwrite,
        } => {
            let orchestrator = context.migration_orchestrator().await?;
            let handler = MigrateSingleCommandHandler::new();
            let command = MigrateSingleCommand {
                database,
                options: TransferOptions::new(format, overwrite),
                format: cli.format,
            };
            handler.execute(&orchestrator, &command).await
        }
    }
}
