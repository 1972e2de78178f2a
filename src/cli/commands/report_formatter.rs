// 出力フォーマッタ
//
// 接続確認・比較・移行計画・移行レポートを人間向けテキストに整形します。

use crate::cli::commands::test::ToolchainCheck;
use crate::core::catalog::Catalog;
use crate::core::database_name::DatabaseName;
use crate::core::transfer::{MigrationReport, TransferOutcome, TransferStatus};
use crate::services::connection_probe::{ProbeReport, ProbeResult};
use crate::services::migration_orchestrator::{Comparison, MigrationPlan};
use colored::Colorize;
use std::collections::BTreeSet;

const NONE_MARKER: &str = "(none)";

/// 接続確認結果を整形
pub fn format_probe_report(report: &ProbeReport) -> String {
    let mut output = String::new();
    output.push_str(&format!("{}\n", "Connection test".bold()));
    output.push_str(&format_probe_line(&report.source));
    output.push_str(&format_probe_line(&report.destination));

    if report.is_success() {
        output.push_str(&format!("\n{}", "Both servers are reachable.".green()));
    } else {
        output.push_str(&format!("\n{}", "Connection test failed.".red().bold()));
    }
    output
}

fn format_probe_line(result: &ProbeResult) -> String {
    match &result.error {
        None => format!(
            "  {} {:<12} {}\n",
            "✓".green(),
            result.role.to_string(),
            result.target
        ),
        Some(error) => format!(
            "  {} {:<12} {}\n      {}\n",
            "✗".red(),
            result.role.to_string(),
            result.target,
            error.red()
        ),
    }
}

/// ツールチェーン検出結果を整形
pub fn format_toolchain_check(check: &ToolchainCheck) -> String {
    match (&check.pg_dump, &check.psql, &check.error) {
        (Some(pg_dump), Some(psql), None) => format!(
            "  {} pg_dump {}\n  {} psql    {}\n",
            "✓".green(),
            pg_dump.display(),
            "✓".green(),
            psql.display()
        ),
        (_, _, error) => format!(
            "  {} {}\n",
            "✗".red(),
            error
                .as_deref()
                .unwrap_or("PostgreSQL client tools not found")
                .red()
        ),
    }
}

/// サーバー比較結果を整形
pub fn format_comparison(comparison: &Comparison) -> String {
    let mut output = String::new();
    output.push_str(&format_catalog(&comparison.source));
    output.push('\n');
    output.push_str(&format_catalog(&comparison.destination));
    output.push('\n');

    let diff = &comparison.diff;
    output.push_str(&format_name_set("Only on source", &diff.source_only, "+"));
    output.push('\n');
    output.push_str(&format_name_set("Only on destination", &diff.dest_only, "-"));
    output.push('\n');
    output.push_str(&format_name_set("On both servers", &diff.common, "="));

    if diff.source_only.is_empty() {
        output.push_str(&format!(
            "\n{}",
            "Every source database already exists on the destination.".green()
        ));
    }
    output
}

fn format_catalog(catalog: &Catalog) -> String {
    format_name_set(
        &format!("{} databases", catalog.role),
        &catalog.databases,
        "-",
    )
}

fn format_name_set(title: &str, names: &BTreeSet<DatabaseName>, marker: &str) -> String {
    let mut output = format!("{} ({}):\n", title.bold(), names.len());
    if names.is_empty() {
        output.push_str(&format!("  {}\n", NONE_MARKER.dimmed()));
    }
    for name in names {
        output.push_str(&format!("  {} {}\n", marker, name));
    }
    output
}

/// 移行計画を整形（実行前の確認表示）
pub fn format_plan(plan: &MigrationPlan) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{} ({}, {}):\n",
        "Databases to migrate".bold(),
        plan.targets.len(),
        plan.options.format.describe()
    ));

    if plan.targets.is_empty() {
        output.push_str(&format!("  {}\n", NONE_MARKER.dimmed()));
    }
    for target in &plan.targets {
        if !target.exists_at_destination {
            output.push_str(&format!("  - {}\n", target.database));
        } else if plan.options.overwrite_existing {
            output.push_str(&format!(
                "  - {} {}\n",
                target.database,
                "(exists on destination, will be overwritten)".yellow()
            ));
        } else {
            output.push_str(&format!(
                "  - {} {}\n",
                target.database,
                "(exists on destination, will be skipped)".dimmed()
            ));
        }
    }

    if !plan.excluded.is_empty() {
        let names: Vec<&str> = plan.excluded.iter().map(|n| n.as_str()).collect();
        output.push_str(&format!("Excluded: {}\n", names.join(", ")));
    }
    if !plan.ignored_excludes.is_empty() {
        output.push_str(&format!(
            "{} {}\n",
            "⚠".yellow(),
            format!(
                "Not found on source, ignored: {}",
                plan.ignored_excludes.join(", ")
            )
            .yellow()
        ));
    }
    output
}

/// 移行レポートを整形
pub fn format_report(report: &MigrationReport) -> String {
    let mut output = String::new();
    output.push_str(&format!("{}\n", "Migration results".bold()));

    if report.is_empty() {
        output.push_str(&format!("  {}\n", NONE_MARKER.dimmed()));
    }
    for outcome in report.outcomes() {
        output.push_str(&format_outcome(outcome));
    }

    let summary = report.summary();
    let line = format!(
        "Summary: {} succeeded, {} skipped, {} failed ({} total)",
        summary.succeeded, summary.skipped, summary.failed, summary.total
    );
    output.push('\n');
    if summary.failed > 0 {
        output.push_str(&line.red().bold().to_string());
    } else {
        output.push_str(&line.green().to_string());
    }
    output
}

fn format_outcome(outcome: &TransferOutcome) -> String {
    match outcome.status {
        TransferStatus::Succeeded => format!(
            "  {} {} ({:.1}s)\n",
            "✓".green(),
            outcome.database,
            outcome.duration_ms as f64 / 1000.0
        ),
        TransferStatus::Skipped => format!(
            "  {} {} skipped: {}\n",
            "⚠".yellow(),
            outcome.database,
            outcome.reason.as_deref().unwrap_or_default()
        ),
        TransferStatus::Failed => {
            let mut line = format!(
                "  {} {} {}\n",
                "✗".red(),
                outcome.database,
                outcome.reason.as_deref().unwrap_or("failed").red()
            );
            for diagnostic in outcome.diagnostics.lines() {
                line.push_str(&format!("      {}\n", diagnostic));
            }
            line
        }
    }
}
