//! Markdown and console rendering of an analysis

use crate::artifact::PersistedAnalysis;
use pathparity_core::{AnalysisReport, BackendId, Comparison, Operation, PathPattern};
use std::fmt::{self, Write};

fn percent(part: u64, total: u64) -> String {
    if total == 0 {
        return "N/A".to_string();
    }
    #[allow(clippy::cast_precision_loss)]
    let rate = part as f64 / total as f64 * 100.0;
    format!("{rate:.1}%")
}

/// Render the full Markdown report
#[must_use]
pub fn render_markdown(analysis: &PersistedAnalysis) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_markdown(&mut out, analysis);
    out
}

/// Render the short plain-text summary printed after a run
#[must_use]
pub fn render_summary(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let _ = write_summary(&mut out, report);
    out
}

fn write_markdown(out: &mut String, analysis: &PersistedAnalysis) -> fmt::Result {
    let report = &analysis.report;

    writeln!(out, "# Path Resolution Parity Report\n")?;
    writeln!(out, "Generated: {}\n", analysis.generated_at.to_rfc3339())?;
    for backend in BackendId::BOTH {
        if let Some(source) = analysis.source(backend) {
            writeln!(
                out,
                "- Backend {backend}: `{}` (run {}, {} records{})",
                source.adapter,
                source.run_id,
                source.records,
                if source.cancelled { ", interrupted" } else { "" }
            )?;
        }
    }
    if analysis.is_partial() {
        writeln!(out, "\n> At least one run was interrupted; results cover completed scenarios only.")?;
    }
    writeln!(out)?;

    writeln!(out, "## Executive Summary\n")?;
    write_summary_table(out, report)?;

    writeln!(out, "\n## Path Behavior Analysis\n")?;
    writeln!(out, "| Path Pattern | Matches | Differences | Match Rate |")?;
    writeln!(out, "|--------------|---------|-------------|------------|")?;
    for (pattern, stats) in &report.by_path_pattern {
        writeln!(
            out,
            "| {} | {} | {} | {} |",
            pattern.label(),
            stats.matches,
            stats.differences,
            percent(stats.matches, stats.total())
        )?;
    }

    writeln!(out, "\n## Operation Behavior Analysis\n")?;
    writeln!(out, "| Operation | Matches | Differences | Match Rate |")?;
    writeln!(out, "|-----------|---------|-------------|------------|")?;
    for (operation, stats) in &report.by_operation {
        let bucket = stats.bucket();
        writeln!(
            out,
            "| {operation} | {} | {} | {} |",
            bucket.matches,
            bucket.differences,
            percent(bucket.matches, bucket.total())
        )?;
    }

    let critical: Vec<&Comparison> = report
        .comparisons
        .iter()
        .filter(|c| c.critical_difference)
        .collect();
    if !critical.is_empty() {
        writeln!(out, "\n## Critical Differences\n")?;
        writeln!(
            out,
            "These scenarios succeeded on one backend and failed on the other:\n"
        )?;
        for comparison in critical {
            writeln!(out, "### {}", comparison.scenario_name)?;
            writeln!(out, "- **Issue**: {}\n", comparison.difference_detail)?;
        }
    }

    writeln!(out, "\n## Detailed Comparisons\n")?;
    let mut differing = report.differing().peekable();
    if differing.peek().is_none() {
        writeln!(out, "All compared scenarios behaved identically.")?;
    } else {
        writeln!(out, "### Scenarios with Different Behavior\n")?;
        for comparison in differing {
            write_details(out, comparison)?;
        }
    }

    writeln!(out, "\n## Recommendations\n")?;
    for line in recommendations(report) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

fn write_summary_table(out: &mut String, report: &AnalysisReport) -> fmt::Result {
    let summary = &report.summary;
    writeln!(out, "| Metric | Value |")?;
    writeln!(out, "|--------|-------|")?;
    writeln!(out, "| Scenarios Compared | {} |", summary.total)?;
    writeln!(
        out,
        "| Identical Behavior | {} ({}) |",
        summary.identical,
        percent(summary.identical, summary.total)
    )?;
    writeln!(
        out,
        "| Different Behavior | {} ({}) |",
        summary.different,
        percent(summary.different, summary.total)
    )?;
    writeln!(
        out,
        "| Critical Differences | {} |",
        summary.critical_scenario_names.len()
    )
}

fn write_details(out: &mut String, comparison: &Comparison) -> fmt::Result {
    writeln!(out, "<details>")?;
    writeln!(
        out,
        "<summary><strong>{}</strong></summary>\n",
        comparison.scenario_name
    )?;
    writeln!(out, "- **Path Used**: `{}`", comparison.path_used)?;
    writeln!(out, "- **Operation**: {}", comparison.operation)?;
    writeln!(
        out,
        "- **Critical**: {}",
        if comparison.critical_difference { "yes" } else { "no" }
    )?;
    if !comparison.difference_detail.is_empty() {
        writeln!(out, "- **Difference**: {}", comparison.difference_detail)?;
    }
    if !comparison.path_resolution_differences.is_empty() {
        writeln!(out, "\n**Path Resolution Differences**:")?;
        for diff in &comparison.path_resolution_differences {
            writeln!(
                out,
                "  - Path `{}`: A={}, B={}",
                diff.candidate_path, diff.found_a, diff.found_b
            )?;
        }
    }
    writeln!(out, "\n</details>\n")
}

fn recommendations(report: &AnalysisReport) -> Vec<String> {
    let differs = |pattern: PathPattern| {
        report
            .by_path_pattern
            .get(&pattern)
            .is_some_and(|s| s.differences > 0)
    };

    let mut items = Vec::new();
    if differs(PathPattern::LeadingSlash) {
        items.push("**Leading Slash Handling**: paths with a leading slash resolve differently. Standardize the path format across the application.");
    }
    if differs(PathPattern::Empty) {
        items.push("**Empty Path Handling**: empty paths behave differently. Always pass an explicit path.");
    }
    if differs(PathPattern::Root) {
        items.push("**Root Writes**: operations against the root resolve differently. Avoid root-relative update keys.");
    }
    if differs(PathPattern::DoubleSlash) {
        items.push("**Double Slashes**: paths containing `//` are treated differently. Normalize paths before issuing writes.");
    }
    if report
        .by_operation
        .get(&Operation::BatchUpdate)
        .is_some_and(|s| s.differences > 0)
    {
        items.push("**Batch Updates**: multi-path update keys resolve differently. Prefer update keys without a leading slash.");
    }
    if !report.summary.critical_scenario_names.is_empty() {
        items.push("**Critical Issues**: resolve the critical differences above before using the backends interchangeably.");
    }

    let mut lines: Vec<String> = items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {item}", i + 1))
        .collect();
    if lines.is_empty() {
        lines.push("No path-handling differences were observed.".to_string());
    }
    lines.push(String::new());
    lines.push("### Best Practices\n".to_string());
    lines.push("- **Use consistent path formats**: pick absolute or relative paths and use them everywhere".to_string());
    lines.push("- **Avoid edge cases**: avoid empty paths, double slashes and trailing slashes".to_string());
    lines.push("- **Test every pattern in use**: rerun this comparison when switching clients".to_string());
    lines
}

fn write_summary(out: &mut String, report: &AnalysisReport) -> fmt::Result {
    let summary = &report.summary;
    writeln!(
        out,
        "Scenarios compared: {}  identical: {} ({})  different: {} ({})",
        summary.total,
        summary.identical,
        percent(summary.identical, summary.total),
        summary.different,
        percent(summary.different, summary.total)
    )?;
    if !summary.critical_scenario_names.is_empty() {
        writeln!(out, "Critical differences:")?;
        for name in &summary.critical_scenario_names {
            writeln!(out, "  x {name}")?;
        }
    }
    for (pattern, stats) in &report.by_path_pattern {
        writeln!(
            out,
            "  {:<30} {:>3} match  {:>3} differ  {}",
            pattern.label(),
            stats.matches,
            stats.differences,
            percent(stats.matches, stats.total())
        )?;
    }
    Ok(())
}
