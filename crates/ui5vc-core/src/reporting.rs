use anyhow::{Context, Result};
use std::path::Path;

use crate::check::{CheckSummary, SummaryRow};

/// Render the summary rows as a markdown table.
pub fn render_summary_md(rows: &[SummaryRow]) -> String {
    let mut out = String::new();
    out.push_str("| Manifest | Version | New version | Status | Details |\n");
    out.push_str("| --- | --- | --- | --- | --- |\n");
    for row in rows {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            row.rel_path, row.old_version, row.new_version, row.status_icon, row.status_text
        ));
    }
    out
}

/// Write the summary in pretty JSON format.
pub fn write_summary_json(path: &Path, summary: &CheckSummary) -> Result<()> {
    let content = serde_json::to_string_pretty(summary).context("serialize check summary")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Write the markdown table, e.g. for a CI step summary.
pub fn write_summary_md(path: &Path, rows: &[SummaryRow]) -> Result<()> {
    let md = render_summary_md(rows);
    std::fs::write(path, md).with_context(|| format!("write {:?}", path))?;
    Ok(())
}
