use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::aggregate::{RankedPlayer, format_percent};
use crate::pipeline::RankingReport;
use crate::similarity::SimilarityMethod;

const NAME_WIDTH: usize = 28;

/// Plain-text ranking for the terminal, one player per line.
pub fn render_table(report: &RankingReport, show_components: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Reference: {} ({} features, {} candidates)",
        report.reference.label,
        report.features.len(),
        report.candidates
    );

    let mut header = format!("{:>4}  {:<width$}  {:>8}", "#", "Player", "Score", width = NAME_WIDTH);
    if show_components {
        for method in SimilarityMethod::ALL {
            let _ = write!(header, "  {:>12}", method.label());
        }
    }
    let _ = writeln!(out, "{header}");
    let _ = writeln!(out, "{}", "-".repeat(header.len()));

    for (idx, row) in report.rows.iter().enumerate() {
        let _ = write!(
            out,
            "{:>4}  {:<width$}  {:>8}",
            idx + 1,
            clip(&row.name, NAME_WIDTH),
            row.score_percent(),
            width = NAME_WIDTH
        );
        if show_components {
            for method in SimilarityMethod::ALL {
                let _ = write!(out, "  {:>12}", component_cell(row, method));
            }
        }
        out.push('\n');
    }

    for note in &report.undefined {
        let _ = writeln!(out, "[WARN] {}", note.message);
    }
    out
}

fn component_cell(row: &RankedPlayer, method: SimilarityMethod) -> String {
    row.components
        .get(method)
        .map(|v| format!("{v:.4}"))
        .unwrap_or_else(|| "n/a".to_string())
}

fn clip(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        return name.to_string();
    }
    let mut out: String = name.chars().take(width.saturating_sub(1)).collect();
    out.push('~');
    out
}

pub fn write_json(path: &Path, report: &RankingReport) -> Result<()> {
    ensure_parent(path)?;
    let body = serde_json::to_string_pretty(report).context("serialize ranking report")?;
    fs::write(path, body).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Two sheets: "Ranking" (rank, player, percentage, components) and
/// "Reference" (the synthetic maximum player's compared values).
pub fn export_xlsx(path: &Path, report: &RankingReport) -> Result<()> {
    ensure_parent(path)?;

    let mut ranking_rows = vec![{
        let mut header = vec!["Rank".to_string(), "Player".to_string(), "Score".to_string()];
        header.extend(SimilarityMethod::ALL.iter().map(|m| m.label().to_string()));
        header
    }];
    for (idx, row) in report.rows.iter().enumerate() {
        let mut cells = vec![(idx + 1).to_string(), row.name.clone(), format_percent(row.score)];
        cells.extend(SimilarityMethod::ALL.iter().map(|m| {
            row.components
                .get(*m)
                .map(|v| format!("{v:.6}"))
                .unwrap_or_default()
        }));
        ranking_rows.push(cells);
    }

    let mut reference_rows = vec![vec!["Feature".to_string(), report.reference.label.clone()]];
    for (column, value) in report
        .reference
        .columns
        .iter()
        .zip(&report.reference.values)
    {
        reference_rows.push(vec![column.clone(), format!("{value:.6}")]);
    }

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Ranking")?;
        write_rows(sheet, &ranking_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Reference")?;
        write_rows(sheet, &reference_rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(())
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    Ok(())
}
