//! Output blocks produced by actions and their plain-text terminal rendering.

use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputBlock {
    Markdown(String),
    /// Two-column key/value table.
    Table {
        title: String,
        rows: Vec<(String, String)>,
    },
    Matrix {
        title: String,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Notice(String),
    Warning(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionOutput {
    pub blocks: Vec<OutputBlock>,
}

impl ActionOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn markdown(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(OutputBlock::Markdown(text.into()));
        self
    }

    pub fn table(mut self, title: impl Into<String>, rows: Vec<(String, String)>) -> Self {
        self.blocks.push(OutputBlock::Table {
            title: title.into(),
            rows,
        });
        self
    }

    pub fn matrix(
        mut self,
        title: impl Into<String>,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> Self {
        self.blocks.push(OutputBlock::Matrix {
            title: title.into(),
            headers,
            rows,
        });
        self
    }

    pub fn notice(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(OutputBlock::Notice(text.into()));
        self
    }

    pub fn warning(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(OutputBlock::Warning(text.into()));
        self
    }

    pub fn warnings(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                OutputBlock::Warning(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// First table block with the given title.
    pub fn find_table(&self, wanted: &str) -> Option<&[(String, String)]> {
        self.blocks.iter().find_map(|block| match block {
            OutputBlock::Table { title, rows } if title == wanted => Some(rows.as_slice()),
            _ => None,
        })
    }

    pub fn render(&self) -> String {
        self.blocks
            .iter()
            .map(render_block)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn render_block(block: &OutputBlock) -> String {
    match block {
        OutputBlock::Markdown(text) => format!("{}\n", text.trim_end()),
        OutputBlock::Table { title, rows } => render_table(title, rows),
        OutputBlock::Matrix {
            title,
            headers,
            rows,
        } => render_matrix(title, headers, rows),
        OutputBlock::Notice(text) => format!("note: {text}\n"),
        OutputBlock::Warning(text) => format!("warning: {text}\n"),
    }
}

fn width(text: &str) -> usize {
    text.chars().count()
}

fn pad(text: &str, to: usize) -> String {
    let mut out = text.to_string();
    out.extend(std::iter::repeat(' ').take(to.saturating_sub(width(text))));
    out
}

fn render_table(title: &str, rows: &[(String, String)]) -> String {
    let mut out = format!("{title}\n");
    let key_width = rows.iter().map(|(k, _)| width(k)).max().unwrap_or(0);
    for (key, value) in rows {
        let shown = if value.is_empty() {
            "-"
        } else {
            value.as_str()
        };
        let _ = writeln!(out, "  {} | {}", pad(key, key_width), shown);
    }
    out
}

fn render_matrix(title: &str, headers: &[String], rows: &[Vec<String>]) -> String {
    let columns = headers
        .len()
        .max(rows.iter().map(Vec::len).max().unwrap_or(0));
    let mut widths = vec![0usize; columns];
    for line in std::iter::once(headers).chain(rows.iter().map(Vec::as_slice)) {
        for (i, cell) in line.iter().enumerate() {
            widths[i] = widths[i].max(width(cell));
        }
    }

    let format_row = |cells: &[String]| {
        let padded = (0..columns)
            .map(|i| pad(cells.get(i).map(String::as_str).unwrap_or(""), widths[i]))
            .collect::<Vec<_>>();
        format!("  {}", padded.join(" | ").trim_end())
    };

    let mut out = format!("{title}\n");
    let _ = writeln!(out, "{}", format_row(headers));
    let rule = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("-+-");
    let _ = writeln!(out, "  {rule}");
    for row in rows {
        let _ = writeln!(out, "{}", format_row(row));
    }
    out
}

/// Text bar for a slider value, e.g. `#######...` for 7 of 10.
pub fn bar(value: i64, min: i64, max: i64) -> String {
    let span = (max - min).max(1);
    let filled = (value.clamp(min, max) - min) * 10 / span;
    let filled = filled as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(10 - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_aligns_keys_and_marks_empty_values() {
        let output = ActionOutput::new().table(
            "Assessment",
            vec![
                ("PROBLEM_TYPE".to_string(), "Complex".to_string()),
                ("RATIONALE".to_string(), String::new()),
            ],
        );
        assert_eq!(
            output.render(),
            "Assessment\n  PROBLEM_TYPE | Complex\n  RATIONALE    | -\n"
        );
    }

    #[test]
    fn matrix_pads_columns() {
        let block = OutputBlock::Matrix {
            title: "Map".to_string(),
            headers: vec![String::new(), "Narrow".to_string(), "Broad".to_string()],
            rows: vec![vec!["Deep".to_string(), "x".to_string(), String::new()]],
        };
        let rendered = render_block(&block);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "Map");
        assert_eq!(lines[1], "       | Narrow | Broad");
        assert_eq!(lines[2], "  -----+--------+------");
        assert_eq!(lines[3], "  Deep | x      |");
    }

    #[test]
    fn warnings_are_collected_in_order() {
        let output = ActionOutput::new()
            .warning("could not extract field GAPS")
            .markdown("raw")
            .warning("could not extract field RECOMMENDATION");
        assert_eq!(
            output.warnings(),
            vec![
                "could not extract field GAPS",
                "could not extract field RECOMMENDATION",
            ]
        );
    }

    #[test]
    fn bar_scales_to_ten_cells() {
        assert_eq!(bar(7, 0, 10), "#######...");
        assert_eq!(bar(0, 0, 10), "..........");
        assert_eq!(bar(15, 0, 10), "##########");
    }
}
