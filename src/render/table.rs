use unicode_width::UnicodeWidthStr;

use crate::core::MAX_COMMENT_LENGTH;

/// GitHub-flavoured markdown table with columns padded to their display width.
pub fn markdown_table(header: &[String], rows: &[Vec<String>]) -> String {
    let columns = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0);

    let mut widths = vec![3usize; columns];
    for row in std::iter::once(header).chain(rows.iter().map(Vec::as_slice)) {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.width());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format_row(header, &widths));
    lines.push(format!(
        "| {} |",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join(" | ")
    ));
    for row in rows {
        lines.push(format_row(row, &widths));
    }
    lines.join("\n")
}

/// Unpadded table, used where the output is read by machines as much as people.
pub fn compact_table(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format!("|{}|", header.join("|")));
    lines.push(format!("|{}|", vec!["---"; header.len()].join("|")));
    for row in rows {
        lines.push(format!("|{}|", row.join("|")));
    }
    lines.join("\n")
}

fn format_row(row: &[String], widths: &[usize]) -> String {
    let cells: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(idx, width)| pad_end_display(row.get(idx).map(String::as_str).unwrap_or(""), *width))
        .collect();
    format!("| {} |", cells.join(" | "))
}

fn pad_end_display(s: &str, width: usize) -> String {
    let w = s.width();
    if w >= width {
        return s.to_string();
    }
    format!("{s}{}", " ".repeat(width - w))
}

pub fn section(header: &str, table_header: &[String], rows: &[Vec<String>]) -> String {
    format!("{header}\n\n{}", markdown_table(table_header, rows))
}

/// Splits a table section into same-header sections shorter than `budget`.
///
/// Rows are kept in order and each appears in exactly one section. A single
/// row that is too large on its own is returned as an oversized section and
/// left for the comment packer to report.
pub fn split(header: &str, table_header: &[String], rows: &[Vec<String>], budget: usize) -> Vec<String> {
    if rows.is_empty() {
        return Vec::new();
    }

    let full = section(header, table_header, rows);
    if full.len() < budget {
        return vec![full];
    }

    let split_factor = full.len().div_ceil(MAX_COMMENT_LENGTH + 100);
    let window = window_size(rows.len(), split_factor);
    tracing::debug!(
        header,
        length = full.len(),
        rows = rows.len(),
        split_factor,
        window,
        "splitting oversized section"
    );

    rows.chunks(window)
        .flat_map(|chunk| fit(header, table_header, chunk, budget))
        .collect()
}

/// Rows per slice: `ceil(rows / ceil(rows / split_factor))`.
fn window_size(rows: usize, split_factor: usize) -> usize {
    let per_factor = rows.div_ceil(split_factor.max(1)).max(1);
    rows.div_ceil(per_factor).max(1)
}

fn fit(header: &str, table_header: &[String], rows: &[Vec<String>], budget: usize) -> Vec<String> {
    let candidate = section(header, table_header, rows);
    if candidate.len() < budget || rows.len() <= 1 {
        return vec![candidate];
    }
    let mid = rows.len().div_ceil(2);
    let mut out = fit(header, table_header, &rows[..mid], budget);
    out.extend(fit(header, table_header, &rows[mid..], budget));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::section_budget;

    fn budget() -> usize {
        section_budget("knip-reporter")
    }

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn table_pads_columns_to_the_widest_cell() {
        let table = markdown_table(
            &strings(&["Filename", "Unused dependencies"]),
            &[strings(&["a.json", "`react`"])],
        );
        assert_eq!(
            table,
            "| Filename | Unused dependencies |\n\
             | -------- | ------------------- |\n\
             | a.json   | `react`             |"
        );
    }

    #[test]
    fn compact_table_has_no_padding() {
        let table = compact_table(&["Type", "Found"], &[strings(&["Exports", "100"])]);
        assert_eq!(table, "|Type|Found|\n|---|---|\n|Exports|100|");
    }

    #[test]
    fn small_tables_are_returned_whole() {
        let header = strings(&["Filename", "Enum", "Member"]);
        let rows = vec![
            strings(&["DrNefarious.ts", "Homeworld", "`Magmos`<br/>`Aquatos`"]),
            strings(&["Sigmund.ts", "Membership", "`ZordoomPrison`"]),
        ];
        let sections = split("### Unused Enum Members (3)", &header, &rows, budget());
        assert_eq!(
            sections,
            vec![section("### Unused Enum Members (3)", &header, &rows)]
        );
    }

    #[test]
    fn large_tables_are_split_without_losing_rows() {
        let header = strings(&["Filename", "Enum", "Member"]);
        let rows: Vec<Vec<String>> = (0..1500)
            .map(|i| {
                vec![
                    format!("packages/app/src/Module{i}.ts"),
                    "Homeworld".to_string(),
                    format!("`Magmos{i}`<br/>`Aquatos`<br/>`Leviathan`<br/>`TombliOutpost`"),
                ]
            })
            .collect();

        let sections = split("### Unused Enum Members (6000)", &header, &rows, budget());
        assert!(sections.len() > 1);

        let mut seen = Vec::new();
        for section in &sections {
            assert!(section.len() < budget(), "len={}", section.len());
            assert!(section.starts_with("### Unused Enum Members (6000)\n\n| Filename"));
            for line in section.lines().skip(4) {
                let file = line.trim_start_matches("| ").split(' ').next().unwrap_or("");
                seen.push(file.to_string());
            }
        }
        let expected: Vec<String> = rows.iter().map(|r| r[0].clone()).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn a_single_oversized_row_is_kept_as_its_own_section() {
        let header = strings(&["Filename", "Unused exports"]);
        let rows = vec![
            strings(&["small.ts", "`a`"]),
            vec!["huge.ts".to_string(), "x".repeat(MAX_COMMENT_LENGTH + 10)],
        ];
        let sections = split("### Unused exports (2)", &header, &rows, budget());
        assert_eq!(sections.len(), 2);
        assert!(sections[0].contains("small.ts"));
        assert!(sections[1].len() > MAX_COMMENT_LENGTH);
    }

    #[test]
    fn window_follows_the_split_factor() {
        assert_eq!(window_size(10, 3), 3);
        assert_eq!(window_size(10, 1), 10);
        assert_eq!(window_size(9, 3), 3);
        assert_eq!(window_size(1, 4), 1);
    }

    #[test]
    fn sections_just_under_the_comment_limit_leave_room_for_the_marker() {
        let header = strings(&["Filename", "Unused dependencies"]);
        let rows_for = |n: usize| -> Vec<Vec<String>> {
            (0..n)
                .map(|i| vec![format!("p{i:05}.json"), "`dep`".to_string()])
                .collect()
        };
        let one = section("### Unused dependencies", &header, &rows_for(1)).len();
        let step = section("### Unused dependencies", &header, &rows_for(2)).len() - one;
        let mut n = (budget() - one) / step;
        while section("### Unused dependencies", &header, &rows_for(n)).len() < budget() {
            n += 1;
        }
        let rows = rows_for(n);
        let whole = section("### Unused dependencies", &header, &rows);
        assert!(whole.len() < MAX_COMMENT_LENGTH, "len={}", whole.len());

        let sections = split("### Unused dependencies", &header, &rows, budget());
        assert_eq!(sections.len(), 2);
        let bodies = crate::comment::prepare("knip-reporter", &sections);
        assert_eq!(bodies.len(), 2);
        assert!(bodies[0].contains("| p00000.json |"));
        assert!(bodies[1].contains(&format!("| p{:05}.json |", n - 1)));
    }
}
