/// Left-aligned columns separated by two spaces. ANSI color sequences do not
/// count towards column width.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths = headers.iter().map(|h| visible_width(h)).collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(idx) {
                *width = (*width).max(visible_width(cell));
            }
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(format_row(headers, &widths));
    for row in rows {
        let cells = row.iter().map(|c| c.as_str()).collect::<Vec<_>>();
        lines.push(format_row(&cells, &widths));
    }

    lines.join("\n")
}

fn format_row(cells: &[&str], widths: &[usize]) -> String {
    let row = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(visible_width(cell));
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("  ");
    row.trim_end().to_string()
}

fn visible_width(cell: &str) -> usize {
    let mut width = 0;
    let mut in_escape = false;
    for ch in cell.chars() {
        match (in_escape, ch) {
            (false, '\x1b') => in_escape = true,
            (true, 'm') => in_escape = false,
            (true, _) => {}
            (false, _) => width += 1,
        }
    }
    width
}
