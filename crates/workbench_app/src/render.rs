use workbench_core::{
    AppViewModel, DimensionRow, JobPhase, Notification, NotificationLevel, TabularView,
};

/// Cells longer than this are cut and marked with an ellipsis.
const MAX_CELL_CHARS: usize = 60;

pub fn notification_line(notification: &Notification) -> String {
    let tag = match notification.level {
        NotificationLevel::Info => "info",
        NotificationLevel::Success => " ok ",
        NotificationLevel::Error => "fail",
    };
    format!("[{tag}] {}", notification.text)
}

pub fn status_line(view: &AppViewModel) -> Option<String> {
    let key = view.processing_key.as_deref().unwrap_or("-");
    match view.phase {
        JobPhase::Idle | JobPhase::Completed | JobPhase::Failed => None,
        JobPhase::Submitting => Some("Submitting job...".to_string()),
        JobPhase::Polling { attempt } => Some(format!("Job {key}: waiting (poll {attempt})")),
    }
}

pub fn dimension_lines(rows: &[DimensionRow]) -> Vec<String> {
    rows.iter()
        .map(|row| {
            let mark = if row.selected { "x" } else { " " };
            let default = if row.is_default { " (default)" } else { "" };
            if row.description.is_empty() {
                format!("[{mark}] {:>3} {}{default}", row.id, row.name)
            } else {
                format!(
                    "[{mark}] {:>3} {}{default}: {}",
                    row.id, row.name, row.description
                )
            }
        })
        .collect()
}

pub fn table(view: &TabularView) -> String {
    let cells: Vec<[String; 3]> = view
        .rows
        .iter()
        .map(|row| [row.index.to_string(), cell(&row.input), cell(&row.output)])
        .collect();
    let header = view.columns();
    let mut widths = header.map(|h| h.chars().count());
    for row in &cells {
        for (width, text) in widths.iter_mut().zip(row) {
            *width = (*width).max(text.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &header.map(str::to_string), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("-+-"));
    out.push('\n');
    for row in &cells {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, row: &[String; 3], widths: &[usize; 3]) {
    let padded: Vec<String> = row
        .iter()
        .zip(widths)
        .map(|(text, &width)| format!("{text:<width$}"))
        .collect();
    out.push_str(padded.join(" | ").trim_end());
    out.push('\n');
}

fn cell(text: &str) -> String {
    let flat = text.replace('\n', "\\n");
    if flat.chars().count() <= MAX_CELL_CHARS {
        return flat;
    }
    let mut cut: String = flat.chars().take(MAX_CELL_CHARS - 1).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use workbench_core::{render, ProcessedResult, Record};

    #[test]
    fn single_record_renders_one_row() {
        let view = render(&ProcessedResult::Single(Record::new("hello", "HELLO")));
        assert_eq!(
            table(&view),
            "# | Input | Output\n--+-------+-------\n1 | hello | HELLO\n"
        );
    }

    #[test]
    fn long_and_multiline_cells_are_flattened() {
        let long = "x".repeat(100);
        let view = render(&ProcessedResult::Batch(vec![
            Record::new("a\nb", "ok"),
            Record::new(long.as_str(), "ok"),
        ]));
        let text = table(&view);
        assert!(text.contains("a\\nb"));
        assert!(text.contains(&format!("{}…", "x".repeat(MAX_CELL_CHARS - 1))));
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn polling_shows_attempt() {
        let view = AppViewModel {
            phase: JobPhase::Polling { attempt: 3 },
            processing_key: Some("k1".to_string()),
            ..AppViewModel::default()
        };
        assert_eq!(
            status_line(&view).as_deref(),
            Some("Job k1: waiting (poll 3)")
        );
        assert_eq!(status_line(&AppViewModel::default()), None);
    }

    #[test]
    fn notifications_carry_their_level() {
        assert_eq!(
            notification_line(&Notification::error("No processed data to export")),
            "[fail] No processed data to export"
        );
    }
}
