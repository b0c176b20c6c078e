use colored::*;
use jiff::civil::Date;

use crate::{
    models::{
        board::Board,
        task::{Priority, Status, Task},
    },
    services::{
        analytics::Analytics,
        quotes::{Quote, QuoteVariant},
    },
};

/// Widest a chart bar gets
const BAR_WIDTH: usize = 30;

/// Get the terminal width, defaulting to 80 if unavailable
fn get_terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(80)
}

/// Get the appropriate status glyph for a task
pub fn get_status_glyph(task: &Task, is_overdue: bool) -> ColoredString {
    match task.status {
        Status::Done => "✓".dimmed(),
        _ if is_overdue => "●".red(),
        Status::InProgress => "◐".yellow(),
        Status::ToDo => "○".normal(),
    }
}

pub fn priority_label(priority: Priority) -> ColoredString {
    let label = priority.to_string();
    match priority.value() {
        5 => label.red().bold(),
        4 => label.red(),
        3 => label.yellow(),
        2 => label.normal(),
        _ => label.dimmed(),
    }
}

/// Format a due date relative to today (e.g., "Today", "Tomorrow", "3d overdue", "Mar 14")
pub fn format_due_date(date: Date, today: Date) -> String {
    if date == today {
        "Today".to_string()
    } else if today.tomorrow().is_ok_and(|tomorrow| tomorrow == date) {
        "Tomorrow".to_string()
    } else if date < today {
        let days = (today - date).get_days();
        format!("{}d overdue", days)
    } else {
        date.strftime("%b %d").to_string()
    }
}

/// Right-hand context of a task line: tag and due date
fn get_task_context(task: &Task, today: Date) -> Option<String> {
    let mut parts = vec![];
    if let Some(tag) = &task.tag {
        parts.push(format!("#{}", tag));
    }
    if let Some(due) = task.due_date {
        parts.push(format!("due {}", format_due_date(due, today)));
    }
    (!parts.is_empty()).then(|| parts.join("  ·  "))
}

/// Render a single task line with number, glyph, priority, title and right-aligned context
pub fn render_task_line(task: &Task, today: Date) {
    let terminal_width = get_terminal_width();
    let is_overdue = task.is_overdue(today);

    let id_str = format!("{:>3}", task.task_number);
    let glyph = get_status_glyph(task, is_overdue);
    let priority = priority_label(task.priority);
    let title = &task.title;

    let styled_title = if task.status == Status::Done {
        title.dimmed()
    } else {
        title.bold()
    };

    let left_visible_len = format!("  {}  {}  {}  {}", id_str, " ", task.priority, title)
        .chars()
        .count();
    let styled_left = format!("  {}  {}  {}  {}", id_str, glyph, priority, styled_title);

    match get_task_context(task, today) {
        Some(context) => {
            let right_visible_len = context.chars().count();
            let total_content = left_visible_len + right_visible_len;

            if total_content + 4 < terminal_width {
                let padding = terminal_width - total_content - 2;
                let context = if is_overdue {
                    context.red()
                } else {
                    context.dimmed()
                };
                println!("{}{}{}", styled_left, " ".repeat(padding), context);
            } else {
                // Not enough space for right alignment, just print normally
                println!("{}", styled_left);
            }
        }
        None => println!("{}", styled_left),
    }
}

/// Render a view header with title and count
pub fn render_view_header(title: &str, count: usize) {
    let task_word = if count == 1 { "task" } else { "tasks" };
    println!("\n  {} ({} {})\n", title.cyan().bold(), count, task_word);
}

/// Render a section header (e.g., "Priorities", "Tags")
pub fn render_section_header(title: &str) {
    println!("\n  ─── {} ───\n", title.bold());
}

pub fn render_quote(quote: &Quote, variant: QuoteVariant) {
    let attribution = quote
        .author
        .map(|author| format!(" — {}", author))
        .unwrap_or_default();
    println!(
        "  {}{}  {}",
        format!("“{}”", quote.text).italic(),
        attribution.dimmed(),
        format!("[{}]", variant).dimmed()
    );
}

/// Cuts `text` to `width` characters, marking the cut with an ellipsis
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut cut: String = text.chars().take(width - 1).collect();
    cut.push('…');
    cut
}

/// Card lines for one kanban column, each padded to `width`
fn column_lines(tasks: &[&Task], width: usize, today: Date) -> Vec<ColoredString> {
    let mut lines = vec![];
    for task in tasks {
        let headline = format!("#{} {} {}", task.task_number, task.priority, task.title);
        let headline = format!("{:<width$}", truncate(&headline, width), width = width);

        let mut details = vec![];
        if let Some(tag) = &task.tag {
            details.push(format!("#{}", tag));
        }
        if let Some(due) = task.due_date {
            details.push(format_due_date(due, today));
        }
        let details = format!(
            "{:<width$}",
            truncate(&format!("  {}", details.join(" · ")), width),
            width = width
        );

        let headline = match task.status {
            Status::Done => headline.dimmed(),
            _ if task.is_overdue(today) => headline.red(),
            _ if task.priority.value() >= 4 => headline.bold(),
            _ => headline.normal(),
        };
        lines.push(headline);
        lines.push(details.dimmed());
        lines.push(" ".repeat(width).normal());
    }
    lines
}

/// Render the three-column kanban board
pub fn render_board(board: &Board, today: Date) {
    let terminal_width = get_terminal_width();
    let width = ((terminal_width.saturating_sub(6)) / 3).clamp(20, 40);

    let columns: Vec<(Status, Vec<&Task>)> = Status::ALL
        .iter()
        .map(|status| {
            let mut tasks: Vec<&Task> = board.tasks_with_status(*status).collect();
            tasks.sort_by(|a, b| {
                b.priority
                    .cmp(&a.priority)
                    .then_with(|| a.task_number.cmp(&b.task_number))
            });
            (*status, tasks)
        })
        .collect();

    let headers: Vec<String> = columns
        .iter()
        .map(|(status, tasks)| {
            let header = format!("{} ({})", status.as_str().to_uppercase(), tasks.len());
            format!("{:<width$}", truncate(&header, width), width = width)
        })
        .collect();
    println!();
    println!(
        "  {}",
        headers
            .iter()
            .map(|h| h.cyan().bold().to_string())
            .collect::<Vec<_>>()
            .join("  ")
    );
    println!(
        "  {}",
        vec!["─".repeat(width); 3]
            .iter()
            .map(|line| line.dimmed().to_string())
            .collect::<Vec<_>>()
            .join("  ")
    );

    let column_lines: Vec<Vec<ColoredString>> = columns
        .iter()
        .map(|(_, tasks)| column_lines(tasks, width, today))
        .collect();
    let height = column_lines.iter().map(Vec::len).max().unwrap_or(0);
    let blank = " ".repeat(width);

    for row in 0..height {
        let cells: Vec<String> = column_lines
            .iter()
            .map(|lines| match lines.get(row) {
                Some(line) => line.to_string(),
                None => blank.clone(),
            })
            .collect();
        println!("  {}", cells.join("  ").trim_end());
    }
    if height == 0 {
        println!("  {}", "No tasks yet. Add one with `taskdeck add`.".dimmed());
    }
    println!();
}

/// A horizontal bar scaled against `max`
pub fn bar(value: usize, max: usize) -> String {
    if max == 0 || value == 0 {
        return String::new();
    }
    let length = (value * BAR_WIDTH).div_ceil(max);
    "█".repeat(length.min(BAR_WIDTH))
}

fn render_bar_chart<'a>(rows: impl Iterator<Item = (String, usize, Color)> + 'a) {
    let rows: Vec<_> = rows.collect();
    let max = rows.iter().map(|(_, n, _)| *n).max().unwrap_or(0);
    let label_width = rows
        .iter()
        .map(|(label, _, _)| label.chars().count())
        .max()
        .unwrap_or(0);

    for (label, count, color) in rows {
        println!(
            "  {:<label_width$}  {} {}",
            label,
            bar(count, max).color(color),
            count.to_string().dimmed(),
            label_width = label_width
        );
    }
}

/// Render the analytics dashboard
pub fn render_analytics(analytics: &Analytics) {
    render_view_header("Stats", analytics.total);

    println!(
        "  {} {:.0}%   {} {}   {} {}",
        "Completed:".bold(),
        analytics.completion_rate * 100.0,
        "Overdue:".bold(),
        if analytics.overdue > 0 {
            analytics.overdue.to_string().red()
        } else {
            analytics.overdue.to_string().normal()
        },
        "Due this week:".bold(),
        analytics.due_soon
    );
    if let Some(hours) = analytics.average_cycle_hours {
        println!("  {} {:.1}h", "Average time to done:".bold(), hours);
    }
    if analytics.estimated_hours > 0.0 || analytics.actual_hours > 0.0 {
        println!(
            "  {} {:.1}h estimated · {:.1}h actual",
            "Effort:".bold(),
            analytics.estimated_hours,
            analytics.actual_hours
        );
    }

    render_section_header("Status");
    render_bar_chart(analytics.status_counts.iter().map(|(status, count)| {
        let color = match status {
            Status::ToDo => Color::Blue,
            Status::InProgress => Color::Yellow,
            Status::Done => Color::Green,
        };
        (status.to_string(), *count, color)
    }));

    render_section_header("Priority");
    render_bar_chart(
        analytics
            .priority_counts
            .iter()
            .rev()
            .map(|(priority, count)| (priority.to_string(), *count, Color::Magenta)),
    );

    if !analytics.tag_counts.is_empty() {
        render_section_header("Tags");
        let untagged = (analytics.untagged > 0)
            .then(|| ("(untagged)".to_string(), analytics.untagged, Color::White));
        render_bar_chart(
            analytics
                .tag_counts
                .iter()
                .map(|(tag, count)| (format!("#{}", tag), *count, Color::Cyan))
                .chain(untagged),
        );
    }

    render_section_header(&format!(
        "Completed per day (last {})",
        analytics.completions_by_day.len()
    ));
    render_bar_chart(
        analytics
            .completions_by_day
            .iter()
            .map(|(date, count)| (date.strftime("%a %b %d").to_string(), *count, Color::Green)),
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> Date {
        "2026-03-10".parse().unwrap()
    }

    #[test]
    fn test_format_due_date() {
        assert_eq!(format_due_date(today(), today()), "Today");
        assert_eq!(format_due_date("2026-03-11".parse().unwrap(), today()), "Tomorrow");
        assert_eq!(
            format_due_date("2026-03-07".parse().unwrap(), today()),
            "3d overdue"
        );
        assert_eq!(format_due_date("2026-03-20".parse().unwrap(), today()), "Mar 20");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
        assert_eq!(truncate("much longer title", 8), "much lo…");
        assert_eq!(truncate("anything", 0), "");
    }

    #[test]
    fn test_bar_scales_to_max() {
        assert_eq!(bar(0, 10), "");
        assert_eq!(bar(5, 0), "");
        assert_eq!(bar(10, 10).chars().count(), BAR_WIDTH);
        assert_eq!(bar(1, 10).chars().count(), 3);
        assert_eq!(bar(1, 1000).chars().count(), 1);
    }

    #[test]
    fn test_task_context() {
        let task = Task {
            tag: Some("etl".to_string()),
            due_date: Some("2026-03-11".parse().unwrap()),
            ..Task::default()
        };

        assert_eq!(
            get_task_context(&task, today()).as_deref(),
            Some("#etl  ·  due Tomorrow")
        );
        assert_eq!(get_task_context(&Task::default(), today()), None);
    }
}
