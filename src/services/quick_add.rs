use jiff::civil::Date;

use crate::{
    dates::parse_due_date,
    models::{
        store::Store,
        task::{Priority, Task},
    },
    services::tasks::{AddTaskError, AddTaskParameters, add_task},
    storage::Storage,
};

/// Keyword groups in precedence order
const PRIORITY_KEYWORDS: [(&[&str], u8); 4] = [
    (&["urgent", "asap", "critical"], 5),
    (&["high", "important"], 4),
    (&["low", "minor"], 2),
    (&["whenever"], 1),
];

/// Words that may introduce a due date and are dropped with it
const DATE_CONNECTORS: [&str; 3] = ["on", "by", "due"];

#[derive(Debug, PartialEq)]
pub struct QuickTask {
    pub title: String,
    pub priority: Priority,
    pub tag: Option<String>,
    pub due_date: Option<Date>,
}

/// Splits free text like "urgent: send report to Ana by friday #work" into
/// title, priority, tag and due date.
pub fn extract_quick_task(input: &str, today: Date) -> QuickTask {
    let mut words: Vec<&str> = input.split_whitespace().collect();

    let tag = take_tag(&mut words);
    let priority = take_priority(&mut words);
    let due_date = take_due_date(&mut words, today);

    let title = match words.join(" ") {
        title if title.trim_matches(is_separator).is_empty() => input.trim().to_string(),
        title => title.trim_matches(is_separator).to_string(),
    };

    QuickTask {
        title,
        priority,
        tag,
        due_date,
    }
}

pub fn quick_add_task(
    store: &mut Store,
    storage: &impl Storage,
    owner: &str,
    text: &str,
    today: Date,
) -> Result<Task, AddTaskError> {
    let quick = extract_quick_task(text, today);
    log::debug!("Quick add parsed {:?}", quick);

    add_task(
        store,
        storage,
        owner,
        AddTaskParameters {
            title: quick.title,
            priority: quick.priority,
            tag: quick.tag,
            due_date: quick.due_date,
            estimated_hours: None,
        },
    )
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | ':' | ';' | '-' | '!')
}

/// Lowercased word without surrounding punctuation
fn bare(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric() && c != '-')
        .to_lowercase()
}

fn take_tag(words: &mut Vec<&str>) -> Option<String> {
    let index = words
        .iter()
        .position(|w| w.len() > 1 && w.starts_with('#'))?;
    let tag = words.remove(index).trim_start_matches('#');
    let tag = tag.trim_end_matches(|c: char| !c.is_alphanumeric());
    (!tag.is_empty()).then(|| tag.to_string())
}

fn take_priority(words: &mut Vec<&str>) -> Priority {
    for (keywords, level) in PRIORITY_KEYWORDS {
        if let Some(index) = words
            .iter()
            .position(|w| keywords.contains(&bare(w).as_str()))
        {
            words.remove(index);
            if words.get(index).is_some_and(|w| bare(w) == "priority") {
                words.remove(index);
            }
            return Priority::try_from(level).unwrap_or_default();
        }
    }
    Priority::default()
}

fn take_due_date(words: &mut Vec<&str>, today: Date) -> Option<Date> {
    for start in 0..words.len() {
        // Longest phrase first so "next friday" wins over "friday"
        for length in (1..=3).rev() {
            let end = start + length;
            if end > words.len() {
                continue;
            }
            let phrase = words[start..end]
                .iter()
                .map(|w| bare(w))
                .collect::<Vec<_>>()
                .join(" ");
            let Ok(date) = parse_due_date(&phrase, today) else {
                continue;
            };

            let has_connector =
                start > 0 && DATE_CONNECTORS.contains(&bare(words[start - 1]).as_str());
            let from = if has_connector { start - 1 } else { start };
            words.drain(from..end);
            return Some(date);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;

    // A Wednesday
    fn today() -> Date {
        "2026-03-11".parse().unwrap()
    }

    fn priority(level: u8) -> Priority {
        Priority::try_from(level).unwrap()
    }

    #[test]
    fn test_plain_text_keeps_defaults() {
        let quick = extract_quick_task("Refresh sales dashboard", today());

        assert_eq!(
            quick,
            QuickTask {
                title: "Refresh sales dashboard".to_string(),
                priority: Priority::default(),
                tag: None,
                due_date: None,
            }
        );
    }

    #[test]
    fn test_extracts_everything() {
        let quick = extract_quick_task("Urgent: send churn report by friday #work", today());

        assert_eq!(quick.title, "send churn report");
        assert_eq!(quick.priority, priority(5));
        assert_eq!(quick.tag.as_deref(), Some("work"));
        assert_eq!(quick.due_date, Some("2026-03-13".parse().unwrap()));
    }

    #[test]
    fn test_priority_word_is_consumed() {
        let quick = extract_quick_task("fix etl job high priority tomorrow", today());

        assert_eq!(quick.title, "fix etl job");
        assert_eq!(quick.priority, priority(4));
        assert_eq!(quick.due_date, Some("2026-03-12".parse().unwrap()));
    }

    #[test]
    fn test_urgent_beats_low() {
        let quick = extract_quick_task("low effort but urgent cleanup", today());

        assert_eq!(quick.priority, priority(5));
        assert_eq!(quick.title, "low effort but cleanup");
    }

    #[test]
    fn test_multi_word_dates() {
        let quick = extract_quick_task("plan sprint in 2 weeks", today());
        assert_eq!(quick.title, "plan sprint");
        assert_eq!(quick.due_date, Some("2026-03-25".parse().unwrap()));

        let quick = extract_quick_task("review model due next monday", today());
        assert_eq!(quick.title, "review model");
        assert_eq!(quick.due_date, Some("2026-03-16".parse().unwrap()));

        let quick = extract_quick_task("ship on 2026-04-01", today());
        assert_eq!(quick.title, "ship");
        assert_eq!(quick.due_date, Some("2026-04-01".parse().unwrap()));
    }

    #[test]
    fn test_keyword_only_input_keeps_text_as_title() {
        let quick = extract_quick_task("urgent", today());

        assert_eq!(quick.title, "urgent");
        assert_eq!(quick.priority, priority(5));
    }

    #[test]
    fn test_out_of_range_count_stays_in_title() {
        let quick = extract_quick_task("ship report in 1000000 months", today());

        assert_eq!(quick.title, "ship report in 1000000 months");
        assert_eq!(quick.due_date, None);

        let quick = extract_quick_task("archive logs in 99999999 days #ops", today());

        assert_eq!(quick.title, "archive logs in 99999999 days");
        assert_eq!(quick.tag.as_deref(), Some("ops"));
        assert_eq!(quick.due_date, None);
    }

    #[test]
    fn test_quick_add_task_respects_duplicates() {
        let mut store = Store::default();
        let storage = MemoryStorage::default();

        let task = quick_add_task(&mut store, &storage, "alice", "call vendor asap", today())
            .unwrap();
        assert_eq!(task.title, "call vendor");
        assert_eq!(task.priority, priority(5));

        let again = quick_add_task(&mut store, &storage, "alice", "Call Vendor urgent", today());
        assert!(matches!(again, Err(AddTaskError::DuplicateTask { .. })));
    }
}
