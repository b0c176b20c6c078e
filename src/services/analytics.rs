use std::collections::BTreeMap;

use jiff::{ToSpan, civil::Date, tz::TimeZone};

use crate::models::task::{Priority, Status, Task};

/// Days ahead counted as "due soon", today included
const DUE_SOON_DAYS: i64 = 7;

/// Aggregates behind the stats charts
#[derive(Debug, PartialEq)]
pub struct Analytics {
    pub total: usize,
    /// One entry per status in board order
    pub status_counts: Vec<(Status, usize)>,
    /// One entry per priority, lowest first
    pub priority_counts: Vec<(Priority, usize)>,
    /// Most used tag first
    pub tag_counts: Vec<(String, usize)>,
    pub untagged: usize,
    /// Done tasks over all tasks, 0 for an empty board
    pub completion_rate: f64,
    pub overdue: usize,
    pub due_soon: usize,
    /// Completions per day, oldest first, ending today
    pub completions_by_day: Vec<(Date, usize)>,
    /// Mean hours from creation to completion of done tasks
    pub average_cycle_hours: Option<f64>,
    pub estimated_hours: f64,
    pub actual_hours: f64,
}

/// Tasks per tag, most used first, plus the number of untagged tasks
#[derive(Debug, PartialEq)]
pub struct TagCounts {
    pub counts: Vec<(String, usize)>,
    pub untagged: usize,
}

/// Groups tags case-insensitively under the first spelling seen
pub fn count_tags(tasks: &[Task]) -> TagCounts {
    let mut tags: BTreeMap<String, (String, usize)> = BTreeMap::new();
    let mut untagged = 0;
    for task in tasks {
        match task.tag.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(tag) => {
                tags.entry(tag.to_lowercase())
                    .or_insert_with(|| (tag.to_string(), 0))
                    .1 += 1;
            }
            None => untagged += 1,
        }
    }

    let mut counts: Vec<(String, usize)> = tags.into_values().collect();
    counts.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| a.0.to_lowercase().cmp(&b.0.to_lowercase()))
    });

    TagCounts { counts, untagged }
}

pub fn compute_analytics(tasks: &[Task], today: Date, tz: &TimeZone, days: u16) -> Analytics {
    let total = tasks.len();

    let status_counts = Status::ALL
        .iter()
        .map(|status| (*status, tasks.iter().filter(|t| t.status == *status).count()))
        .collect();

    let priority_counts = Priority::all()
        .map(|priority| (priority, tasks.iter().filter(|t| t.priority == priority).count()))
        .collect();

    let TagCounts {
        counts: tag_counts,
        untagged,
    } = count_tags(tasks);

    let done: Vec<&Task> = tasks.iter().filter(|t| t.status == Status::Done).collect();
    let completion_rate = if total == 0 {
        0.0
    } else {
        done.len() as f64 / total as f64
    };

    let overdue = tasks.iter().filter(|t| t.is_overdue(today)).count();

    let due_soon_limit = today
        .checked_add((DUE_SOON_DAYS - 1).days())
        .unwrap_or(today);
    let due_soon = tasks
        .iter()
        .filter(|t| t.status != Status::Done)
        .filter(|t| t.due_date.is_some_and(|d| d >= today && d <= due_soon_limit))
        .count();

    let completions_by_day = completions_by_day(&done, today, tz, days);

    let cycle_hours: Vec<f64> = done
        .iter()
        .filter_map(|t| {
            let completed_at = t.completed_at?;
            let seconds = completed_at.duration_since(t.created_at).as_secs_f64();
            Some(seconds.max(0.0) / 3600.0)
        })
        .collect();
    let average_cycle_hours = if cycle_hours.is_empty() {
        None
    } else {
        Some(cycle_hours.iter().sum::<f64>() / cycle_hours.len() as f64)
    };

    Analytics {
        total,
        status_counts,
        priority_counts,
        tag_counts,
        untagged,
        completion_rate,
        overdue,
        due_soon,
        completions_by_day,
        average_cycle_hours,
        estimated_hours: tasks.iter().filter_map(|t| t.estimated_hours).sum(),
        actual_hours: tasks.iter().filter_map(|t| t.actual_hours).sum(),
    }
}

fn completions_by_day(done: &[&Task], today: Date, tz: &TimeZone, days: u16) -> Vec<(Date, usize)> {
    let mut counts: BTreeMap<Date, usize> = BTreeMap::new();
    for offset in (0..i64::from(days)).rev() {
        if let Ok(date) = today.checked_sub(offset.days()) {
            counts.insert(date, 0);
        }
    }

    for task in done {
        let Some(completed_at) = task.completed_at else {
            continue;
        };
        let date = completed_at.to_zoned(tz.clone()).date();
        if let Some(count) = counts.get_mut(&date) {
            *count += 1;
        }
    }

    counts.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use uuid::Uuid;

    use super::*;

    fn today() -> Date {
        "2026-03-10".parse().unwrap()
    }

    fn task(title: &str, priority: u8, tag: Option<&str>, due: Option<&str>) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: title.to_string(),
            priority: Priority::try_from(priority).unwrap(),
            tag: tag.map(str::to_string),
            due_date: due.map(|d| d.parse().unwrap()),
            created_at: "2026-03-01T08:00:00Z".parse().unwrap(),
            ..Task::default()
        }
    }

    fn sample() -> Vec<Task> {
        let mut finished = task("finished", 5, Some("Work"), Some("2026-03-05"));
        finished.estimated_hours = Some(3.0);
        finished.actual_hours = Some(4.0);
        finished.set_status(Status::Done, "2026-03-09T08:00:00Z".parse::<Timestamp>().unwrap());

        let mut finished_today = task("finished today", 3, Some("work"), None);
        finished_today.set_status(Status::Done, "2026-03-10T20:00:00Z".parse::<Timestamp>().unwrap());

        let mut doing = task("doing", 3, Some("home"), Some("2026-03-12"));
        doing.set_status(Status::InProgress, Timestamp::now());
        doing.estimated_hours = Some(1.5);

        vec![
            finished,
            finished_today,
            doing,
            task("late", 1, None, Some("2026-03-01")),
            task("far away", 2, None, Some("2026-04-30")),
        ]
    }

    #[test]
    fn test_counts() {
        let analytics = compute_analytics(&sample(), today(), &TimeZone::UTC, 7);

        assert_eq!(analytics.total, 5);
        assert_eq!(
            analytics.status_counts,
            vec![(Status::ToDo, 2), (Status::InProgress, 1), (Status::Done, 2)]
        );
        let priorities: Vec<usize> = analytics.priority_counts.iter().map(|(_, n)| *n).collect();
        assert_eq!(priorities, vec![1, 1, 2, 0, 1]);
        assert_eq!(
            analytics.tag_counts,
            vec![("Work".to_string(), 2), ("home".to_string(), 1)]
        );
        assert_eq!(analytics.untagged, 2);
        assert!((analytics.completion_rate - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn test_due_dates() {
        let analytics = compute_analytics(&sample(), today(), &TimeZone::UTC, 7);

        // "finished" is past due but done, so only "late" counts
        assert_eq!(analytics.overdue, 1);
        assert_eq!(analytics.due_soon, 1);
    }

    #[test]
    fn test_completions_by_day() {
        let analytics = compute_analytics(&sample(), today(), &TimeZone::UTC, 7);

        assert_eq!(analytics.completions_by_day.len(), 7);
        assert_eq!(
            analytics.completions_by_day.first().unwrap().0,
            "2026-03-04".parse::<Date>().unwrap()
        );
        let last_two: Vec<usize> = analytics.completions_by_day[5..]
            .iter()
            .map(|(_, n)| *n)
            .collect();
        assert_eq!(last_two, vec![1, 1]);
    }

    #[test]
    fn test_completion_day_uses_time_zone() {
        let tz = TimeZone::fixed(jiff::tz::offset(-5));
        let analytics = compute_analytics(&sample(), today(), &tz, 2);

        // 2026-03-09T08:00Z is 03:00 on the 9th, 2026-03-10T20:00Z is 15:00 on the 10th
        assert_eq!(
            analytics.completions_by_day,
            vec![
                ("2026-03-09".parse().unwrap(), 1),
                ("2026-03-10".parse().unwrap(), 1)
            ]
        );
    }

    #[test]
    fn test_hours() {
        let analytics = compute_analytics(&sample(), today(), &TimeZone::UTC, 7);

        assert_eq!(analytics.estimated_hours, 4.5);
        assert_eq!(analytics.actual_hours, 4.0);
        // 192 hours and 228 hours from 2026-03-01T08:00Z
        assert_eq!(analytics.average_cycle_hours, Some(210.0));
    }

    #[test]
    fn test_count_tags_orders_by_use() {
        let tasks = vec![
            task("a", 3, Some("zeta"), None),
            task("b", 3, Some("Zeta"), None),
            task("c", 3, Some("alpha"), None),
            task("d", 3, Some("beta"), None),
            task("e", 3, Some("beta"), None),
            task("f", 3, Some("ZETA"), None),
            task("g", 3, None, None),
        ];

        let tags = count_tags(&tasks);

        assert_eq!(
            tags.counts,
            vec![
                ("zeta".to_string(), 3),
                ("beta".to_string(), 2),
                ("alpha".to_string(), 1)
            ]
        );
        assert_eq!(tags.untagged, 1);
        assert_eq!(
            compute_analytics(&tasks, today(), &TimeZone::UTC, 1).tag_counts,
            tags.counts
        );
    }

    #[test]
    fn test_empty_board() {
        let analytics = compute_analytics(&[], today(), &TimeZone::UTC, 3);

        assert_eq!(analytics.total, 0);
        assert_eq!(analytics.completion_rate, 0.0);
        assert_eq!(analytics.average_cycle_hours, None);
        assert_eq!(analytics.completions_by_day.len(), 3);
        assert!(analytics.tag_counts.is_empty());
    }
}
