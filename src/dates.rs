use jiff::{
    Span, ToSpan,
    civil::{Date, Weekday},
};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
#[error("Unrecognized date '{0}'")]
pub struct DueDateError(pub String);

/// Parses an absolute (`2026-03-01`) or relative (`tomorrow`, `friday`,
/// `next week`, `in 3 days`) due date against `today`.
pub fn parse_due_date(input: &str, today: Date) -> Result<Date, DueDateError> {
    let words: Vec<String> = input
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect();
    let words: Vec<&str> = words.iter().map(String::as_str).collect();

    parse_words(&words, today).ok_or_else(|| DueDateError(input.trim().to_string()))
}

fn parse_words(words: &[&str], today: Date) -> Option<Date> {
    match words {
        [word] => parse_single_word(word, today),
        ["next", "week"] => today.checked_add(1.week()).ok(),
        ["next", "month"] => today.checked_add(1.month()).ok(),
        ["next", day] => next_weekday(today, parse_weekday(day)?),
        ["in", amount, unit] => {
            let amount: i64 = amount.parse().ok().filter(|n| *n >= 0)?;
            // Counts beyond jiff's span limits are rejected, not clamped
            let span = match unit.trim_end_matches('s') {
                "day" => Span::new().try_days(amount),
                "week" => Span::new().try_weeks(amount),
                "month" => Span::new().try_months(amount),
                _ => return None,
            };
            today.checked_add(span.ok()?).ok()
        }
        _ => None,
    }
}

fn parse_single_word(word: &str, today: Date) -> Option<Date> {
    match word {
        "today" | "tonight" => Some(today),
        "tomorrow" => today.tomorrow().ok(),
        _ => match parse_weekday(word) {
            Some(weekday) => next_weekday(today, weekday),
            None => word.parse::<Date>().ok(),
        },
    }
}

/// The next occurrence of `weekday` strictly after `today`
fn next_weekday(today: Date, weekday: Weekday) -> Option<Date> {
    today.nth_weekday(1, weekday).ok()
}

fn parse_weekday(word: &str) -> Option<Weekday> {
    match word {
        "monday" | "mon" => Some(Weekday::Monday),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tuesday),
        "wednesday" | "wed" => Some(Weekday::Wednesday),
        "thursday" | "thu" | "thurs" => Some(Weekday::Thursday),
        "friday" | "fri" => Some(Weekday::Friday),
        "saturday" | "sat" => Some(Weekday::Saturday),
        "sunday" | "sun" => Some(Weekday::Sunday),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A Wednesday
    fn today() -> Date {
        "2026-03-11".parse().unwrap()
    }

    fn parse(input: &str) -> Date {
        parse_due_date(input, today()).unwrap()
    }

    #[test]
    fn test_absolute_date() {
        assert_eq!(parse("2026-04-01"), "2026-04-01".parse::<Date>().unwrap());
    }

    #[test]
    fn test_relative_words() {
        assert_eq!(parse("today"), today());
        assert_eq!(parse("Tomorrow"), "2026-03-12".parse::<Date>().unwrap());
        assert_eq!(parse("next week"), "2026-03-18".parse::<Date>().unwrap());
        assert_eq!(parse("next month"), "2026-04-11".parse::<Date>().unwrap());
        assert_eq!(parse("in 3 days"), "2026-03-14".parse::<Date>().unwrap());
        assert_eq!(parse("in 1 week"), "2026-03-18".parse::<Date>().unwrap());
        assert_eq!(parse("in 2 months"), "2026-05-11".parse::<Date>().unwrap());
    }

    #[test]
    fn test_weekdays_are_strictly_in_the_future() {
        assert_eq!(parse("friday"), "2026-03-13".parse::<Date>().unwrap());
        assert_eq!(parse("next fri"), "2026-03-13".parse::<Date>().unwrap());
        assert_eq!(parse("wednesday"), "2026-03-18".parse::<Date>().unwrap());
        assert_eq!(parse("monday"), "2026-03-16".parse::<Date>().unwrap());
    }

    #[test]
    fn test_unrecognized_input() {
        assert_eq!(
            parse_due_date("someday soon", today()),
            Err(DueDateError("someday soon".to_string()))
        );
        assert!(parse_due_date("in -2 days", today()).is_err());
        assert!(parse_due_date("2026-02-30", today()).is_err());
    }

    #[test]
    fn test_oversized_counts_are_rejected() {
        assert!(parse_due_date("in 99999999 days", today()).is_err());
        assert!(parse_due_date("in 1000000 months", today()).is_err());
        assert!(parse_due_date("in 9223372036854775807 weeks", today()).is_err());
        // In span range but past the last civil date
        assert!(parse_due_date("in 7000000 days", today()).is_err());
    }
}
