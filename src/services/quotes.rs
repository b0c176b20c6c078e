use std::fmt;

use jiff::civil::Date;

/// Which quote list a user sees. Assignment is stable per username.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteVariant {
    /// Motivational quotes
    A,
    /// Practical productivity tips
    B,
}

impl fmt::Display for QuoteVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteVariant::A => f.write_str("A"),
            QuoteVariant::B => f.write_str("B"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub text: &'static str,
    pub author: Option<&'static str>,
}

const MOTIVATION: [Quote; 6] = [
    Quote {
        text: "The secret of getting ahead is getting started.",
        author: Some("Mark Twain"),
    },
    Quote {
        text: "It always seems impossible until it's done.",
        author: Some("Nelson Mandela"),
    },
    Quote {
        text: "Well done is better than well said.",
        author: Some("Benjamin Franklin"),
    },
    Quote {
        text: "Action is the foundational key to all success.",
        author: Some("Pablo Picasso"),
    },
    Quote {
        text: "Without data, you're just another person with an opinion.",
        author: Some("W. Edwards Deming"),
    },
    Quote {
        text: "Quality is not an act, it is a habit.",
        author: Some("Aristotle"),
    },
];

const TIPS: [Quote; 6] = [
    Quote {
        text: "Pick one In Progress task and finish it before starting another.",
        author: None,
    },
    Quote {
        text: "Split anything estimated over four hours into smaller tasks.",
        author: None,
    },
    Quote {
        text: "Tackle the highest priority task while your focus is fresh.",
        author: None,
    },
    Quote {
        text: "Give every task a due date, even a rough one.",
        author: None,
    },
    Quote {
        text: "Review overdue tasks first: reschedule, finish or delete them.",
        author: None,
    },
    Quote {
        text: "Log actual hours so your next estimates get better.",
        author: None,
    },
];

/// FNV-1a, so the split does not change between builds
fn fnv1a(input: &str) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    input.bytes().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(PRIME)
    })
}

pub fn assign_variant(username: &str) -> QuoteVariant {
    if fnv1a(&username.trim().to_lowercase()) % 2 == 0 {
        QuoteVariant::A
    } else {
        QuoteVariant::B
    }
}

/// The variant's quote for `date`, rotating daily
pub fn quote_of_the_day(variant: QuoteVariant, date: Date) -> Quote {
    let quotes: &[Quote] = match variant {
        QuoteVariant::A => &MOTIVATION,
        QuoteVariant::B => &TIPS,
    };
    let index = usize::try_from(date.day_of_year()).unwrap_or(0) % quotes.len();
    quotes[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_reference_values() {
        assert_eq!(fnv1a(""), 0xcbf29ce484222325);
        assert_eq!(fnv1a("a"), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn test_variant_is_stable_and_case_insensitive() {
        assert_eq!(assign_variant("alice"), assign_variant("ALICE"));
        assert_eq!(assign_variant("alice"), assign_variant("alice"));
    }

    #[test]
    fn test_both_variants_are_used() {
        let names = ["alice", "bob", "carol", "dave", "erin", "frank", "grace", "heidi"];
        let a = names
            .iter()
            .filter(|n| assign_variant(n) == QuoteVariant::A)
            .count();
        assert!(a > 0 && a < names.len());
    }

    #[test]
    fn test_quote_rotates_daily() {
        let monday: Date = "2026-03-09".parse().unwrap();
        let tuesday: Date = "2026-03-10".parse().unwrap();

        assert_ne!(
            quote_of_the_day(QuoteVariant::A, monday),
            quote_of_the_day(QuoteVariant::A, tuesday)
        );
        assert!(quote_of_the_day(QuoteVariant::B, monday).author.is_none());
        assert!(quote_of_the_day(QuoteVariant::A, monday).author.is_some());
    }
}
