//! Normalisation rules for free-text spreadsheet answers
//!
//! Both rule sets are ordered tables evaluated top to bottom; the first rule
//! that matches decides. New phrasings are added to the tables, not to the
//! evaluation code.

use crate::db::models::Gender;

/// One gender rule: matches when the lower-cased value contains any of
/// `contains` or equals any of `equals`
#[derive(Debug)]
pub struct GenderRule {
    pub gender: Gender,
    pub contains: &'static [&'static str],
    pub equals: &'static [&'static str],
}

impl GenderRule {
    fn matches(&self, value: &str) -> bool {
        self.contains.iter().any(|p| value.contains(p)) || self.equals.iter().any(|p| value == *p)
    }
}

/// FEMALE is listed first: "female" contains "male", and answers carrying
/// both markers resolve to FEMALE.
pub const GENDER_RULES: &[GenderRule] = &[
    GenderRule {
        gender: Gender::Female,
        contains: &["female", "स्त्री", "महिला"],
        equals: &["f"],
    },
    GenderRule {
        gender: Gender::Male,
        contains: &["male", "पुरुष", "पुरष"],
        equals: &["m"],
    },
];

/// Map a free-text gender answer to MALE, FEMALE or unknown (`None`)
pub fn standardize_gender(raw: &str) -> Option<Gender> {
    let value = raw.trim().to_lowercase();
    if value.is_empty() {
        return None;
    }
    GENDER_RULES
        .iter()
        .find(|rule| rule.matches(&value))
        .map(|rule| rule.gender)
}

/// Markers meaning "the registrant themself attends"
pub const MYSELF_MARKERS: &[&str] = &["मी स्वतः", "myself"];

/// Text predicate over the lower-cased survey answer
#[derive(Debug)]
pub enum Phrase {
    Contains(&'static str),
    /// Contains `text` but not `unless`
    ContainsWithout {
        text: &'static str,
        unless: &'static str,
    },
}

impl Phrase {
    fn matches(&self, text: &str) -> bool {
        match self {
            Phrase::Contains(p) => text.contains(p),
            Phrase::ContainsWithout { text: p, unless } => text.contains(p) && !text.contains(unless),
        }
    }
}

/// Digit family scanned by [`CountRule::FirstDigit`]
#[derive(Debug, Clone, Copy)]
pub enum DigitScript {
    /// A single Devanagari digit character (०-९)
    Devanagari,
    /// The first run of ASCII digits
    Arabic,
}

/// One attendee-count rule
#[derive(Debug)]
pub enum CountRule {
    /// Fixed count when any phrase matches
    Fixed {
        any_of: &'static [Phrase],
        count: i64,
    },
    /// First number in the given script, plus one when a myself marker is present
    FirstNumber(DigitScript),
    /// A bare myself marker without any quantity
    MyselfOnly,
}

impl CountRule {
    fn apply(&self, text: &str) -> Option<i64> {
        match self {
            CountRule::Fixed { any_of, count } => {
                any_of.iter().any(|p| p.matches(text)).then_some(*count)
            }
            CountRule::FirstNumber(script) => {
                let n = match script {
                    DigitScript::Devanagari => first_devanagari_digit(text)?,
                    DigitScript::Arabic => first_arabic_number(text)?,
                };
                Some(if mentions_myself(text) { n.saturating_add(1) } else { n })
            }
            CountRule::MyselfOnly => mentions_myself(text).then_some(1),
        }
    }
}

/// Attendee-count rules in priority order
pub const ATTENDEE_RULES: &[CountRule] = &[
    CountRule::Fixed {
        any_of: &[
            Phrase::Contains("rs.200"),
            Phrase::ContainsWithout {
                text: "मी स्वतः",
                unless: "आणि",
            },
        ],
        count: 1,
    },
    CountRule::Fixed {
        any_of: &[
            Phrase::Contains("rs.400"),
            Phrase::Contains("मी स्वतः आणि १ व्यक्ती"),
            Phrase::Contains("myself + 1"),
        ],
        count: 2,
    },
    CountRule::Fixed {
        any_of: &[
            Phrase::Contains("rs.600"),
            Phrase::Contains("मी स्वतः आणि २ व्यक्ती"),
            Phrase::Contains("myself + 2"),
        ],
        count: 3,
    },
    CountRule::FirstNumber(DigitScript::Devanagari),
    CountRule::FirstNumber(DigitScript::Arabic),
    CountRule::MyselfOnly,
];

/// Number of people attending, derived from a free-text survey answer
///
/// Only the first number in the answer is considered.
pub fn derive_attendee_count(raw: &str) -> i64 {
    let text = raw.trim().to_lowercase();
    ATTENDEE_RULES
        .iter()
        .find_map(|rule| rule.apply(&text))
        .unwrap_or(0)
}

fn mentions_myself(text: &str) -> bool {
    MYSELF_MARKERS.iter().any(|m| text.contains(m))
}

fn first_devanagari_digit(text: &str) -> Option<i64> {
    text.chars()
        .find(|c| ('\u{0966}'..='\u{096F}').contains(c))
        .map(|c| (c as u32 - 0x0966) as i64)
}

/// First run of ASCII digits; a run too large for `i32` counts as no number,
/// which keeps attendee sums far from overflow
fn first_arabic_number(text: &str) -> Option<i64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<i32>().ok().map(i64::from)
}
