//! Query keyword extraction and title-match boosting.
//!
//! Keywords are either numeric references (`Rule 15`, `Annex I`, `第15条`),
//! proper nouns from a fixed set, or topic phrases from a fixed list. The first
//! two kinds are *strong*; topics are *weak*. A candidate's title boost depends
//! on how many strong and weak keywords its title contains.

use std::sync::LazyLock;

use regex::Regex;

/// `Rule 15`, `Chapter 3`, `Regulation 10a`, ...
static NUMBERED_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(rule|regulation|chapter|section|part)\s*(\d+[a-z]?)\b")
        .expect("Invalid numbered reference regex")
});

/// `Annex I`, `Annex 2`.
static ANNEX_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bannex\s+([ivx]+|\d+)\b").expect("Invalid annex regex")
});

/// `第15条`, `第 15 条`.
static LOCALIZED_ARTICLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"第\s*(\d+)\s*条").expect("Invalid localized article regex"));

/// `规则15`, `规则 15`.
static LOCALIZED_RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"规则\s*(\d+)").expect("Invalid localized rule regex"));

/// Weak keywords. Lowercase.
pub const TOPIC_KEYWORDS: &[&str] = &[
    "crossing",
    "overtaking",
    "head-on",
    "give-way",
    "stand-on",
    "safe speed",
    "lookout",
    "restricted visibility",
    "narrow channel",
    "traffic separation",
    "risk of collision",
    "collision",
    "sound signals",
    "lights",
    "shapes",
    "anchoring",
    "towing",
    "fishing",
    "sailing",
];

/// Strong keywords. Lowercase.
pub const PROPER_NOUNS: &[&str] = &[
    "colregs", "colreg", "solas", "marpol", "stcw", "imo", "isps", "ism", "unclos",
];

pub const STRONG_MULTI_MATCH_BOOST: f32 = 3.0;
pub const STRONG_SINGLE_MATCH_BOOST: f32 = 1.5;
pub const WEAK_MULTI_MATCH_BOOST: f32 = 1.1;
pub const WEAK_SINGLE_MATCH_BOOST: f32 = 1.05;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword {
    /// Lowercase, single-spaced form matched against titles.
    pub term: String,
    pub strong: bool,
}

/// Keywords extracted from one query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryKeywords {
    keywords: Vec<Keyword>,
}

/// Strong and weak keyword counts found in one title.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TitleMatches {
    pub strong: usize,
    pub weak: usize,
}

impl TitleMatches {
    pub fn total(&self) -> usize {
        self.strong + self.weak
    }

    pub fn boost(&self) -> f32 {
        match (self.strong, self.total()) {
            (s, t) if s >= 1 && t >= 2 => STRONG_MULTI_MATCH_BOOST,
            (s, 1) if s >= 1 => STRONG_SINGLE_MATCH_BOOST,
            (_, t) if t >= 2 => WEAK_MULTI_MATCH_BOOST,
            (_, 1) => WEAK_SINGLE_MATCH_BOOST,
            _ => 1.0,
        }
    }
}

impl QueryKeywords {
    pub fn extract(query: &str) -> Self {
        let mut extracted = Self::default();
        let lowered = query.to_lowercase();

        for caps in NUMBERED_REFERENCE.captures_iter(&lowered) {
            extracted.push(format!("{} {}", &caps[1], &caps[2]), true);
        }
        for caps in ANNEX_REFERENCE.captures_iter(&lowered) {
            extracted.push(format!("annex {}", &caps[1]), true);
        }
        for caps in LOCALIZED_ARTICLE.captures_iter(&lowered) {
            extracted.push(format!("第{}条", &caps[1]), true);
        }
        for caps in LOCALIZED_RULE.captures_iter(&lowered) {
            extracted.push(format!("规则{}", &caps[1]), true);
        }

        for noun in PROPER_NOUNS {
            if contains_term(&lowered, noun) {
                extracted.push((*noun).to_string(), true);
            }
        }
        for topic in TOPIC_KEYWORDS {
            if contains_term(&lowered, topic) {
                extracted.push((*topic).to_string(), false);
            }
        }

        extracted
    }

    fn push(&mut self, term: String, strong: bool) {
        if !self.keywords.iter().any(|k| k.term == term) {
            self.keywords.push(Keyword { term, strong });
        }
    }

    pub fn keywords(&self) -> &[Keyword] {
        &self.keywords
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn match_title(&self, title: &str) -> TitleMatches {
        let mut matches = TitleMatches::default();
        if self.keywords.is_empty() || title.is_empty() {
            return matches;
        }

        let title = normalize_whitespace(&title.to_lowercase());
        for keyword in &self.keywords {
            if contains_term(&title, &keyword.term) {
                if keyword.strong {
                    matches.strong += 1;
                } else {
                    matches.weak += 1;
                }
            }
        }
        matches
    }

    /// Score multiplier for a candidate titled `title`.
    pub fn title_boost(&self, title: &str) -> f32 {
        self.match_title(title).boost()
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Substring match that refuses to split ASCII words or numbers.
///
/// `rule 15` matches `rule 15 - crossing` but not `rule 150`.
fn contains_term(haystack: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }

    haystack.match_indices(term).any(|(start, matched)| {
        let end = start + matched.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(|c| c.is_ascii_alphanumeric())
            && !after.is_some_and(|c| c.is_ascii_alphanumeric())
    })
}
