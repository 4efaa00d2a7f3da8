//! Rule-based fallback: fixed English deontic idioms matched per sentence.
//!
//! Sentences that match no idiom produce no clause. The idiom set is
//! deliberately small; it is not a parser.

use chrono::{DateTime, NaiveDate, Utc};
use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::clause::{ClauseKind, DeonticClause, ANY};

struct Idiom {
    kind: ClauseKind,
    pattern: Regex,
}

fn idiom(kind: ClauseKind, pattern: &str) -> Idiom {
    Idiom {
        kind,
        pattern: Regex::new(pattern).expect("deontic idiom is a valid literal regex"),
    }
}

/// Prohibitions first, then obligations, then permissions. The first idiom
/// that matches a sentence wins.
static IDIOMS: LazyLock<Vec<Idiom>> = LazyLock::new(|| {
    vec![
        idiom(
            ClauseKind::Prohibition,
            r"(?i)^(?:no\s+(?P<actor>.+?)|nobody)\s+(?:may|can|shall|must)\s+(?P<action>.+)$",
        ),
        idiom(
            ClauseKind::Prohibition,
            r"(?i)^(?P<actor>.+?)\s+(?:must|shall|may)\s+not\s+(?P<action>.+)$",
        ),
        idiom(
            ClauseKind::Prohibition,
            r"(?i)^(?P<actor>.+?)\s+(?:cannot|can\s+not|can't|mustn't|shan't)\s+(?P<action>.+)$",
        ),
        idiom(
            ClauseKind::Prohibition,
            r"(?i)^(?P<actor>.+?)\s+(?:is|are)\s+(?:prohibited|forbidden)\s+from\s+(?P<action>.+)$",
        ),
        idiom(
            ClauseKind::Obligation,
            r"(?i)^(?P<actor>.+?)\s+(?:must|shall)\s+(?P<action>.+)$",
        ),
        idiom(
            ClauseKind::Permission,
            r"(?i)^only\s+(?P<actor>.+?)\s+(?:may|can)\s+(?P<action>.+)$",
        ),
        idiom(
            ClauseKind::Permission,
            r"(?i)^(?P<actor>.+?)\s+(?:is|are)\s+permitted\s+to\s+(?P<action>.+)$",
        ),
        idiom(
            ClauseKind::Permission,
            r"(?i)^(?P<actor>.+?)\s+(?:may|can)\s+(?P<action>.+)$",
        ),
    ]
});

static SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.;!?\n]").expect("sentence break is a valid literal regex"));

static WINDOW_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+(?P<bound>before|until|after)\s+(?P<date>\d{4}-\d{2}-\d{2})$")
        .expect("window suffix is a valid literal regex")
});

static RESOURCE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+on\s+(?P<resource>[\w:/*-]+)$")
        .expect("resource suffix is a valid literal regex")
});

const ARTICLES: &[&str] = &["the", "a", "an", "all", "any", "every"];

const GENERIC_ACTORS: &[&str] = &[
    "anyone", "anybody", "everyone", "everybody", "someone", "somebody", "one", "agent",
    "agents", "user", "users", "actor", "actors", "caller", "callers",
];

/// Non-empty trimmed sentences.
pub fn split_sentences(text: &str) -> Vec<&str> {
    SENTENCE_BREAK
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Match one sentence against the idiom table.
pub fn match_sentence(sentence: &str) -> Option<DeonticClause> {
    IDIOMS.iter().find_map(|idiom| {
        let caps = idiom.pattern.captures(sentence)?;
        clause_from_captures(idiom.kind, &caps)
    })
}

fn clause_from_captures(kind: ClauseKind, caps: &Captures<'_>) -> Option<DeonticClause> {
    let actor = caps
        .name("actor")
        .map(|m| normalize_actor(m.as_str()))
        .unwrap_or_else(|| ANY.to_string());
    let raw_action = caps.name("action")?.as_str();
    let (action, not_before, not_after) = split_window(raw_action);
    let (action, resource) = split_resource(&action);
    let action = normalize_action(&action);
    if action.is_empty() || actor.is_empty() {
        return None;
    }
    let clause = DeonticClause::new(kind, actor, action).with_window(not_before, not_after);
    Some(match resource {
        Some(resource) => clause.with_resource(resource),
        None => clause,
    })
}

/// Lowercase, drop leading articles, map generic nouns to `*`.
pub fn normalize_actor(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let mut words: Vec<&str> = lowered.split_whitespace().collect();
    while words.len() > 1 && ARTICLES.contains(&words[0]) {
        words.remove(0);
    }
    let actor = words.join(" ");
    if GENERIC_ACTORS.contains(&actor.as_str()) {
        ANY.to_string()
    } else {
        actor
    }
}

/// Lowercase with whitespace collapsed and trailing punctuation removed.
pub fn normalize_action(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches([',', ':', '"', '\''])
        .to_lowercase()
}

/// Peel trailing `before|until|after YYYY-MM-DD` bounds off an action.
fn split_window(raw: &str) -> (String, Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let mut action = raw.trim().to_string();
    let mut not_before = None;
    let mut not_after = None;
    while let Some(caps) = WINDOW_SUFFIX.captures(&action) {
        let Some(date) = caps
            .name("date")
            .and_then(|m| NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d").ok())
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
        else {
            break;
        };
        let bound = caps
            .name("bound")
            .map(|m| m.as_str().to_lowercase())
            .unwrap_or_default();
        let start = caps.get(0).map_or(action.len(), |m| m.start());
        if bound == "after" {
            not_before = Some(date);
        } else {
            not_after = Some(date);
        }
        action.truncate(start);
    }
    (action, not_before, not_after)
}

/// Peel a trailing `on <resource>` scope off an action.
fn split_resource(raw: &str) -> (String, Option<String>) {
    match RESOURCE_SUFFIX.captures(raw) {
        Some(caps) => {
            let start = caps.get(0).map_or(raw.len(), |m| m.start());
            let resource = caps.name("resource").map(|m| m.as_str().to_string());
            (raw[..start].to_string(), resource)
        }
        None => (raw.to_string(), None),
    }
}
