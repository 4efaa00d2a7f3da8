use regex::RegexBuilder;

use crate::clause::{DeonticClause, ANY};
use crate::gate::GateRequest;

/// Decides whether a clause applies to a request.
pub trait ClauseMatcher: Send + Sync {
    fn matches(&self, clause: &DeonticClause, request: &GateRequest) -> bool;
}

/// Case-insensitive `*`/`?` glob matching over actor, action and resource.
///
/// The action matches the requested tool either as a whole (spaces and
/// underscores are interchangeable) or by the leading verb of a
/// multi-word action phrase. A clause scoped to a resource only applies to requests
/// naming a matching resource. Time windows are honored.
#[derive(Clone, Copy, Debug, Default)]
pub struct GlobClauseMatcher;

impl ClauseMatcher for GlobClauseMatcher {
    fn matches(&self, clause: &DeonticClause, request: &GateRequest) -> bool {
        if !clause.active_at(request.at) {
            return false;
        }
        if !glob_match(&clause.actor, &request.actor) {
            return false;
        }
        if !action_matches(&clause.action, &request.tool) {
            return false;
        }
        match (&clause.resource, &request.resource) {
            (None, _) => true,
            (Some(pattern), Some(resource)) => glob_match(pattern, resource),
            (Some(_), None) => false,
        }
    }
}

fn action_matches(action: &str, tool: &str) -> bool {
    if glob_match(action, tool) {
        return true;
    }
    let underscored = action.split_whitespace().collect::<Vec<_>>().join("_");
    if glob_match(&underscored, tool) {
        return true;
    }
    let mut words = action.split_whitespace();
    match (words.next(), words.next()) {
        (Some(verb), Some(_)) => glob_match(verb, tool),
        _ => false,
    }
}

/// Case-insensitive glob with `*` (any run) and `?` (one character).
pub fn glob_match(pattern: &str, text: &str) -> bool {
    if pattern == ANY {
        return true;
    }
    if !pattern.contains(['*', '?']) {
        return pattern.to_lowercase() == text.to_lowercase();
    }
    let translated = regex::escape(pattern)
        .replace(r"\*", ".*")
        .replace(r"\?", ".");
    RegexBuilder::new(&format!("^{}$", translated))
        .case_insensitive(true)
        .build()
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn globs() {
        assert!(glob_match("*", "anything"));
        assert!(glob_match("delete_*", "DELETE_records"));
        assert!(glob_match("b?b", "bob"));
        assert!(!glob_match("b?b", "bobby"));
        assert!(glob_match("Bob", "bob"));
        assert!(!glob_match("bob", "alice"));
        assert!(glob_match("a.b", "a.b"));
        assert!(!glob_match("a.b", "axb"));
    }

    #[test]
    fn action_forms() {
        assert!(action_matches("delete records", "delete_records"));
        assert!(action_matches("delete records", "delete"));
        assert!(action_matches("deploy", "deploy"));
        assert!(!action_matches("deploy", "deploy_prod"));
        assert!(action_matches("deploy*", "deploy_prod"));
    }

    #[test]
    fn only_the_leading_verb_stands_for_a_phrase() {
        assert!(action_matches("read the secrets", "read"));
        assert!(action_matches("read the secrets", "read_the_secrets"));
        assert!(!action_matches("read the secrets", "the"));
        assert!(!action_matches("read the secrets", "secrets"));
    }

    #[test]
    fn resource_and_window() {
        let matcher = GlobClauseMatcher;
        let clause = DeonticClause::prohibition("bob", "deploy").with_resource("prod-*");
        let request = GateRequest::new("bob", "deploy");
        assert!(!matcher.matches(&clause, &request));
        assert!(matcher.matches(&clause, &request.clone().resource("prod-eu")));
        assert!(!matcher.matches(&clause, &request.clone().resource("staging")));

        let end = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let expired = DeonticClause::prohibition("bob", "deploy").with_window(None, Some(end));
        let later = GateRequest::new("bob", "deploy")
            .at(Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap());
        assert!(!matcher.matches(&expired, &later));
    }
}
