//! Route level requirements matched by request path.
use std::fmt::Display;
use std::fmt::Formatter;

use portcullis_context::Context;

use super::AccessDenied;
use super::Granularity;
use super::Requirement;

/// Errors parsing route patterns.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    /// Patterns must be absolute paths.
    #[error("route pattern '{0}' must start with '/'")]
    // (pattern,)
    NotAbsolute(String),

    /// The `**` wildcard is only allowed as the last segment.
    #[error("route pattern '{0}' can only use '**' as the last segment")]
    // (pattern,)
    MisplacedRest(String),
}

/// A single segment of a [`PathPattern`].
#[derive(Clone, Debug, Eq, PartialEq)]
enum Segment {
    /// Matches exactly one segment, whatever its value.
    Any,

    /// Matches one segment with the given value.
    Literal(String),

    /// Matches zero or more trailing segments.
    Rest,
}

/// Path matcher for routes, with support for wildcards.
///
/// - `/admin` matches exactly `/admin` (and `/admin/`).
/// - `/*` matches any single segment path, such as `/private`.
/// - `/css/**` matches `/css` and anything below it.
/// - `/**` matches every path.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PathPattern {
    pattern: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Check if a request path matches the pattern.
    pub fn matches(&self, path: &str) -> bool {
        let mut parts = path.split('/').filter(|part| !part.is_empty());
        for segment in &self.segments {
            match segment {
                Segment::Rest => return true,
                Segment::Any => {
                    if parts.next().is_none() {
                        return false;
                    }
                }
                Segment::Literal(literal) => match parts.next() {
                    Some(part) if part == literal => (),
                    _ => return false,
                },
            }
        }
        parts.next().is_none()
    }

    /// Parse a pattern definition.
    pub fn parse<S: Into<String>>(pattern: S) -> Result<PathPattern, PatternError> {
        let pattern = pattern.into();
        if !pattern.starts_with('/') {
            return Err(PatternError::NotAbsolute(pattern));
        }
        let segments: Vec<Segment> = pattern
            .split('/')
            .filter(|part| !part.is_empty())
            .map(|part| match part {
                "*" => Segment::Any,
                "**" => Segment::Rest,
                literal => Segment::Literal(literal.to_string()),
            })
            .collect();
        let rest = segments.iter().position(|segment| *segment == Segment::Rest);
        if let Some(index) = rest {
            if index != segments.len() - 1 {
                return Err(PatternError::MisplacedRest(pattern));
            }
        }
        Ok(PathPattern { pattern, segments })
    }
}

impl Display for PathPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.pattern)
    }
}

/// Requirement that applies to all requests with paths matching a pattern.
#[derive(Clone, Debug)]
pub struct RouteRule {
    /// Paths the rule applies to.
    pub pattern: PathPattern,

    /// Requirement callers must satisfy to access matching paths.
    pub requirement: Requirement,
}

/// Ordered list of route rules where the first matching rule wins.
///
/// Specific routes must be declared before catch-all wildcards.
/// Requests that match no rule are denied.
#[derive(Clone, Debug, Default)]
pub struct RouteRules {
    rules: Vec<RouteRule>,
}

impl RouteRules {
    /// Decide if the [`Context`]'s caller can access a request path.
    ///
    /// Paths that match no rule are denied.
    pub fn authorise(&self, context: &Context, path: &str) -> Result<(), AccessDenied> {
        match self.requirement_for(path) {
            Some(requirement) => super::decide(context, Granularity::Route, path, requirement),
            None => super::decide(context, Granularity::Route, path, &Requirement::DenyAll),
        }
    }

    /// Create an empty set of rules (which denies everything).
    pub fn new() -> RouteRules {
        RouteRules::default()
    }

    /// Find the requirement for a request path.
    pub fn requirement_for(&self, path: &str) -> Option<&Requirement> {
        self.rules
            .iter()
            .find(|rule| rule.pattern.matches(path))
            .map(|rule| &rule.requirement)
    }

    /// Add a rule after all previously declared rules.
    pub fn route<S: Into<String>>(
        mut self,
        pattern: S,
        requirement: Requirement,
    ) -> Result<RouteRules, PatternError> {
        let pattern = PathPattern::parse(pattern)?;
        self.rules.push(RouteRule {
            pattern,
            requirement,
        });
        Ok(self)
    }

    /// Declared rules, in evaluation order.
    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::PathPattern;
    use super::PatternError;
    use super::Requirement;
    use super::RouteRules;

    #[test]
    fn exact_patterns() {
        let pattern = PathPattern::parse("/admin").unwrap();
        assert!(pattern.matches("/admin"));
        assert!(pattern.matches("/admin/"));
        assert!(!pattern.matches("/admin/users"));
        assert!(!pattern.matches("/"));

        let root = PathPattern::parse("/").unwrap();
        assert!(root.matches("/"));
        assert!(!root.matches("/private"));
    }

    #[test]
    fn wildcard_patterns() {
        let single = PathPattern::parse("/*").unwrap();
        assert!(single.matches("/private"));
        assert!(!single.matches("/"));
        assert!(!single.matches("/css/main.css"));

        let rest = PathPattern::parse("/css/**").unwrap();
        assert!(rest.matches("/css"));
        assert!(rest.matches("/css/main.css"));
        assert!(rest.matches("/css/fonts/a.woff"));
        assert!(!rest.matches("/js/main.js"));

        let all = PathPattern::parse("/**").unwrap();
        assert!(all.matches("/"));
        assert!(all.matches("/anything/at/all"));
    }

    #[test]
    fn invalid_patterns() {
        assert!(matches!(
            PathPattern::parse("admin"),
            Err(PatternError::NotAbsolute(_))
        ));
        assert!(matches!(
            PathPattern::parse("/**/admin"),
            Err(PatternError::MisplacedRest(_))
        ));
    }

    #[test]
    fn first_matching_rule_wins() {
        let rules = RouteRules::new()
            .route("/", Requirement::PermitAll)
            .unwrap()
            .route("/admin", Requirement::capability("admin"))
            .unwrap()
            .route("/**", Requirement::Authenticated)
            .unwrap();
        assert!(matches!(
            rules.requirement_for("/admin"),
            Some(Requirement::Capability(_))
        ));
        assert!(matches!(
            rules.requirement_for("/private"),
            Some(Requirement::Authenticated)
        ));
        assert!(matches!(
            rules.requirement_for("/"),
            Some(Requirement::PermitAll)
        ));
        assert_eq!(rules.rules().len(), 3);
    }

    #[test]
    fn unmatched_paths_have_no_requirement() {
        let rules = RouteRules::new()
            .route("/", Requirement::PermitAll)
            .unwrap();
        assert!(rules.requirement_for("/private").is_none());
    }
}
