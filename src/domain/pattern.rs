// Lazily compiled static regex patterns
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum PatternError {
    #[error("Regex compilation failed for pattern '{pattern}' (name: {name}): {source}")]
    CompilationFailed {
        pattern: &'static str,
        name: &'static str,
        #[source]
        source: regex::Error,
    },
}

/// A single regex compiled on first use.
///
/// Compilation errors are cached alongside successes so a bad pattern is
/// reported on every call instead of panicking once.
pub struct StaticPattern {
    pattern: &'static str,
    name: &'static str,
    compiled: OnceLock<Result<Regex, PatternError>>,
}

impl StaticPattern {
    pub const fn new(pattern: &'static str, name: &'static str) -> Self {
        Self {
            pattern,
            name,
            compiled: OnceLock::new(),
        }
    }

    pub fn get(&self) -> Result<&Regex, PatternError> {
        self.compiled
            .get_or_init(|| {
                Regex::new(self.pattern).map_err(|source| PatternError::CompilationFailed {
                    pattern: self.pattern,
                    name: self.name,
                    source,
                })
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Event names and property keys.
pub static IDENTIFIER: StaticPattern =
    StaticPattern::new(r"^[a-zA-Z#][A-Za-z0-9_]{0,49}$", "identifier");

/// ISO-8601 timestamps with sub-second precision and a zone suffix.
///
/// ASCII digits only; the fraction may have any length.
pub static ZONED_TIMESTAMP: StaticPattern = StaticPattern::new(
    r"([0-9]{4}-[0-9]{2}-[0-9]{2})T([0-9]{2}:[0-9]{2}:[0-9]{2})\.([0-9]+)(?:Z|[+-][0-9]{2}:[0-9]{2})",
    "zoned_timestamp",
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_patterns_compile() {
        assert!(IDENTIFIER.get().is_ok());
        assert!(ZONED_TIMESTAMP.get().is_ok());
    }

    #[test]
    fn zoned_timestamp_requires_ascii_digits() {
        let pattern = ZONED_TIMESTAMP.get().unwrap();
        assert!(pattern.is_match("2021-02-15T10:00:00.1Z"));
        assert!(!pattern.is_match("２０２１-０２-１５T１０:００:００.１２３Z"));
        assert!(!pattern.is_match("٢٠٢١-٠٢-١٥T١٠:٠٠:٠٠.١٢٣Z"));
    }

    #[test]
    fn invalid_pattern_reports_error_every_time() {
        static BROKEN: StaticPattern = StaticPattern::new("(unclosed", "broken");

        for _ in 0..2 {
            match BROKEN.get() {
                Err(PatternError::CompilationFailed { name, .. }) => assert_eq!(name, "broken"),
                Ok(_) => panic!("pattern should not compile"),
            }
        }
    }
}
