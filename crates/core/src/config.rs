//! Environment variable helpers shared by the service configurations.

use std::str::FromStr;

use crate::error::CoreError;

/// Read `var`, falling back to `default` when it is unset.
pub fn env_or(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

/// Read and parse `var`, falling back to `default` when it is unset.
///
/// A value that is present but does not parse is a configuration error, not a
/// silent fallback.
pub fn env_parse<T>(var: &'static str, default: T) -> Result<T, CoreError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| CoreError::Config {
            var,
            message: format!("cannot parse {raw:?}: {e}"),
        }),
        Err(_) => Ok(default),
    }
}

/// Split a comma-separated list, dropping empty entries.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_list_trims_and_drops_empty_entries() {
        assert_eq!(
            split_list(" http://a.test, ,http://b.test,"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn env_parse_uses_default_when_unset() {
        let value: u16 = env_parse("TANKRELAY_TEST_SURELY_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }
}
