//! Lenient parsing of raw string parameters.
//!
//! Every parser returns `None` for input it cannot use, and [`Resolver`]
//! turns that into a fall back to the next layer:
//! raw request value, then `DEFAULT_<PARAM>` environment value, then the
//! hard-coded default. Callers are never told a fallback happened.

use std::collections::{BTreeMap, BTreeSet};

use http::{HeaderName, HeaderValue};

/// Parse a boolean spelled `true`/`1`/`yes` or `false`/`0`/`no` (any case).
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Parse a non-negative decimal integer.
pub fn parse_int(value: &str) -> Option<u64> {
    value.trim().parse().ok()
}

/// Split a comma-separated list into trimmed, non-empty tokens, keeping order.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `key1:value1;key2:value2` into a header mapping.
///
/// Names are lowercased. Pairs without a colon, or whose name or value is
/// not a valid HTTP header, are dropped; a repeated name keeps the last value.
pub fn parse_headers(value: &str) -> BTreeMap<String, String> {
    value
        .split(';')
        .filter_map(|pair| pair.split_once(':'))
        .filter_map(|(name, value)| {
            let name = HeaderName::from_bytes(name.trim().as_bytes()).ok()?;
            let value = value.trim();
            HeaderValue::from_str(value).ok()?;
            Some((name.as_str().to_string(), value.to_string()))
        })
        .collect()
}

/// Environment variable that carries the default for a parameter,
/// e.g. `full-content` -> `DEFAULT_FULL_CONTENT`.
pub fn env_key(param: &str) -> String {
    format!("DEFAULT_{}", param.to_ascii_uppercase().replace('-', "_"))
}

/// Resolves one parameter at a time across the raw/env/default layers.
pub(crate) struct Resolver<'a> {
    raw: &'a BTreeMap<String, String>,
    env: &'a BTreeMap<String, String>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(raw: &'a BTreeMap<String, String>, env: &'a BTreeMap<String, String>) -> Self {
        Self { raw, env }
    }

    fn layers(&self, param: &str) -> [Option<&'a str>; 2] {
        [self.raw.get(param).map(String::as_str), self.env.get(&env_key(param)).map(String::as_str)]
    }

    /// First layer whose value `parse` accepts.
    fn first<T>(&self, param: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
        self.layers(param).into_iter().flatten().find_map(parse)
    }

    pub(crate) fn bool(&self, param: &str, default: bool) -> bool {
        self.first(param, parse_bool).unwrap_or(default)
    }

    pub(crate) fn int(&self, param: &str, default: u64) -> u64 {
        self.first(param, parse_int).unwrap_or(default)
    }

    pub(crate) fn optional_u32(&self, param: &str) -> Option<u32> {
        self.first(param, |v| parse_int(v).and_then(|n| u32::try_from(n).ok()))
    }

    pub(crate) fn string(&self, param: &str, default: &str) -> String {
        self.first(param, non_empty).unwrap_or_else(|| default.to_string())
    }

    pub(crate) fn list(&self, param: &str) -> Vec<String> {
        self.first(param, |v| Some(parse_list(v)).filter(|l| !l.is_empty()))
            .unwrap_or_default()
    }

    pub(crate) fn set(&self, param: &str) -> BTreeSet<String> {
        self.list(param)
            .into_iter()
            .map(|token| token.to_ascii_lowercase())
            .collect()
    }

    pub(crate) fn headers(&self, param: &str) -> BTreeMap<String, String> {
        self.first(param, |v| Some(parse_headers(v)).filter(|h| !h.is_empty()))
            .unwrap_or_default()
    }

    pub(crate) fn parsed<T>(&self, param: &str, parse: impl Fn(&str) -> Option<T>, default: T) -> T {
        self.first(param, parse).unwrap_or(default)
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_parse_bool_spellings() {
        for truthy in ["true", "TRUE", "1", "yes", "Yes", " true "] {
            assert_eq!(parse_bool(truthy), Some(true), "{truthy}");
        }
        for falsy in ["false", "False", "0", "no", "NO"] {
            assert_eq!(parse_bool(falsy), Some(false), "{falsy}");
        }
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("60000"), Some(60_000));
        assert_eq!(parse_int(" 42 "), Some(42));
        assert_eq!(parse_int("abc"), None);
        assert_eq!(parse_int("-5"), None);
        assert_eq!(parse_int(""), None);
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list("a.js, b.js,,  c.js "), vec!["a.js", "b.js", "c.js"]);
        assert!(parse_list("").is_empty());
        assert!(parse_list(" , ,").is_empty());
    }

    #[test]
    fn test_parse_headers() {
        let headers = parse_headers("X-One: 1; X-Two:two:parts;broken;:novalue");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["x-one"], "1");
        assert_eq!(headers["x-two"], "two:parts");
    }

    #[test]
    fn test_parse_headers_drops_invalid_pairs() {
        let headers = parse_headers("Bad Name:x;X-Ok:1;X-Nl:a\u{7f}b");
        assert_eq!(headers, BTreeMap::from([("x-ok".to_string(), "1".to_string())]));
    }

    #[test]
    fn test_parse_headers_case_insensitive_names() {
        assert_eq!(parse_headers("X-A:1"), parse_headers("x-a:1"));
        assert_eq!(parse_headers("X-A:1;x-a:2").len(), 1);
    }

    #[test]
    fn test_env_key() {
        assert_eq!(env_key("full-content"), "DEFAULT_FULL_CONTENT");
        assert_eq!(env_key("cache"), "DEFAULT_CACHE");
    }

    #[test]
    fn test_resolver_precedence() {
        let raw = map(&[("cache", "yes")]);
        let env = map(&[("DEFAULT_CACHE", "false"), ("DEFAULT_SLEEP", "250")]);
        let resolver = Resolver::new(&raw, &env);

        assert!(resolver.bool("cache", false));
        assert_eq!(resolver.int("sleep", 0), 250);
        assert_eq!(resolver.int("scroll-down", 7), 7);
    }

    #[test]
    fn test_resolver_unparsable_raw_falls_back_to_env() {
        let raw = map(&[("timeout", "soon"), ("incognito", "perhaps")]);
        let env = map(&[("DEFAULT_TIMEOUT", "1000")]);
        let resolver = Resolver::new(&raw, &env);

        assert_eq!(resolver.int("timeout", 60_000), 1000);
        assert!(resolver.bool("incognito", true));
    }

    #[test]
    fn test_resolver_set_is_order_independent() {
        let a = map(&[("resource", "script,Image,document")]);
        let b = map(&[("resource", "document,image,script,script")]);
        let env = BTreeMap::new();
        assert_eq!(Resolver::new(&a, &env).set("resource"), Resolver::new(&b, &env).set("resource"));
    }
}
