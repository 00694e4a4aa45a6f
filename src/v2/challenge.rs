//! `WWW-Authenticate` challenge parsing.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, WWW_AUTHENTICATE};
use std::collections::HashMap;

const SCHEME_REGEX: &str = r#"^\s*([!#$%&'*+.^_`|~0-9A-Za-z-]+)(?:\s+|$)"#;

const PARAM_REGEX: &str = r#"(?x)
    \s*,?\s*
    (?P<key>[!\#$%&'*+.^_`|~0-9A-Za-z-]+)
    \s*=\s*
    (?:
        "(?P<quoted>(?:[^"\\]|\\.)*)"
      |
        (?P<token>[^\s,"]*)
    )
    \s*
"#;

static SCHEME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(SCHEME_REGEX).expect("scheme pattern is a valid regex"));
static PARAM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(PARAM_REGEX).expect("parameter pattern is a valid regex"));

/// An authentication challenge advertised by a registry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Challenge {
    /// Lower-cased scheme name, e.g. `basic` or `bearer`.
    pub scheme: String,
    /// Parameters with lower-cased keys, e.g. `realm` and `service`.
    pub parameters: HashMap<String, String>,
}

impl Challenge {
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }
}

/// Parse every `WWW-Authenticate` header in `headers`, in order.
///
/// Values that cannot be parsed are skipped.
pub fn parse_auth_headers(headers: &HeaderMap) -> Vec<Challenge> {
    headers
        .get_all(WWW_AUTHENTICATE)
        .iter()
        .filter_map(|v| match v.to_str() {
            Ok(s) => parse_challenge(s),
            Err(e) => {
                trace!("Skipping non-ASCII authentication header: {}", e);
                None
            }
        })
        .collect()
}

/// Parse a single challenge value such as `Bearer realm="https://auth.example.com/token"`.
pub fn parse_challenge(value: &str) -> Option<Challenge> {
    let caps = match SCHEME_RE.captures(value) {
        Some(c) => c,
        None => {
            trace!("Skipping unparseable authentication header {:?}", value);
            return None;
        }
    };
    let scheme = caps.get(1)?.as_str().to_ascii_lowercase();
    let rest = &value[caps.get(0)?.end()..];

    let mut parameters = HashMap::new();
    let mut consumed = 0;
    for c in PARAM_RE.captures_iter(rest) {
        let whole = c.get(0)?;
        if whole.start() != consumed {
            trace!("Stray input in authentication header {:?}", value);
            break;
        }
        consumed = whole.end();
        let key = c.name("key")?.as_str().to_ascii_lowercase();
        let val = match (c.name("quoted"), c.name("token")) {
            (Some(q), _) => unescape(q.as_str()),
            (None, Some(t)) => t.as_str().to_string(),
            (None, None) => String::new(),
        };
        parameters.insert(key, val);
    }

    Some(Challenge { scheme, parameters })
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(n) = chars.next() {
                    out.push(n);
                }
            }
            c => out.push(c),
        }
    }
    out
}
