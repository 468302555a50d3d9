//! Attack signature filtering.
//!
//! # Responsibilities
//! - Match common injection payloads (SQL, script, path traversal, shell)
//! - Inspect decoded path and query, selected headers, and the body
//!
//! # Design Decisions
//! - All signatures compile into one `RegexSet`, one pass per location
//! - Percent-decoding happens before matching so encoded payloads are caught

use std::borrow::Cow;

use regex::RegexSet;

use crate::admission::{AdmissionError, RequestFacts};

/// Built-in signatures as `(family, pattern)`.
const SIGNATURES: &[(&str, &str)] = &[
    ("sql_injection", r"(?i)\bunion\b[\s\S]{0,100}?\bselect\b"),
    ("sql_injection", r#"(?i)['"]\s*(or|and)\s+['"]?\w+['"]?\s*=\s*['"]?\w+"#),
    ("sql_injection", r"(?i)['`;]\s*(drop|truncate|alter)\s+table\b"),
    ("sql_injection", r"(?i)\b(pg_sleep|sleep|benchmark|waitfor\s+delay)\s*\("),
    ("xss", r"(?i)<\s*script\b"),
    ("xss", r"(?i)\bjavascript\s*:"),
    ("xss", r"(?i)\bon(error|load|click|mouseover|focus|submit)\s*="),
    ("xss", r"(?i)<\s*(iframe|object|embed)\b"),
    ("path_traversal", r"\.\.[/\\]"),
    ("path_traversal", r"(?i)(/etc/(passwd|shadow)|\bwin\.ini\b|\bboot\.ini\b)"),
    ("command_injection", r"(?i)(?:[;&|`]|\$\()\s*(?:cat|ls|wget|curl|nc|bash|sh|rm|whoami|id|uname)\b\s*(?:[-/$]|$)"),
];

/// A signature hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShieldMatch {
    pub location: &'static str,
    pub family: String,
}

pub struct Shield {
    set: RegexSet,
    families: Vec<String>,
}

impl Shield {
    /// Compile the built-in signatures plus any configured extras.
    pub fn new(extra_patterns: &[String]) -> Result<Self, AdmissionError> {
        let mut patterns: Vec<String> = SIGNATURES.iter().map(|(_, p)| p.to_string()).collect();
        let mut families: Vec<String> = SIGNATURES.iter().map(|(f, _)| f.to_string()).collect();

        for extra in extra_patterns {
            patterns.push(format!("(?i){}", extra));
            families.push("custom".to_string());
        }

        let set = RegexSet::new(&patterns).map_err(|e| AdmissionError::Policy(e.to_string()))?;
        Ok(Self { set, families })
    }

    /// First signature found in the request, if any.
    pub fn inspect(&self, facts: &RequestFacts) -> Option<ShieldMatch> {
        let mut locations: Vec<(&'static str, Cow<'_, str>)> = vec![("path", decode(&facts.path))];
        if let Some(query) = &facts.query {
            locations.push(("query", decode(query)));
        }
        for (name, value) in [
            ("user-agent", &facts.user_agent),
            ("referer", &facts.referer),
            ("cookie", &facts.cookie),
        ] {
            if let Some(value) = value {
                locations.push((name, Cow::Borrowed(value.as_str())));
            }
        }
        if let Some(body) = &facts.body {
            if !body.is_empty() {
                locations.push(("body", String::from_utf8_lossy(body)));
            }
        }

        locations.into_iter().find_map(|(location, text)| {
            self.set.matches(&text).iter().next().map(|index| ShieldMatch {
                location,
                family: self.families[index].clone(),
            })
        })
    }
}

impl std::fmt::Debug for Shield {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shield")
            .field("signatures", &self.set.len())
            .finish()
    }
}

/// Percent-decode, treating `+` as a space as browsers do in query strings.
fn decode(raw: &str) -> Cow<'_, str> {
    if !raw.contains('%') && !raw.contains('+') {
        return Cow::Borrowed(raw);
    }
    let spaced = raw.replace('+', " ");
    Cow::Owned(String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;

    fn facts() -> RequestFacts {
        RequestFacts {
            path: "/api/products".into(),
            user_agent: Some("Mozilla/5.0 (X11; Linux x86_64) Firefox/128.0".into()),
            ..Default::default()
        }
    }

    fn shield() -> Shield {
        Shield::new(&[]).unwrap()
    }

    #[test]
    fn test_clean_requests_pass() {
        let mut f = facts();
        f.query = Some("page=2&sort=price".into());
        f.body = Some(Bytes::from_static(
            br#"{"name":"Tom & Jerry mug","price":"12.50","image":"https://cdn.example.com/a.png"}"#,
        ));
        assert_eq!(shield().inspect(&f), None);
    }

    #[test]
    fn test_detects_encoded_sql_injection_in_query() {
        let mut f = facts();
        f.query = Some("id=1%27%20OR%20%271%27%3D%271".into());
        let hit = shield().inspect(&f).unwrap();
        assert_eq!(hit.location, "query");
        assert_eq!(hit.family, "sql_injection");

        f.query = Some("q=1+UNION+SELECT+password+FROM+users".into());
        assert_eq!(shield().inspect(&f).unwrap().family, "sql_injection");
    }

    #[test]
    fn test_detects_script_in_body() {
        let mut f = facts();
        f.body = Some(Bytes::from_static(br#"{"name":"<script>alert(1)</script>"}"#));
        let hit = shield().inspect(&f).unwrap();
        assert_eq!(hit.location, "body");
        assert_eq!(hit.family, "xss");
    }

    #[test]
    fn test_detects_traversal_and_shell() {
        let mut f = facts();
        f.path = "/api/products/..%2F..%2Fetc%2Fpasswd".into();
        assert_eq!(shield().inspect(&f).unwrap().family, "path_traversal");

        let mut f = facts();
        f.body = Some(Bytes::from_static(br#"{"image":"x; cat /etc/hosts"}"#));
        assert_eq!(shield().inspect(&f).unwrap().family, "command_injection");
    }

    #[test]
    fn test_extra_patterns() {
        let shield = Shield::new(&["evil-token".to_string()]).unwrap();
        let mut f = facts();
        f.cookie = Some("session=EVIL-TOKEN".into());
        let hit = shield.inspect(&f).unwrap();
        assert_eq!(hit.location, "cookie");
        assert_eq!(hit.family, "custom");

        assert!(Shield::new(&["(".to_string()]).is_err());
    }
}
