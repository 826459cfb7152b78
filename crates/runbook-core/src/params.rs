//! Placeholder resolution: merging catalogue defaults with operator overrides,
//! deriving computed parameters, and substituting `{name}` tokens.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Parameter context: name → value.
pub type Params = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Substitution
// ---------------------------------------------------------------------------

static TOKEN_RE: OnceLock<Regex> = OnceLock::new();

fn token_re() -> &'static Regex {
    TOKEN_RE.get_or_init(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").unwrap())
}

/// Replace every `{name}` token whose name is present in `params`.
///
/// Unknown tokens are left verbatim, delimiters included. Substituted values
/// are never re-scanned, so a value containing `{other}` stays literal.
pub fn substitute(text: &str, params: &Params) -> String {
    token_re()
        .replace_all(text, |caps: &Captures| match params.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Substitute a list of templates, preserving count and order.
pub fn substitute_all(templates: &[String], params: &Params) -> Vec<String> {
    templates.iter().map(|t| substitute(t, params)).collect()
}

// ---------------------------------------------------------------------------
// Derived parameters
// ---------------------------------------------------------------------------

/// A parameter computed from another resolved parameter, e.g. the output
/// directory derived from the target domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedParam {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_base")]
    pub base: String,
    #[serde(default = "default_fallback")]
    pub fallback: String,
}

fn default_name() -> String {
    "outdir".to_string()
}

fn default_source() -> String {
    "domain".to_string()
}

fn default_base() -> String {
    "./out".to_string()
}

fn default_fallback() -> String {
    "target".to_string()
}

impl Default for DerivedParam {
    fn default() -> Self {
        Self {
            name: default_name(),
            source: default_source(),
            base: default_base(),
            fallback: default_fallback(),
        }
    }
}

impl DerivedParam {
    /// `<base>/<sanitized source>`, or `<base>/<fallback>` when the source is
    /// empty or absent.
    pub fn derive(&self, params: &Params) -> String {
        let source = params.get(&self.source).map(String::as_str).unwrap_or("");
        let safe = sanitize(source);
        let leaf = if safe.is_empty() {
            self.fallback.as_str()
        } else {
            safe.as_str()
        };
        format!("{}/{}", self.base, leaf)
    }
}

/// Replace every character outside `[A-Za-z0-9.-]` with `_`.
pub fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Merge `overrides` over `base` and compute the default derived `outdir`.
pub fn resolve(base: &Params, overrides: &Params) -> Params {
    resolve_with(base, overrides, &[DerivedParam::default()])
}

/// Merge `overrides` over `base`, then compute each of `derived` in order.
///
/// Blank overrides (empty or whitespace-only) never replace a base value;
/// non-blank overrides are trimmed. Derived parameters always take their
/// computed value, even when an override of the same name was supplied.
pub fn resolve_with(base: &Params, overrides: &Params, derived: &[DerivedParam]) -> Params {
    let mut params = base.clone();
    for (key, value) in overrides {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            params.insert(key.clone(), trimmed.to_string());
        }
    }
    for d in derived {
        let value = d.derive(&params);
        params.insert(d.name.clone(), value);
    }
    params
}

/// Stringify a catalogue default. `null` counts as absent.
pub fn stringify(value: &serde_yaml::Value) -> Option<String> {
    use serde_yaml::Value;
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Tagged(tagged) => stringify(&tagged.value),
        other => serde_json::to_string(other).ok(),
    }
}

/// Parse a `key=value` pair as given on a command line.
pub fn parse_assignment(raw: &str) -> crate::Result<(String, String)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| crate::RunbookError::InvalidParam(raw.to_string()))?;
    let key = key.trim();
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(crate::RunbookError::InvalidParam(raw.to_string()));
    }
    Ok((key.to_string(), value.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitute_replaces_known_tokens() {
        let p = params(&[("domain", "example.com"), ("port", "443")]);
        assert_eq!(
            substitute("nmap -p {port} {domain}", &p),
            "nmap -p 443 example.com"
        );
    }

    #[test]
    fn substitute_preserves_unknown_tokens() {
        assert_eq!(substitute("{missing}", &Params::new()), "{missing}");
        let p = params(&[("a", "1")]);
        assert_eq!(substitute("{a}-{b}", &p), "1-{b}");
    }

    #[test]
    fn substitute_is_identity_without_tokens() {
        let p = params(&[("domain", "example.com")]);
        for text in ["", "plain text", "{ not a token }", "{a-b}", "{}", "awk '{print $1}'"] {
            assert_eq!(substitute(text, &p), text);
        }
    }

    #[test]
    fn substitute_does_not_recurse() {
        let p = params(&[("a", "{b}"), ("b", "deep")]);
        assert_eq!(substitute("{a}", &p), "{b}");
    }

    #[test]
    fn blank_override_keeps_base() {
        let base = params(&[("a", "x")]);
        for blank in ["", "   ", "\t"] {
            let resolved = resolve(&base, &params(&[("a", blank)]));
            assert_eq!(resolved["a"], "x");
        }
    }

    #[test]
    fn override_wins_and_is_trimmed() {
        let base = params(&[("domain", "default.test")]);
        let resolved = resolve(&base, &params(&[("domain", "  example.com ")]));
        assert_eq!(resolved["domain"], "example.com");
        assert_eq!(resolved["outdir"], "./out/example.com");
    }

    #[test]
    fn outdir_sanitizes_and_falls_back() {
        let resolved = resolve(&Params::new(), &params(&[("domain", "a b/c:d")]));
        assert_eq!(resolved["outdir"], "./out/a_b_c_d");

        let resolved = resolve(&Params::new(), &Params::new());
        assert_eq!(resolved["outdir"], "./out/target");
    }

    #[test]
    fn derived_param_replaces_override_of_same_name() {
        let resolved = resolve(
            &Params::new(),
            &params(&[("domain", "x.io"), ("outdir", "/tmp/elsewhere")]),
        );
        assert_eq!(resolved["outdir"], "./out/x.io");
    }

    #[test]
    fn custom_derived_param() {
        let derived = DerivedParam {
            name: "workdir".to_string(),
            source: "host".to_string(),
            base: "/srv/runs".to_string(),
            fallback: "unnamed".to_string(),
        };
        let resolved = resolve_with(
            &Params::new(),
            &params(&[("host", "db-01.local")]),
            &[derived],
        );
        assert_eq!(resolved["workdir"], "/srv/runs/db-01.local");
        assert!(!resolved.contains_key("outdir"));
    }

    #[test]
    fn stringify_scalars() {
        let v: serde_yaml::Value = serde_yaml::from_str("8080").unwrap();
        assert_eq!(stringify(&v).as_deref(), Some("8080"));
        let v: serde_yaml::Value = serde_yaml::from_str("true").unwrap();
        assert_eq!(stringify(&v).as_deref(), Some("true"));
        let v: serde_yaml::Value = serde_yaml::from_str("~").unwrap();
        assert_eq!(stringify(&v), None);
    }

    #[test]
    fn parse_assignment_splits_on_first_equals() {
        let (k, v) = parse_assignment("header=X-Token=abc").unwrap();
        assert_eq!(k, "header");
        assert_eq!(v, "X-Token=abc");
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("bad key=1").is_err());
    }
}
