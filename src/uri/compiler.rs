//! C1 — the URI compiler: turns a path (and optional domain) template into
//! an ordered constraint list plus matching regexes (spec §4.1).
//!
//! Domain and path are tokenized independently — `.` is the domain's
//! segment delimiter the way `/` is the path's — then concatenated into one
//! constraint list, domain constraints first, each flagged `is_host`. Two
//! regexes come out rather than one combined pattern: `path_regex` (always
//! present) and `host_regex` (present iff a domain template was given).
//! This keeps the "uri" and "host" matchers (spec §4.2) independent checks
//! against independent anchors, which is the natural split in a typed
//! language even though the spec describes a route's regex in the
//! singular — see DESIGN.md.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::uri::constraint::{Constraint, Quantifier};

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)(\(([^()]*)\))?([?+*])?").unwrap()
});

pub struct CompileInput<'a> {
    pub domain: Option<&'a str>,
    pub path: &'a str,
    pub rules: &'a HashMap<String, String>,
    pub defaults: &'a HashMap<String, Value>,
    /// param name -> constraint-level rename (spec §4.1/§4.4 step 5).
    pub binding_aliases: &'a HashMap<String, String>,
    pub strict: bool,
}

pub struct Compiled {
    pub constraints: Vec<Constraint>,
    pub path_regex: Regex,
    pub host_regex: Option<Regex>,
}

pub fn compile(input: CompileInput<'_>) -> Result<Compiled> {
    let mut constraints = Vec::new();

    if let Some(domain) = input.domain {
        constraints.extend(tokenize(
            domain,
            '.',
            true,
            input.rules,
            input.defaults,
            input.binding_aliases,
        )?);
    }
    constraints.extend(tokenize(
        input.path,
        '/',
        false,
        input.rules,
        input.defaults,
        input.binding_aliases,
    )?);

    let path_regex = build_regex(
        constraints.iter().filter(|c| !c.is_host()),
        input.strict,
        false,
    )?;
    let host_regex = if input.domain.is_some() {
        Some(build_regex(
            constraints.iter().filter(|c| c.is_host()),
            true,
            true,
        )?)
    } else {
        None
    };

    Ok(Compiled {
        constraints,
        path_regex,
        host_regex,
    })
}

/// Tokenize one template (domain or path) into constraints. `delimiter` is
/// unused for splitting logic beyond documentation purposes here — the
/// split point between a standalone literal and the following param's
/// `prefix` is cosmetic (see module docs), so every literal run between two
/// tokens is simply folded into the *next* param's prefix, with only a
/// leading/trailing run with no following/preceding param becoming a
/// standalone `Literal` constraint.
fn tokenize(
    template: &str,
    _delimiter: char,
    is_host: bool,
    rules: &HashMap<String, String>,
    defaults: &HashMap<String, Value>,
    binding_aliases: &HashMap<String, String>,
) -> Result<Vec<Constraint>> {
    let mut out = Vec::new();
    let mut last_end = 0usize;

    for caps in TOKEN_RE.captures_iter(template) {
        let whole = caps.get(0).expect("group 0 always present");
        let literal = &template[last_end..whole.start()];

        let name = caps
            .get(1)
            .expect("token regex guarantees group 1")
            .as_str()
            .to_string();
        let explicit_rule = caps.get(3).map(|m| m.as_str().to_string());
        let quantifier = caps
            .get(4)
            .and_then(|m| m.as_str().chars().next())
            .and_then(Quantifier::from_char)
            .unwrap_or(Quantifier::None);

        let rule = explicit_rule
            .or_else(|| rules.get(&name).cloned())
            .unwrap_or_else(|| "[^/]+".to_string());
        let default = defaults.get(&name).cloned();
        let alias = binding_aliases.get(&name).cloned();
        let optional = quantifier.implies_optional();

        out.push(Constraint::Param {
            name,
            prefix: literal.to_string(),
            suffix: String::new(),
            quantifier,
            optional,
            default,
            alias,
            rule,
            is_host,
        });

        last_end = whole.end();
    }

    let trailing = &template[last_end..];
    if !trailing.is_empty() || out.is_empty() {
        out.push(Constraint::Literal {
            text: trailing.to_string(),
            is_host,
        });
    }

    Ok(out)
}

fn build_regex<'a>(
    constraints: impl Iterator<Item = &'a Constraint>,
    strict: bool,
    case_insensitive: bool,
) -> Result<Regex> {
    let mut pattern = String::from("^");

    for c in constraints {
        match c {
            Constraint::Literal { text, .. } => {
                pattern.push_str(&regex::escape(text));
            }
            Constraint::Param {
                prefix,
                suffix,
                rule,
                ..
            } => {
                let segment = format!(
                    "{}({}){}",
                    regex::escape(prefix),
                    rule,
                    regex::escape(suffix)
                );
                if c.is_optional() {
                    pattern.push_str("(?:");
                    pattern.push_str(&segment);
                    pattern.push_str(")?");
                } else {
                    pattern.push_str(&segment);
                }
            }
        }
    }

    if !strict {
        pattern.push_str("/?");
    }
    pattern.push('$');

    regex::RegexBuilder::new(&pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| Error::router(format!("failed to compile route regex {pattern:?}: {e}")))
}
