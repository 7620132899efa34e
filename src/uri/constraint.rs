//! The constraint model compiled out of a path/domain template (spec §3).

use serde_json::Value;

/// Trailing modifier on a `:name` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    /// No modifier — the segment is required, exactly one value.
    None,
    /// `?` — zero or one.
    Optional,
    /// `+` — one or more.
    Plus,
    /// `*` — zero or more.
    Star,
}

impl Quantifier {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '?' => Some(Quantifier::Optional),
            '+' => Some(Quantifier::Plus),
            '*' => Some(Quantifier::Star),
            _ => None,
        }
    }

    /// §3 invariant: quantifier `?` or `*` implies optionality on its own.
    pub fn implies_optional(&self) -> bool {
        matches!(self, Quantifier::Optional | Quantifier::Star)
    }
}

/// One element of the compiled, left-to-right constraint list (spec §3/§4.1).
#[derive(Debug, Clone)]
pub enum Constraint {
    /// A literal run of text, e.g. `/users/` or `.example.com`.
    Literal { text: String, is_host: bool },
    /// A `:name` parameter token, with whatever glued literal text
    /// surrounds it inside its segment.
    Param {
        name: String,
        prefix: String,
        suffix: String,
        quantifier: Quantifier,
        optional: bool,
        default: Option<Value>,
        /// Constraint-level rename: when set, the bound value is stored
        /// under both `name` and this alias (spec §4.1/§4.4 step 5).
        alias: Option<String>,
        /// Effective regex fragment for this parameter: an explicit
        /// `(rule)` suffix, else `rules[name]`, else `[^/]+`.
        rule: String,
        is_host: bool,
    },
}

impl Constraint {
    pub fn is_host(&self) -> bool {
        match self {
            Constraint::Literal { is_host, .. } => *is_host,
            Constraint::Param { is_host, .. } => *is_host,
        }
    }

    pub fn param_name(&self) -> Option<&str> {
        match self {
            Constraint::Param { name, .. } => Some(name),
            Constraint::Literal { .. } => None,
        }
    }

    /// §8 property 5: optional iff `optional=true`, a quantifier in
    /// `{?,*}`, or a default is present.
    pub fn is_optional(&self) -> bool {
        match self {
            Constraint::Literal { .. } => false,
            Constraint::Param {
                optional,
                quantifier,
                default,
                ..
            } => *optional || quantifier.implies_optional() || default.is_some(),
        }
    }
}
