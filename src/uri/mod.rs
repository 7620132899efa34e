//! URI Compiler (C1, spec §4.1): parses a path (and optional domain)
//! template into an ordered constraint list and the regexes used to match
//! and later reconstruct a URI.

mod compiler;
mod constraint;

pub use compiler::{compile, CompileInput, Compiled};
pub use constraint::{Constraint, Quantifier};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn compile_path(path: &str) -> Compiled {
        compile(CompileInput {
            domain: None,
            path,
            rules: &HashMap::new(),
            defaults: &HashMap::new(),
            binding_aliases: &HashMap::new(),
            strict: false,
        })
        .unwrap()
    }

    #[test]
    fn compiles_literal_path() {
        let c = compile_path("/users");
        assert!(c.path_regex.is_match("/users"));
        assert!(c.path_regex.is_match("/users/"));
        assert!(!c.path_regex.is_match("/users/42"));
    }

    #[test]
    fn compiles_required_param() {
        let c = compile_path("/users/:id");
        assert!(c.path_regex.is_match("/users/42"));
        assert!(!c.path_regex.is_match("/users/"));
        let caps = c.path_regex.captures("/users/42").unwrap();
        assert_eq!(&caps[1], "42");
    }

    #[test]
    fn compiles_optional_param_with_quantifier() {
        let c = compile_path("/posts/:slug?");
        assert!(c.path_regex.is_match("/posts"));
        assert!(c.path_regex.is_match("/posts/hello-world"));
        let names: Vec<_> = c
            .constraints
            .iter()
            .filter_map(|c| c.param_name())
            .collect();
        assert_eq!(names, vec!["slug"]);
        assert!(c.constraints[c.constraints.len() - 1].is_optional());
    }

    #[test]
    fn explicit_rule_wins_over_route_rule() {
        let mut rules = HashMap::new();
        rules.insert("id".to_string(), "[a-z]+".to_string());
        let compiled = compile(CompileInput {
            domain: None,
            path: "/users/:id(\\d+)",
            rules: &rules,
            defaults: &HashMap::new(),
            binding_aliases: &HashMap::new(),
            strict: false,
        })
        .unwrap();
        assert!(compiled.path_regex.is_match("/users/42"));
        assert!(!compiled.path_regex.is_match("/users/abc"));
    }

    #[test]
    fn route_level_rule_applies_without_explicit_rule() {
        let mut rules = HashMap::new();
        rules.insert("id".to_string(), "\\d+".to_string());
        let compiled = compile(CompileInput {
            domain: None,
            path: "/users/:id",
            rules: &rules,
            defaults: &HashMap::new(),
            binding_aliases: &HashMap::new(),
            strict: false,
        })
        .unwrap();
        assert!(!compiled.path_regex.is_match("/users/abc"));
    }

    #[test]
    fn strict_mode_rejects_trailing_slash() {
        let compiled = compile(CompileInput {
            domain: None,
            path: "/users",
            rules: &HashMap::new(),
            defaults: &HashMap::new(),
            binding_aliases: &HashMap::new(),
            strict: true,
        })
        .unwrap();
        assert!(compiled.path_regex.is_match("/users"));
        assert!(!compiled.path_regex.is_match("/users/"));
    }

    #[test]
    fn domain_constraints_are_flagged_host() {
        let compiled = compile(CompileInput {
            domain: Some(":sub.example.com"),
            path: "/",
            rules: &HashMap::new(),
            defaults: &HashMap::new(),
            binding_aliases: &HashMap::new(),
            strict: false,
        })
        .unwrap();
        let host_regex = compiled.host_regex.as_ref().unwrap();
        assert!(host_regex.is_match("tenant.example.com"));
        assert!(compiled.constraints[0].is_host());
        assert!(compiled
            .constraints
            .iter()
            .find(|c| c.param_name() == Some("sub"))
            .unwrap()
            .is_host());
    }

    #[test]
    fn default_makes_param_optional_even_without_quantifier() {
        let mut defaults = HashMap::new();
        defaults.insert("page".to_string(), serde_json::json!(1));
        let compiled = compile(CompileInput {
            domain: None,
            path: "/items/:page",
            rules: &HashMap::new(),
            defaults: &defaults,
            binding_aliases: &HashMap::new(),
            strict: false,
        })
        .unwrap();
        assert!(compiled.path_regex.is_match("/items"));
        let param = compiled
            .constraints
            .iter()
            .find(|c| c.param_name() == Some("page"))
            .unwrap();
        assert!(param.is_optional());
    }
}
