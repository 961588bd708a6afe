//! A deliberately small subset of the engine's policy language, enough
//! for tests to register real modules and evaluate them against input.
//!
//! Supported statements, one per line:
//! - `package a.b.c`
//! - `import input.a.b` (the last segment becomes the alias)
//! - `import data.a.b` (accepted, unused by evaluation)
//! - `default <rule> = <json literal>` (`:=` also accepted)
//! - `<rule> { <term> == <json literal> }` where `<term>` is an import
//!   alias or a dotted `input.` reference
//! - blank lines and `#` comments
//!
//! Anything else fails compilation with the offending row, which is what
//! the error-path tests need from the policy endpoint.

use std::collections::HashMap;

use serde_json::Value;

/// A compile failure with the position and text of the offending line.
#[derive(Debug, Clone)]
pub struct CompileError {
    pub message: String,
    pub row: usize,
    pub col: usize,
    pub text: String,
}

impl CompileError {
    fn new(row: usize, raw: &str, message: String) -> Self {
        let col = raw.len() - raw.trim_start().len() + 1;
        Self { message, row, col, text: raw.trim().to_string() }
    }
}

/// A compiled policy module: its package path and named rules.
#[derive(Debug, Clone)]
pub struct Module {
    package: Vec<String>,
    rules: Vec<Rule>,
}

#[derive(Debug, Clone)]
struct Rule {
    name: String,
    default_value: Option<Value>,
    condition: Option<Condition>,
}

#[derive(Debug, Clone)]
struct Condition {
    input_path: Vec<String>,
    expected: Value,
}

impl Module {
    /// Evaluates the rule addressed by `path` (package segments plus rule
    /// name) against `input`. A satisfied body yields `true`; otherwise
    /// the rule's default applies; an undefined rule yields `None`.
    pub fn eval_rule(&self, path: &[String], input: &Value) -> Option<Value> {
        let (name, package) = path.split_last()?;
        if package != self.package.as_slice() {
            return None;
        }
        let rule = self.rules.iter().find(|r| &r.name == name)?;
        if let Some(cond) = &rule.condition {
            let actual = cond
                .input_path
                .iter()
                .try_fold(input, |node, seg| node.get(seg.as_str()));
            if actual == Some(&cond.expected) {
                return Some(Value::Bool(true));
            }
        }
        rule.default_value.clone()
    }
}

/// Compiles policy source into a [`Module`].
pub fn compile(src: &str) -> Result<Module, CompileError> {
    let mut package: Option<Vec<String>> = None;
    let mut imports: HashMap<String, Vec<String>> = HashMap::new();
    let mut rules: Vec<Rule> = Vec::new();

    for (idx, raw) in src.lines().enumerate() {
        let row = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(rest) = line.strip_prefix("package ") {
            let name = rest.trim();
            let segments = parse_ref(name)
                .ok_or_else(|| CompileError::new(row, raw, format!("invalid package name `{name}`")))?;
            if package.replace(segments).is_some() {
                return Err(CompileError::new(row, raw, "duplicate package declaration".to_string()));
            }
            continue;
        }

        if package.is_none() {
            return Err(CompileError::new(row, raw, "package expected".to_string()));
        }

        if let Some(rest) = line.strip_prefix("import ") {
            let reference = rest.trim();
            let segments = parse_ref(reference)
                .ok_or_else(|| CompileError::new(row, raw, format!("invalid import `{reference}`")))?;
            match segments.first().map(String::as_str) {
                Some("input") if segments.len() > 1 => {
                    imports.insert(segments[segments.len() - 1].clone(), segments[1..].to_vec());
                }
                Some("data") => {}
                _ => {
                    return Err(CompileError::new(row, raw, format!("invalid import `{reference}`")));
                }
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("default ") {
            let assign = rest.replacen(":=", "=", 1);
            let Some((name, literal)) = assign.split_once('=') else {
                return Err(CompileError::new(row, raw, "invalid default declaration".to_string()));
            };
            let (name, literal) = (name.trim(), literal.trim());
            if !is_ident(name) {
                return Err(CompileError::new(row, raw, format!("invalid rule name `{name}`")));
            }
            let value = parse_literal(literal)
                .ok_or_else(|| CompileError::new(row, raw, format!("invalid literal `{literal}`")))?;
            rule_entry(&mut rules, name).default_value = Some(value);
            continue;
        }

        if let Some((name, rest)) = line.split_once('{') {
            let name = name.trim();
            let Some(body) = rest.trim().strip_suffix('}') else {
                return Err(CompileError::new(row, raw, "expected `}` closing the rule body".to_string()));
            };
            if !is_ident(name) {
                return Err(CompileError::new(row, raw, format!("invalid rule name `{name}`")));
            }
            let Some((term, literal)) = body.split_once("==") else {
                return Err(CompileError::new(
                    row,
                    raw,
                    format!("unsupported rule body `{}`", body.trim()),
                ));
            };
            let (term, literal) = (term.trim(), literal.trim());
            let input_path = if let Some(dotted) = term.strip_prefix("input.") {
                parse_ref(dotted)
                    .ok_or_else(|| CompileError::new(row, raw, format!("invalid reference `{term}`")))?
            } else if let Some(path) = imports.get(term) {
                path.clone()
            } else {
                return Err(CompileError::new(row, raw, format!("var {term} is unsafe")));
            };
            let expected = parse_literal(literal)
                .ok_or_else(|| CompileError::new(row, raw, format!("invalid literal `{literal}`")))?;
            rule_entry(&mut rules, name).condition = Some(Condition { input_path, expected });
            continue;
        }

        return Err(CompileError::new(row, raw, format!("unexpected statement `{line}`")));
    }

    match package {
        Some(package) => Ok(Module { package, rules }),
        None => Err(CompileError::new(
            src.lines().count().max(1),
            "",
            "package expected".to_string(),
        )),
    }
}

fn rule_entry<'a>(rules: &'a mut Vec<Rule>, name: &str) -> &'a mut Rule {
    let index = match rules.iter().position(|r| r.name == name) {
        Some(i) => i,
        None => {
            rules.push(Rule {
                name: name.to_string(),
                default_value: None,
                condition: None,
            });
            rules.len() - 1
        }
    };
    &mut rules[index]
}

fn parse_ref(s: &str) -> Option<Vec<String>> {
    let segments: Vec<&str> = s.split('.').collect();
    if segments.is_empty() || !segments.iter().all(|seg| is_ident(seg)) {
        return None;
    }
    Some(segments.into_iter().map(str::to_string).collect())
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_literal(s: &str) -> Option<Value> {
    serde_json::from_str(s).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const EXAMPLE: &str = "
package opa.examples

import input.example.flag

default allow_request = false
allow_request { flag == true }
";

    fn path(segs: &[&str]) -> Vec<String> {
        segs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn compiles_package_imports_and_rules() {
        let module = compile(EXAMPLE).unwrap();
        assert_eq!(module.package, path(&["opa", "examples"]));
        assert_eq!(module.rules.len(), 1);
    }

    #[test]
    fn import_only_module_compiles() {
        let module = compile("package opa.examples\n\nimport data.servers\nimport data.networks\n").unwrap();
        assert!(module.rules.is_empty());
    }

    #[test]
    fn missing_package_reports_offending_row() {
        let err = compile("\npotato\n").unwrap_err();
        assert_eq!(err.message, "package expected");
        assert_eq!(err.row, 2);
        assert_eq!(err.text, "potato");
    }

    #[test]
    fn unexpected_statement_reports_offending_row() {
        let err = compile("package x\n\nnot a statement\n").unwrap_err();
        assert_eq!(err.row, 3);
        assert!(err.message.contains("unexpected statement"));
    }

    #[test]
    fn unresolved_term_is_unsafe() {
        let err = compile("package x\n\nallow { flag == true }\n").unwrap_err();
        assert!(err.message.contains("var flag is unsafe"));
    }

    #[test]
    fn satisfied_body_yields_true() {
        let module = compile(EXAMPLE).unwrap();
        let input = json!({"example": {"flag": true}});
        let result = module.eval_rule(&path(&["opa", "examples", "allow_request"]), &input);
        assert_eq!(result, Some(Value::Bool(true)));
    }

    #[test]
    fn failed_body_falls_back_to_default() {
        let module = compile(EXAMPLE).unwrap();
        let input = json!({"example": {"flag": false}});
        let result = module.eval_rule(&path(&["opa", "examples", "allow_request"]), &input);
        assert_eq!(result, Some(Value::Bool(false)));
    }

    #[test]
    fn rule_without_default_is_undefined_on_failure() {
        let module = compile("package x\n\nallow { input.flag == true }\n").unwrap();
        assert_eq!(module.eval_rule(&path(&["x", "allow"]), &Value::Null), None);
    }

    #[test]
    fn other_paths_are_undefined() {
        let module = compile(EXAMPLE).unwrap();
        let input = json!({"example": {"flag": true}});
        assert_eq!(module.eval_rule(&path(&["opa", "examples", "deny"]), &input), None);
        assert_eq!(module.eval_rule(&path(&["other", "allow_request"]), &input), None);
    }

    #[test]
    fn dotted_input_reference_needs_no_import() {
        let module = compile("package x\n\nallow { input.a.b == \"yes\" }\n").unwrap();
        let result = module.eval_rule(&path(&["x", "allow"]), &json!({"a": {"b": "yes"}}));
        assert_eq!(result, Some(Value::Bool(true)));
    }
}
