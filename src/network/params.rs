//! `{param}` placeholder resolution for endpoint paths

use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ConsoleError, Result};

/// Supplies values for path placeholders. Returning `None` (or a blank
/// value) means the parameter is missing.
pub trait ParameterResolver {
    fn resolve(&self, name: &str) -> Option<String>;
}

impl<F> ParameterResolver for F
where
    F: Fn(&str) -> Option<String>,
{
    fn resolve(&self, name: &str) -> Option<String> {
        self(name)
    }
}

impl ParameterResolver for HashMap<String, String> {
    fn resolve(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Asks the operator on the terminal, one line per parameter
pub struct PromptResolver;

impl ParameterResolver for PromptResolver {
    fn resolve(&self, name: &str) -> Option<String> {
        let mut stderr = io::stderr();
        let _ = write!(stderr, "Value for {{{}}}: ", name);
        let _ = stderr.flush();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{([^{}/]+)\}").expect("placeholder pattern is valid"))
}

/// Distinct placeholder names in order of first appearance
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for capture in placeholder_pattern().captures_iter(template) {
        let name = capture[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Replaces every placeholder with its resolved value.
///
/// Stops at the first parameter without a usable value; nothing is
/// substituted in that case.
pub fn resolve_placeholders(template: &str, resolver: &dyn ParameterResolver) -> Result<String> {
    let mut values = HashMap::new();
    for name in placeholders(template) {
        let value = resolver
            .resolve(&name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConsoleError::MissingParameter(name.clone()))?;
        values.insert(name, value);
    }

    let resolved = placeholder_pattern().replace_all(template, |caps: &regex::Captures| {
        values
            .get(&caps[1])
            .cloned()
            .unwrap_or_else(|| caps[0].to_string())
    });
    Ok(resolved.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_placeholders_in_document_order() {
        assert_eq!(
            placeholders("http://h/users/{id}/posts/{postId}/{id}"),
            vec!["id".to_string(), "postId".to_string()]
        );
        assert!(placeholders("http://h/users").is_empty());
    }

    #[test]
    fn test_resolves_each_name_once() {
        let asked = RefCell::new(Vec::new());
        let resolver = |name: &str| {
            asked.borrow_mut().push(name.to_string());
            Some(format!(" {}-1 ", name))
        };
        let url = resolve_placeholders("/a/{id}/b/{slug}/c/{id}", &resolver).unwrap();
        assert_eq!(url, "/a/id-1/b/slug-1/c/id-1");
        assert_eq!(*asked.borrow(), vec!["id", "slug"]);
    }

    #[test]
    fn test_blank_value_is_missing() {
        for answer in [None, Some(String::new()), Some("   ".to_string())] {
            let resolver = move |_: &str| answer.clone();
            let err = resolve_placeholders("/users/{id}", &resolver).unwrap_err();
            assert_eq!(err, ConsoleError::MissingParameter("id".into()));
        }
    }

    #[test]
    fn test_map_resolver() {
        let mut map = HashMap::new();
        map.insert("id".to_string(), "42".to_string());
        assert_eq!(resolve_placeholders("/users/{id}", &map).unwrap(), "/users/42");
    }
}
