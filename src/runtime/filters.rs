//! Output modifiers applied by `|name:arg` suffixes

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::error::RenderError;
use crate::parser::Modifier;

/// A filter receives the current text and the modifier's arguments
pub type Filter = Arc<dyn Fn(&str, &[String]) -> String + Send + Sync>;

/// Marker modifier that disables escaping of a printed value
pub const NOESCAPE: &str = "noescape";

/// Named filters available to templates
#[derive(Clone)]
pub struct FilterSet {
    filters: HashMap<String, Filter>,
}

impl fmt::Debug for FilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.filters.keys().collect();
        names.sort();
        f.debug_struct("FilterSet").field("filters", &names).finish()
    }
}

impl Default for FilterSet {
    fn default() -> Self {
        let mut set = Self {
            filters: HashMap::new(),
        };
        set.register("upper", |s, _| s.to_uppercase());
        set.register("lower", |s, _| s.to_lowercase());
        set.register("firstUpper", |s, _| {
            let mut chars = s.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        });
        set.register("trim", |s, _| s.trim().to_string());
        set.register("strip", |s, _| s.split_whitespace().collect::<Vec<_>>().join(" "));
        set.register("truncate", truncate);
        set.register("replace", |s, args| match args {
            [from, to, ..] if !from.is_empty() => s.replace(from.as_str(), to),
            [from] if !from.is_empty() => s.replace(from.as_str(), ""),
            _ => s.to_string(),
        });
        set.register(NOESCAPE, |s, _| s.to_string());
        set
    }
}

fn truncate(s: &str, args: &[String]) -> String {
    let Some(max) = args.first().and_then(|a| a.trim().parse::<usize>().ok()) else {
        return s.to_string();
    };
    let append = args.get(1).map(String::as_str).unwrap_or("\u{2026}");
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(append.chars().count());
    let mut out: String = s.chars().take(keep).collect();
    out.push_str(append);
    out
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a filter
    pub fn register<F>(&mut self, name: &str, filter: F)
    where
        F: Fn(&str, &[String]) -> String + Send + Sync + 'static,
    {
        self.filters.insert(name.to_string(), Arc::new(filter));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Run `value` through each modifier in order
    pub fn apply(&self, modifiers: &[Modifier], value: String) -> Result<String, RenderError> {
        modifiers.iter().try_fold(value, |acc, modifier| {
            let filter = self
                .filters
                .get(&modifier.name)
                .ok_or_else(|| RenderError::UnknownFilter {
                    name: modifier.name.clone(),
                })?;
            Ok(filter(&acc, &modifier.args))
        })
    }
}

/// Whether the printed value bypasses escaping
pub fn is_raw(modifiers: &[Modifier]) -> bool {
    modifiers.iter().any(|m| m.name == NOESCAPE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modifier(name: &str, args: &[&str]) -> Modifier {
        Modifier {
            name: name.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn test_chain_applies_in_order() {
        let filters = FilterSet::default();
        let out = filters
            .apply(
                &[modifier("trim", &[]), modifier("firstUpper", &[])],
                "  hello ".to_string(),
            )
            .unwrap();
        assert_eq!(out, "Hello");
    }

    #[test]
    fn test_truncate() {
        let filters = FilterSet::default();
        let out = filters
            .apply(&[modifier("truncate", &["5", "..."])], "abcdefgh".to_string())
            .unwrap();
        assert_eq!(out, "ab...");
        let out = filters
            .apply(&[modifier("truncate", &["10"])], "short".to_string())
            .unwrap();
        assert_eq!(out, "short");
    }

    #[test]
    fn test_replace_and_strip() {
        let filters = FilterSet::default();
        let out = filters
            .apply(
                &[modifier("strip", &[]), modifier("replace", &["a", "o"])],
                "a  b\n  a".to_string(),
            )
            .unwrap();
        assert_eq!(out, "o b o");
    }

    #[test]
    fn test_unknown_filter() {
        let err = FilterSet::default()
            .apply(&[modifier("shout", &[])], "x".to_string())
            .unwrap_err();
        assert!(matches!(err, RenderError::UnknownFilter { name } if name == "shout"));
    }

    #[test]
    fn test_custom_filter() {
        let mut filters = FilterSet::new();
        filters.register("wrap", |s, args| {
            let tag = args.first().map(String::as_str).unwrap_or("b");
            format!("<{tag}>{s}</{tag}>")
        });
        let out = filters
            .apply(&[modifier("wrap", &["em"])], "hi".to_string())
            .unwrap();
        assert_eq!(out, "<em>hi</em>");
    }

    #[test]
    fn test_noescape_marker() {
        assert!(is_raw(&[modifier("upper", &[]), modifier(NOESCAPE, &[])]));
        assert!(!is_raw(&[modifier("upper", &[])]));
    }
}
