use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// One term of a selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorTerm {
    /// `#name` or a bare `name`
    Id(String),
    /// `.name`
    Class(String),
}

/// Comma-separated list of `#id` / `.class` terms naming the scene boxes that
/// collect snow, e.g. `#banner, .ledge`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selector {
    terms: Vec<SelectorTerm>,
}

impl Selector {
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    #[cfg(test)]
    pub fn terms(&self) -> &[SelectorTerm] {
        &self.terms
    }

    /// Does an element with this id and classes match any term?
    pub fn matches(&self, id: &str, classes: &[String]) -> bool {
        self.terms.iter().any(|term| match term {
            SelectorTerm::Id(name) => name.eq_ignore_ascii_case(id),
            SelectorTerm::Class(name) => classes.iter().any(|c| c.eq_ignore_ascii_case(name)),
        })
    }
}

impl FromStr for Selector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut terms = Vec::new();
        for raw in s.split(',') {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let term = if let Some(class) = raw.strip_prefix('.') {
                SelectorTerm::Class(class.to_string())
            } else {
                SelectorTerm::Id(raw.trim_start_matches('#').to_string())
            };
            match &term {
                SelectorTerm::Id(name) | SelectorTerm::Class(name) if name.is_empty() => {
                    return Err(format!("Empty selector term in '{}'", s));
                }
                SelectorTerm::Id(name) | SelectorTerm::Class(name)
                    if name.contains(char::is_whitespace) =>
                {
                    return Err(format!("Nested selectors are not supported: '{}'", raw));
                }
                _ => terms.push(term),
            }
        }
        Ok(Self { terms })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .terms
            .iter()
            .map(|term| match term {
                SelectorTerm::Id(name) => format!("#{}", name),
                SelectorTerm::Class(name) => format!(".{}", name),
            })
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

impl Serialize for Selector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Selector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_mixed_terms() {
        let sel: Selector = "#banner, .ledge,  footer".parse().unwrap();
        assert_eq!(
            sel.terms(),
            &[
                SelectorTerm::Id("banner".into()),
                SelectorTerm::Class("ledge".into()),
                SelectorTerm::Id("footer".into()),
            ]
        );
    }

    #[test]
    fn test_matching() {
        let sel: Selector = "#banner, .ledge".parse().unwrap();
        assert!(sel.matches("banner", &[]));
        assert!(sel.matches("BANNER", &[]));
        assert!(sel.matches("left", &classes(&["box", "ledge"])));
        assert!(!sel.matches("left", &classes(&["box"])));
    }

    #[test]
    fn test_empty_and_invalid() {
        let sel: Selector = "".parse().unwrap();
        assert!(sel.is_empty());
        assert!(!sel.matches("anything", &[]));
        assert!("#".parse::<Selector>().is_err());
        assert!("#zone .tagline".parse::<Selector>().is_err());
    }

    #[test]
    fn test_display_normalises() {
        let sel: Selector = "banner,.ledge".parse().unwrap();
        assert_eq!(sel.to_string(), "#banner, .ledge");
    }
}
