use super::core::NodeData;

/// Compound selector: `tag#id.class[attr][attr=value]`, every part optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

impl Selector {
    /// Returns `None` for empty input, combinators, or malformed parts.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        let mut selector = Selector::default();
        let mut rest = input;

        let tag_len = rest.find(['#', '.', '[']).unwrap_or(rest.len());
        if tag_len > 0 {
            let tag = &rest[..tag_len];
            if tag != "*" {
                selector.tag = Some(valid_ident(tag)?.to_ascii_lowercase());
            }
            rest = &rest[tag_len..];
        }

        while let Some(marker) = rest.chars().next() {
            rest = &rest[marker.len_utf8()..];
            match marker {
                '#' | '.' => {
                    let len = rest.find(['#', '.', '[']).unwrap_or(rest.len());
                    let name = valid_ident(&rest[..len])?.to_string();
                    if marker == '#' {
                        selector.id = Some(name);
                    } else {
                        selector.classes.push(name);
                    }
                    rest = &rest[len..];
                }
                '[' => {
                    let close = rest.find(']')?;
                    let body = &rest[..close];
                    let attr = match body.split_once('=') {
                        Some((name, value)) => (
                            valid_ident(name.trim())?.to_string(),
                            Some(unquote(value.trim()).to_string()),
                        ),
                        None => (valid_ident(body.trim())?.to_string(), None),
                    };
                    selector.attrs.push(attr);
                    rest = &rest[close + 1..];
                }
                _ => return None,
            }
        }

        Some(selector)
    }

    pub fn matches(&self, data: &NodeData) -> bool {
        let NodeData::Element { tag, attrs } = data else {
            return false;
        };
        let lookup = |name: &str| {
            attrs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        };

        if let Some(expected) = &self.tag {
            if !tag.eq_ignore_ascii_case(expected) {
                return false;
            }
        }
        if let Some(expected) = &self.id {
            if lookup("id") != Some(expected.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let classes: Vec<&str> = lookup("class")
                .map(|value| value.split_whitespace().collect())
                .unwrap_or_default();
            if !self.classes.iter().all(|class| classes.contains(&class.as_str())) {
                return false;
            }
        }
        self.attrs.iter().all(|(name, expected)| match (lookup(name), expected) {
            (Some(actual), Some(expected)) => actual == expected,
            (Some(_), None) => true,
            (None, _) => false,
        })
    }
}

fn valid_ident(raw: &str) -> Option<&str> {
    let ok = !raw.is_empty()
        && raw
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
    ok.then_some(raw)
}

fn unquote(raw: &str) -> &str {
    raw.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .or_else(|| raw.strip_prefix('\'').and_then(|inner| inner.strip_suffix('\'')))
        .unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(tag: &str, attrs: &[(&str, &str)]) -> NodeData {
        NodeData::Element {
            tag: tag.to_string(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn parses_compound_parts() {
        let selector = Selector::parse("div#modal.overlay.open[data-layer=\"top\"]").unwrap();
        let node = element(
            "div",
            &[("id", "modal"), ("class", "open overlay"), ("data-layer", "top")],
        );
        assert!(selector.matches(&node));
    }

    #[test]
    fn missing_class_fails() {
        let selector = Selector::parse(".overlay.open").unwrap();
        assert!(!selector.matches(&element("div", &[("class", "overlay")])));
    }

    #[test]
    fn presence_only_attribute() {
        let selector = Selector::parse("[hidden]").unwrap();
        assert!(selector.matches(&element("span", &[("hidden", "")])));
        assert!(!selector.matches(&element("span", &[])));
    }

    #[test]
    fn combinators_and_empty_input_are_rejected() {
        assert_eq!(Selector::parse("body > #outside"), None);
        assert_eq!(Selector::parse("body #outside"), None);
        assert_eq!(Selector::parse("   "), None);
        assert_eq!(Selector::parse("#"), None);
    }

    #[test]
    fn text_nodes_never_match() {
        let selector = Selector::parse("*").unwrap();
        assert!(!selector.matches(&NodeData::Text("x".to_string())));
        assert!(selector.matches(&element("p", &[])));
    }
}
