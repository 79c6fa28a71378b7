use once_cell::sync::Lazy;
/**
 * Directive Matching - CSS Selector Matching
 *
 * Parses the selector subset directives and projection slots may use (tag, `.class`,
 * `#id`, `[attr]`, `[attr=value]`, `:not(...)` and `,` lists) and matches it against
 * the static shape of template elements.
 */
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::output::output_ast as o;

/// Regex for parsing CSS selectors
static SELECTOR_REGEXP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(\:not\()|(([\.\#]?)[-\w]+)|(?:\[([-.\w*\\$]+)(?:=(?:"([^"]*)"|'([^']*)'|([^\]]*)))?\])|(\))|(\s*,\s*)"#).unwrap()
});

/// Match groups in the selector regex
#[derive(Debug, Clone, Copy)]
enum SelectorRegexp {
    Not = 1,
    Tag = 2,
    Prefix = 3,
    Attribute = 4,
    AttributeValueDouble = 5,
    AttributeValueSingle = 6,
    AttributeValueUnquoted = 7,
    NotEnd = 8,
    Separator = 9,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorParseError {
    #[error("Nesting :not in a selector is not allowed")]
    NestedNot,
    #[error("Multiple selectors in :not are not supported")]
    MultipleInNot,
    #[error("Error in attribute selector \"{0}\". Unescaped \"$\" is not supported. Please escape with \"\\$\".")]
    UnescapedDollar(String),
    #[error("Empty selector")]
    Empty,
    #[error("Only one :not() is supported in projection selector \"{0}\"")]
    MultipleNotInProjection(String),
}

/// CSS Selector representation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CssSelector {
    pub element: Option<String>,
    pub class_names: Vec<String>,
    /// Attributes stored in pairs: [name, value, name, value, ...]
    pub attrs: Vec<String>,
    pub not_selectors: Vec<CssSelector>,
}

impl CssSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse CSS selector string into CssSelector objects
    pub fn parse(selector: &str) -> Result<Vec<CssSelector>, SelectorParseError> {
        let mut results = Vec::new();
        let mut css_selector = CssSelector::new();
        let mut in_not = false;

        for cap in SELECTOR_REGEXP.captures_iter(selector) {
            if cap.get(SelectorRegexp::Not as usize).is_some() {
                if in_not {
                    return Err(SelectorParseError::NestedNot);
                }
                in_not = true;
                css_selector.not_selectors.push(CssSelector::new());
            }

            if let Some(tag_match) = cap.get(SelectorRegexp::Tag as usize) {
                let tag = tag_match.as_str();
                let prefix = cap
                    .get(SelectorRegexp::Prefix as usize)
                    .map(|m| m.as_str())
                    .unwrap_or("");
                let current = css_selector.current_mut(in_not);
                match prefix {
                    "#" => current.add_attribute("id", &tag[1..]),
                    "." => current.add_class_name(&tag[1..]),
                    _ => current.set_element(tag),
                }
            }

            if let Some(attr_match) = cap.get(SelectorRegexp::Attribute as usize) {
                let value = [
                    SelectorRegexp::AttributeValueDouble,
                    SelectorRegexp::AttributeValueSingle,
                    SelectorRegexp::AttributeValueUnquoted,
                ]
                .iter()
                .find_map(|group| cap.get(*group as usize))
                .map(|m| m.as_str())
                .unwrap_or("");
                let name = Self::unescape_attribute(attr_match.as_str())?;
                css_selector.current_mut(in_not).add_attribute(&name, value);
            }

            if cap.get(SelectorRegexp::NotEnd as usize).is_some() {
                in_not = false;
            }

            if cap.get(SelectorRegexp::Separator as usize).is_some() {
                if in_not {
                    return Err(SelectorParseError::MultipleInNot);
                }
                Self::add_result(&mut results, css_selector);
                css_selector = CssSelector::new();
            }
        }

        Self::add_result(&mut results, css_selector);
        if results.iter().all(CssSelector::is_empty) {
            return Err(SelectorParseError::Empty);
        }
        Ok(results)
    }

    fn current_mut(&mut self, in_not: bool) -> &mut CssSelector {
        if in_not && !self.not_selectors.is_empty() {
            let last = self.not_selectors.len() - 1;
            &mut self.not_selectors[last]
        } else {
            self
        }
    }

    fn add_result(results: &mut Vec<CssSelector>, mut css_sel: CssSelector) {
        if !css_sel.not_selectors.is_empty()
            && css_sel.element.is_none()
            && css_sel.class_names.is_empty()
            && css_sel.attrs.is_empty()
        {
            css_sel.element = Some("*".to_string());
        }
        results.push(css_sel);
    }

    fn is_empty(&self) -> bool {
        self.element.is_none()
            && self.class_names.is_empty()
            && self.attrs.is_empty()
            && self.not_selectors.is_empty()
    }

    /// Unescape \$ sequences from CSS attribute selector
    fn unescape_attribute(attr: &str) -> Result<String, SelectorParseError> {
        let mut result = String::new();
        let mut escaping = false;

        for ch in attr.chars() {
            if ch == '\\' {
                escaping = true;
                continue;
            }
            if ch == '$' && !escaping {
                return Err(SelectorParseError::UnescapedDollar(attr.to_string()));
            }
            escaping = false;
            result.push(ch);
        }

        Ok(result)
    }

    fn escape_attribute(attr: &str) -> String {
        attr.replace('$', "\\$")
    }

    pub fn has_element_selector(&self) -> bool {
        matches!(&self.element, Some(element) if element != "*")
    }

    pub fn set_element(&mut self, element: &str) {
        self.element = Some(element.to_string());
    }

    pub fn add_attribute(&mut self, name: &str, value: &str) {
        self.attrs.push(name.to_string());
        self.attrs.push(value.to_lowercase());
    }

    pub fn add_class_name(&mut self, name: &str) {
        self.class_names.push(name.to_lowercase());
    }

    /// Get attribute value by name
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .chunks(2)
            .find(|pair| pair[0] == name)
            .and_then(|pair| pair.get(1))
            .map(String::as_str)
    }

    fn attr_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs
            .chunks(2)
            .map(|pair| (pair[0].as_str(), pair.get(1).map_or("", String::as_str)))
    }

    /// Whether this selector (used as a pattern) matches the static shape `element`.
    ///
    /// Tag names compare case-insensitively, attribute names exactly, and attribute
    /// values and class names case-insensitively. A pattern attribute without a value
    /// only requires presence.
    pub fn matches(&self, element: &CssSelector) -> bool {
        if let Some(pattern_tag) = &self.element {
            if pattern_tag != "*" {
                match &element.element {
                    Some(tag) if tag.eq_ignore_ascii_case(pattern_tag) => {}
                    _ => return false,
                }
            }
        }

        let has_all_classes = self.class_names.iter().all(|cls| {
            element
                .class_names
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(cls))
        });
        if !has_all_classes {
            return false;
        }

        let has_all_attrs = self.attr_pairs().all(|(name, value)| {
            element.attr_pairs().any(|(candidate_name, candidate_value)| {
                candidate_name == name && (value.is_empty() || candidate_value.eq_ignore_ascii_case(value))
            })
        });
        if !has_all_attrs {
            return false;
        }

        !self.not_selectors.iter().any(|not| not.matches(element))
    }

    /// Flat array form used by the runtime: `[tag, attrName, attrValue, ..., 'class', cls]`.
    fn to_r3_simple_selector(&self) -> o::Expression {
        let mut entries = vec![o::literal(
            self.element
                .as_deref()
                .filter(|e| *e != "*")
                .unwrap_or("")
                .to_string(),
        )];
        for (name, value) in self.attr_pairs() {
            entries.push(o::literal(name));
            entries.push(o::literal(value));
        }
        for class_name in &self.class_names {
            entries.push(o::literal("class"));
            entries.push(o::literal(class_name.as_str()));
        }
        o::literal_arr(entries)
    }

    /// Runtime form of a parsed selector list: one `[positive, negative | null]` pair per
    /// comma-separated alternative.
    pub fn to_r3_selector_list(
        selectors: &[CssSelector],
        source: &str,
    ) -> Result<o::Expression, SelectorParseError> {
        let mut alternatives = Vec::with_capacity(selectors.len());
        for selector in selectors {
            let negative = match selector.not_selectors.as_slice() {
                [] => o::null_expr(),
                [single] => single.to_r3_simple_selector(),
                _ => return Err(SelectorParseError::MultipleNotInProjection(source.to_string())),
            };
            alternatives.push(o::literal_arr(vec![selector.to_r3_simple_selector(), negative]));
        }
        Ok(o::literal_arr(alternatives))
    }
}

impl std::fmt::Display for CssSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.element.as_deref().unwrap_or(""))?;

        for class_name in &self.class_names {
            write!(f, ".{}", class_name)?;
        }

        for (name, value) in self.attr_pairs() {
            let name = Self::escape_attribute(name);
            if value.is_empty() {
                write!(f, "[{}]", name)?;
            } else {
                write!(f, "[{}={}]", name, value)?;
            }
        }

        for not_selector in &self.not_selectors {
            write!(f, ":not({})", not_selector)?;
        }

        Ok(())
    }
}

/// Builds the selector an element exposes for matching: its tag, static attributes
/// (the `class` attribute also contributes its class names) and the names of its bound
/// inputs and outputs with empty values.
pub fn create_element_css_selector<'a>(
    tag: &str,
    attributes: impl IntoIterator<Item = (&'a str, &'a str)>,
    binding_names: impl IntoIterator<Item = &'a str>,
) -> CssSelector {
    let mut css_selector = CssSelector::new();
    css_selector.set_element(tag);

    for (name, value) in attributes {
        css_selector.add_attribute(name, value);
        if name.eq_ignore_ascii_case("class") {
            for class_name in value.split_whitespace() {
                css_selector.add_class_name(class_name);
            }
        }
    }

    for name in binding_names {
        css_selector.add_attribute(name, "");
    }

    css_selector
}

/// Matches element selectors against registered selector lists.
///
/// Results come back in registration order with each entry reported at most once, no
/// matter how many alternatives of its selector list matched.
pub struct SelectorMatcher<T> {
    selectables: Vec<(Vec<CssSelector>, T)>,
}

impl<T> SelectorMatcher<T> {
    pub fn new() -> Self {
        SelectorMatcher {
            selectables: Vec::new(),
        }
    }

    /// Add a selector list with associated data
    pub fn add_selectables(&mut self, css_selectors: Vec<CssSelector>, callback_data: T) {
        self.selectables.push((css_selectors, callback_data));
    }

    pub fn len(&self) -> usize {
        self.selectables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectables.is_empty()
    }

    /// Match a CSS selector against registered selectors
    pub fn match_selector<F>(&self, css_selector: &CssSelector, mut callback: F) -> bool
    where
        F: FnMut(&CssSelector, &T),
    {
        let mut matched = false;
        for (selectors, data) in &self.selectables {
            if let Some(hit) = selectors.iter().find(|s| s.matches(css_selector)) {
                callback(hit, data);
                matched = true;
            }
        }
        matched
    }

    pub fn match_all(&self, css_selector: &CssSelector) -> Vec<&T> {
        self.selectables
            .iter()
            .filter(|(selectors, _)| selectors.iter().any(|s| s.matches(css_selector)))
            .map(|(_, data)| data)
            .collect()
    }
}

impl<T> Default for SelectorMatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}
