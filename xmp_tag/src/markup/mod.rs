//! Parses a tag's raw argument string into named parameters.
//!
//! The markup is a run of whitespace-separated `key=value` pairs. Each value
//! is either a quoted literal or a bare variable name:
//!
//! ```text
//! file_path="photos/cat.jpg" property_namespace='dc' property_name=prop
//! ```
//!
//! Literals may escape their own quote character (`\"` or `\'`). Variables
//! are looked up through a callback the caller hands us, so this module never
//! touches a rendering context itself.

use crate::tag::TAG_NAME;

pub mod error;
mod scan;

pub use error::MarkupError;

/// Parameters the `xmp` tag can't render without.
pub const REQUIRED_PARAMETERS: [&str; 3] = ["file_path", "property_namespace", "property_name"];

/// An example of valid markup, shown to template authors when theirs isn't.
pub fn syntax_example() -> String {
    format!("{{% {TAG_NAME} file='value' key=variable %}}")
}

/// A parsed value, before it's been resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RawValue<'markup> {
    /// `"..."`, still containing any `\"` escapes.
    DoubleQuoted(&'markup str),

    /// `'...'`, still containing any `\'` escapes.
    SingleQuoted(&'markup str),

    /// A bare token naming a variable in the rendering context.
    Variable(&'markup str),
}

impl RawValue<'_> {
    /// Turns this raw value into its final string.
    ///
    /// Quoted literals are unescaped. Only the literal's own quote character
    /// is unescaped - other backslash sequences stay exactly as written.
    ///
    /// Variables are handed to `resolve_variable`. When it finds nothing, the
    /// value is empty.
    pub fn resolve(&self, resolve_variable: impl FnOnce(&str) -> Option<String>) -> String {
        match *self {
            RawValue::DoubleQuoted(s) => s.replace("\\\"", "\""),
            RawValue::SingleQuoted(s) => s.replace("\\'", "'"),
            RawValue::Variable(name) => resolve_variable(name).unwrap_or_else(|| {
                log::debug!("Variable `{name}` didn't resolve to anything. Using an empty value.");
                String::new()
            }),
        }
    }
}

/// An ordered list of resolved parameters.
///
/// Keys are unique. Inserting a key that's already present replaces its value
/// but keeps its original position.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AttributeList(Vec<(String, String)>);

impl AttributeList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, returning the value it replaced, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let (key, value) = (key.into(), value.into());

        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, old)) => Some(core::mem::replace(old, value)),
            None => {
                self.0.push((key, value));
                None
            }
        }
    }

    /// Gets the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether `key` was given, even with an empty value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// How many distinct keys were given.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no parameters were given at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the names of any [`REQUIRED_PARAMETERS`] that aren't present.
    pub fn missing_required(&self) -> Vec<&'static str> {
        REQUIRED_PARAMETERS
            .into_iter()
            .filter(|key| !self.contains_key(key))
            .collect()
    }
}

impl core::fmt::Display for AttributeList {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("{")?;
        for (idx, (key, value)) in self.iter().enumerate() {
            if idx != 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}: {value:?}")?;
        }
        f.write_str("}")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AttributeList {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut list = AttributeList::new();
        for (k, v) in iter {
            list.insert(k, v);
        }
        list
    }
}

/// Checks whether `markup` matches the attribute grammar, start to end.
///
/// Nothing is resolved here.
pub fn validate_syntax(markup: &str) -> bool {
    scan::parameters(markup).is_some()
}

/// Parses `markup` into a list of resolved parameters without checking for
/// the required ones.
///
/// Pairs are resolved left to right, and a repeated key keeps its last value.
///
/// # Errors
///
/// Returns [`MarkupError::Syntax`] if the markup doesn't match the grammar.
/// In that case, `resolve_variable` is never called.
pub fn parse_parameters(
    markup: &str,
    mut resolve_variable: impl FnMut(&str) -> Option<String>,
) -> Result<AttributeList, MarkupError> {
    let Some(raw) = scan::parameters(markup) else {
        log::error!("Markup didn't match the `{TAG_NAME}` tag's syntax: `{markup}`");
        return Err(MarkupError::Syntax {
            markup: markup.to_string(),
            example: syntax_example(),
        });
    };

    let mut parameters = AttributeList::new();
    for (key, value) in raw {
        let resolved = value.resolve(&mut resolve_variable);
        log::trace!("Parameter `{key}` resolved to `{resolved}`.");

        if let Some(old) = parameters.insert(key, resolved) {
            log::debug!("Parameter `{key}` was given more than once. Dropping old value `{old}`.");
        }
    }

    Ok(parameters)
}

/// Parses `markup` into a list of resolved parameters, then ensures that all
/// [`REQUIRED_PARAMETERS`] are present.
///
/// # Errors
///
/// - [`MarkupError::Syntax`] if the markup doesn't match the grammar.
/// - [`MarkupError::MissingParameters`] if a required parameter is absent.
pub fn parse(
    markup: &str,
    resolve_variable: impl FnMut(&str) -> Option<String>,
) -> Result<AttributeList, MarkupError> {
    let parameters = parse_parameters(markup, resolve_variable)?;

    let missing = parameters.missing_required();
    if !missing.is_empty() {
        log::error!("The `{TAG_NAME}` tag is missing parameters: {missing:?}");
        return Err(MarkupError::MissingParameters {
            parameters,
            required: REQUIRED_PARAMETERS.to_vec(),
        });
    }

    Ok(parameters)
}
