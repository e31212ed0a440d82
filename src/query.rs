//! Query string parsing and serialization
//!
//! [`ParsedQuery`] is an ordered key → [`QueryValue`] mapping. Both directions take the same
//! [`QueryStringOptions`] so that, for one configuration, `parse(stringify(q)) == q` for any `q`
//! that came out of `parse`.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::BTreeMap;

/// Characters left unescaped when encoding a key or value
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// How arrays are written in a query string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrayFormat {
    /// Repeated keys: `tag=a&tag=b`
    #[default]
    None,
    /// Bracket suffix: `tag[]=a&tag[]=b`
    Bracket,
    /// Indexed: `tag[0]=a&tag[1]=b`
    Index,
    /// One key, separated values: `tag=a,b`
    Comma,
}

/// Options shared by [`ParsedQuery::parse`] and [`ParsedQuery::stringify`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryStringOptions {
    /// Array encoding style
    pub array_format: ArrayFormat,
    /// Separator used by [`ArrayFormat::Comma`]
    pub array_separator: char,
    /// Sort keys on parse and on stringify
    pub sort: bool,
    /// Drop [`QueryValue::Null`] entries when stringifying
    pub skip_null: bool,
}

impl QueryStringOptions {
    /// Create the default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the array encoding style
    pub fn array_format(mut self, format: ArrayFormat) -> Self {
        self.array_format = format;
        self
    }

    /// Set the separator for [`ArrayFormat::Comma`]
    pub fn array_separator(mut self, separator: char) -> Self {
        self.array_separator = separator;
        self
    }

    /// Enable or disable key sorting
    pub fn sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    /// Enable or disable dropping null entries
    pub fn skip_null(mut self, skip: bool) -> Self {
        self.skip_null = skip;
        self
    }
}

impl Default for QueryStringOptions {
    fn default() -> Self {
        Self {
            array_format: ArrayFormat::None,
            array_separator: ',',
            sort: true,
            skip_null: false,
        }
    }
}

/// A value held under one query key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// Key without `=`, e.g. `?flag`
    Null,
    /// A single value
    Single(String),
    /// Several values for one key
    Many(Vec<String>),
}

impl QueryValue {
    /// The value as a string, if it is a single value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            QueryValue::Single(value) => Some(value),
            _ => None,
        }
    }

    /// The first value, whatever the shape
    pub fn first(&self) -> Option<&str> {
        match self {
            QueryValue::Null => None,
            QueryValue::Single(value) => Some(value),
            QueryValue::Many(values) => values.first().map(String::as_str),
        }
    }

    /// All values as a slice-like vector of borrowed strings
    pub fn to_vec(&self) -> Vec<&str> {
        match self {
            QueryValue::Null => Vec::new(),
            QueryValue::Single(value) => vec![value.as_str()],
            QueryValue::Many(values) => values.iter().map(String::as_str).collect(),
        }
    }

    fn push(&mut self, value: Option<String>) {
        let Some(value) = value else {
            return;
        };
        *self = match std::mem::replace(self, QueryValue::Null) {
            QueryValue::Null => QueryValue::Single(value),
            QueryValue::Single(first) => QueryValue::Many(vec![first, value]),
            QueryValue::Many(mut values) => {
                values.push(value);
                QueryValue::Many(values)
            }
        };
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Single(value)
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Single(value.to_string())
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(values: Vec<String>) -> Self {
        QueryValue::Many(values)
    }
}

/// An ordered query string mapping
///
/// # Example
///
/// ```
/// use url_state_sync::{ParsedQuery, QueryStringOptions, QueryValue};
///
/// let options = QueryStringOptions::default();
/// let mut query = ParsedQuery::parse("?page=2&sort=name", &options);
///
/// assert_eq!(query.get_str("page"), Some("2"));
///
/// query.set("page", None);
/// query.insert("q", "rust lang");
/// assert_eq!(query.to_search(&options), "?q=rust%20lang&sort=name");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    entries: Vec<(String, QueryValue)>,
}

impl ParsedQuery {
    /// Create an empty query
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the search part of a location
    ///
    /// Leading `?`, `#` and `&` are ignored. `+` decodes to a space.
    pub fn parse(search: &str, options: &QueryStringOptions) -> Self {
        let mut query = ParsedQuery::new();
        // Index-format arrays are collected by position and flattened at the end.
        let mut indexed: BTreeMap<String, BTreeMap<usize, String>> = BTreeMap::new();

        let trimmed = search.trim_start_matches(['?', '#', '&']);

        for part in trimmed.split('&').filter(|part| !part.is_empty()) {
            let part = part.replace('+', " ");
            let (raw_key, raw_value) = match part.split_once('=') {
                Some((key, value)) => (key, Some(value)),
                None => (part.as_str(), None),
            };
            let key = decode(raw_key);
            let value = raw_value.map(decode);

            match options.array_format {
                ArrayFormat::None => match query.get_mut(&key) {
                    Some(existing) => existing.push(value),
                    None => query.insert(key, value.map_or(QueryValue::Null, QueryValue::Single)),
                },
                ArrayFormat::Bracket => {
                    if let Some(base) = key.strip_suffix("[]") {
                        let base = base.to_string();
                        match query.get_mut(&base) {
                            Some(QueryValue::Many(values)) => values.extend(value),
                            _ => query.insert(base, QueryValue::Many(value.into_iter().collect())),
                        }
                    } else {
                        query.insert(key, value.map_or(QueryValue::Null, QueryValue::Single));
                    }
                }
                ArrayFormat::Index => {
                    if let Some((base, index)) = split_index(&key) {
                        if let Some(value) = value {
                            indexed.entry(base).or_default().insert(index, value);
                        }
                    } else {
                        query.insert(key, value.map_or(QueryValue::Null, QueryValue::Single));
                    }
                }
                ArrayFormat::Comma => {
                    let value = match value {
                        Some(value) if value.contains(options.array_separator) => {
                            QueryValue::Many(
                                value
                                    .split(options.array_separator)
                                    .map(str::to_string)
                                    .collect(),
                            )
                        }
                        Some(value) => QueryValue::Single(value),
                        None => QueryValue::Null,
                    };
                    query.insert(key, value);
                }
            }
        }

        for (key, values) in indexed {
            query.insert(key, QueryValue::Many(values.into_values().collect()));
        }

        if options.sort {
            query.sort();
        }

        query
    }

    /// Serialize without the leading `?`
    pub fn stringify(&self, options: &QueryStringOptions) -> String {
        let mut entries: Vec<&(String, QueryValue)> = self.entries.iter().collect();
        if options.sort {
            entries.sort_by(|a, b| a.0.cmp(&b.0));
        }

        let mut pairs = Vec::new();
        for (key, value) in entries {
            let key = encode(key);
            match value {
                QueryValue::Null => {
                    if !options.skip_null {
                        pairs.push(key);
                    }
                }
                QueryValue::Single(value) => pairs.push(format!("{}={}", key, encode(value))),
                QueryValue::Many(values) if values.is_empty() => {}
                QueryValue::Many(values) => match options.array_format {
                    ArrayFormat::None => {
                        pairs.extend(values.iter().map(|v| format!("{}={}", key, encode(v))));
                    }
                    ArrayFormat::Bracket => {
                        pairs.extend(values.iter().map(|v| format!("{}[]={}", key, encode(v))));
                    }
                    ArrayFormat::Index => {
                        pairs.extend(
                            values
                                .iter()
                                .enumerate()
                                .map(|(i, v)| format!("{}[{}]={}", key, i, encode(v))),
                        );
                    }
                    ArrayFormat::Comma => {
                        let joined = values
                            .iter()
                            .map(|v| encode(v))
                            .collect::<Vec<_>>()
                            .join(&options.array_separator.to_string());
                        pairs.push(format!("{}={}", key, joined));
                    }
                },
            }
        }

        pairs.join("&")
    }

    /// Serialize as a location search: `?` plus pairs, or empty when there is nothing to write
    pub fn to_search(&self, options: &QueryStringOptions) -> String {
        let pairs = self.stringify(options);
        if pairs.is_empty() {
            String::new()
        } else {
            format!("?{}", pairs)
        }
    }

    /// Get a value
    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Get a single value as a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(QueryValue::as_str)
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut QueryValue> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Insert or overwrite a value, keeping the key's position if it already exists
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
        let key = key.into();
        let value = value.into();
        match self.get_mut(&key) {
            Some(existing) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Insert a value, or remove the key when `value` is `None`
    pub fn set(&mut self, key: impl Into<String>, value: Option<QueryValue>) {
        let key = key.into();
        match value {
            Some(value) => self.insert(key, value),
            None => {
                self.remove(&key);
            }
        }
    }

    /// Remove a key
    pub fn remove(&mut self, key: &str) -> Option<QueryValue> {
        let position = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(position).1)
    }

    /// Check if a key is present
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterate over entries in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the query holds no keys
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn sort(&mut self) {
        self.entries.sort_by(|a, b| a.0.cmp(&b.0));
    }
}

impl<K, V> FromIterator<(K, V)> for ParsedQuery
where
    K: Into<String>,
    V: Into<QueryValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut query = ParsedQuery::new();
        for (key, value) in iter {
            query.insert(key, value);
        }
        query
    }
}

/// Percent-encode one query component
pub fn encode(component: &str) -> String {
    utf8_percent_encode(component, COMPONENT).to_string()
}

/// Percent-decode one query component, replacing invalid UTF-8
pub fn decode(component: &str) -> String {
    percent_decode_str(component).decode_utf8_lossy().into_owned()
}

/// Split `name[3]` into `("name", 3)`
fn split_index(key: &str) -> Option<(String, usize)> {
    let inner = key.strip_suffix(']')?;
    let open = inner.rfind('[')?;
    let index = inner[open + 1..].parse().ok()?;
    Some((inner[..open].to_string(), index))
}
