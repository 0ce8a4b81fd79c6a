// File: src/declaration.rs
// Purpose: Raw route declarations as read from route files, before compilation

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::RouterError;

/// Option bag attached to a route
pub type Options = IndexMap<String, OptionValue>;

/// Scalar option value
///
/// Deserialization tries the variants in order, so `1234` is an `Int` and
/// `"1234"` a `Str`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Target type for option comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Bool,
    Int,
    Float,
    Str,
}

impl FromStr for OptionType {
    type Err = RouterError;

    /// Accepts `bool`, `boolean`, `int`, `integer`, `float`, `double` and
    /// `string`; an empty name means `string`
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "bool" | "boolean" => Ok(OptionType::Bool),
            "int" | "integer" => Ok(OptionType::Int),
            "float" | "double" => Ok(OptionType::Float),
            "string" | "" => Ok(OptionType::Str),
            _ => Err(RouterError::InvalidOptionType(name.to_string())),
        }
    }
}

impl OptionValue {
    /// Converts the value to another scalar type
    ///
    /// Loose scalar conversion rules: `"0"` and `""` are false, strings
    /// convert to numbers from their leading numeric part (`"12px"` is 12,
    /// `"abc"` is 0), `true` prints as `"1"` and `false` as `""`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_i18n_router::{OptionType, OptionValue};
    ///
    /// let value = OptionValue::Str("1234".to_string());
    /// assert_eq!(value.coerce(OptionType::Int), OptionValue::Int(1234));
    /// assert_eq!(OptionValue::Int(0).coerce(OptionType::Bool), OptionValue::Bool(false));
    /// assert_eq!(OptionValue::Bool(true).coerce(OptionType::Str), OptionValue::Str("1".into()));
    /// ```
    pub fn coerce(&self, target: OptionType) -> OptionValue {
        match target {
            OptionType::Bool => OptionValue::Bool(self.to_bool()),
            OptionType::Int => OptionValue::Int(self.to_int()),
            OptionType::Float => OptionValue::Float(self.to_float()),
            OptionType::Str => OptionValue::Str(self.to_string()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            OptionValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    fn to_bool(&self) -> bool {
        match self {
            OptionValue::Bool(b) => *b,
            OptionValue::Int(i) => *i != 0,
            OptionValue::Float(f) => *f != 0.0,
            OptionValue::Str(s) => !(s.is_empty() || s == "0"),
        }
    }

    fn to_int(&self) -> i64 {
        match self {
            OptionValue::Bool(b) => i64::from(*b),
            OptionValue::Int(i) => *i,
            OptionValue::Float(f) => f.trunc() as i64,
            OptionValue::Str(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(|f| f.trunc() as i64))
                    .unwrap_or_else(|| leading_number(s).parse().unwrap_or(0))
            }
        }
    }

    fn to_float(&self) -> f64 {
        match self {
            OptionValue::Bool(b) => f64::from(u8::from(*b)),
            OptionValue::Int(i) => *i as f64,
            OptionValue::Float(f) => *f,
            OptionValue::Str(s) => {
                let s = s.trim();
                s.parse::<f64>()
                    .unwrap_or_else(|_| leading_number(s).parse().unwrap_or(0.0))
            }
        }
    }
}

/// Leading `[+-]?digits` of a string, empty when there is none
fn leading_number(s: &str) -> &str {
    let sign = usize::from(s.starts_with(['+', '-']));
    let digits = s[sign..]
        .bytes()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits == 0 {
        ""
    } else {
        &s[..sign + digits]
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(true) => f.write_str("1"),
            OptionValue::Bool(false) => Ok(()),
            OptionValue::Int(i) => write!(f, "{}", i),
            OptionValue::Float(x) if x.fract() == 0.0 && x.abs() < 1e15 => write!(f, "{}", *x as i64),
            OptionValue::Float(x) => write!(f, "{}", x),
            OptionValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Float(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Str(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Str(value)
    }
}

/// One entry under a route id: a template / controller string or the option bag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeclValue {
    Text(String),
    Options(Options),
}

impl From<&str> for DeclValue {
    fn from(value: &str) -> Self {
        DeclValue::Text(value.to_string())
    }
}

impl From<String> for DeclValue {
    fn from(value: String) -> Self {
        DeclValue::Text(value)
    }
}

impl From<Options> for DeclValue {
    fn from(value: Options) -> Self {
        DeclValue::Options(value)
    }
}

/// Raw route input: route id → (key → value), both in declaration order
///
/// Keys are the controller label, the options label, and language codes.
///
/// ```yaml
/// TEST_ROOT:
///   __: "ControllerTest::Root"
///   FR: "fr/accueil"
///   EN: "en/home"
///   options:
///     methods: "GET HEAD"
///     sitemap: true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteDeclarations(IndexMap<String, IndexMap<String, DeclValue>>);

impl RouteDeclarations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml_str(source: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(source)
    }

    pub fn from_json_str(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Sets one key of a route, creating the route when needed
    pub fn set(&mut self, id: impl Into<String>, key: impl Into<String>, value: impl Into<DeclValue>) -> &mut Self {
        self.0
            .entry(id.into())
            .or_default()
            .insert(key.into(), value.into());
        self
    }

    pub fn get(&self, id: &str) -> Option<&IndexMap<String, DeclValue>> {
        self.0.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &IndexMap<String, DeclValue>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Deep-merges another set of declarations into this one
    ///
    /// Routes are combined by id and keys are unioned. Two option bags under
    /// the same key are unioned label by label. Any other conflict is won by
    /// `other`.
    pub fn merge(&mut self, other: RouteDeclarations) -> &mut Self {
        for (id, keys) in other.0 {
            let route = self.0.entry(id).or_default();
            for (key, value) in keys {
                match (route.get_mut(&key), value) {
                    (Some(DeclValue::Options(existing)), DeclValue::Options(incoming)) => {
                        existing.extend(incoming);
                    }
                    (_, value) => {
                        route.insert(key, value);
                    }
                }
            }
        }
        self
    }

    /// Renames every route id to `prefix + id`
    pub fn with_prefix(self, prefix: &str) -> Self {
        if prefix.is_empty() {
            return self;
        }
        Self(
            self.0
                .into_iter()
                .map(|(id, keys)| (format!("{}{}", prefix, id), keys))
                .collect(),
        )
    }
}

impl FromIterator<(String, IndexMap<String, DeclValue>)> for RouteDeclarations {
    fn from_iter<T: IntoIterator<Item = (String, IndexMap<String, DeclValue>)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
