// File: src/filter.rs
// Purpose: Criteria for selecting routes by method, option values and language

use indexmap::{IndexMap, IndexSet};

use crate::declaration::{OptionType, OptionValue};
use crate::error::Result;
use crate::table::RouteEntry;

/// Route selection criteria for [`Router::filter`](crate::Router::filter)
///
/// # Examples
///
/// ```
/// use rhtmx_i18n_router::{Filter, OptionType};
///
/// let filter = Filter::new()
///     .methods(["get"])
///     .option("sitemap", "1", OptionType::Bool)
///     .try_option("priority", "3", "int")
///     .unwrap()
///     .lang("EN");
/// assert_eq!(filter.target_lang(), Some("EN"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    methods: IndexSet<String>,
    options: IndexMap<String, (OptionValue, OptionType)>,
    lang: Option<String>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds requested methods (upper-cased)
    pub fn methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.methods
            .extend(methods.into_iter().map(|m| m.as_ref().to_ascii_uppercase()));
        self
    }

    /// Requires an option to equal `value` once both are converted to `kind`
    pub fn option(mut self, label: impl Into<String>, value: impl Into<OptionValue>, kind: OptionType) -> Self {
        let value = value.into().coerce(kind);
        self.options.insert(label.into(), (value, kind));
        self
    }

    /// Same as [`option`](Self::option) with the type given by name
    pub fn try_option(self, label: impl Into<String>, value: &str, kind: &str) -> Result<Self> {
        let kind: OptionType = kind.parse()?;
        Ok(self.option(label, value, kind))
    }

    /// Language of the returned routes (defaults to the current one)
    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn target_lang(&self) -> Option<&str> {
        self.lang.as_deref().filter(|lang| !lang.is_empty())
    }

    /// Whether an entry satisfies every criterion
    ///
    /// With methods requested, the entry must declare at least one of them;
    /// an entry without declared methods never matches a method filter.
    /// Each filtered option must exist on the entry and be equal after
    /// conversion.
    pub fn matches(&self, entry: &RouteEntry) -> bool {
        let method_ok = self.methods.is_empty()
            || entry.methods().iter().any(|method| self.methods.contains(method));

        method_ok
            && self.options.iter().all(|(label, (expected, kind))| {
                entry
                    .option(label)
                    .is_some_and(|value| value.coerce(*kind) == *expected)
            })
    }
}
