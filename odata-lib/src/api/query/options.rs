//! The option bag behind every query.

use std::collections::HashMap;

use super::ExpandBuilder;
use super::Filter;
use super::GroupBy;
use super::OrderBy;

/// The query options a [`QueryBuilder`](super::QueryBuilder) understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryOption {
    Select,
    Filter,
    Search,
    GroupBy,
    Transform,
    OrderBy,
    Top,
    Skip,
    Expand,
    Count,
}

impl QueryOption {
    /// Every option, in declaration order.
    pub const ALL: [QueryOption; 10] = [
        QueryOption::Select,
        QueryOption::Filter,
        QueryOption::Search,
        QueryOption::GroupBy,
        QueryOption::Transform,
        QueryOption::OrderBy,
        QueryOption::Top,
        QueryOption::Skip,
        QueryOption::Expand,
        QueryOption::Count,
    ];

    /// The option's name (`"select"`, `"orderBy"`, ...).
    pub fn name(self) -> &'static str {
        match self {
            QueryOption::Select => "select",
            QueryOption::Filter => "filter",
            QueryOption::Search => "search",
            QueryOption::GroupBy => "groupBy",
            QueryOption::Transform => "transform",
            QueryOption::OrderBy => "orderBy",
            QueryOption::Top => "top",
            QueryOption::Skip => "skip",
            QueryOption::Expand => "expand",
            QueryOption::Count => "count",
        }
    }
}

impl std::fmt::Display for QueryOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A value stored under one [`QueryOption`].
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Select(Vec<String>),
    Filter(Filter),
    Search(String),
    GroupBy(GroupBy),
    Transform(Vec<String>),
    OrderBy(OrderBy),
    Top(usize),
    Skip(usize),
    Expand(Vec<ExpandBuilder>),
    Count(bool),
}

impl OptionValue {
    /// The option this value belongs to.
    pub fn option(&self) -> QueryOption {
        match self {
            OptionValue::Select(_) => QueryOption::Select,
            OptionValue::Filter(_) => QueryOption::Filter,
            OptionValue::Search(_) => QueryOption::Search,
            OptionValue::GroupBy(_) => QueryOption::GroupBy,
            OptionValue::Transform(_) => QueryOption::Transform,
            OptionValue::OrderBy(_) => QueryOption::OrderBy,
            OptionValue::Top(_) => QueryOption::Top,
            OptionValue::Skip(_) => QueryOption::Skip,
            OptionValue::Expand(_) => QueryOption::Expand,
            OptionValue::Count(_) => QueryOption::Count,
        }
    }
}

/// Typed access to one query option.
///
/// Implemented by the marker types in [`key`]; lets [`ODataOptions`] expose
/// `get`/`set`/`unset` with the value type fixed per option.
pub trait OptionKey {
    /// The option this key addresses.
    const OPTION: QueryOption;
    /// The value type stored under the option.
    type Value;

    fn wrap(value: Self::Value) -> OptionValue;
    fn peek(value: &OptionValue) -> Option<&Self::Value>;
    fn peek_mut(value: &mut OptionValue) -> Option<&mut Self::Value>;
}

macro_rules! option_key {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Typed key for the `", stringify!($name), "` option.")]
            #[derive(Debug, Clone, Copy)]
            pub struct $name;

            impl OptionKey for $name {
                const OPTION: QueryOption = QueryOption::$name;
                type Value = $ty;

                fn wrap(value: $ty) -> OptionValue {
                    OptionValue::$name(value)
                }

                fn peek(value: &OptionValue) -> Option<&$ty> {
                    match value {
                        OptionValue::$name(v) => Some(v),
                        _ => None,
                    }
                }

                fn peek_mut(value: &mut OptionValue) -> Option<&mut $ty> {
                    match value {
                        OptionValue::$name(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

/// Marker types for [`ODataOptions::get`], [`ODataOptions::set`] and
/// [`ODataOptions::unset`].
pub mod key {
    use super::*;

    option_key! {
        Select => Vec<String>,
        Filter => super::Filter,
        Search => String,
        GroupBy => super::GroupBy,
        Transform => Vec<String>,
        OrderBy => super::OrderBy,
        Top => usize,
        Skip => usize,
        Expand => Vec<super::ExpandBuilder>,
        Count => bool,
    }
}

/// Mapping of query options to their values.
///
/// Each option appears at most once. Ordering of the rendered query string is
/// fixed by the encoder, not by insertion order.
///
/// # Example
///
/// ```
/// use odata_lib::api::query::{key, ODataOptions, QueryOption};
///
/// let mut options = ODataOptions::new();
/// options.set::<key::Top>(10).set::<key::Search>("blue".to_string());
/// assert_eq!(options.get::<key::Top>(), Some(&10));
///
/// options.keep(&[QueryOption::Search]);
/// assert!(options.get::<key::Top>().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ODataOptions {
    values: HashMap<QueryOption, OptionValue>,
}

impl ODataOptions {
    /// Creates an empty option bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of option `K`, if set.
    pub fn get<K: OptionKey>(&self) -> Option<&K::Value> {
        self.values.get(&K::OPTION).and_then(K::peek)
    }

    /// Returns a mutable reference to the value of option `K`, if set.
    pub fn get_mut<K: OptionKey>(&mut self) -> Option<&mut K::Value> {
        self.values.get_mut(&K::OPTION).and_then(K::peek_mut)
    }

    /// Sets option `K`, replacing any previous value.
    pub fn set<K: OptionKey>(&mut self, value: K::Value) -> &mut Self {
        self.values.insert(K::OPTION, K::wrap(value));
        self
    }

    /// Removes option `K`.
    pub fn unset<K: OptionKey>(&mut self) -> &mut Self {
        self.values.remove(&K::OPTION);
        self
    }

    /// Returns the untyped value stored under `option`.
    pub fn get_option(&self, option: QueryOption) -> Option<&OptionValue> {
        self.values.get(&option)
    }

    /// Stores an untyped value under its own option.
    pub fn insert(&mut self, value: OptionValue) -> &mut Self {
        self.values.insert(value.option(), value);
        self
    }

    /// Removes `option`, returning its previous value.
    pub fn remove(&mut self, option: QueryOption) -> Option<OptionValue> {
        self.values.remove(&option)
    }

    /// Returns `true` if `option` is set.
    pub fn contains(&self, option: QueryOption) -> bool {
        self.values.contains_key(&option)
    }

    /// Removes every option.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Removes every option not listed in `options`.
    pub fn keep(&mut self, options: &[QueryOption]) {
        self.values.retain(|option, _| options.contains(option));
    }

    /// Copies every option of `other` into this bag, `other` winning on
    /// conflicts.
    pub fn merge(&mut self, other: &ODataOptions) {
        for (option, value) in &other.values {
            self.values.insert(*option, value.clone());
        }
    }

    /// Returns the number of options set.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no option is set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over the set options in [`QueryOption`] order.
    pub fn iter(&self) -> impl Iterator<Item = &OptionValue> {
        QueryOption::ALL
            .iter()
            .filter_map(|option| self.values.get(option))
    }
}
