//! Aggregation (`$apply=groupby(...)`).

/// Aggregation method applied to a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateMethod {
    Sum,
    Min,
    Max,
    Average,
    CountDistinct,
}

impl AggregateMethod {
    fn as_str(self) -> &'static str {
        match self {
            AggregateMethod::Sum => "sum",
            AggregateMethod::Min => "min",
            AggregateMethod::Max => "max",
            AggregateMethod::Average => "average",
            AggregateMethod::CountDistinct => "countdistinct",
        }
    }
}

/// One aggregate expression inside `aggregate(...)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregate {
    /// `property with method as alias`
    Property {
        property: String,
        method: AggregateMethod,
        alias: String,
    },
    /// `$count as alias`
    Count { alias: String },
}

impl Aggregate {
    /// Aggregates `property` with `method`, exposing the result as `alias`.
    pub fn new(property: impl Into<String>, method: AggregateMethod, alias: impl Into<String>) -> Self {
        Aggregate::Property {
            property: property.into(),
            method,
            alias: alias.into(),
        }
    }

    /// Counts the members of each group.
    pub fn count(alias: impl Into<String>) -> Self {
        Aggregate::Count { alias: alias.into() }
    }
}

impl std::fmt::Display for Aggregate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Aggregate::Property {
                property,
                method,
                alias,
            } => write!(f, "{} with {} as {}", property, method.as_str(), alias),
            Aggregate::Count { alias } => write!(f, "$count as {}", alias),
        }
    }
}

/// A `groupby` transformation.
///
/// # Example
///
/// ```
/// use odata_lib::api::query::{Aggregate, AggregateMethod, GroupBy};
///
/// let group = GroupBy::new(["Country"])
///     .aggregate(Aggregate::new("Budget", AggregateMethod::Sum, "Total"));
/// assert_eq!(group.to_string(), "groupby((Country),aggregate(Budget with sum as Total))");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBy {
    properties: Vec<String>,
    aggregates: Vec<Aggregate>,
}

impl GroupBy {
    /// Groups by the given properties.
    pub fn new<S: Into<String>>(properties: impl IntoIterator<Item = S>) -> Self {
        Self {
            properties: properties.into_iter().map(Into::into).collect(),
            aggregates: Vec::new(),
        }
    }

    /// Adds an aggregate computed per group.
    pub fn aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregates.push(aggregate);
        self
    }

    /// Returns the grouping properties.
    pub fn properties(&self) -> &[String] {
        &self.properties
    }
}

impl std::fmt::Display for GroupBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "groupby(({})", self.properties.join(","))?;
        if !self.aggregates.is_empty() {
            let aggregates: Vec<String> = self.aggregates.iter().map(ToString::to_string).collect();
            write!(f, ",aggregate({})", aggregates.join(","))?;
        }
        f.write_str(")")
    }
}
