//! Query-string encoding.
//!
//! Options are emitted in a fixed order regardless of how they were set:
//! `$select`, `$filter`, `$search`, `$apply`, `$orderby`, `$top`, `$skip`,
//! `$count`, `$expand`.

use chrono::SecondsFormat;

use super::Filter;
use super::ODataOptions;
use super::key;
use crate::model::Value;

/// Characters left as-is by [`encode_component`], besides ASCII alphanumerics.
const SAFE: &str = "-_.~$()',;=:/@*";

/// Percent-encodes `s` for use in a URL path or query value.
///
/// OData punctuation (`$ ( ) ' , ; = : / @ *`) is kept readable; everything
/// else outside the unreserved set is encoded.
pub fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut buf = [0u8; 4];
    for ch in s.chars() {
        if ch.is_ascii_alphanumeric() || SAFE.contains(ch) {
            out.push(ch);
        } else {
            out.push_str(&urlencoding::encode(ch.encode_utf8(&mut buf)));
        }
    }
    out
}

/// Renders the options as `(name, value)` pairs in canonical order.
pub(crate) fn option_pairs(options: &ODataOptions) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();

    if let Some(select) = options.get::<key::Select>().filter(|s| !s.is_empty()) {
        pairs.push(("$select", select.join(",")));
    }

    if let Some(filter) = options.get::<key::Filter>() {
        let rendered = filter_to_odata(filter);
        if !rendered.is_empty() {
            pairs.push(("$filter", rendered));
        }
    }

    if let Some(search) = options.get::<key::Search>() {
        pairs.push(("$search", search.clone()));
    }

    let mut apply: Vec<String> = options
        .get::<key::Transform>()
        .cloned()
        .unwrap_or_default();
    if let Some(group_by) = options.get::<key::GroupBy>() {
        apply.push(group_by.to_string());
    }
    if !apply.is_empty() {
        pairs.push(("$apply", apply.join("/")));
    }

    if let Some(order) = options.get::<key::OrderBy>() {
        pairs.push(("$orderby", order.to_string()));
    }

    if let Some(top) = options.get::<key::Top>() {
        pairs.push(("$top", top.to_string()));
    }

    if let Some(skip) = options.get::<key::Skip>() {
        pairs.push(("$skip", skip.to_string()));
    }

    if let Some(count) = options.get::<key::Count>() {
        pairs.push(("$count", count.to_string()));
    }

    if let Some(expands) = options.get::<key::Expand>().filter(|e| !e.is_empty()) {
        let clauses: Vec<_> = expands.iter().map(|e| e.to_odata()).collect();
        pairs.push(("$expand", clauses.join(",")));
    }

    pairs
}

/// Builds the encoded query string (without the leading `?`).
pub fn query_string(options: &ODataOptions) -> String {
    option_pairs(options)
        .into_iter()
        .map(|(name, value)| format!("{}={}", name, encode_component(&value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Builds the `;`-separated option list used inside `$expand`.
pub(crate) fn nested_query(options: &ODataOptions) -> String {
    option_pairs(options)
        .into_iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join(";")
}

/// Converts a `Filter` to an OData `$filter` expression.
pub fn filter_to_odata(filter: &Filter) -> String {
    match filter {
        Filter::Eq(field, value) => format!("{} eq {}", field, value_to_odata(value)),
        Filter::Ne(field, value) => format!("{} ne {}", field, value_to_odata(value)),
        Filter::Gt(field, value) => format!("{} gt {}", field, value_to_odata(value)),
        Filter::Ge(field, value) => format!("{} ge {}", field, value_to_odata(value)),
        Filter::Lt(field, value) => format!("{} lt {}", field, value_to_odata(value)),
        Filter::Le(field, value) => format!("{} le {}", field, value_to_odata(value)),
        Filter::In(field, values) => {
            let values: Vec<_> = values.iter().map(value_to_odata).collect();
            format!("{} in ({})", field, values.join(","))
        }
        Filter::Contains(field, value) => format!("contains({},{})", field, escape_string(value)),
        Filter::StartsWith(field, value) => {
            format!("startswith({},{})", field, escape_string(value))
        }
        Filter::EndsWith(field, value) => format!("endswith({},{})", field, escape_string(value)),
        Filter::IsNull(field) => format!("{} eq null", field),
        Filter::IsNotNull(field) => format!("{} ne null", field),
        Filter::Any {
            collection,
            variable,
            filter,
        } => format!("{}/any({}:{})", collection, variable, filter_to_odata(filter)),
        Filter::All {
            collection,
            variable,
            filter,
        } => format!("{}/all({}:{})", collection, variable, filter_to_odata(filter)),
        Filter::And(filters) => join_filters(filters, " and "),
        Filter::Or(filters) => join_filters(filters, " or "),
        Filter::Not(inner) => format!("not ({})", filter_to_odata(inner)),
        Filter::Raw(raw) => raw.clone(),
    }
}

fn join_filters(filters: &[Filter], operator: &str) -> String {
    let parts: Vec<_> = filters
        .iter()
        .map(filter_to_odata)
        .filter(|s| !s.is_empty())
        .collect();
    match parts.len() {
        0 => String::new(),
        1 => parts[0].clone(),
        _ => format!("({})", parts.join(operator)),
    }
}

/// Converts a `Value` to an OData literal.
pub fn value_to_odata(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(n) => n.to_string(),
        Value::Float(n) => {
            let s = n.to_string();
            if s.contains('.') || s.contains('e') || s.contains("inf") || s.contains("NaN") {
                s
            } else {
                format!("{}.0", s)
            }
        }
        Value::String(s) => escape_string(s),
        Value::Guid(g) => g.to_string(),
        Value::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
    }
}

/// Quotes a string literal, doubling embedded single quotes.
pub fn escape_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;
    use crate::api::query::ExpandBuilder;
    use crate::api::query::GroupBy;
    use crate::api::query::OrderBy;

    #[test]
    fn test_simple_filters() {
        assert_eq!(
            filter_to_odata(&Filter::eq("FirstName", "Scott")),
            "FirstName eq 'Scott'"
        );
        assert_eq!(filter_to_odata(&Filter::gt("Age", 30)), "Age gt 30");
        assert_eq!(
            filter_to_odata(&Filter::is_null("MiddleName")),
            "MiddleName eq null"
        );
    }

    #[test]
    fn test_string_functions() {
        assert_eq!(
            filter_to_odata(&Filter::contains("LastName", "hyt")),
            "contains(LastName,'hyt')"
        );
        assert_eq!(
            filter_to_odata(&Filter::ends_with("Emails", "@example.com")),
            "endswith(Emails,'@example.com')"
        );
    }

    #[test]
    fn test_combined_and_negated_filters() {
        let filter = Filter::and([Filter::eq("Gender", "Male"), Filter::gt("Age", 30)]);
        assert_eq!(filter_to_odata(&filter), "(Gender eq 'Male' and Age gt 30)");

        let negated = filter.not();
        assert_eq!(
            filter_to_odata(&negated),
            "not ((Gender eq 'Male' and Age gt 30))"
        );

        assert_eq!(filter_to_odata(&Filter::and([])), "");
        assert_eq!(
            filter_to_odata(&Filter::or([Filter::eq("A", 1)])),
            "A eq 1"
        );
    }

    #[test]
    fn test_lambda_and_in() {
        let filter = Filter::any("Trips", "t", Filter::gt("t/Budget", 3000));
        assert_eq!(filter_to_odata(&filter), "Trips/any(t:t/Budget gt 3000)");

        let filter = Filter::is_in("UserName", ["russellwhyte", "scottketchum"]);
        assert_eq!(
            filter_to_odata(&filter),
            "UserName in ('russellwhyte','scottketchum')"
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(value_to_odata(&Value::Float(2.0)), "2.0");
        assert_eq!(value_to_odata(&Value::Float(2.5)), "2.5");
        assert_eq!(value_to_odata(&Value::Bool(true)), "true");
        assert_eq!(escape_string("O'Brien"), "'O''Brien'");

        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(value_to_odata(&Value::DateTime(dt)), "2024-03-01T12:30:00Z");
    }

    #[test]
    fn test_encode_component() {
        assert_eq!(encode_component("Name eq 'a b'"), "Name%20eq%20'a%20b'");
        assert_eq!(encode_component("a&b+c#d"), "a%26b%2Bc%23d");
        assert_eq!(encode_component("Trips($top=2)"), "Trips($top=2)");
    }

    #[test]
    fn test_query_string_order() {
        let mut options = ODataOptions::new();
        options
            .set::<key::Expand>(vec![ExpandBuilder::new("Friends")])
            .set::<key::Count>(true)
            .set::<key::Skip>(20)
            .set::<key::Top>(10)
            .set::<key::OrderBy>(OrderBy::asc("LastName"))
            .set::<key::Filter>(Filter::eq("Gender", "Female"))
            .set::<key::Select>(vec!["FirstName".to_string(), "LastName".to_string()]);

        assert_eq!(
            query_string(&options),
            "$select=FirstName,LastName&$filter=Gender%20eq%20'Female'&$orderby=LastName%20asc\
             &$top=10&$skip=20&$count=true&$expand=Friends"
        );
    }

    #[test]
    fn test_apply_combines_transform_and_group_by() {
        let mut options = ODataOptions::new();
        options
            .set::<key::GroupBy>(GroupBy::new(["Country"]))
            .set::<key::Transform>(vec!["filter(Budget gt 0)".to_string()]);

        assert_eq!(
            option_pairs(&options),
            vec![("$apply", "filter(Budget gt 0)/groupby((Country))".to_string())]
        );
    }

    #[test]
    fn test_empty_options() {
        assert_eq!(query_string(&ODataOptions::new()), "");
    }
}
