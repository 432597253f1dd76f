//! Dynamic SQL fragment construction for partial updates and filtered list
//! queries. Everything here is pure string/value assembly: no query is ever
//! executed from this module, and user input only ever reaches the database
//! through positional bind parameters.

use serde::Deserialize;
use sqlx::postgres::PgArguments;
use sqlx::Arguments;

use crate::errors::AppError;

/// A scalar destined for a bind parameter. Each variant is typed so a NULL
/// still carries the column type the driver needs.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(Option<String>),
    Int(Option<i32>),
    Float(Option<f64>),
    Bool(Option<bool>),
}

impl SqlValue {
    /// Encodes this value onto a Postgres argument list.
    pub fn add_to(&self, args: &mut PgArguments) {
        match self {
            SqlValue::Text(v) => args.add(v.clone()),
            SqlValue::Int(v) => args.add(*v),
            SqlValue::Float(v) => args.add(*v),
            SqlValue::Bool(v) => args.add(*v),
        }
    }
}

/// Collects builder output into the positional argument list for one
/// statement. Argument order matches placeholder numbering exactly.
pub fn arguments(values: &[SqlValue]) -> PgArguments {
    let mut args = PgArguments::default();
    for value in values {
        value.add_to(&mut args);
    }
    args
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(Some(v))
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(Some(v.to_string()))
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(Some(v))
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(Some(v))
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(Some(v))
    }
}

/// A `SET` clause fragment plus its bind values, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialUpdate {
    pub set_clause: String,
    pub values: Vec<SqlValue>,
}

/// Builds the `SET` fragment for a partial UPDATE from a sparse field list.
///
/// Each `(logical_name, value)` pair at position i (1-based) becomes
/// `"physical_name"=$i`, where the physical name comes from `renames` when
/// the logical name is listed there and is the logical name unchanged
/// otherwise. `values` parallels the field order exactly.
///
/// Fails with [`AppError::NoData`] if `fields` is empty, before any SQL text
/// is assembled. An UPDATE with an empty SET clause must never be issued.
pub fn partial_update(
    fields: Vec<(&str, SqlValue)>,
    renames: &[(&str, &str)],
) -> Result<PartialUpdate, AppError> {
    if fields.is_empty() {
        return Err(AppError::NoData);
    }

    let mut assignments = Vec::with_capacity(fields.len());
    let mut values = Vec::with_capacity(fields.len());

    for (idx, (logical, value)) in fields.into_iter().enumerate() {
        let physical = renames
            .iter()
            .find(|(from, _)| *from == logical)
            .map(|(_, to)| *to)
            .unwrap_or(logical);
        assignments.push(format!("\"{}\"=${}", physical, idx + 1));
        values.push(value);
    }

    Ok(PartialUpdate {
        set_clause: assignments.join(", "),
        values,
    })
}

/// A `WHERE` fragment (empty when no filter is active), its bind values, and
/// the fixed sort column for the entity kind.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterQuery {
    pub where_clause: String,
    pub values: Vec<SqlValue>,
    pub order_by: &'static str,
}

/// Per-call accumulator for predicate fragments and placeholder numbering.
/// Scoped entirely to one `build`; numbering never leaks across calls.
struct PredicateList {
    predicates: Vec<String>,
    values: Vec<SqlValue>,
}

impl PredicateList {
    fn new() -> Self {
        Self {
            predicates: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Appends a predicate using the next unused 1-based placeholder.
    fn push_bound(&mut self, template: &str, value: SqlValue) {
        self.predicates
            .push(format!("{} ${}", template, self.values.len() + 1));
        self.values.push(value);
    }

    /// Appends a fixed predicate that takes no parameter.
    fn push_fixed(&mut self, predicate: &str) {
        self.predicates.push(predicate.to_string());
    }

    fn finish(self, order_by: &'static str) -> FilterQuery {
        FilterQuery {
            where_clause: self.predicates.join(" AND "),
            values: self.values,
            order_by,
        }
    }
}

// An absent, empty, or zero filter value means "not requested". hasEquity is
// only active when explicitly true; false is identical to absent. Both
// behaviors are load-bearing: callers depend on the generated query text.

fn active_text(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

fn active_i32(v: Option<i32>) -> Option<i32> {
    v.filter(|n| *n != 0)
}

/// Recognized query filters for the company list endpoint. Unknown keys are
/// rejected at deserialization, before any SQL is built.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyFilters {
    pub name: Option<String>,
    pub min_employees: Option<i32>,
    pub max_employees: Option<i32>,
}

impl CompanyFilters {
    /// Builds the WHERE fragment. Filters apply in a fixed order (name,
    /// minEmployees, maxEmployees) so placeholder numbering is stable.
    pub fn build(&self) -> FilterQuery {
        let mut list = PredicateList::new();

        if let Some(name) = active_text(&self.name) {
            list.push_bound("name ILIKE", SqlValue::from(format!("%{name}%")));
        }
        if let Some(min) = active_i32(self.min_employees) {
            list.push_bound("num_employees >=", SqlValue::from(min));
        }
        if let Some(max) = active_i32(self.max_employees) {
            list.push_bound("num_employees <=", SqlValue::from(max));
        }

        list.finish("name")
    }
}

/// Recognized query filters for the job list endpoint.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobFilters {
    pub title: Option<String>,
    pub min_salary: Option<i32>,
    pub has_equity: Option<bool>,
}

impl JobFilters {
    /// Builds the WHERE fragment. Fixed order: title, minSalary, hasEquity.
    /// The equity predicate is a constant comparison and binds no parameter.
    pub fn build(&self) -> FilterQuery {
        let mut list = PredicateList::new();

        if let Some(title) = active_text(&self.title) {
            list.push_bound("title ILIKE", SqlValue::from(format!("%{title}%")));
        }
        if let Some(min) = active_i32(self.min_salary) {
            list.push_bound("salary >=", SqlValue::from(min));
        }
        if self.has_equity == Some(true) {
            list.push_fixed("equity > 0");
        }

        list.finish("title")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_update_translates_listed_names_only() {
        let result = partial_update(
            vec![
                ("firstName", SqlValue::from("Aliya")),
                ("age", SqlValue::from(32)),
            ],
            &[("firstName", "first_name")],
        )
        .unwrap();

        assert_eq!(result.set_clause, "\"first_name\"=$1, \"age\"=$2");
        assert_eq!(
            result.values,
            vec![SqlValue::from("Aliya"), SqlValue::from(32)]
        );
    }

    #[test]
    fn partial_update_without_renames_passes_names_through() {
        let result = partial_update(
            vec![("name", SqlValue::from("Acme"))],
            &[],
        )
        .unwrap();

        assert_eq!(result.set_clause, "\"name\"=$1");
        assert_eq!(result.values, vec![SqlValue::from("Acme")]);
    }

    #[test]
    fn partial_update_placeholder_count_matches_values() {
        let result = partial_update(
            vec![
                ("a", SqlValue::from(1)),
                ("b", SqlValue::from(true)),
                ("c", SqlValue::Text(None)),
            ],
            &[],
        )
        .unwrap();

        let placeholders = result.set_clause.matches('$').count();
        assert_eq!(placeholders, result.values.len());
        assert_eq!(result.set_clause, "\"a\"=$1, \"b\"=$2, \"c\"=$3");
    }

    #[test]
    fn partial_update_rejects_empty_field_map() {
        let err = partial_update(vec![], &[("x", "y")]).unwrap_err();
        assert!(matches!(err, AppError::NoData));
    }

    #[test]
    fn partial_update_is_deterministic() {
        let fields = || {
            vec![
                ("logoUrl", SqlValue::from("http://a.io/x.png")),
                ("numEmployees", SqlValue::from(12)),
            ]
        };
        let renames = [("logoUrl", "logo_url"), ("numEmployees", "num_employees")];
        let first = partial_update(fields(), &renames).unwrap();
        let second = partial_update(fields(), &renames).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn company_filters_empty_means_full_scan() {
        let fq = CompanyFilters::default().build();
        assert_eq!(fq.where_clause, "");
        assert!(fq.values.is_empty());
        assert_eq!(fq.order_by, "name");
    }

    #[test]
    fn company_filters_apply_in_fixed_order() {
        let fq = CompanyFilters {
            name: Some("net".to_string()),
            min_employees: Some(10),
            max_employees: Some(50),
        }
        .build();

        assert_eq!(
            fq.where_clause,
            "name ILIKE $1 AND num_employees >= $2 AND num_employees <= $3"
        );
        assert_eq!(
            fq.values,
            vec![
                SqlValue::from("%net%"),
                SqlValue::from(10),
                SqlValue::from(50)
            ]
        );
    }

    #[test]
    fn company_filters_single_bound() {
        let fq = CompanyFilters {
            max_employees: Some(200),
            ..Default::default()
        }
        .build();

        assert_eq!(fq.where_clause, "num_employees <= $1");
        assert_eq!(fq.values, vec![SqlValue::from(200)]);
    }

    #[test]
    fn company_filters_skip_empty_and_zero() {
        let fq = CompanyFilters {
            name: Some(String::new()),
            min_employees: Some(0),
            max_employees: None,
        }
        .build();

        assert_eq!(fq.where_clause, "");
        assert!(fq.values.is_empty());
    }

    #[test]
    fn job_filters_equity_true_binds_nothing() {
        let fq = JobFilters {
            has_equity: Some(true),
            ..Default::default()
        }
        .build();

        assert_eq!(fq.where_clause, "equity > 0");
        assert!(fq.values.is_empty());
        assert_eq!(fq.order_by, "title");
    }

    #[test]
    fn job_filters_equity_false_is_not_requested() {
        let fq = JobFilters {
            has_equity: Some(false),
            ..Default::default()
        }
        .build();

        assert_eq!(fq.where_clause, "");
        assert!(fq.values.is_empty());
    }

    #[test]
    fn job_filters_combined() {
        let fq = JobFilters {
            title: Some("engineer".to_string()),
            min_salary: Some(90000),
            has_equity: Some(true),
        }
        .build();

        assert_eq!(
            fq.where_clause,
            "title ILIKE $1 AND salary >= $2 AND equity > 0"
        );
        assert_eq!(
            fq.values,
            vec![SqlValue::from("%engineer%"), SqlValue::from(90000)]
        );
    }

    #[test]
    fn filter_build_is_idempotent() {
        let filters = JobFilters {
            title: Some("dev".to_string()),
            min_salary: Some(1),
            has_equity: Some(true),
        };
        assert_eq!(filters.build(), filters.build());
    }

    // Filter structs arrive through the urlencoded query string, so the
    // key-legality tests go through the same deserializer the extractor uses.

    #[test]
    fn company_filters_reject_unknown_query_keys() {
        let parsed: Result<CompanyFilters, _> =
            serde_urlencoded::from_str("name=net&symbol=Test&city=Atlanta");
        assert!(parsed.is_err());
    }

    #[test]
    fn company_filters_parse_all_recognized_query_keys() {
        let parsed: CompanyFilters =
            serde_urlencoded::from_str("name=net&minEmployees=100&maxEmployees=200").unwrap();
        assert_eq!(parsed.name.as_deref(), Some("net"));
        assert_eq!(parsed.min_employees, Some(100));
        assert_eq!(parsed.max_employees, Some(200));
    }

    #[test]
    fn job_filters_parse_equity_flag_from_query_string() {
        let parsed: JobFilters =
            serde_urlencoded::from_str("title=dev&minSalary=50000&hasEquity=true").unwrap();
        assert_eq!(parsed.has_equity, Some(true));
        assert_eq!(parsed.min_salary, Some(50000));
    }

    #[test]
    fn job_filters_reject_unknown_query_keys() {
        let parsed: Result<JobFilters, _> = serde_urlencoded::from_str("title=dev&location=remote");
        assert!(parsed.is_err());
    }
}
