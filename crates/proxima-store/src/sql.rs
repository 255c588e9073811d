//! SQL rendering of proximity queries for MySQL-like and Postgres-like engines.
//!
//! The rendered statement wraps the address table in a subquery so the
//! computed `distance` column can be filtered by alias:
//!
//! ```text
//! SELECT subquery.* FROM (
//!     SELECT addresses.*, content.<numeric columns>, <haversine> AS distance
//!     FROM addresses INNER JOIN content ON ...
//!     WHERE <row filters>
//!     HAVING <post-aggregation filters>
//! ) AS subquery
//! WHERE <pre-aggregation filters on computed columns>
//! ORDER BY subquery.distance
//! ```
//!
//! MySQL accepts `HAVING` on select aliases without `GROUP BY`, Postgres does
//! not, which is why the placement of distance predicates differs.

use proxima_core::models::{
    Bound, ColumnExpr, ComputedColumn, Join, Placement, Predicate, Scalar, DISTANCE_COLUMN,
};
use proxima_core::ports::QueryBuilder;
use proxima_geo::HaversineCalculator;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Address columns selected by the subquery
const ADDRESS_COLUMNS: [&str; 13] = [
    "element_id",
    "site_id",
    "field_id",
    "street1",
    "street2",
    "city",
    "state",
    "zip",
    "neighborhood",
    "county",
    "country",
    "lat",
    "lng",
];

/// Database flavour a query is rendered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    MySql,
    Postgres,
}

impl SqlDialect {
    /// MySQL filters on computed columns in `HAVING`
    pub fn post_aggregation_only(&self) -> bool {
        matches!(self, SqlDialect::MySql)
    }

    /// Placeholder for the `n`th parameter (1-based)
    pub fn placeholder(&self, n: usize) -> String {
        match self {
            SqlDialect::MySql => "?".to_string(),
            SqlDialect::Postgres => format!("${}", n),
        }
    }

    /// Quote an identifier
    pub fn quote(&self, ident: &str) -> String {
        match self {
            SqlDialect::MySql => format!("`{}`", ident.replace('`', "``")),
            SqlDialect::Postgres => format!("\"{}\"", ident.replace('"', "\"\"")),
        }
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlDialect::MySql => write!(f, "mysql"),
            SqlDialect::Postgres => write!(f, "postgres"),
        }
    }
}

/// A bound parameter value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlParam {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<&Scalar> for SqlParam {
    fn from(value: &Scalar) -> Self {
        match value {
            Scalar::Text(s) => SqlParam::Text(s.clone()),
            Scalar::Number(n) => SqlParam::Float(*n),
        }
    }
}

/// SQL text with its parameters in placeholder order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedSql {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

/// Query builder that renders to SQL
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    dialect: SqlDialect,
    site_id: Option<u64>,
    joins: Vec<Join>,
    columns: Vec<ComputedColumn>,
    predicates: Vec<(Predicate, Placement)>,
}

/// Clause of the statement a predicate is rendered into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clause {
    /// Subquery `WHERE`, on raw address rows
    InnerWhere,

    /// Subquery `HAVING`
    Having,

    /// Outer `WHERE`, on computed columns of the subquery
    OuterWhere,
}

impl Clause {
    fn of(predicate: &Predicate, placement: Placement) -> Self {
        match (placement, predicate) {
            (Placement::PostAggregation, _) => Clause::Having,
            (Placement::PreAggregation, Predicate::DistanceWithin(_)) => Clause::OuterWhere,
            (Placement::PreAggregation, _) => Clause::InnerWhere,
        }
    }
}

/// Collects parameters while numbering placeholders in text order
struct Params {
    dialect: SqlDialect,
    values: Vec<SqlParam>,
}

impl Params {
    fn push(&mut self, value: SqlParam) -> String {
        self.values.push(value);
        self.dialect.placeholder(self.values.len())
    }
}

impl SqlQuery {
    pub fn new(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            site_id: None,
            joins: Vec::new(),
            columns: Vec::new(),
            predicates: Vec::new(),
        }
    }

    /// Query elements of one site
    pub fn for_site(mut self, site_id: u64) -> Self {
        self.site_id = Some(site_id);
        self
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    /// Render the statement
    pub fn render(&self) -> RenderedSql {
        let calculator = HaversineCalculator::new();
        let mut params = Params {
            dialect: self.dialect,
            values: Vec::new(),
        };

        // Inner select list
        let mut inner_select: Vec<String> = ADDRESS_COLUMNS
            .iter()
            .map(|column| format!("addresses.{}", column))
            .collect();
        for column in self.content_columns() {
            let quoted = self.dialect.quote(&column);
            inner_select.push(format!("content.{} AS {}", quoted, quoted));
        }

        let mut outer_select = vec!["subquery.*".to_string()];
        for column in &self.columns {
            let alias = self.dialect.quote(&column.alias);
            match &column.expr {
                ColumnExpr::Null => inner_select.push(format!("NULL AS {}", alias)),
                ColumnExpr::Distance(expr) => inner_select.push(format!(
                    "{} AS {}",
                    calculator.sql(expr, "addresses.lat", "addresses.lng"),
                    alias
                )),
                ColumnExpr::Alias(source) => outer_select.push(format!(
                    "subquery.{} AS {}",
                    self.dialect.quote(source),
                    alias
                )),
            }
        }

        // Inner WHERE: joins, then row filters
        let mut inner_where = Vec::new();
        for join in &self.joins {
            inner_where.push(format!(
                "addresses.field_id = {}",
                params.push(SqlParam::Int(join.field_id as i64))
            ));
            if join.match_element_site {
                match self.site_id {
                    Some(site) => inner_where.push(format!(
                        "addresses.site_id = {}",
                        params.push(SqlParam::Int(site as i64))
                    )),
                    None => inner_where.push("addresses.site_id = content.site_id".to_string()),
                }
            }
        }

        // Sections are rendered in text order so positional placeholders line up
        for predicate in self.predicates_in(Clause::InnerWhere) {
            inner_where.push(self.render_predicate(predicate, Some("addresses"), &mut params));
        }
        let having: Vec<String> = self
            .predicates_in(Clause::Having)
            .map(|predicate| self.render_predicate(predicate, None, &mut params))
            .collect();
        let outer_where: Vec<String> = self
            .predicates_in(Clause::OuterWhere)
            .map(|predicate| self.render_predicate(predicate, Some("subquery"), &mut params))
            .collect();

        let mut sql = format!(
            "SELECT {} FROM (SELECT {} FROM addresses \
             INNER JOIN content ON content.element_id = addresses.element_id \
             AND content.site_id = addresses.site_id",
            outer_select.join(", "),
            inner_select.join(", ")
        );
        if !inner_where.is_empty() {
            sql.push_str(&format!(" WHERE {}", inner_where.join(" AND ")));
        }
        if !having.is_empty() {
            sql.push_str(&format!(" HAVING {}", having.join(" AND ")));
        }
        sql.push_str(") AS subquery");
        if !outer_where.is_empty() {
            sql.push_str(&format!(" WHERE {}", outer_where.join(" AND ")));
        }
        if self.columns.iter().any(|c| c.alias == DISTANCE_COLUMN) {
            sql.push_str(&format!(
                " ORDER BY subquery.{} ASC",
                self.dialect.quote(DISTANCE_COLUMN)
            ));
        }

        RenderedSql {
            sql,
            params: params.values,
        }
    }

    /// Predicates rendered into one clause, in insertion order
    fn predicates_in(&self, clause: Clause) -> impl Iterator<Item = &Predicate> + '_ {
        self.predicates
            .iter()
            .filter(move |(predicate, placement)| Clause::of(predicate, *placement) == clause)
            .map(|(predicate, _)| predicate)
    }

    /// Numeric content columns referenced by reverse radius predicates
    fn content_columns(&self) -> BTreeSet<String> {
        self.predicates
            .iter()
            .filter_map(|(predicate, _)| match predicate {
                Predicate::DistanceWithin(Bound::Column(column)) => Some(column.clone()),
                _ => None,
            })
            .collect()
    }

    /// Render one predicate; `table` qualifies column references, `None`
    /// leaves them bare for `HAVING`
    fn render_predicate(
        &self,
        predicate: &Predicate,
        table: Option<&str>,
        params: &mut Params,
    ) -> String {
        let column = |name: &str| match table {
            Some(table) => format!("{}.{}", table, self.dialect.quote(name)),
            None => self.dialect.quote(name),
        };

        match predicate {
            Predicate::DistanceWithin(Bound::Fixed(range)) => {
                format!("{} <= {}", column(DISTANCE_COLUMN), params.push(SqlParam::Float(*range)))
            }
            Predicate::DistanceWithin(Bound::Column(limit)) => {
                format!("{} <= {}", column(DISTANCE_COLUMN), column(limit))
            }
            Predicate::SubfieldIn { subfield, values } => {
                let alternatives: Vec<String> = values
                    .iter()
                    .map(|value| format!("{} = {}", column(subfield), params.push(value.into())))
                    .collect();
                if alternatives.len() == 1 {
                    alternatives.join("")
                } else {
                    format!("({})", alternatives.join(" OR "))
                }
            }
            Predicate::HasCoordinates => format!(
                "NOT ({} IS NULL OR {} IS NULL)",
                column("lat"),
                column("lng")
            ),
        }
    }
}

impl QueryBuilder for SqlQuery {
    fn add_join(&mut self, join: Join) {
        self.joins.push(join);
    }

    fn add_computed_column(&mut self, column: ComputedColumn) {
        self.columns.push(column);
    }

    fn add_predicate(&mut self, predicate: Predicate, placement: Placement) {
        self.predicates.push((predicate, placement));
    }

    fn supports_post_aggregation_filter_only(&self) -> bool {
        self.dialect.post_aggregation_only()
    }
}
