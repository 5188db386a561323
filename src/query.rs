//! Shared machinery for the paginated/filterable list endpoints.
//!
//! Every admin listing (brands, products, templates, inventory, orders) goes
//! through the same pipeline: lenient parameter normalization, an allow-listed
//! sort key, a tagged filter specification, and a count + page fetch that run
//! in one transaction so both observe the same snapshot.

use sea_orm::sea_query::{Expr, ExprTrait, SimpleExpr, extension::postgres::PgExpr};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, Order, PaginatorTrait,
    QuerySelect, Select, TransactionTrait, Value,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::response::PageMeta;

/// Raw query parameters common to all list endpoints. Every field arrives as
/// an optional string; invalid numbers fall back to defaults instead of
/// failing the request.
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct ListParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub filter_status: Option<String>,
}

/// Normalized pagination and sort request.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
    pub search: String,
    pub sort_by: Option<String>,
    pub order: Order,
}

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

impl ListParams {
    pub fn normalize(&self) -> PageRequest {
        let page = self
            .page
            .as_deref()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);
        let page_size = self
            .page_size
            .as_deref()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let order = match self.sort_order.as_deref() {
            Some("asc") => Order::Asc,
            _ => Order::Desc,
        };
        PageRequest {
            page,
            page_size,
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            sort_by: self.sort_by.clone(),
            order,
        }
    }
}

impl PageRequest {
    pub fn skip(&self) -> u64 {
        // Saturate: page is client-controlled and may be arbitrarily large.
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

/// Per-resource sort allow-list. An unknown `sort_by` falls back to the
/// default column; the raw string never reaches the query builder.
pub struct SortSpec<C: ColumnTrait + Copy> {
    pub default: C,
    pub allowed: &'static [(&'static str, C)],
}

impl<C: ColumnTrait + Copy> SortSpec<C> {
    pub const fn new(default: C, allowed: &'static [(&'static str, C)]) -> Self {
        Self { default, allowed }
    }

    pub fn resolve(&self, requested: Option<&str>) -> C {
        requested
            .and_then(|name| {
                self.allowed
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, col)| *col)
            })
            .unwrap_or(self.default)
    }
}

/// One clause in a list filter. Columns are addressed as `(Entity, Column)`
/// expressions so clauses can target joined tables.
pub enum Clause {
    Eq(Expr, Value),
    Contains(Expr, String),
    Between(Expr, Value, Value),
}

impl Clause {
    fn into_expr(self) -> SimpleExpr {
        match self {
            Clause::Eq(target, value) => target.eq(value),
            Clause::Contains(target, term) => target.ilike(format!("%{term}%")),
            Clause::Between(target, lo, hi) => target.between(lo, hi),
        }
    }
}

/// Tagged filter specification: AND-combined clauses plus an OR-combined
/// case-insensitive substring search across declared targets. Absent filters
/// contribute no constraint.
#[derive(Default)]
pub struct ListFilter {
    clauses: Vec<Clause>,
    search_term: String,
    search_targets: Vec<Expr>,
}

impl ListFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn and_eq(self, target: Expr, value: impl Into<Value>) -> Self {
        self.and(Clause::Eq(target, value.into()))
    }

    pub fn and_eq_opt<V: Into<Value>>(self, target: Expr, value: Option<V>) -> Self {
        match value {
            Some(v) => self.and_eq(target, v),
            None => self,
        }
    }

    pub fn search(mut self, term: &str, targets: Vec<Expr>) -> Self {
        self.search_term = term.to_string();
        self.search_targets = targets;
        self
    }

    pub fn into_condition(self) -> Condition {
        let mut cond = Condition::all();
        for clause in self.clauses {
            cond = cond.add(clause.into_expr());
        }
        if !self.search_term.is_empty() && !self.search_targets.is_empty() {
            let pattern = format!("%{}%", self.search_term);
            let mut any = Condition::any();
            for target in self.search_targets {
                any = any.add(target.ilike(pattern.clone()));
            }
            cond = cond.add(any);
        }
        cond
    }
}

/// Run the count and the page fetch for a prepared finder. Both queries
/// execute inside one transaction so the total and the page are mutually
/// consistent; staleness across requests is accepted.
pub async fn paginate<E>(
    conn: &DatabaseConnection,
    finder: Select<E>,
    page: &PageRequest,
) -> Result<(Vec<E::Model>, PageMeta), DbErr>
where
    E: EntityTrait,
    E::Model: Send + Sync,
{
    let txn = conn.begin().await?;
    let total = finder.clone().count(&txn).await?;
    let rows = finder
        .offset(page.skip())
        .limit(page.page_size)
        .all(&txn)
        .await?;
    txn.commit().await?;
    Ok((rows, PageMeta::new(page.page, page.page_size, total)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::products::{Column, Entity as Products};
    use sea_orm::{DbBackend, IdenStatic, QueryFilter, QueryTrait};

    fn to_sql(cond: Condition) -> String {
        Products::find()
            .filter(cond)
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn normalize_defaults_on_missing_input() {
        let req = ListParams::default().normalize();
        assert_eq!(req.page, 1);
        assert_eq!(req.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(req.search, "");
        assert!(matches!(req.order, Order::Desc));
    }

    #[test]
    fn normalize_defaults_on_invalid_input() {
        let params = ListParams {
            page: Some("banana".into()),
            page_size: Some("-3".into()),
            sort_order: Some("sideways".into()),
            ..Default::default()
        };
        let req = params.normalize();
        assert_eq!(req.page, 1);
        assert_eq!(req.page_size, DEFAULT_PAGE_SIZE);
        assert!(matches!(req.order, Order::Desc));
    }

    #[test]
    fn normalize_clamps_page_size() {
        let params = ListParams {
            page_size: Some("5000".into()),
            ..Default::default()
        };
        assert_eq!(params.normalize().page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn normalize_accepts_asc() {
        let params = ListParams {
            sort_order: Some("asc".into()),
            ..Default::default()
        };
        assert!(matches!(params.normalize().order, Order::Asc));
    }

    #[test]
    fn skip_is_page_minus_one_times_size() {
        let params = ListParams {
            page: Some("3".into()),
            page_size: Some("25".into()),
            ..Default::default()
        };
        assert_eq!(params.normalize().skip(), 50);
    }

    #[test]
    fn skip_saturates_on_huge_page() {
        let params = ListParams {
            page: Some(u64::MAX.to_string()),
            page_size: Some("100".into()),
            ..Default::default()
        };
        assert_eq!(params.normalize().skip(), u64::MAX);
    }

    #[test]
    fn sort_spec_resolves_allowed_keys() {
        let spec = SortSpec::new(
            Column::UpdatedAt,
            &[("name", Column::Name), ("price", Column::Price)],
        );
        assert_eq!(spec.resolve(Some("price")).as_str(), "price");
    }

    #[test]
    fn sort_spec_falls_back_on_unknown_key() {
        let spec = SortSpec::new(Column::UpdatedAt, &[("name", Column::Name)]);
        assert_eq!(
            spec.resolve(Some("password_hash; DROP")).as_str(),
            "updated_at"
        );
        assert_eq!(spec.resolve(None).as_str(), "updated_at");
    }

    // An empty Condition::all() renders as WHERE TRUE, which is still
    // unconstrained; check for actual clauses instead of the keyword.
    fn assert_no_clauses(sql: &str) {
        assert!(!sql.contains("ILIKE"), "unexpected constraint: {sql}");
        assert!(!sql.contains(" = "), "unexpected constraint: {sql}");
        assert!(!sql.contains("BETWEEN"), "unexpected constraint: {sql}");
    }

    #[test]
    fn empty_filter_is_unconstrained() {
        assert_no_clauses(&to_sql(ListFilter::new().into_condition()));
    }

    #[test]
    fn blank_search_contributes_no_constraint() {
        let sql = to_sql(
            ListFilter::new()
                .search("", vec![Expr::col(Column::Name)])
                .into_condition(),
        );
        assert_no_clauses(&sql);
    }

    #[test]
    fn search_is_case_insensitive_and_or_combined() {
        let cond = ListFilter::new().search(
            "boil",
            vec![
                Expr::col((Products, Column::Name)),
                Expr::col((Products, Column::Description)),
            ],
        );
        let sql = to_sql(cond.into_condition());
        assert!(sql.contains("ILIKE"), "expected ILIKE in: {sql}");
        assert!(sql.contains("OR"), "expected OR in: {sql}");
        assert!(sql.contains("%boil%"));
    }

    #[test]
    fn clauses_and_search_are_and_combined() {
        let cond = ListFilter::new()
            .and_eq(Expr::col((Products, Column::Status)), "ACTIVE")
            .search("kettle", vec![Expr::col((Products, Column::Name))]);
        let sql = to_sql(cond.into_condition());
        assert!(sql.contains("AND"), "expected AND in: {sql}");
    }
}
