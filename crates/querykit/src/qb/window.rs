//! Window specifications and sort items.
//!
//! ```ignore
//! use querykit::prelude::*;
//!
//! let rank = row_number().over(
//!     WindowSpec::new()
//!         .partition_by(&employees_department)
//!         .order_by(employees_salary.desc()),
//! );
//! // ROW_NUMBER() OVER (PARTITION BY "employees"."department" ORDER BY "employees"."salary" DESC)
//! ```

use crate::dialect::Dialect;
use crate::error::QueryResult;
use crate::qb::expr::{ExprNode, IntoNode};
use crate::qb::param::ParamList;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

/// NULLS ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsOrder {
    First,
    Last,
}

/// One ORDER BY item, shared by SELECT and window specifications.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub expr: ExprNode,
    pub dir: SortDir,
    pub nulls: Option<NullsOrder>,
}

impl OrderItem {
    pub fn new(expr: impl IntoNode, dir: SortDir) -> Self {
        Self {
            expr: expr.into_node(),
            dir,
            nulls: None,
        }
    }

    pub fn asc(expr: impl IntoNode) -> Self {
        Self::new(expr, SortDir::Asc)
    }

    pub fn desc(expr: impl IntoNode) -> Self {
        Self::new(expr, SortDir::Desc)
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = Some(NullsOrder::First);
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = Some(NullsOrder::Last);
        self
    }

    pub(crate) fn validate_nested(&self, dialect: &dyn Dialect) -> QueryResult<()> {
        self.expr.validate_nested(dialect)
    }

    /// Render `expr ASC|DESC [NULLS FIRST|LAST]`.
    ///
    /// Without NULLS ordering support, a leading `CASE WHEN expr IS NULL`
    /// sort key stands in for the NULLS clause; `expr` then renders twice.
    pub fn render(&self, dialect: &dyn Dialect, params: &mut ParamList) -> String {
        let dir = self.dir.as_str();
        match self.nulls {
            None => format!("{} {dir}", self.expr.render(dialect, params)),
            Some(nulls) if dialect.supports_nulls_ordering() => {
                let expr = self.expr.render(dialect, params);
                let nulls = match nulls {
                    NullsOrder::First => "NULLS FIRST",
                    NullsOrder::Last => "NULLS LAST",
                };
                format!("{expr} {dir} {nulls}")
            }
            Some(nulls) => {
                let (null_key, value_key) = match nulls {
                    NullsOrder::First => (0, 1),
                    NullsOrder::Last => (1, 0),
                };
                let key = self.expr.render(dialect, params);
                let expr = self.expr.render(dialect, params);
                format!("CASE WHEN {key} IS NULL THEN {null_key} ELSE {value_key} END, {expr} {dir}")
            }
        }
    }
}

/// Render a comma-separated ORDER BY list.
pub(crate) fn render_order_list(
    items: &[OrderItem],
    dialect: &dyn Dialect,
    params: &mut ParamList,
) -> String {
    items
        .iter()
        .map(|item| item.render(dialect, params))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Frame type: ROWS, RANGE, or GROUPS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Rows,
    Range,
    /// Falls back to ROWS where the dialect lacks GROUPS.
    Groups,
}

/// Frame boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameBound {
    UnboundedPreceding,
    Preceding(u64),
    CurrentRow,
    Following(u64),
    UnboundedFollowing,
}

impl FrameBound {
    fn render(self) -> String {
        match self {
            FrameBound::UnboundedPreceding => "UNBOUNDED PRECEDING".to_string(),
            FrameBound::Preceding(n) => format!("{n} PRECEDING"),
            FrameBound::CurrentRow => "CURRENT ROW".to_string(),
            FrameBound::Following(n) => format!("{n} FOLLOWING"),
            FrameBound::UnboundedFollowing => "UNBOUNDED FOLLOWING".to_string(),
        }
    }
}

/// Window frame clause.
///
/// Offsets are rendered inline, never bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowFrame {
    pub kind: FrameKind,
    pub start: FrameBound,
    pub end: Option<FrameBound>,
}

impl WindowFrame {
    /// Frame with just a start bound.
    pub fn new(kind: FrameKind, start: FrameBound) -> Self {
        Self {
            kind,
            start,
            end: None,
        }
    }

    /// Frame with BETWEEN start AND end.
    pub fn between(kind: FrameKind, start: FrameBound, end: FrameBound) -> Self {
        Self {
            kind,
            start,
            end: Some(end),
        }
    }

    /// ROWS BETWEEN (periods-1) PRECEDING AND CURRENT ROW
    pub fn rolling(periods: u32) -> Self {
        Self::between(
            FrameKind::Rows,
            FrameBound::Preceding(u64::from(periods.saturating_sub(1))),
            FrameBound::CurrentRow,
        )
    }

    fn render(&self, dialect: &dyn Dialect) -> String {
        let kind = match self.kind {
            FrameKind::Rows => "ROWS",
            FrameKind::Range => "RANGE",
            FrameKind::Groups if dialect.supports_groups_frame() => "GROUPS",
            FrameKind::Groups => "ROWS",
        };
        match self.end {
            None => format!("{kind} {}", self.start.render()),
            Some(end) => format!("{kind} BETWEEN {} AND {}", self.start.render(), end.render()),
        }
    }
}

/// Partition, order and frame of a window function call.
///
/// An empty specification renders `OVER ()`: the whole result set is one
/// partition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowSpec {
    partition_by: Vec<ExprNode>,
    order_by: Vec<OrderItem>,
    frame: Option<WindowFrame>,
}

impl WindowSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a PARTITION BY expression.
    pub fn partition_by(mut self, expr: impl IntoNode) -> Self {
        self.partition_by.push(expr.into_node());
        self
    }

    /// Append an ORDER BY item.
    pub fn order_by(mut self, item: OrderItem) -> Self {
        self.order_by.push(item);
        self
    }

    pub fn frame(mut self, frame: WindowFrame) -> Self {
        self.frame = Some(frame);
        self
    }

    /// `ROWS <start>`
    pub fn rows(self, start: FrameBound) -> Self {
        self.frame(WindowFrame::new(FrameKind::Rows, start))
    }

    /// `ROWS BETWEEN <start> AND <end>`
    pub fn rows_between(self, start: FrameBound, end: FrameBound) -> Self {
        self.frame(WindowFrame::between(FrameKind::Rows, start, end))
    }

    /// `RANGE <start>`
    pub fn range(self, start: FrameBound) -> Self {
        self.frame(WindowFrame::new(FrameKind::Range, start))
    }

    /// `RANGE BETWEEN <start> AND <end>`
    pub fn range_between(self, start: FrameBound, end: FrameBound) -> Self {
        self.frame(WindowFrame::between(FrameKind::Range, start, end))
    }

    /// `GROUPS <start>`
    pub fn groups(self, start: FrameBound) -> Self {
        self.frame(WindowFrame::new(FrameKind::Groups, start))
    }

    /// `GROUPS BETWEEN <start> AND <end>`
    pub fn groups_between(self, start: FrameBound, end: FrameBound) -> Self {
        self.frame(WindowFrame::between(FrameKind::Groups, start, end))
    }

    pub fn is_empty(&self) -> bool {
        self.partition_by.is_empty() && self.order_by.is_empty() && self.frame.is_none()
    }

    pub(crate) fn validate_nested(&self, dialect: &dyn Dialect) -> QueryResult<()> {
        self.partition_by
            .iter()
            .try_for_each(|e| e.validate_nested(dialect))?;
        self.order_by
            .iter()
            .try_for_each(|o| o.validate_nested(dialect))
    }

    /// Render the text between the OVER parentheses.
    pub fn render(&self, dialect: &dyn Dialect, params: &mut ParamList) -> String {
        let mut parts = Vec::new();
        if !self.partition_by.is_empty() {
            let exprs: Vec<String> = self
                .partition_by
                .iter()
                .map(|e| e.render(dialect, params))
                .collect();
            parts.push(format!("PARTITION BY {}", exprs.join(", ")));
        }
        if !self.order_by.is_empty() {
            parts.push(format!(
                "ORDER BY {}",
                render_order_list(&self.order_by, dialect, params)
            ));
        }
        if let Some(frame) = &self.frame {
            parts.push(frame.render(dialect));
        }
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{GenericDialect, MySqlDialect, PostgresDialect};
    use crate::qb::func::{row_number, sum};
    use crate::table::Table;

    fn render_spec(spec: &WindowSpec, dialect: &dyn Dialect) -> String {
        let mut params = ParamList::new();
        spec.render(dialect, &mut params)
    }

    #[test]
    fn test_empty_spec_renders_empty_over() {
        let mut params = ParamList::new();
        let sql = row_number().over(WindowSpec::new()).render(&GenericDialect, &mut params);
        assert_eq!(sql, "ROW_NUMBER() OVER ()");
    }

    #[test]
    fn test_partition_and_order() {
        let employees = Table::new("employees");
        let department = employees.typed::<String>("department");
        let salary = employees.typed::<f64>("salary");
        let mut params = ParamList::new();
        let sql = row_number()
            .over(WindowSpec::new().partition_by(&department).order_by(salary.desc()))
            .render(&PostgresDialect, &mut params);
        assert_eq!(
            sql,
            "ROW_NUMBER() OVER (PARTITION BY \"employees\".\"department\" ORDER BY \"employees\".\"salary\" DESC)"
        );
        assert!(params.is_empty());
    }

    #[test]
    fn test_frames() {
        let spec = WindowSpec::new().rows(FrameBound::UnboundedPreceding);
        assert_eq!(render_spec(&spec, &GenericDialect), "ROWS UNBOUNDED PRECEDING");

        let spec = WindowSpec::new().frame(WindowFrame::rolling(3));
        assert_eq!(
            render_spec(&spec, &GenericDialect),
            "ROWS BETWEEN 2 PRECEDING AND CURRENT ROW"
        );

        let spec = WindowSpec::new().range_between(FrameBound::Preceding(1), FrameBound::Following(1));
        assert_eq!(
            render_spec(&spec, &GenericDialect),
            "RANGE BETWEEN 1 PRECEDING AND 1 FOLLOWING"
        );
    }

    #[test]
    fn test_groups_fallback() {
        let spec = WindowSpec::new().groups_between(FrameBound::CurrentRow, FrameBound::UnboundedFollowing);
        assert_eq!(
            render_spec(&spec, &PostgresDialect),
            "GROUPS BETWEEN CURRENT ROW AND UNBOUNDED FOLLOWING"
        );
        assert_eq!(
            render_spec(&spec, &MySqlDialect),
            "ROWS BETWEEN CURRENT ROW AND UNBOUNDED FOLLOWING"
        );
    }

    #[test]
    fn test_running_total() {
        let orders = Table::new("orders");
        let amount = orders.typed::<f64>("amount");
        let placed = orders.typed::<i64>("placed_at");
        let mut params = ParamList::new();
        let sql = sum(&amount)
            .over(
                WindowSpec::new()
                    .order_by(placed.asc())
                    .rows_between(FrameBound::UnboundedPreceding, FrameBound::CurrentRow),
            )
            .render(&GenericDialect, &mut params);
        assert_eq!(
            sql,
            "SUM(\"orders\".\"amount\") OVER (ORDER BY \"orders\".\"placed_at\" ASC \
             ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW)"
        );
    }

    #[test]
    fn test_nulls_ordering_fallback() {
        let users = Table::new("users");
        let last_login = users.typed::<Option<i64>>("last_login");
        let item = last_login.desc().nulls_last();

        let mut params = ParamList::new();
        assert_eq!(
            item.render(&PostgresDialect, &mut params),
            "\"users\".\"last_login\" DESC NULLS LAST"
        );
        assert_eq!(
            item.render(&MySqlDialect, &mut params),
            "CASE WHEN `users`.`last_login` IS NULL THEN 1 ELSE 0 END, `users`.`last_login` DESC"
        );
    }
}
