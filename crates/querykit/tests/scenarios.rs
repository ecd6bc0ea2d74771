use querykit::prelude::*;
use querykit::qb::{BatchInsertBuilder, BatchStrategy, SelectBuilder};
use std::sync::Mutex;

/// Records every statement and reports one affected row per VALUES tuple.
#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<PreparedSql>>,
}

impl Recorder {
    fn seen(&self) -> Vec<PreparedSql> {
        self.seen.lock().unwrap().clone()
    }
}

impl Executor for Recorder {
    async fn execute(&self, statement: &PreparedSql) -> QueryResult<u64> {
        self.seen.lock().unwrap().push(statement.clone());
        Ok(statement.sql.matches("), (").count() as u64 + 1)
    }
}

fn users() -> (Table, Column<i32>, Column<bool>) {
    let users = Table::new("users");
    let age = users.typed::<i32>("age");
    let active = users.typed::<bool>("active");
    (users, age, active)
}

#[test]
fn scenario_a_simple_conjunction() {
    let (_, age, active) = users();
    let predicate = age.gt(18).and(active.eq(true));
    let mut params = qb::ParamList::new();
    let sql = predicate.render(&GenericDialect, &mut params);
    assert_eq!(sql, "\"users\".\"age\" > ? AND \"users\".\"active\" = ?");
    assert_eq!(params.values(), &[Value::Int(18), Value::Bool(true)]);
}

#[test]
fn scenario_b_row_number_window() {
    let employees = Table::new("employees");
    let department = employees.typed::<String>("department");
    let salary = employees.typed::<f64>("salary");
    let expr = row_number().over(
        WindowSpec::new()
            .partition_by(&department)
            .order_by(salary.desc()),
    );
    let mut params = qb::ParamList::new();
    assert_eq!(
        expr.render(&GenericDialect, &mut params),
        "ROW_NUMBER() OVER (PARTITION BY \"employees\".\"department\" ORDER BY \"employees\".\"salary\" DESC)"
    );
    assert!(params.is_empty());
}

#[test]
fn scenario_c_subquery_params_in_textual_order() {
    let (users, age, active) = users();
    let id = users.typed::<i64>("id");
    let orders = Table::new("orders");
    let user_id = orders.typed::<i64>("user_id");
    let total = orders.typed::<f64>("total");

    let big_spenders = SelectBuilder::new()
        .column(&user_id)
        .from(&orders)
        .where_clause(total.gt(100.0));
    let prepared = qb::select()
        .column(&id)
        .from(&users)
        .where_clause(age.ge(21).and(id.in_subquery(big_spenders)).and(active.eq(true)))
        .build(&PostgresDialect)
        .unwrap();

    assert_eq!(
        prepared.sql,
        "SELECT \"users\".\"id\" FROM \"users\" WHERE \"users\".\"age\" >= $1 AND \"users\".\"id\" IN \
         (SELECT \"orders\".\"user_id\" FROM \"orders\" WHERE \"orders\".\"total\" > $2) AND \"users\".\"active\" = $3"
    );
    assert_eq!(
        prepared.params,
        vec![Value::Int(21), Value::Double(100.0), Value::Bool(true)]
    );
}

#[tokio::test]
async fn scenario_d_empty_batch_executes_nothing() {
    let (users, _, _) = users();
    let recorder = Recorder::default();
    let compiler = Compiler::new(CompileConfig::new().dialect(DialectKind::Postgres));

    let outcome = compiler
        .execute_batch(&recorder, &BatchInsertBuilder::new(&users))
        .await
        .unwrap();

    assert_eq!(outcome.statements, 0);
    assert_eq!(outcome.total(), 0);
    assert!(recorder.seen().is_empty());
}

#[tokio::test]
async fn batch_multi_row_executes_every_chunk() {
    let (users, age, active) = users();
    let recorder = Recorder::default();
    let compiler = Compiler::new(
        CompileConfig::new()
            .dialect(DialectKind::Sqlite)
            .batch_strategy(BatchStrategy::MultiRow)
            .max_params(4),
    );
    let batch = qb::batch_insert(&users)
        .rows((0..5).map(|i| BatchRow::new().value(&age, 20 + i).value(&active, i % 2 == 0)));

    let outcome = compiler.execute_batch(&recorder, &batch).await.unwrap();

    assert_eq!(outcome.statements, 3);
    assert_eq!(outcome.rows, vec![0..2, 2..4, 4..5]);
    assert_eq!(outcome.rows_affected, vec![2, 2, 1]);
    assert_eq!(outcome.total(), 5);
    assert_eq!(outcome.spans().last(), Some((4..5, 1)));
    for prepared in recorder.seen() {
        assert_eq!(prepared.placeholder_count(), prepared.params.len());
    }
}

#[tokio::test]
async fn execute_rejects_before_reaching_the_executor() {
    let (users, age, _) = users();
    let recorder = Recorder::default();
    let compiler = Compiler::new(CompileConfig::new().dialect(DialectKind::MySql));
    let stmt = qb::delete(&users).where_clause(age.lt(0)).returning(&age);

    let err = compiler.execute(&recorder, &stmt).await.unwrap_err();

    assert!(err.is_unsupported());
    assert!(recorder.seen().is_empty());
}

#[test]
fn rendering_is_deterministic() {
    let (users, age, active) = users();
    let stmt = qb::select()
        .column(&age)
        .from(&users)
        .where_clause(or_any([age.in_list([1, 2]), not(active.eq(false))]))
        .order_by(age.asc().nulls_first())
        .limit(10);
    for dialect in [
        DialectKind::Generic,
        DialectKind::Postgres,
        DialectKind::Sqlite,
        DialectKind::MySql,
    ] {
        let d = dialect.dialect();
        let a = stmt.build(d.as_ref()).unwrap();
        let b = stmt.build(d.as_ref()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.cache_key(), b.cache_key());
        assert_eq!(a.placeholder_count(), a.params.len(), "{}", a.sql);
    }
}

#[test]
fn raw_fragment_markers_inside_quotes_stay_literal() {
    let (users, age, _) = users();
    let prepared = qb::select()
        .from(&users)
        .where_clause(Predicate::raw("note <> '?' AND id = ?", vec![Value::Int(7)]).and(age.gt(1)))
        .build(&PostgresDialect)
        .unwrap();
    assert_eq!(
        prepared.sql,
        "SELECT * FROM \"users\" WHERE (note <> '?' AND id = $1) AND \"users\".\"age\" > $2"
    );
    assert_eq!(prepared.placeholder_count(), prepared.params.len());
    assert_eq!(prepared.params, vec![Value::Int(7), Value::Int(1)]);
}

#[test]
fn empty_groups_and_lists() {
    let (users, age, _) = users();
    let prepared = qb::select()
        .from(&users)
        .where_clause(and_all([]).and(or_any([])).and(age.in_list([])).and(age.not_in([])))
        .build(&PostgresDialect)
        .unwrap();
    assert_eq!(
        prepared.sql,
        "SELECT * FROM \"users\" WHERE 1 = 0 AND 1 = 0 AND 1 = 1"
    );
    assert!(prepared.params.is_empty());
}

#[test]
fn double_negation_is_identity() {
    let (_, age, _) = users();
    let p = age.between(1, 9);
    assert_eq!(not(not(p.clone())), p);
}
