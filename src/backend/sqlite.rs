use super::Backend;
use crate::value::{Kind, Param, Timestamp, Value};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnection, SqliteRow, SqliteStatement};
use sqlx::{Executor, Row, Sqlite, Statement};

type Q<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

const LAST_INSERT_ROWID: &str = "SELECT last_insert_rowid()";

fn bind(query: Q<'_>, value: Param) -> Q<'_> {
    match value {
        Param::Boolean(value) => query.bind(value),
        Param::Integer(value) => query.bind(value),
        Param::Long(value) => query.bind(value),
        Param::Double(value) => query.bind(value),
        Param::Text(value) => query.bind(value),
        Param::Timestamp(value) => query.bind(value),
    }
}

impl Backend for Sqlite {
    async fn prepare(
        connection: &mut SqliteConnection,
        sql: &str,
    ) -> Result<SqliteStatement<'static>, sqlx::Error> {
        let statement = connection.prepare(sql).await?;
        Ok(Statement::to_owned(&statement))
    }

    async fn fetch_all(
        connection: &mut SqliteConnection,
        statement: &SqliteStatement<'static>,
        values: Vec<Param>,
    ) -> Result<Vec<SqliteRow>, sqlx::Error> {
        let query = values.into_iter().fold(statement.query(), bind);
        query.fetch_all(connection).await
    }

    async fn execute(
        connection: &mut SqliteConnection,
        statement: &SqliteStatement<'static>,
        values: Vec<Param>,
        generated_keys: bool,
    ) -> Result<i64, sqlx::Error> {
        let query = values.into_iter().fold(statement.query(), bind);
        if !generated_keys {
            query.execute(connection).await?;
            return Ok(0);
        }

        // last_insert_rowid() is connection-wide; only a change made by this
        // statement is a generated key.
        let before: i64 = sqlx::query_scalar(LAST_INSERT_ROWID)
            .fetch_one(&mut *connection)
            .await?;
        let result = query.execute(&mut *connection).await?;
        let after = result.last_insert_rowid();
        if result.rows_affected() > 0 && after != before {
            Ok(after)
        } else {
            Ok(0)
        }
    }

    fn read(row: &SqliteRow, column: usize, kind: Kind) -> Result<Value, sqlx::Error> {
        Ok(match kind {
            Kind::Boolean => Value::Boolean(row.try_get::<Option<bool>, _>(column)?.unwrap_or_default()),
            Kind::Integer => Value::Integer(row.try_get::<Option<i32>, _>(column)?.unwrap_or_default()),
            Kind::Long => Value::Long(row.try_get::<Option<i64>, _>(column)?.unwrap_or_default()),
            Kind::Double => Value::Double(row.try_get::<Option<f64>, _>(column)?.unwrap_or_default()),
            Kind::Text | Kind::Mapping => Value::Text(row.try_get::<Option<String>, _>(column)?),
            Kind::Timestamp => Value::Timestamp(row.try_get::<Option<Timestamp>, _>(column)?),
        })
    }
}
