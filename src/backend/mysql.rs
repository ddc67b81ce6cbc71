use super::Backend;
use crate::value::{Kind, Param, Timestamp, Value};
use sqlx::mysql::{MySqlArguments, MySqlConnection, MySqlRow, MySqlStatement};
use sqlx::query::Query;
use sqlx::{Executor, MySql, Row, Statement};

type Q<'q> = Query<'q, MySql, MySqlArguments>;

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

impl Backend for MySql {
    async fn prepare(
        connection: &mut MySqlConnection,
        sql: &str,
    ) -> Result<MySqlStatement<'static>, sqlx::Error> {
        let statement = connection.prepare(sql).await?;
        Ok(Statement::to_owned(&statement))
    }

    async fn fetch_all(
        connection: &mut MySqlConnection,
        statement: &MySqlStatement<'static>,
        values: Vec<Param>,
    ) -> Result<Vec<MySqlRow>, sqlx::Error> {
        let query = values.into_iter().fold(statement.query(), bind);
        query.fetch_all(connection).await
    }

    async fn execute(
        connection: &mut MySqlConnection,
        statement: &MySqlStatement<'static>,
        values: Vec<Param>,
        generated_keys: bool,
    ) -> Result<i64, sqlx::Error> {
        let query = values.into_iter().fold(statement.query(), bind);
        let result = query.execute(connection).await?;
        // The OK packet carries the id generated by this statement, 0 if none.
        if generated_keys {
            Ok(i64::try_from(result.last_insert_id()).unwrap_or_default())
        } else {
            Ok(0)
        }
    }

    fn read(row: &MySqlRow, column: usize, kind: Kind) -> Result<Value, sqlx::Error> {
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
