//! The driver seam between the query builder and a concrete sqlx database.
//!
//! Binding and decoding need concrete argument and row types, so each supported
//! database implements [`Backend`] once and the rest of the crate stays generic.

mod mysql;
mod sqlite;

use crate::value::{Kind, Param, Value};
use sqlx::Database;
use std::future::Future;

/// A sqlx [`Database`] the query builder can drive.
pub trait Backend: Database {
    /// Prepares positional `sql` on `connection`.
    fn prepare(
        connection: &mut Self::Connection,
        sql: &str,
    ) -> impl Future<Output = Result<Self::Statement<'static>, sqlx::Error>> + Send;

    /// Binds `values` in position order and returns every row.
    fn fetch_all(
        connection: &mut Self::Connection,
        statement: &Self::Statement<'static>,
        values: Vec<Param>,
    ) -> impl Future<Output = Result<Vec<Self::Row>, sqlx::Error>> + Send;

    /// Binds `values` in position order and runs the statement as a command.
    ///
    /// With `generated_keys` set, returns the first key generated by this
    /// statement, or 0 when it inserted nothing. Otherwise returns 0.
    fn execute(
        connection: &mut Self::Connection,
        statement: &Self::Statement<'static>,
        values: Vec<Param>,
        generated_keys: bool,
    ) -> impl Future<Output = Result<i64, sqlx::Error>> + Send;

    /// Reads column `column` of `row` as `kind`.
    ///
    /// `Mapping` columns come back as [`Value::Text`]; decoding them is up to the
    /// caller's codec. Null numeric and boolean columns read as zero/false.
    fn read(row: &Self::Row, column: usize, kind: Kind) -> Result<Value, sqlx::Error>;
}
