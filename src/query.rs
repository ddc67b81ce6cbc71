use crate::backend::Backend;
use crate::builder::{build_query, ParsedQuery};
use crate::codec::MappingCodec;
use crate::describe::Describe;
use crate::error::Error;
use crate::policy::FieldPolicy;
use crate::source::DataSource;
use crate::value::{Param, Timestamp, Value};
use sqlx::pool::PoolConnection;

/// A prepared statement and the pooled connection it was prepared on.
///
/// Dropping it releases both: the statement first, then the connection goes
/// back to the pool. Every exit path of a [`QueryBuilder`] ends here.
pub(crate) struct BoundStatement<DB: Backend> {
    pub(crate) statement: DB::Statement<'static>,
    pub(crate) connection: PoolConnection<DB>,
}

impl<DB: Backend> Drop for BoundStatement<DB> {
    fn drop(&mut self) {
        tracing::trace!(database = DB::NAME, "releasing statement and connection");
    }
}

/// A one-shot query built from a template with named placeholders.
///
/// `QueryBuilder` acquires a connection and prepares the statement as soon as it
/// is created. Values are bound by name with the typed setters or in bulk with
/// [`set_object`](Self::set_object), then exactly one terminal call
/// ([`execute_query`](Self::execute_query),
/// [`execute_query_single`](Self::execute_query_single) or
/// [`execute_update`](Self::execute_update)) runs it. Every method takes `self`,
/// so the statement and its connection are released whenever the builder is
/// consumed or dropped, whether the call succeeded or not.
///
/// An empty template yields an inert builder: no connection is acquired and the
/// terminal calls return empty results.
///
/// # Type Parameters
///
/// * `DB` - The sqlx database driven through [`Backend`]
///
/// # Examples
///
/// ```rust,no_run
/// use sqlx::{MySql, MySqlPool};
/// use sqlx_named_mapper::{DataSource, QueryBuilder};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = MySqlPool::connect("mysql://localhost/traccar").await?;
/// let source = DataSource::new(pool);
///
/// let id = QueryBuilder::create_with_keys(
///     &source,
///     "INSERT INTO device (name, uniqueid) VALUES (:name, :uniqueId)",
///     true,
/// )
/// .await?
/// .set_string("name", Some("Truck-1"))
/// .set_string("uniqueId", Some("123456"))
/// .execute_update()
/// .await?;
/// println!("Inserted device {id}");
/// # Ok(())
/// # }
/// ```
pub struct QueryBuilder<DB: Backend> {
    query: ParsedQuery,
    values: Vec<Option<Param>>,
    codec: MappingCodec,
    policy: FieldPolicy,
    generated_keys: bool,
    bound: Option<BoundStatement<DB>>,
}

impl<DB: Backend> QueryBuilder<DB> {
    /// Creates a builder for `template` on a connection from `source`.
    ///
    /// # Arguments
    ///
    /// * `source` - Connection pool plus the codec and field policy to use
    /// * `template` - SQL with named placeholders (e.g. `:deviceId`)
    ///
    /// # Errors
    ///
    /// Returns an error if no connection can be acquired or the database rejects
    /// the statement. The connection is released before the error is returned.
    pub async fn create(source: &DataSource<DB>, template: &str) -> crate::Result<Self> {
        Self::create_with_keys(source, template, false).await
    }

    /// Like [`create`](Self::create); with `generated_keys` set,
    /// [`execute_update`](Self::execute_update) returns the generated key.
    pub async fn create_with_keys(
        source: &DataSource<DB>,
        template: &str,
        generated_keys: bool,
    ) -> crate::Result<Self> {
        let query = build_query(template)?;
        let mut builder = Self {
            values: vec![None; query.len()],
            query,
            codec: source.codec(),
            policy: source.policy(),
            generated_keys,
            bound: None,
        };
        if builder.query.sql().is_empty() {
            return Ok(builder);
        }

        let mut connection = source.pool().acquire().await?;
        // On failure `connection` is dropped here, which hands it back to the pool.
        let statement = DB::prepare(&mut *connection, builder.query.sql()).await?;
        tracing::debug!(
            database = DB::NAME,
            sql = builder.query.sql(),
            placeholders = builder.query.len(),
            "prepared statement"
        );

        builder.bound = Some(BoundStatement {
            statement,
            connection,
        });
        Ok(builder)
    }

    /// The positional SQL sent to the database.
    pub fn sql(&self) -> &str {
        self.query.sql()
    }

    /// Binds `value` to every occurrence of `:name`.
    pub fn set_boolean(mut self, name: &str, value: bool) -> Self {
        self.assign(name, Param::Boolean(value));
        self
    }

    /// Binds `value` to every occurrence of `:name`.
    pub fn set_integer(mut self, name: &str, value: i32) -> Self {
        self.assign(name, Param::Integer(value));
        self
    }

    /// Binds `value` to every occurrence of `:name`.
    pub fn set_long(mut self, name: &str, value: i64) -> Self {
        self.assign(name, Param::Long(value));
        self
    }

    /// Binds `value` to every occurrence of `:name`.
    pub fn set_double(mut self, name: &str, value: f64) -> Self {
        self.assign(name, Param::Double(value));
        self
    }

    /// Binds `value` to every occurrence of `:name`; `None` binds a text `NULL`.
    pub fn set_string(mut self, name: &str, value: Option<&str>) -> Self {
        self.assign(name, Param::Text(value.map(str::to_owned)));
        self
    }

    /// Binds `value` to every occurrence of `:name`; `None` binds a timestamp `NULL`.
    pub fn set_date(mut self, name: &str, value: Option<Timestamp>) -> Self {
        self.assign(name, Param::Timestamp(value));
        self
    }

    /// Binds any [`Value`] to every occurrence of `:name`.
    ///
    /// A [`Value::Mapping`] is encoded with the source's codec and bound as text.
    ///
    /// # Errors
    ///
    /// Returns a codec error when a mapping cannot be encoded. The builder is
    /// consumed, releasing its connection.
    pub fn set_value(mut self, name: &str, value: Value) -> crate::Result<Self> {
        let value = self.encode(value)?;
        self.assign(name, value);
        Ok(self)
    }

    /// Binds every described field of `object` whose name appears in the template.
    ///
    /// Fields without a matching placeholder are ignored. A field whose mapping
    /// cannot be encoded is handled by the source's [`FieldPolicy`]: skipped with
    /// a warning when lenient, returned as an error when strict.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use sqlx::MySqlPool;
    /// use sqlx_named_mapper::{impl_describe, DataSource, QueryBuilder};
    ///
    /// #[derive(Debug, Default)]
    /// struct Event {
    ///     device_id: i64,
    ///     event_code: i32,
    /// }
    ///
    /// impl_describe!(Event {
    ///     device_id as "deviceId": i64,
    ///     event_code as "eventCode": i32,
    /// });
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let source = DataSource::new(MySqlPool::connect("mysql://localhost/test").await?);
    /// let event = Event { device_id: 7, event_code: 100 };
    /// QueryBuilder::create(
    ///     &source,
    ///     "DELETE FROM events WHERE deviceid = :deviceId AND code = :eventCode",
    /// )
    /// .await?
    /// .set_object(&event)?
    /// .execute_update()
    /// .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn set_object<T: Describe>(mut self, object: &T) -> crate::Result<Self> {
        for field in T::fields() {
            if self.query.indexes(field.name()).is_empty() {
                continue;
            }
            match self.encode(field.get(object)) {
                Ok(value) => self.assign(field.name(), value),
                Err(error) => self.policy.handle(field.name(), error)?,
            }
        }
        Ok(self)
    }

    /// Runs the statement as a command.
    ///
    /// # Returns
    ///
    /// The first generated key when the builder was created with
    /// `generated_keys`, otherwise 0. An inert builder returns 0.
    ///
    /// # Errors
    ///
    /// Returns an error if a placeholder was never bound or the database rejects
    /// the statement.
    pub async fn execute_update(self) -> crate::Result<i64> {
        let generated_keys = self.generated_keys;
        let Some((mut bound, values)) = self.into_execution()? else {
            return Ok(0);
        };

        Ok(DB::execute(&mut *bound.connection, &bound.statement, values, generated_keys).await?)
    }

    pub(crate) fn codec(&self) -> MappingCodec {
        self.codec
    }

    pub(crate) fn policy(&self) -> FieldPolicy {
        self.policy
    }

    /// Splits the builder into its bound statement and the values for each
    /// position, or `None` for an inert builder.
    pub(crate) fn into_execution(self) -> crate::Result<Option<(BoundStatement<DB>, Vec<Param>)>> {
        let Some(bound) = self.bound else {
            return Ok(None);
        };
        let values = self
            .values
            .into_iter()
            .zip(self.query.order())
            .map(|(value, name)| value.ok_or_else(|| Error::UnboundPlaceholder(name.clone())))
            .collect::<crate::Result<Vec<_>>>()?;
        Ok(Some((bound, values)))
    }

    fn encode(&self, value: Value) -> crate::Result<Param> {
        Ok(match value {
            Value::Boolean(value) => Param::Boolean(value),
            Value::Integer(value) => Param::Integer(value),
            Value::Long(value) => Param::Long(value),
            Value::Double(value) => Param::Double(value),
            Value::Text(value) => Param::Text(value),
            Value::Timestamp(value) => Param::Timestamp(value),
            Value::Mapping(attributes) => Param::Text(Some(self.codec.encode(&attributes)?)),
        })
    }

    fn assign(&mut self, name: &str, value: Param) {
        for &position in self.query.indexes(name) {
            self.values[position - 1] = Some(value.clone());
        }
    }
}
