use crate::backend::Backend;
use crate::codec::MappingCodec;
use crate::describe::{Describe, Field};
use crate::policy::FieldPolicy;
use crate::query::QueryBuilder;
use crate::value::{Kind, Value};
use sqlx::{Column, Statement};

struct Binding<T: 'static> {
    field: &'static Field<T>,
    column: usize,
}

/// The fields of `T` that have a matching result column, in field order.
///
/// Built once per query from the statement's column metadata and applied to
/// every row.
pub(crate) struct BindingPlan<T: 'static> {
    bindings: Vec<Binding<T>>,
}

impl<T: Describe> BindingPlan<T> {
    pub(crate) fn new(columns: &[String]) -> Self {
        let bindings = T::fields()
            .iter()
            .filter_map(|field| {
                columns
                    .iter()
                    .position(|column| field.matches(column))
                    .map(|column| Binding { field, column })
            })
            .collect();
        Self { bindings }
    }

    pub(crate) fn len(&self) -> usize {
        self.bindings.len()
    }

    fn materialize<DB: Backend>(
        &self,
        row: &DB::Row,
        codec: MappingCodec,
        policy: FieldPolicy,
    ) -> crate::Result<T> {
        let mut object = T::instantiate()?;
        for Binding { field, column } in &self.bindings {
            let value = match (field.kind(), DB::read(row, *column, field.kind())?) {
                // Null timestamps and mappings leave the field at its default.
                (_, Value::Timestamp(None)) | (Kind::Mapping, Value::Text(None)) => continue,
                (Kind::Mapping, Value::Text(Some(text))) => match codec.decode(&text) {
                    Ok(attributes) => Value::Mapping(attributes),
                    Err(error) => {
                        policy.handle(field.name(), error.into())?;
                        continue;
                    }
                },
                (_, value) => value,
            };
            policy.check(field.name(), field.set(&mut object, value))?;
        }
        Ok(object)
    }
}

fn column_names<DB: Backend>(statement: &DB::Statement<'static>) -> Vec<String> {
    statement
        .columns()
        .iter()
        .map(|column| column.name().to_owned())
        .collect()
}

impl<DB: Backend> QueryBuilder<DB> {
    /// Executes the query and materializes one `T` per row.
    ///
    /// Only fields of `T` whose name matches a result column (ignoring case) are
    /// written; the others keep their default value.
    ///
    /// # Returns
    ///
    /// The rows in result order. An inert builder returns an empty vector.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A placeholder was never bound
    /// - The query fails or a column cannot be decoded as its field's kind
    /// - `T` cannot be instantiated
    /// - A field fails under [`FieldPolicy::Strict`]
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use sqlx::MySqlPool;
    /// use sqlx_named_mapper::{impl_describe, DataSource, QueryBuilder};
    ///
    /// #[derive(Debug, Default)]
    /// struct Device {
    ///     id: i64,
    ///     name: String,
    /// }
    ///
    /// impl_describe!(Device { id: i64, name: String });
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let source = DataSource::new(MySqlPool::connect("mysql://localhost/test").await?);
    /// let devices: Vec<Device> = QueryBuilder::create(
    ///     &source,
    ///     "SELECT id, name FROM device WHERE groupid = :groupId",
    /// )
    /// .await?
    /// .set_long("groupId", 3)
    /// .execute_query()
    /// .await?;
    /// println!("Found {} devices", devices.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn execute_query<T: Describe>(self) -> crate::Result<Vec<T>> {
        let codec = self.codec();
        let policy = self.policy();
        let Some((mut bound, values)) = self.into_execution()? else {
            return Ok(Vec::new());
        };

        let plan = BindingPlan::<T>::new(&column_names::<DB>(&bound.statement));
        let rows = DB::fetch_all(&mut *bound.connection, &bound.statement, values).await?;
        drop(bound);

        tracing::trace!(rows = rows.len(), fields = plan.len(), "materializing rows");
        rows.iter()
            .map(|row| plan.materialize::<DB>(row, codec, policy))
            .collect()
    }

    /// Executes the query and returns the first materialized row, if any.
    ///
    /// This runs the full query; it does not add a row limit.
    ///
    /// # Errors
    ///
    /// Same as [`execute_query`](Self::execute_query).
    pub async fn execute_query_single<T: Describe>(self) -> crate::Result<Option<T>> {
        Ok(self.execute_query().await?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{memory_source, Device};
    use crate::Error;

    async fn seed(source: &crate::DataSource<sqlx::Sqlite>, statements: &[&str]) {
        for statement in statements {
            sqlx::query(statement).execute(source.pool()).await.unwrap();
        }
    }

    #[test]
    fn test_plan_matches_columns_ignoring_case() {
        let columns = vec!["NAME".to_string(), "other".to_string(), "Id".to_string(), "SpeedLimit".to_string()];
        let plan = BindingPlan::<Device>::new(&columns);

        let bound: Vec<(&str, usize)> = plan
            .bindings
            .iter()
            .map(|binding| (binding.field.name(), binding.column))
            .collect();
        assert_eq!(bound, vec![("id", 2), ("name", 0), ("speedLimit", 3)]);
    }

    #[tokio::test]
    async fn test_unmatched_fields_keep_defaults() {
        let source = memory_source().await;
        seed(
            &source,
            &["INSERT INTO device (id, name, uniqueid, groupid, speedlimit) VALUES (1, 'Truck-1', 'u1', 4, 90.0)"],
        )
        .await;

        let devices: Vec<Device> = QueryBuilder::create(&source, "SELECT ID, UniqueId FROM device")
            .await
            .unwrap()
            .execute_query()
            .await
            .unwrap();

        assert_eq!(
            devices,
            vec![Device {
                id: 1,
                unique_id: Some("u1".into()),
                ..Device::default()
            }]
        );
    }

    #[tokio::test]
    async fn test_single_returns_first_or_none() {
        let source = memory_source().await;
        seed(
            &source,
            &[
                "INSERT INTO device (id, name, groupid) VALUES (1, 'one', 1)",
                "INSERT INTO device (id, name, groupid) VALUES (2, 'two', 1)",
            ],
        )
        .await;
        let select = "SELECT id, name FROM device WHERE groupid = :groupId ORDER BY id DESC";

        let first: Option<Device> = QueryBuilder::create(&source, select)
            .await
            .unwrap()
            .set_integer("groupId", 1)
            .execute_query_single()
            .await
            .unwrap();
        assert_eq!(first.map(|device| device.name), Some("two".to_string()));

        let none: Option<Device> = QueryBuilder::create(&source, select)
            .await
            .unwrap()
            .set_integer("groupId", 9)
            .execute_query_single()
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_null_columns() {
        let source = memory_source().await;
        seed(
            &source,
            &["INSERT INTO device (id, name, lastupdate, attributes) VALUES (5, 'idle', NULL, NULL)"],
        )
        .await;

        let device: Device = QueryBuilder::create(
            &source,
            "SELECT id, name, lastupdate, attributes, NULL AS groupid FROM device",
        )
        .await
        .unwrap()
        .execute_query_single()
        .await
        .unwrap()
        .unwrap();

        assert_eq!(device.id, 5);
        assert_eq!(device.last_update, None);
        assert!(device.attributes.is_empty());
        assert_eq!(device.group_id, 0);
    }

    #[tokio::test]
    async fn test_malformed_mapping_is_skipped_when_lenient() {
        let source = memory_source().await;
        seed(
            &source,
            &["INSERT INTO device (id, name, attributes) VALUES (1, 'broken', '{not json')"],
        )
        .await;

        let device: Device = QueryBuilder::create(&source, "SELECT id, name, attributes FROM device")
            .await
            .unwrap()
            .execute_query_single()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(device.name, "broken");
        assert!(device.attributes.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_mapping_fails_when_strict() {
        let source = memory_source().await.with_policy(FieldPolicy::Strict);
        seed(
            &source,
            &["INSERT INTO device (id, name, attributes) VALUES (1, 'broken', '{not json')"],
        )
        .await;

        let result = QueryBuilder::create(&source, "SELECT id, name, attributes FROM device")
            .await
            .unwrap()
            .execute_query::<Device>()
            .await;
        assert!(matches!(result, Err(Error::Codec(_))));

        // The failed call still released its connection.
        assert!(QueryBuilder::create(&source, "SELECT id FROM device").await.is_ok());
    }

    #[derive(Debug, Default)]
    struct Unbuildable {
        id: i64,
    }

    impl Describe for Unbuildable {
        fn fields() -> &'static [Field<Self>] {
            static FIELDS: std::sync::OnceLock<Vec<Field<Unbuildable>>> = std::sync::OnceLock::new();
            FIELDS.get_or_init(|| {
                vec![Field::new(
                    "id",
                    Kind::Long,
                    |object: &Unbuildable| -> Value { Value::Long(object.id) },
                    |object: &mut Unbuildable, value: Value| -> crate::Result<()> {
                        object.id = crate::value::extract("id", value)?;
                        Ok(())
                    },
                )]
            })
        }

        fn instantiate() -> crate::Result<Self> {
            Err(Error::Instantiate("Unbuildable".into()))
        }
    }

    #[tokio::test]
    async fn test_instantiation_failure_aborts_query() {
        let source = memory_source().await;
        seed(&source, &["INSERT INTO device (id, name) VALUES (1, 'x')"]).await;

        let result = QueryBuilder::create(&source, "SELECT id FROM device")
            .await
            .unwrap()
            .execute_query::<Unbuildable>()
            .await;
        assert!(matches!(result, Err(Error::Instantiate(_))));

        // No rows means nothing to instantiate.
        let empty = QueryBuilder::create(&source, "SELECT id FROM device WHERE id = :id")
            .await
            .unwrap()
            .set_long("id", 42)
            .execute_query::<Unbuildable>()
            .await
            .unwrap();
        assert!(empty.is_empty());
    }
}
