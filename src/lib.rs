//! # sqlx-named-mapper
//!
//! Named-parameter SQL on top of SQLx, with column-to-field mapping for plain
//! structs.
//!
//! ## Features
//!
//! - **Named Placeholders**: Write `:name` in SQL; each name may appear any number of times
//! - **Quote Aware**: Colons inside `'...'` or `"..."` literals are left alone
//! - **Typed Setters**: `set_integer`, `set_string`, `set_date` and friends bind by name, ignoring case
//! - **Object Binding**: `set_object` binds every described field that has a placeholder
//! - **Row Mapping**: `execute_query` fills one struct per row from case-insensitive column names
//! - **Mapping Fields**: Key/value attribute maps are stored as JSON or XML text
//! - **Scoped Connections**: Each builder holds one pooled connection and returns it on every path
//!
//! ## Quick Start
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! sqlx = { version = "0.8", features = ["mysql", "runtime-tokio"] }
//! sqlx-named-mapper = "0.1"
//! ```
//!
//! ## Examples
//!
//! ### Describing a Model
//!
//! ```rust
//! use sqlx_named_mapper::{impl_describe, Attributes, Describe};
//!
//! #[derive(Debug, Default)]
//! struct Device {
//!     id: i64,
//!     name: String,
//!     unique_id: Option<String>,
//!     attributes: Attributes,
//! }
//!
//! impl_describe!(Device {
//!     id: i64,
//!     name: String,
//!     unique_id as "uniqueId": Option<String>,
//!     attributes: Attributes,
//! });
//!
//! let names: Vec<&str> = Device::fields().iter().map(|field| field.name()).collect();
//! assert_eq!(names, ["id", "name", "uniqueId", "attributes"]);
//! ```
//!
//! ### Inserting and Reading Back
//!
//! ```rust,no_run
//! use sqlx::MySqlPool;
//! use sqlx_named_mapper::{impl_describe, Attributes, DataSource, QueryBuilder};
//!
//! #[derive(Debug, Default)]
//! struct Device {
//!     id: i64,
//!     name: String,
//!     unique_id: Option<String>,
//!     attributes: Attributes,
//! }
//!
//! impl_describe!(Device {
//!     id: i64,
//!     name: String,
//!     unique_id as "uniqueId": Option<String>,
//!     attributes: Attributes,
//! });
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = DataSource::new(MySqlPool::connect("mysql://localhost/traccar").await?);
//!
//! let device = Device {
//!     name: "Truck-1".into(),
//!     unique_id: Some("358240051111110".into()),
//!     ..Device::default()
//! };
//! let id = QueryBuilder::create_with_keys(
//!     &source,
//!     "INSERT INTO device (name, uniqueId, attributes) VALUES (:name, :uniqueId, :attributes)",
//!     true,
//! )
//! .await?
//! .set_object(&device)?
//! .execute_update()
//! .await?;
//!
//! let stored: Option<Device> = source
//!     .query("SELECT * FROM device WHERE id = :id")
//!     .await?
//!     .set_long("id", id)
//!     .execute_query_single()
//!     .await?;
//! println!("Stored {stored:?}");
//! # Ok(())
//! # }
//! ```
//!
//! ### Configuration From the Environment
//!
//! ```rust,no_run
//! use sqlx::MySql;
//! use sqlx_named_mapper::{DataSource, DatabaseConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // DATABASE_URL, DATABASE_MAX_CONNECTIONS, DATABASE_XML, ...
//! let config = DatabaseConfig::from_env();
//! let source = DataSource::<MySql>::connect(&config).await?;
//!
//! let updated = source
//!     .query("UPDATE device SET disabled = :disabled WHERE groupId = :groupId")
//!     .await?
//!     .set_boolean("disabled", true)
//!     .set_long("groupId", 3)
//!     .execute_update()
//!     .await?;
//! assert_eq!(updated, 0); // no generated keys requested
//! # Ok(())
//! # }
//! ```
//!
//! ## How It Works
//!
//! 1. **Parse**: `:name` placeholders become `?`, recording every position each name occupies
//! 2. **Prepare**: A pooled connection is acquired and the positional SQL is prepared on it
//! 3. **Bind**: Setters fill value slots; nothing reaches the database until execution
//! 4. **Execute**: Slots are bound in order, the statement runs, and the connection goes back to the pool
//!
//! ## Limitations
//!
//! - Supports MySQL and SQLite
//! - Placeholder names must start with a letter or `_`
//! - Only the field kinds in [`Kind`] can be mapped

pub mod backend;
pub mod builder;
pub mod codec;
pub mod config;
pub mod describe;
pub mod error;
pub mod events;
pub mod policy;
pub mod query;
pub mod query_as;
pub mod source;
pub mod value;

#[cfg(test)]
mod testing;

pub use backend::Backend;
pub use codec::MappingCodec;
pub use config::DatabaseConfig;
pub use describe::{Describe, Field};
pub use error::{Error, Result};
pub use policy::FieldPolicy;
pub use query::QueryBuilder;
pub use source::DataSource;
pub use value::{Attributes, Kind, Timestamp, Value};

/// Convenience re-exports for common use cases
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::impl_describe;
    pub use crate::{Attributes, DataSource, Describe, QueryBuilder, Timestamp};
}
