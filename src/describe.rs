//! Explicit field descriptions used instead of runtime reflection.
//!
//! A type that can be bound with [`QueryBuilder::set_object`](crate::QueryBuilder::set_object)
//! or materialized with [`QueryBuilder::execute_query`](crate::QueryBuilder::execute_query)
//! implements [`Describe`], listing one [`Field`] per column/placeholder it maps.
//! The [`impl_describe!`](crate::impl_describe) macro writes the impl for plain structs.

use crate::value::{Kind, Value};

type Getter<T> = fn(&T) -> Value;
type Setter<T> = fn(&mut T, Value) -> crate::Result<()>;

/// One mapped field of `T`: its name, its kind and the functions moving a
/// [`Value`] in and out of an instance.
pub struct Field<T> {
    name: &'static str,
    kind: Kind,
    get: Getter<T>,
    set: Setter<T>,
}

impl<T> Field<T> {
    pub fn new(name: &'static str, kind: Kind, get: Getter<T>, set: Setter<T>) -> Self {
        Self {
            name,
            kind,
            get,
            set,
        }
    }

    /// Name matched case-insensitively against placeholders and result columns.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn get(&self, object: &T) -> Value {
        (self.get)(object)
    }

    pub fn set(&self, object: &mut T, value: Value) -> crate::Result<()> {
        (self.set)(object, value)
    }

    pub(crate) fn matches(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

impl<T> std::fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// A type whose fields can be bound to placeholders and filled from result rows.
pub trait Describe: Default + 'static {
    /// The mapped fields, in declaration order. Built once per type.
    fn fields() -> &'static [Field<Self>];

    /// Creates the blank instance a result row is written into.
    ///
    /// # Errors
    ///
    /// Implementations that cannot always produce an instance return
    /// [`Error::Instantiate`](crate::Error::Instantiate); it aborts the whole query.
    fn instantiate() -> crate::Result<Self> {
        Ok(Self::default())
    }
}

/// Implements [`Describe`] for a struct by listing its mapped fields.
///
/// Each entry is `field: Type` or `field as "name": Type`, where the quoted name
/// is what templates and result columns refer to. `Type` must implement
/// [`FieldType`](crate::value::FieldType) and `Clone`.
///
/// # Examples
///
/// ```
/// use sqlx_named_mapper::describe::Describe;
/// use sqlx_named_mapper::impl_describe;
/// use sqlx_named_mapper::value::{Timestamp, Value};
///
/// #[derive(Debug, Default)]
/// struct Device {
///     id: i64,
///     name: String,
///     last_update: Option<Timestamp>,
/// }
///
/// impl_describe!(Device {
///     id: i64,
///     name: String,
///     last_update as "lastUpdate": Option<Timestamp>,
/// });
///
/// let names: Vec<_> = Device::fields().iter().map(|field| field.name()).collect();
/// assert_eq!(names, ["id", "name", "lastUpdate"]);
///
/// let mut device = Device::default();
/// Device::fields()[1].set(&mut device, Value::Text(Some("Truck-1".into())))?;
/// assert_eq!(device.name, "Truck-1");
/// # Ok::<(), sqlx_named_mapper::Error>(())
/// ```
#[macro_export]
macro_rules! impl_describe {
    ($ty:ty { $( $field:ident $( as $name:literal )? : $fty:ty ),* $(,)? }) => {
        impl $crate::describe::Describe for $ty {
            fn fields() -> &'static [$crate::describe::Field<Self>] {
                static FIELDS: ::std::sync::OnceLock<::std::vec::Vec<$crate::describe::Field<$ty>>> =
                    ::std::sync::OnceLock::new();
                FIELDS.get_or_init(|| {
                    ::std::vec![$(
                        $crate::describe::Field::<$ty>::new(
                            $crate::__field_name!($field $(, $name)?),
                            <$fty as $crate::value::FieldType>::KIND,
                            |object: &$ty| -> $crate::value::Value {
                                <$fty as $crate::value::FieldType>::into_value(
                                    ::std::clone::Clone::clone(&object.$field),
                                )
                            },
                            |object: &mut $ty, value: $crate::value::Value| -> $crate::Result<()> {
                                object.$field = $crate::value::extract::<$fty>(
                                    $crate::__field_name!($field $(, $name)?),
                                    value,
                                )?;
                                ::std::result::Result::Ok(())
                            },
                        )
                    ),*]
                })
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __field_name {
    ($field:ident) => {
        ::std::stringify!($field)
    };
    ($field:ident, $name:literal) => {
        $name
    };
}
