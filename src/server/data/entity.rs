//! Capabilities every persisted record type provides to the data layer.

use std::{fmt::Debug, hash::Hash};

use sea_orm::{
    sea_query::{IntoValueTuple, ValueTuple, ValueType},
    ActiveModelTrait, EntityName, EntityTrait, FromQueryResult, Value,
};

use crate::server::error::data::DataError;

/// A persisted record with a single-column primary key.
///
/// Implemented on the SeaORM `Model` of each entity, usually through [`db_entity!`]. A key
/// equal to `Key::default()` is transient: the record has not been assigned a key by the
/// database yet and the key column is left out of the insert.
///
/// `PartialEq` is what change detection compares tracked values against their snapshots with.
pub trait DbEntity:
    FromQueryResult + Default + Clone + PartialEq + Debug + Send + Sync + 'static
{
    type Table: EntityTrait<Model = Self>;
    type Active: ActiveModelTrait<Entity = Self::Table> + Send + 'static;
    type Key: ValueType + Into<Value> + Clone + Eq + Hash + Debug + Default + Send + Sync + 'static;

    fn key(&self) -> Self::Key;

    fn key_column() -> <Self::Table as EntityTrait>::Column;

    fn into_active(self) -> Self::Active;

    fn is_transient(&self) -> bool {
        self.key() == Self::Key::default()
    }
}

/// Name of the table backing `M`, used in error messages and logs.
pub fn table_name<M: DbEntity>() -> String {
    M::Table::default().table_name().to_string()
}

/// Converts loosely typed key arguments into the key of `M`.
///
/// Exactly one value of the key's column type is accepted.
pub fn key_from_values<M: DbEntity>(values: Vec<Value>) -> Result<M::Key, DataError> {
    let mut values = values.into_iter();

    match (values.next(), values.next()) {
        (Some(value), None) => <M::Key as ValueType>::try_from(value.clone()).map_err(|_| {
            DataError::InvalidKey {
                entity: table_name::<M>(),
                reason: format!(
                    "{:?} is not a valid {}",
                    value,
                    <M::Key as ValueType>::type_name()
                ),
            }
        }),
        (None, _) => Err(DataError::InvalidKey {
            entity: table_name::<M>(),
            reason: "no key values were supplied".to_string(),
        }),
        (Some(_), Some(_)) => Err(DataError::InvalidKey {
            entity: table_name::<M>(),
            reason: format!("expected 1 key value, got {}", values.len() + 2),
        }),
    }
}

/// Converts the key reported by an insert back into the key of `M`.
pub(crate) fn key_from_insert<M: DbEntity>(id: impl IntoValueTuple) -> Result<M::Key, DataError> {
    match id.into_value_tuple() {
        ValueTuple::One(value) => <M::Key as ValueType>::try_from(value).map_err(|err| {
            DataError::Internal(format!(
                "key returned by insert into {} could not be read: {:?}",
                table_name::<M>(),
                err
            ))
        }),
        other => Err(DataError::Internal(format!(
            "insert into {} returned a composite key {:?}",
            table_name::<M>(),
            other
        ))),
    }
}

/// Implements [`DbEntity`] for the `Model` of a SeaORM entity module.
///
/// ```ignore
/// db_entity!(entity::app_user { key: id: i32 => Id });
/// ```
#[macro_export]
macro_rules! db_entity {
    ($($module:ident)::+ { key: $field:ident: $key:ty => $column:ident }) => {
        impl $crate::server::data::entity::DbEntity for $($module)::+::Model {
            type Table = $($module)::+::Entity;
            type Active = $($module)::+::ActiveModel;
            type Key = $key;

            fn key(&self) -> $key {
                ::std::clone::Clone::clone(&self.$field)
            }

            fn key_column() -> $($module)::+::Column {
                $($module)::+::Column::$column
            }

            fn into_active(self) -> $($module)::+::ActiveModel {
                ::sea_orm::IntoActiveModel::into_active_model(self)
            }
        }
    };
}
