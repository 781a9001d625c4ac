//! Statically declared conversions between entities and transport objects.
//!
//! Maps are registered per (source, destination) type pair by [`Profile`]s when the
//! application starts and looked up at runtime through [`Mapper::map`]. Field-by-field maps
//! are written with [`map_fields!`](crate::map_fields), which copies fields of the same name
//! and requires every other destination field to be listed as ignored.

pub mod profile;

use std::{
    any::{type_name, Any, TypeId},
    collections::HashMap,
};

use crate::server::error::mapping::MappingError;

type MapFn = Box<dyn Fn(&dyn Any) -> Option<Box<dyn Any>> + Send + Sync>;

/// Registered conversions, shared read-only across requests.
pub struct Mapper {
    maps: HashMap<(TypeId, TypeId), MapFn>,
}

impl Mapper {
    pub fn builder() -> MapperBuilder {
        MapperBuilder::default()
    }

    /// Converts `source` into a `D` using the map registered for `S` to `D`.
    pub fn map<S: 'static, D: 'static>(&self, source: &S) -> Result<D, MappingError> {
        let map = self
            .maps
            .get(&(TypeId::of::<S>(), TypeId::of::<D>()))
            .ok_or(MappingError::MissingMap {
                from: type_name::<S>(),
                to: type_name::<D>(),
            })?;

        map(source as &dyn Any)
            .and_then(|mapped| mapped.downcast::<D>().ok())
            .map(|mapped| *mapped)
            .ok_or(MappingError::TypeMismatch {
                from: type_name::<S>(),
                to: type_name::<D>(),
            })
    }

    pub fn map_all<S: 'static, D: 'static>(&self, sources: &[S]) -> Result<Vec<D>, MappingError> {
        sources.iter().map(|source| self.map(source)).collect()
    }

    pub fn has_map<S: 'static, D: 'static>(&self) -> bool {
        self.maps
            .contains_key(&(TypeId::of::<S>(), TypeId::of::<D>()))
    }
}

#[derive(Default)]
pub struct MapperBuilder {
    maps: HashMap<(TypeId, TypeId), MapFn>,
}

impl MapperBuilder {
    /// Registers the conversion from `S` to `D`, replacing any earlier one for the pair.
    pub fn create_map<S, D, F>(&mut self, map: F) -> &mut Self
    where
        S: 'static,
        D: 'static,
        F: Fn(&S) -> D + Send + Sync + 'static,
    {
        let erased: MapFn = Box::new(move |source: &dyn Any| {
            source
                .downcast_ref::<S>()
                .map(|source| Box::new(map(source)) as Box<dyn Any>)
        });

        if self
            .maps
            .insert((TypeId::of::<S>(), TypeId::of::<D>()), erased)
            .is_some()
        {
            tracing::warn!(
                "Replaced existing map from {} to {}",
                type_name::<S>(),
                type_name::<D>()
            );
        }

        self
    }

    pub fn add_profile(&mut self, profile: &dyn Profile) -> &mut Self {
        profile.configure(self);
        self
    }

    pub fn build(self) -> Mapper {
        Mapper { maps: self.maps }
    }
}

/// A group of related maps registered together.
pub trait Profile: Send + Sync {
    fn configure(&self, builder: &mut MapperBuilder);
}

/// Builds the application's [`Mapper`] from the built-in profiles plus `extra`.
pub struct MappingConfiguration;

impl MappingConfiguration {
    pub fn configure(extra: Vec<Box<dyn Profile>>) -> Mapper {
        let mut builder = Mapper::builder();
        builder
            .add_profile(&profile::EntityToDtoProfile)
            .add_profile(&profile::DtoToEntityProfile);

        for profile in &extra {
            builder.add_profile(profile.as_ref());
        }

        builder.build()
    }
}

/// Builds `$dest` from `$src` by copying the listed fields of the same name.
///
/// Every destination field without a source counterpart must be named under `ignore`
/// and is set to its default, so adding a field to either side without updating the map
/// fails to compile.
///
/// ```ignore
/// map_fields!(user => UserDto { id, user_name, email, display_name } ignore { roles })
/// ```
#[macro_export]
macro_rules! map_fields {
    ($src:expr => $dest:path { $($field:ident),* $(,)? } ignore { $($ignored:ident),* $(,)? }) => {{
        let source = $src;
        $dest {
            $($field: ::std::clone::Clone::clone(&source.$field),)*
            $($ignored: ::std::default::Default::default(),)*
        }
    }};
    ($src:expr => $dest:path { $($field:ident),* $(,)? }) => {
        $crate::map_fields!($src => $dest { $($field),* } ignore {})
    };
}
