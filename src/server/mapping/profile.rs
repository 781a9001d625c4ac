use crate::{
    map_fields,
    model::user::{RoleDto, UserDto},
    server::{
        mapping::{MapperBuilder, Profile},
        model::db::{AppRoleModel, AppUserModel},
    },
};

/// Entities to the transport objects returned by the API.
pub struct EntityToDtoProfile;

impl Profile for EntityToDtoProfile {
    fn configure(&self, builder: &mut MapperBuilder) {
        builder
            .create_map(|user: &AppUserModel| {
                map_fields!(user => UserDto { id, user_name, email, display_name } ignore { roles })
            })
            .create_map(|role: &AppRoleModel| map_fields!(role => RoleDto { id, name }));
    }
}

/// Transport objects received by the API back to entities.
///
/// Credentials and timestamps are never accepted from a client and stay at their defaults.
pub struct DtoToEntityProfile;

impl Profile for DtoToEntityProfile {
    fn configure(&self, builder: &mut MapperBuilder) {
        builder.create_map(|dto: &UserDto| {
            map_fields!(dto => AppUserModel {
                id, user_name, email, display_name
            } ignore {
                password_hash, created_at
            })
        });
    }
}
