use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{ColumnTrait, Condition};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    model::{
        api::ErrorDto,
        user::{RoleDto, UserDto},
    },
    server::{
        data::entity::table_name,
        error::{data::DataError, Error},
        model::{
            app::AppState,
            db::{AppRoleModel, AppUserModel},
        },
        service::db::{DataService, DbService},
    },
};

pub static EXAMPLE_TAG: &str = "example";

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExampleQuery {
    /// Username to look up, defaults to the configured default username
    pub username: Option<String>,
}

/// Look up a user by username and return the username
#[utoipa::path(
    get,
    path = "/api/example",
    tag = EXAMPLE_TAG,
    params(ExampleQuery),
    responses(
        (status = 200, description = "Username of the matching user", body = String, content_type = "text/plain"),
        (status = 404, description = "No user has that username", body = String, content_type = "text/plain"),
        (status = 500, description = "Internal server error", body = ErrorDto)
    ),
)]
pub async fn index(
    State(state): State<AppState>,
    users: DataService<AppUserModel>,
    Query(query): Query<ExampleQuery>,
) -> Result<Response, Error> {
    let username = query
        .username
        .unwrap_or_else(|| state.default_username.clone());

    let user = users
        .find_by(Condition::all().add(entity::app_user::Column::UserName.eq(username.as_str())))
        .no_tracking()
        .fetch_one()
        .await?;

    let Some(user) = user else {
        return Ok((StatusCode::NOT_FOUND, "Not found").into_response());
    };

    let dto: UserDto = state.mapper.map(&user)?;

    Ok((StatusCode::OK, dto.user_name).into_response())
}

/// Get a user and their roles by ID
#[utoipa::path(
    get,
    path = "/api/example/{id}",
    tag = EXAMPLE_TAG,
    params(
        ("id" = String, Path, description = "ID of the user")
    ),
    responses(
        (status = 200, description = "Success when retrieving the user", body = UserDto),
        (status = 400, description = "The ID is not a valid user ID", body = ErrorDto),
        (status = 404, description = "User not found", body = ErrorDto),
        (status = 500, description = "Internal server error", body = ErrorDto)
    ),
)]
pub async fn get_user(
    State(state): State<AppState>,
    users: DataService<AppUserModel>,
    Path(id): Path<String>,
) -> Result<Response, Error> {
    let id: i32 = id.parse().map_err(|_| DataError::InvalidKey {
        entity: table_name::<AppUserModel>(),
        reason: format!("'{}' is not a valid user ID", id),
    })?;

    let mut rows = users
        .find_by(Condition::all().add(entity::app_user::Column::Id.eq(id)))
        .no_tracking()
        .fetch_with_related(entity::prelude::AppRole)
        .await?;

    let Some((user, roles)) = rows.pop() else {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(ErrorDto {
                error: "User not found".to_string(),
            }),
        )
            .into_response());
    };

    let mut dto: UserDto = state.mapper.map(&user)?;
    dto.roles = state.mapper.map_all::<AppRoleModel, RoleDto>(&roles)?;

    Ok((StatusCode::OK, Json(dto)).into_response())
}
