use axum::{middleware, routing::get, Json, Router};
use utoipa::OpenApi;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::server::{controller, model::app::AppState, scope::request_scope};

/// Builds the application router with all API routes and OpenAPI documentation.
///
/// Every route runs inside the [`request_scope`] middleware, so handlers can extract
/// repositories, services and the unit of work of their request.
///
/// # OpenAPI
/// The generated OpenAPI document is served as JSON at `/api/docs/openapi.json`.
pub fn routes(state: AppState) -> Router {
    #[derive(OpenApi)]
    #[openapi(info(title = "Groundwork", description = "Groundwork API"), tags(
        (name = controller::example::EXAMPLE_TAG, description = "Example data access routes"),
    ))]
    struct ApiDoc;

    let (routes, api) = OpenApiRouter::<AppState>::with_openapi(ApiDoc::openapi())
        .routes(routes!(controller::example::index))
        .routes(routes!(controller::example::get_user))
        .split_for_parts();

    routes
        .route(
            "/api/docs/openapi.json",
            get(move || {
                let api = api.clone();
                async move { Json(api) }
            }),
        )
        .layer(middleware::from_fn_with_state(state.clone(), request_scope))
        .with_state(state)
}
