pub mod admins;
pub mod orders;

use axum::{Router, extract::DefaultBodyLimit};
use tower_http::{services::ServeDir, trace::TraceLayer};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    core::{app_state::AppState, swagger},
    media::PUBLIC_PREFIX,
};

/// Every API route under `/api/v1`, with its OpenAPI description.
pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/api/v1",
        orders::routes_with_openapi().merge(admins::orders::routes_with_openapi(state.clone())),
    )
}

/// The complete service: API, Swagger UI and the uploaded files.
pub fn app(state: AppState) -> Router {
    let (routes, mut openapi) = routes_with_openapi(&state).split_for_parts();
    openapi.info = utoipa::openapi::InfoBuilder::new()
        .title("Storefront OrderService API")
        .version("1.0.0")
        .build();

    let uploads = ServeDir::new(state.media.root());
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    routes
        .merge(swagger::create_swagger_ui(openapi))
        .nest_service(PUBLIC_PREFIX, uploads)
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
