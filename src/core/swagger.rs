use utoipa::openapi::{
    Components, OpenApi,
    security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

/// Serves the generated document at `/api-docs/openapi.json`, with the
/// bearer scheme referenced by admin routes registered on it.
pub fn create_swagger_ui(mut openapi: OpenApi) -> SwaggerUi {
    openapi
        .components
        .get_or_insert_with(Components::new)
        .add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );

    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi)
}
