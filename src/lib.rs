pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::api::middleware::request_id::REQUEST_ID_HEADER;
use crate::config::GalleryConfig;
use crate::services::gallery::GalleryService;
use crate::services::listing_cache::ListingCache;
use crate::services::storage::StorageService;
use crate::services::transcoder::Transcoder;
use crate::services::upload_pipeline::UploadPipeline;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::upload::upload_media,
        api::handlers::gallery::list_gallery,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::upload::UploadForm,
            api::handlers::upload::UploadResponse,
            api::handlers::health::HealthResponse,
            models::UploadedObject,
            models::MediaKind,
            services::gallery::GalleryItem,
            services::gallery::GalleryPage,
        )
    ),
    modifiers(&BasicAuthAddon),
    tags(
        (name = "media", description = "Gallery listing and uploads"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;

struct BasicAuthAddon;

impl Modify for BasicAuthAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "basic",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Basic).build()),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn StorageService>,
    pub cache: Arc<ListingCache>,
    pub uploads: Arc<UploadPipeline>,
    pub gallery: Arc<GalleryService>,
    pub config: GalleryConfig,
}

impl AppState {
    /// Wires the cache, upload pipeline and gallery service around one store.
    pub fn new(
        config: GalleryConfig,
        storage: Arc<dyn StorageService>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        let cache = Arc::new(ListingCache::new(storage.clone(), config.max_cache_bytes));

        let uploads = Arc::new(UploadPipeline::new(
            storage.clone(),
            transcoder,
            cache.clone(),
            config.staging_dir.clone(),
            config.rollback_failed_batches,
        ));

        let gallery = Arc::new(GalleryService::new(
            storage.clone(),
            cache.clone(),
            config.cache_ttl(),
            config.signed_url_expiry(),
        ));

        Self {
            storage,
            cache,
            uploads,
            gallery,
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &axum::http::Request<_>| {
            let request_id = request
                .headers()
                .get(&REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        })
        .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
            info!("📥 {} {}", request.method(), request.uri());
        })
        .on_response(
            |response: &axum::http::Response<_>,
             latency: std::time::Duration,
             _span: &tracing::Span| {
                info!(
                    "📤 Finished in {:?} with status {}",
                    latency,
                    response.status()
                );
            },
        );

    let protected = Router::new()
        .route(
            "/upload",
            post(api::handlers::upload::upload_media)
                .layer(DefaultBodyLimit::max(state.config.max_upload_size)),
        )
        .route("/gallery", get(api::handlers::gallery::list_gallery))
        .route_layer(from_fn_with_state(
            state.clone(),
            api::middleware::auth::basic_auth_middleware,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .merge(protected)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .layer(trace_layer)
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .with_state(state)
}
