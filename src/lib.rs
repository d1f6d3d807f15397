use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::Compress;
use actix_web::{http::header, web, App, HttpServer};
use anyhow::Context;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod config;
pub mod delivery;
pub mod invoice;
pub mod pipeline;
pub mod render;

pub use crate::invoice::handlers::AppState;

use crate::config::AppConfig;
use crate::delivery::{AirtableClient, RecordStore};
use crate::invoice::handlers;
use crate::pipeline::InvoicePipeline;
use crate::render::{MarkupRenderer, Renderer, VectorRenderer};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::invoice::handlers::generate_inline_invoice,
        crate::invoice::handlers::deliver_invoice,
    ),
    components(
        schemas(
            invoice::models::InvoiceRequest,
            invoice::models::AmountInput,
            invoice::models::InlineInvoiceResponse,
            invoice::models::DeliveredInvoiceResponse,
            invoice::models::ApiError,
        )
    ),
    tags(
        (name = "Invoice Service", description = "Invoice generation and delivery endpoints.")
    )
)]
struct ApiDoc;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().context("invalid startup configuration")?;

    let http_client = reqwest::Client::builder()
        .user_agent(concat!("invoice-server/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to create HTTP client")?;
    let store: Arc<dyn RecordStore + Send + Sync> = Arc::new(AirtableClient::new(
        config.record_store.clone(),
        http_client,
    ));

    let app_state = web::Data::new(AppState {
        inline_pipeline: InvoicePipeline::inline(
            Arc::new(Renderer::Vector(VectorRenderer::new())),
            config.company.clone(),
        ),
        delivery_pipeline: InvoicePipeline::delivering(
            Arc::new(Renderer::Markup(MarkupRenderer::new(&config.chromium_bin))),
            store,
            config.company.clone(),
        ),
    });

    log::info!("Starting server at http://{}", config.bind_addr);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["POST", "OPTIONS"])
            .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
            .max_age(3600);

        App::new()
            .wrap(Compress::default())
            .wrap(cors)
            .app_data(app_state.clone())
            .service(
                web::scope("/api")
                    .service(
                        web::resource("/generate-invoice")
                            .route(web::post().to(handlers::generate_inline_invoice))
                            .default_service(web::route().to(handlers::method_not_allowed)),
                    )
                    .service(
                        web::resource("/invoice")
                            .route(web::post().to(handlers::deliver_invoice))
                            .default_service(web::route().to(handlers::method_not_allowed)),
                    ),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind(&config.bind_addr)
    .with_context(|| format!("failed to bind {}", config.bind_addr))?
    .run()
    .await?;

    Ok(())
}
