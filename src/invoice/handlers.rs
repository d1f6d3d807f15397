use actix_web::{web, HttpResponse, Responder};
use log::{error, info};

use crate::pipeline::{InvoicePipeline, PipelineError, PipelineOutcome};

use super::models::{
    ApiError, DeliveredInvoiceResponse, InlineInvoiceResponse, InvoiceRequest,
};

/// Both pipeline variants, constructed once at startup.
pub struct AppState {
    pub inline_pipeline: InvoicePipeline,
    pub delivery_pipeline: InvoicePipeline,
}

fn pipeline_error_response(err: PipelineError) -> HttpResponse {
    error!("invoice pipeline failed while {}: {err}", err.stage());
    if err.is_client_error() {
        HttpResponse::BadRequest().json(ApiError::new(err.to_string()))
    } else {
        HttpResponse::InternalServerError()
            .json(ApiError::new("Failed to generate invoice").with_details(err.to_string()))
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Invoice Service",
    post,
    path = "/generate-invoice",
    request_body = InvoiceRequest,
    responses(
        (status = 200, description = "Invoice rendered, PDF returned inline", body = InlineInvoiceResponse),
        (status = 400, description = "Invalid billing fields", body = ApiError),
        (status = 405, description = "Method not allowed", body = ApiError),
        (status = 500, description = "Rendering failed", body = ApiError)
    )
)]
pub async fn generate_inline_invoice(
    req: web::Json<InvoiceRequest>,
    data: web::Data<AppState>,
) -> impl Responder {
    info!("inline invoice requested");
    match data.inline_pipeline.run(&req).await {
        Ok(PipelineOutcome::Inline {
            invoice_number,
            pdf_data_url,
        }) => HttpResponse::Ok().json(InlineInvoiceResponse {
            success: true,
            invoice_number,
            pdf_data_url,
        }),
        Ok(PipelineOutcome::Delivered { .. }) => {
            error!("inline pipeline produced a delivery outcome");
            HttpResponse::InternalServerError()
                .json(ApiError::new("Failed to generate invoice"))
        }
        Err(err) => pipeline_error_response(err),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Invoice Service",
    post,
    path = "/invoice",
    request_body = InvoiceRequest,
    responses(
        (status = 200, description = "Invoice delivered to the record store", body = DeliveredInvoiceResponse),
        (status = 400, description = "Invalid billing fields", body = ApiError),
        (status = 405, description = "Method not allowed", body = ApiError),
        (status = 500, description = "Lookup, rendering or upload failed", body = ApiError)
    )
)]
pub async fn deliver_invoice(
    req: web::Json<InvoiceRequest>,
    data: web::Data<AppState>,
) -> impl Responder {
    info!("delivered invoice requested");
    match data.delivery_pipeline.run(&req).await {
        Ok(PipelineOutcome::Delivered {
            invoice_number,
            delivery,
        }) => {
            let attachment_succeeded = delivery
                .attached_record_id
                .is_some()
                .then_some(delivery.attachment_succeeded);
            HttpResponse::Ok().json(DeliveredInvoiceResponse {
                success: true,
                invoice_number,
                url: delivery.artifact_url,
                record_id: delivery.attached_record_id,
                attachment_succeeded,
            })
        }
        Ok(PipelineOutcome::Inline { .. }) => {
            error!("delivering pipeline produced an inline outcome");
            HttpResponse::InternalServerError()
                .json(ApiError::new("Failed to generate invoice"))
        }
        Err(err) => pipeline_error_response(err),
    }
}

/// Default service for the invoice resources: anything but POST gets a 405
/// without touching the pipeline.
pub async fn method_not_allowed() -> impl Responder {
    HttpResponse::MethodNotAllowed().json(ApiError::new("Method Not Allowed"))
}
