//! OpenAPI documentation for the HTTP surface.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "MindSaaS Core API",
        description = "Intake-to-payment-to-delivery control service: questionnaire intake, Pix payment \
                       intents, the payment webhook, and the builder job endpoints."
    ),
    paths(
        api::handlers::prds::upsert_prd,
        api::handlers::prds::get_prd,
        api::handlers::answers::submit_answers,
        api::handlers::answers::list_answers,
        api::handlers::payments::create_payment_intent,
        api::handlers::payments::payment_webhook,
        api::handlers::runner::run_builder_jobs,
        api::handlers::jobs::update_job_state,
        api::handlers::cron::trigger_builder,
    ),
    components(schemas(
        crate::lifecycle::PrdState,
        crate::db::models::prds::PrdDocument,
        api::models::prds::PrdUpsertRequest,
        api::models::prds::PrdUpsertResponse,
        api::models::prds::PrdResponse,
        api::models::answers::AnswerCreate,
        api::models::answers::AnswerResponse,
        api::models::payments::PaymentIntentRequest,
        api::models::payments::PaymentIntentResponse,
        api::models::payments::WebhookPayload,
        api::models::payments::WebhookMetadata,
        api::models::runner::RunnerRequest,
        api::models::runner::RunnerItem,
        api::models::runner::RunnerReport,
        api::models::jobs::JobStateUpdateRequest,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "prds", description = "PRD lifecycle and intake answers"),
        (name = "payments", description = "Payment intents and the provider webhook"),
        (name = "jobs", description = "Internal job runner and pipeline endpoints"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "BearerAuth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}
