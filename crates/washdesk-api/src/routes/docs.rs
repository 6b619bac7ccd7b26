use axum::Json;
use utoipa::OpenApi;

use super::{admin, health, send, testing, twilio, upload, webhooks};

#[derive(OpenApi)]
#[openapi(
    info(title = "WashDesk API", description = "Laundromat complaint relay and WhatsApp webhooks"),
    paths(
        health::health_check,
        health::gupshup_status,
        twilio::twilio_status,
        twilio::twilio_webhook,
        webhooks::gupshup_message,
        webhooks::gupshup_events,
        webhooks::gupshup_users,
        send::send_gupshup,
        send::send_whatsapp,
        upload::upload_file,
        admin::get_conversation,
        admin::message_stats,
        admin::dashboard,
        admin::user_messages,
        testing::echo_webhook,
    ),
    components(schemas(
        health::HealthResponse,
        health::HealthFeatures,
        health::GupshupStatus,
        health::GupshupStatusFeatures,
        twilio::TwilioStatus,
        send::RelayRequest,
        send::RelayResponse,
        send::WhatsAppSendResponse,
        upload::UploadResponse,
        upload::UploadedFile,
        admin::ConversationResponse,
        admin::MessageStatsResponse,
        admin::DashboardSummary,
        admin::DashboardResponse,
        admin::UserMessagesResponse,
    )),
    tags(
        (name = "health", description = "Service and provider status"),
        (name = "webhooks", description = "Provider callbacks"),
        (name = "relay", description = "Complaint relay"),
        (name = "admin", description = "Message log queries"),
        (name = "testing", description = "Development helpers")
    )
)]
pub struct ApiDoc;

/// OpenAPI document
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
