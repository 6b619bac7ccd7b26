use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use washdesk_types::{DailyStats, StatsTotals, StoredMessage};

use crate::{error::ApiResult, state::AppState};

const MAX_LIMIT: i64 = 500;
const MAX_DAYS: i64 = 365;
/// Unprocessed messages fetched for the dashboard, and how many are shown
const PENDING_FETCH: i64 = 10;
const PENDING_SHOWN: usize = 5;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitQuery {
    /// Maximum messages (default 50)
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatsQuery {
    /// Window in days
    pub days: Option<i64>,
}

impl StatsQuery {
    fn days_or(&self, default: i64) -> i64 {
        self.days.unwrap_or(default).clamp(1, MAX_DAYS)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub conversation_id: String,
    #[schema(value_type = Vec<Object>)]
    pub messages: Vec<StoredMessage>,
    pub count: usize,
}

/// Latest messages of a conversation, oldest first
#[utoipa::path(
    get,
    path = "/admin/conversations/{id}",
    params(
        ("id" = String, Path, description = "Conversation ID"),
        LimitQuery
    ),
    responses((status = 200, description = "Conversation messages", body = ConversationResponse)),
    tag = "admin"
)]
pub async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<ConversationResponse>> {
    let messages = state
        .store
        .get_conversation(&id, query.limit.clamp(1, MAX_LIMIT))
        .await?;

    Ok(Json(ConversationResponse {
        conversation_id: id,
        count: messages.len(),
        messages,
    }))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageStatsResponse {
    pub period_days: i64,
    #[schema(value_type = Object)]
    pub totals: StatsTotals,
    #[schema(value_type = Vec<Object>)]
    pub daily_stats: Vec<DailyStats>,
}

/// Daily message counts with window totals
#[utoipa::path(
    get,
    path = "/admin/stats/messages",
    params(StatsQuery),
    responses((status = 200, description = "Message statistics", body = MessageStatsResponse)),
    tag = "admin"
)]
pub async fn message_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Json<MessageStatsResponse>> {
    let days = query.days_or(30);
    let daily_stats = state.store.get_stats(days).await?;

    Ok(Json(MessageStatsResponse {
        period_days: days,
        totals: StatsTotals::from_days(&daily_stats),
        daily_stats,
    }))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardSummary {
    pub total_messages: i64,
    pub auto_responses: i64,
    pub automation_rate: String,
    pub unique_users: i64,
    pub pending_messages: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub period_days: i64,
    pub summary: DashboardSummary,
    #[schema(value_type = Vec<Object>)]
    pub daily_stats: Vec<DailyStats>,
    #[schema(value_type = Vec<Object>)]
    pub recent_unprocessed: Vec<StoredMessage>,
}

/// Activity summary for operators
#[utoipa::path(
    get,
    path = "/admin/dashboard",
    params(StatsQuery),
    responses((status = 200, description = "Dashboard summary", body = DashboardResponse)),
    tag = "admin"
)]
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Json<DashboardResponse>> {
    let days = query.days_or(7);
    let daily_stats = state.store.get_stats(days).await?;
    let mut unprocessed = state.store.get_unprocessed(PENDING_FETCH).await?;
    let totals = StatsTotals::from_days(&daily_stats);

    let summary = DashboardSummary {
        total_messages: totals.total_messages,
        auto_responses: totals.auto_responses,
        automation_rate: totals.automation_rate(),
        unique_users: totals.unique_users,
        pending_messages: unprocessed.len(),
    };
    unprocessed.truncate(PENDING_SHOWN);

    Ok(Json(DashboardResponse {
        period_days: days,
        summary,
        daily_stats,
        recent_unprocessed: unprocessed,
    }))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserMessagesResponse {
    pub phone: String,
    #[schema(value_type = Vec<Object>)]
    pub messages: Vec<StoredMessage>,
    pub count: usize,
}

/// Messages sent by one phone number, newest first
#[utoipa::path(
    get,
    path = "/admin/users/{phone}/messages",
    params(
        ("phone" = String, Path, description = "Sender phone number"),
        LimitQuery
    ),
    responses((status = 200, description = "Messages from the user", body = UserMessagesResponse)),
    tag = "admin"
)]
pub async fn user_messages(
    State(state): State<Arc<AppState>>,
    Path(phone): Path<String>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<UserMessagesResponse>> {
    let messages = state
        .store
        .get_by_phone(&phone, query.limit.clamp(1, MAX_LIMIT))
        .await?;

    Ok(Json(UserMessagesResponse {
        phone,
        count: messages.len(),
        messages,
    }))
}
