use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, IntGaugeVec, Opts, TextEncoder};
use uuid::Uuid;

use crate::entitlement::AccessDecision;
use crate::models::MessageKind;

static ACCESS_DECISIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "entitlement_service_access_decisions_total",
            "Entitlement resolver outcomes",
        ),
        &["outcome"],
    )
    .expect("failed to create entitlement_service_access_decisions_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register entitlement_service_access_decisions_total");
    counter
});

static CHAT_MESSAGES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "entitlement_service_chat_messages_total",
            "Live chat rows appended and broadcast",
        ),
        &["kind"],
    )
    .expect("failed to create entitlement_service_chat_messages_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register entitlement_service_chat_messages_total");
    counter
});

static LEADERBOARD_REFRESHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "entitlement_service_leaderboard_refreshes_total",
            "Leaderboard polls against the tip ledger",
        ),
        &["result"],
    )
    .expect("failed to create entitlement_service_leaderboard_refreshes_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register entitlement_service_leaderboard_refreshes_total");
    counter
});

static LIVE_VIEWERS: Lazy<IntGaugeVec> = Lazy::new(|| {
    let gauge = IntGaugeVec::new(
        Opts::new(
            "entitlement_service_live_viewers",
            "Present viewers per live stream",
        ),
        &["creator_id"],
    )
    .expect("failed to create entitlement_service_live_viewers");
    prometheus::default_registry()
        .register(Box::new(gauge.clone()))
        .expect("failed to register entitlement_service_live_viewers");
    gauge
});

pub fn inc_access_decision(decision: &AccessDecision) {
    let outcome = match decision {
        AccessDecision::Granted(_) => "granted",
        AccessDecision::Denied(reason) => reason.as_str(),
    };
    ACCESS_DECISIONS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn inc_chat_message(kind: MessageKind) {
    let label = match kind {
        MessageKind::Chat => "chat",
        MessageKind::Tip => "tip",
    };
    CHAT_MESSAGES_TOTAL.with_label_values(&[label]).inc();
}

pub fn inc_leaderboard_refresh(ok: bool) {
    let result = if ok { "ok" } else { "error" };
    LEADERBOARD_REFRESHES_TOTAL.with_label_values(&[result]).inc();
}

pub fn set_live_viewers(creator_id: Uuid, count: i64) {
    LIVE_VIEWERS
        .with_label_values(&[creator_id.to_string().as_str()])
        .set(count);
}

/// Drop the per-stream series once the stream has no watchers left.
pub fn clear_live_viewers(creator_id: Uuid) {
    let _ = LIVE_VIEWERS.remove_label_values(&[creator_id.to_string().as_str()]);
}

pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
