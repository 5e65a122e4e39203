use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;

/// Describe the service's metrics so the exporter emits HELP lines.
pub fn describe() {
    metrics::describe_counter!("label_items_served_total", "Audio items handed to labelers");
    metrics::describe_counter!(
        "label_items_empty_total",
        "Selections that found nothing left to label"
    );
    metrics::describe_counter!(
        "label_item_lease_conflicts_total",
        "Selections that lost the lease on their pick and chose again"
    );
    metrics::describe_counter!("labels_submitted_total", "Accepted label submissions");
    metrics::describe_counter!("audio_uploads_total", "Audio files registered for labeling");
    metrics::describe_counter!("logins_total", "Successful logins");
    metrics::describe_histogram!(
        "label_selection_seconds",
        "Time to scan candidates and pick the next item"
    );
}

/// `/metrics` scrape route, in Prometheus text exposition format.
pub fn router(handle: Arc<PrometheusHandle>) -> Router {
    Router::new()
        .route("/metrics", get(prometheus_metrics))
        .with_state(handle)
}

async fn prometheus_metrics(State(handle): State<Arc<PrometheusHandle>>) -> String {
    handle.render()
}
