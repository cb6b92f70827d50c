use tracing::{debug, error, info, warn};

pub fn log_request_received(endpoint: &str, method: &str) {
    info!("Request received: {} {}", method, endpoint);
}

pub fn log_webhook_accepted(request_id: &str, event: &str, members: usize) {
    info!(
        "📥 Kaonavi webhook accepted: {} - Event: {} - Members: {}",
        request_id, event, members
    );
}

pub fn log_webhook_rejected(request_id: &str, reason: &str) {
    warn!("Kaonavi webhook rejected: {} - Reason: {}", request_id, reason);
}

pub fn log_kaonavi_api_error(endpoint: &str, error: &str) {
    error!("Kaonavi API error: {} - Error: {}", endpoint, error);
}

pub fn log_config_loaded(env: &str) {
    info!("Configuration loaded successfully for environment: {}", env);
}

pub fn log_server_startup(port: u16, dry_run: bool) {
    info!(
        "🚀 Kaonavi middleware server starting on port {} (dry_run={})",
        port, dry_run
    );
}

pub fn log_server_ready(host: &str, port: u16) {
    info!("✅ Server ready and listening on http://{}:{}", host, port);
}

pub fn log_health_check() {
    debug!("Health check requested");
}

pub fn log_warning(message: &str) {
    warn!("{}", message);
}
