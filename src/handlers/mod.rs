pub mod admin;
pub mod health;
pub mod webhook;

pub use admin::{
    ensure_webhook, list_departments, list_members, list_webhooks, member_layout, task_progress,
};
pub use health::{health_check, ready_check};
pub use webhook::handle_kaonavi_webhook;
