use std::sync::Arc;

use autodel_admission::config::AdmissionConfig;

#[derive(Clone)]
pub struct WebhookState {
    pub config: Arc<AdmissionConfig>,
}

impl WebhookState {
    pub fn new(config: AdmissionConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}
