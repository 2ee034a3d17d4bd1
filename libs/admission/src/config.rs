/// Process configuration for the decision engine, built once at startup
/// and shared read-only across request handlers.
#[derive(Clone, Debug)]
pub struct AdmissionConfig {
    /// Namespace stamped into synthesized cron job metadata.
    pub namespace: String,
    /// Image for the cleanup container.
    pub image: String,
    /// Endpoint the cleanup command calls with the resource identity.
    pub service_endpoint: String,
    /// Namespaces whose resources are always admitted unmodified.
    pub ignored_namespaces: Vec<String>,
}

impl AdmissionConfig {
    pub fn is_ignored(&self, namespace: &str) -> bool {
        self.ignored_namespaces.iter().any(|ns| ns == namespace)
    }
}

#[cfg(test)]
impl Default for AdmissionConfig {
    fn default() -> Self {
        AdmissionConfig {
            namespace: "default".to_string(),
            image: "busybox:latest".to_string(),
            service_endpoint: "http://auto-delete-service".to_string(),
            ignored_namespaces: vec!["kube-system".to_string()],
        }
    }
}
