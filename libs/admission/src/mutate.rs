use crate::config::AdmissionConfig;
use crate::cronjob::{serialize_patch, synthesize};
use crate::policy::{Decision, evaluate, parse_schedule};
use crate::resource::normalize;
use crate::review::{AdmissionRequest, AdmissionResponse};

use tracing::{debug, error};

const INTERNAL_ERROR: u16 = 500;

/// Run one admission request through the decision pipeline:
/// normalize, evaluate, and on a trigger synthesize the cleanup job
/// patch. Every path ends in exactly one response.
pub fn mutate(request: &AdmissionRequest, config: &AdmissionConfig) -> AdmissionResponse {
    let uid = request.uid.clone();

    if let Some(namespace) = request.namespace.as_deref() {
        if config.is_ignored(namespace) {
            debug!("skipping resource in ignored namespace {namespace}");
            return AdmissionResponse::allow(uid);
        }
    }

    // Only create and update operations can carry the trigger annotation.
    if request.operation != "CREATE" && request.operation != "UPDATE" {
        debug!("skipping {} operation", request.operation);
        return AdmissionResponse::allow(uid);
    }

    let raw = match request.object.as_ref() {
        Some(raw) => raw,
        None => {
            error!("missing object in {} request", request.operation);
            return AdmissionResponse::deny(uid, INTERNAL_ERROR, "missing object in request");
        }
    };

    let resource = match normalize(raw) {
        Ok(resource) => resource,
        Err(err) => {
            error!("failed to decode resource: {err}");
            return AdmissionResponse::deny(uid, INTERNAL_ERROR, err.to_string());
        }
    };

    let value = match evaluate(&resource) {
        Decision::Skip => {
            debug!("no trigger annotation on {} {}", resource.kind, resource.name);
            return AdmissionResponse::allow(uid);
        }
        Decision::Trigger(value) => value,
    };

    let job = synthesize(
        resource.base_name(),
        parse_schedule(&value),
        &resource.identity(),
        config,
    );
    match serialize_patch(&job) {
        Ok(patch) => {
            debug!(
                "patching {} {} with cleanup cron job {}",
                resource.kind,
                resource.name,
                job.metadata.name.as_deref().unwrap_or_default()
            );
            AdmissionResponse::allow_with_patch(uid, &patch)
        }
        Err(err) => {
            error!("failed to serialize cron job patch: {err}");
            AdmissionResponse::deny(uid, INTERNAL_ERROR, err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::AUTO_DELETE_ANNOTATION;

    use base64::Engine;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use k8s_openapi::api::batch::v1::CronJob;
    use serde_json::json;

    fn request(uid: &str, operation: &str, object: Option<serde_json::Value>) -> AdmissionRequest {
        AdmissionRequest {
            uid: uid.to_string(),
            operation: operation.to_string(),
            namespace: Some("default".to_string()),
            object,
        }
    }

    fn annotated_object(name: &str, generate_name: &str, schedule: &str) -> serde_json::Value {
        json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {
                "name": name,
                "generateName": generate_name,
                "annotations": {AUTO_DELETE_ANNOTATION: schedule}
            }
        })
    }

    fn decode_patch(response: &AdmissionResponse) -> CronJob {
        let bytes = BASE64
            .decode(response.patch.as_ref().expect("patch"))
            .expect("base64 patch");
        serde_json::from_slice(&bytes).expect("cron job patch")
    }

    #[test]
    fn test_mutate_allows_without_annotation() {
        let object = json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {"name": "plain"}
        });
        let response = mutate(&request("uid-1", "CREATE", Some(object)), &AdmissionConfig::default());
        assert!(response.allowed);
        assert_eq!(response.uid, "uid-1");
        assert!(response.patch.is_none());
    }

    #[test]
    fn test_mutate_patches_annotated_resource() {
        let object = annotated_object("MyJob", "MyJob-", "0 0 * * *");
        let response = mutate(&request("uid-2", "CREATE", Some(object)), &AdmissionConfig::default());
        assert!(response.allowed);
        assert_eq!(response.uid, "uid-2");
        assert_eq!(response.patch_type.as_deref(), Some("JSONPatch"));

        let job = decode_patch(&response);
        assert_eq!(job.metadata.name.as_deref(), Some("myjob-"));
        assert_eq!(job.spec.expect("spec").schedule, "0 0 * * *");
    }

    #[test]
    fn test_mutate_falls_back_to_name_without_generate_name() {
        let object = annotated_object("Standalone", "", "@daily");
        let response = mutate(&request("uid-3", "UPDATE", Some(object)), &AdmissionConfig::default());
        let job = decode_patch(&response);
        assert_eq!(job.metadata.name.as_deref(), Some("standalone"));
    }

    #[test]
    fn test_mutate_denies_malformed_object() {
        let response = mutate(
            &request("uid-4", "CREATE", Some(json!(42))),
            &AdmissionConfig::default(),
        );
        assert!(!response.allowed);
        assert_eq!(response.uid, "uid-4");
        assert_eq!(response.status.expect("status").code, Some(500));
        assert!(response.patch.is_none());
    }

    #[test]
    fn test_mutate_denies_missing_object() {
        let response = mutate(&request("uid-5", "CREATE", None), &AdmissionConfig::default());
        assert!(!response.allowed);
        assert_eq!(response.status.expect("status").code, Some(500));
    }

    #[test]
    fn test_mutate_allows_other_operations() {
        let object = annotated_object("Doomed", "Doomed-", "@hourly");
        let response = mutate(&request("uid-6", "DELETE", Some(object)), &AdmissionConfig::default());
        assert!(response.allowed);
        assert!(response.patch.is_none());
    }

    #[test]
    fn test_mutate_allows_ignored_namespace() {
        let object = annotated_object("Sys", "Sys-", "@hourly");
        let mut req = request("uid-7", "CREATE", Some(object));
        req.namespace = Some("kube-system".to_string());
        let response = mutate(&req, &AdmissionConfig::default());
        assert!(response.allowed);
        assert!(response.patch.is_none());
    }

    #[test]
    fn test_mutate_is_idempotent() {
        let object = annotated_object("Twice", "Twice-", "@weekly");
        let first = mutate(&request("uid-8", "CREATE", Some(object.clone())), &AdmissionConfig::default());
        let second = mutate(&request("uid-8", "CREATE", Some(object)), &AdmissionConfig::default());
        assert_eq!(first.patch, second.patch);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_mutate_concurrent_requests_are_independent() {
        let config = std::sync::Arc::new(AdmissionConfig::default());
        let handles: Vec<_> = (0..128)
            .map(|i| {
                let config = config.clone();
                tokio::spawn(async move {
                    let uid = format!("uid-{i}");
                    let object = if i % 2 == 0 {
                        annotated_object(&format!("Job{i}"), &format!("Job{i}-"), "@daily")
                    } else {
                        json!({
                            "apiVersion": "v1",
                            "kind": "Pod",
                            "metadata": {"name": format!("pod-{i}")}
                        })
                    };
                    let response = mutate(&request(&uid, "CREATE", Some(object)), &config);
                    (i, uid, response)
                })
            })
            .collect();

        for handle in handles {
            let (i, uid, response) = handle.await.expect("task");
            assert_eq!(response.uid, uid);
            assert!(response.allowed);
            assert_eq!(response.patch.is_some(), i % 2 == 0);
        }
    }
}
