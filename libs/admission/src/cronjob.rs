use crate::config::AdmissionConfig;
use crate::error::{Error, Result};

use std::collections::BTreeMap;

use k8s_openapi::api::batch::v1::{CronJob, CronJobSpec, JobSpec, JobTemplateSpec};
use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

const CONTAINER_NAME: &str = "auto-delete";
const CONTROLLER_LABEL: &str = "admission-controller-name";
const TYPE_LABEL_VALUE: &str = "auto-delete-cronjob";

/// Build the cleanup cron job for a triggering resource. Deterministic:
/// identical inputs produce an identical object.
pub fn synthesize(
    base_name: &str,
    schedule: &str,
    resource_identity: &str,
    config: &AdmissionConfig,
) -> CronJob {
    let name = base_name.to_lowercase();
    let labels: BTreeMap<String, String> = [
        (CONTROLLER_LABEL.to_string(), name.clone()),
        ("type".to_string(), TYPE_LABEL_VALUE.to_string()),
    ]
    .into();

    CronJob {
        metadata: ObjectMeta {
            name: Some(name),
            namespace: Some(config.namespace.clone()),
            labels: Some(labels),
            ..ObjectMeta::default()
        },
        spec: Some(CronJobSpec {
            schedule: schedule.to_string(),
            job_template: JobTemplateSpec {
                spec: Some(JobSpec {
                    template: PodTemplateSpec {
                        spec: Some(PodSpec {
                            containers: vec![Container {
                                name: CONTAINER_NAME.to_string(),
                                image: Some(config.image.clone()),
                                command: Some(vec![
                                    "curl".to_string(),
                                    config.service_endpoint.clone(),
                                    resource_identity.to_string(),
                                ]),
                                image_pull_policy: Some("IfNotPresent".to_string()),
                                ..Container::default()
                            }],
                            ..PodSpec::default()
                        }),
                        ..PodTemplateSpec::default()
                    },
                    ..JobSpec::default()
                }),
                ..JobTemplateSpec::default()
            },
            ..CronJobSpec::default()
        }),
        ..CronJob::default()
    }
}

/// Serialize the synthesized job into the patch payload.
pub fn serialize_patch(cron_job: &CronJob) -> Result<Vec<u8>> {
    serde_json::to_vec(cron_job).map_err(Error::Synthesis)
}
