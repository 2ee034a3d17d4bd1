use crate::resource::NormalizedResource;

/// Annotation key that opts a resource into auto-delete handling. The
/// lookup is an exact string match; no prefixes, no case folding.
pub const AUTO_DELETE_ANNOTATION: &str = "auto-delete-admission";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// No trigger annotation: admit unmodified.
    Skip,
    /// Trigger annotation present; carries its raw value.
    Trigger(String),
}

pub fn evaluate(resource: &NormalizedResource) -> Decision {
    match resource.annotations.get(AUTO_DELETE_ANNOTATION) {
        Some(value) => Decision::Trigger(value.clone()),
        None => Decision::Skip,
    }
}

/// Hook for schedule validation. The annotation value is currently
/// passed through verbatim.
// TODO: validate the value as a cron expression and surface a deny on
// malformed schedules
pub fn parse_schedule(value: &str) -> &str {
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource_with_annotations(pairs: &[(&str, &str)]) -> NormalizedResource {
        NormalizedResource {
            name: "my-app".to_string(),
            kind: "Deployment".to_string(),
            annotations: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..NormalizedResource::default()
        }
    }

    #[test]
    fn test_evaluate_skips_without_annotation() {
        let resource = resource_with_annotations(&[("team", "platform")]);
        assert_eq!(evaluate(&resource), Decision::Skip);
    }

    #[test]
    fn test_evaluate_triggers_with_annotation() {
        let resource = resource_with_annotations(&[(AUTO_DELETE_ANNOTATION, "0 0 * * *")]);
        assert_eq!(
            evaluate(&resource),
            Decision::Trigger("0 0 * * *".to_string())
        );
    }

    #[test]
    fn test_evaluate_key_match_is_exact() {
        let resource = resource_with_annotations(&[
            ("Auto-Delete-Admission", "* * * * *"),
            ("auto-delete-admission-extra", "* * * * *"),
        ]);
        assert_eq!(evaluate(&resource), Decision::Skip);
    }

    #[test]
    fn test_parse_schedule_is_verbatim() {
        assert_eq!(parse_schedule("@daily"), "@daily");
        assert_eq!(parse_schedule("not a schedule"), "not a schedule");
    }
}
