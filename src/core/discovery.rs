use crate::domain::model::Instance;
use crate::utils::error::{MigrationError, Result};
use regex::Regex;
use std::collections::HashSet;

/// Matches tag keys that mark an instance as owned by the cluster,
/// e.g. `kubernetes.io/cluster/<name>` or `kubernetes.io/cluster/<name>-extra`.
#[derive(Debug, Clone)]
pub struct OwnershipMatcher {
    pattern: Regex,
}

impl OwnershipMatcher {
    pub fn new(ownership_tag: &str) -> Result<Self> {
        let pattern = Regex::new(&format!("^{}", regex::escape(ownership_tag))).map_err(|e| {
            MigrationError::ConfigError {
                message: format!("Invalid ownership tag '{}': {}", ownership_tag, e),
            }
        })?;
        Ok(Self { pattern })
    }

    pub fn is_match(&self, key: &str) -> bool {
        self.pattern.is_match(key)
    }

    /// The first matching tag key, in sorted order so logs are stable.
    pub fn owned_tag<'a>(&self, instance: &'a Instance) -> Option<&'a str> {
        instance
            .tags
            .keys()
            .map(String::as_str)
            .filter(|key| self.is_match(key))
            .min()
    }
}

/// Volume ids attached to owned instances, in discovery order, without duplicates.
/// Instances without an ownership tag contribute nothing.
pub fn collect_volume_ids(instances: &[Instance], matcher: &OwnershipMatcher) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut volume_ids = Vec::new();

    for instance in instances {
        tracing::info!("🖥️  Instance: {}", instance.id);

        match instance.name() {
            Some(name) => tracing::info!("Instance name: {}", name),
            None => tracing::info!("Instance {} has no tag \"Name\"", instance.id),
        }

        let Some(owned_tag) = matcher.owned_tag(instance) else {
            tracing::info!(
                "Instance {} does not contain an owned tag, skipping",
                instance.id
            );
            continue;
        };
        tracing::debug!("Owned tag: {}", owned_tag);

        let mut found = Vec::new();
        for volume_id in &instance.volume_ids {
            if volume_id.is_empty() {
                tracing::debug!("Ignoring block device without a volume id on {}", instance.id);
                continue;
            }
            if seen.insert(volume_id.clone()) {
                volume_ids.push(volume_id.clone());
            }
            found.push(volume_id.as_str());
        }

        tracing::info!(
            "Found the following volumes on {}: {}",
            instance.id,
            found.join(",")
        );
    }

    volume_ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn instance(id: &str, tags: &[(&str, &str)], volumes: &[&str]) -> Instance {
        Instance {
            id: id.to_string(),
            tags: tags
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
            volume_ids: volumes.iter().map(|v| v.to_string()).collect(),
        }
    }

    fn matcher() -> OwnershipMatcher {
        OwnershipMatcher::new("kubernetes.io/cluster/prod").unwrap()
    }

    #[test]
    fn test_matcher_is_prefix_and_literal() {
        let m = matcher();
        assert!(m.is_match("kubernetes.io/cluster/prod"));
        assert!(m.is_match("kubernetes.io/cluster/prod-blue"));
        assert!(!m.is_match("kubernetes.io/cluster/staging"));
        // '.' in the tag must not act as a wildcard
        assert!(!m.is_match("kubernetesXio/cluster/prod"));
        assert!(!m.is_match("x-kubernetes.io/cluster/prod"));
    }

    #[test]
    fn test_unowned_instance_contributes_no_volumes() {
        let instances = vec![
            instance("i-unowned", &[("Name", "prod-worker")], &["vol-a"]),
            instance(
                "i-owned",
                &[("Name", "prod-worker"), ("kubernetes.io/cluster/prod", "owned")],
                &["vol-b", "vol-c"],
            ),
        ];

        let ids = collect_volume_ids(&instances, &matcher());
        assert_eq!(ids, vec!["vol-b", "vol-c"]);
    }

    #[test]
    fn test_unowned_instance_does_not_hide_later_instances() {
        let instances = vec![
            instance("i-1", &[("kubernetes.io/cluster/prod", "owned")], &["vol-1"]),
            instance("i-2", &[], &["vol-2"]),
            instance("i-3", &[("kubernetes.io/cluster/prod", "shared")], &["vol-3"]),
        ];

        let ids = collect_volume_ids(&instances, &matcher());
        assert_eq!(ids, vec!["vol-1", "vol-3"]);
    }

    #[test]
    fn test_missing_name_tag_is_not_a_skip() {
        let instances = vec![instance(
            "i-1",
            &[("kubernetes.io/cluster/prod", "owned")],
            &["vol-1"],
        )];
        assert_eq!(collect_volume_ids(&instances, &matcher()), vec!["vol-1"]);
    }

    #[test]
    fn test_duplicates_and_empty_ids_are_dropped() {
        let instances = vec![
            instance("i-1", &[("kubernetes.io/cluster/prod", "owned")], &["vol-1", ""]),
            instance("i-2", &[("kubernetes.io/cluster/prod", "owned")], &["vol-1", "vol-2"]),
        ];

        let ids = collect_volume_ids(&instances, &matcher());
        assert_eq!(ids, vec!["vol-1", "vol-2"]);
    }
}
