//! Effective-permission aggregation.
//!
//! Collects every policy document reachable from a principal: its own
//! inline policies, plus each of its groups' inline and attached managed
//! policies. Per-group fetches run with bounded concurrency; any failure
//! aborts the whole aggregation so a missing policy can never masquerade
//! as an absent permission.

use std::collections::HashSet;

use futures::stream::{self, StreamExt, TryStreamExt};
use log::{debug, warn};

use super::identity::PrincipalIdentity;
use super::store::{PolicyStore, StoreError, drain_pages};

/// Where a policy document was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyProvenance {
    /// Inline policy attached directly to the principal
    UserInline,

    /// Inline policy of a group the principal belongs to
    GroupInline { group: String },

    /// Managed policy attached to a group the principal belongs to
    GroupManaged { group: String, arn: String },
}

impl PolicyProvenance {
    /// Short human-readable description for report output.
    pub fn describe(&self) -> String {
        match self {
            PolicyProvenance::UserInline => "inline".to_string(),
            PolicyProvenance::GroupInline { group } => format!("inline via group {}", group),
            PolicyProvenance::GroupManaged { group, .. } => format!("managed via group {}", group),
        }
    }
}

/// A named, decoded policy document with its provenance.
#[derive(Debug, Clone)]
pub struct PolicyDocument {
    pub name: String,
    pub document: String,
    pub provenance: PolicyProvenance,
}

/// All policy documents reachable from a principal.
///
/// Built fresh per analysis run; group membership and policy content are
/// mutable external state, so nothing here is cached.
#[derive(Debug)]
pub struct EffectivePermissionSet {
    pub principal_arn: String,
    pub documents: Vec<PolicyDocument>,
}

impl EffectivePermissionSet {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Aggregates a principal's reachable policies from a [`PolicyStore`].
pub struct PermissionAggregator<'a, S: PolicyStore> {
    store: &'a S,
    max_concurrency: usize,
}

impl<'a, S: PolicyStore> PermissionAggregator<'a, S> {
    pub fn new(store: &'a S, max_concurrency: usize) -> Self {
        Self {
            store,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Fetches the principal's complete effective permission set.
    ///
    /// All-or-nothing: the first fetch failure aborts the aggregation and
    /// cancels the outstanding per-group fetches. Pagination is drained
    /// for every list call before its results are used.
    pub async fn aggregate(
        &self,
        identity: &PrincipalIdentity,
    ) -> Result<EffectivePermissionSet, StoreError> {
        let mut documents = Vec::new();

        // The principal's own inline policies.
        let inline_names = drain_pages(|marker| {
            self.store.list_user_policies(&identity.user_name, marker)
        })
        .await?;

        for name in inline_names {
            let raw = self.store.get_user_policy(&identity.user_name, &name).await?;
            documents.push(PolicyDocument {
                document: decode_document(&name, &raw),
                name,
                provenance: PolicyProvenance::UserInline,
            });
        }

        debug!(
            "Fetched {} inline policies for {}",
            documents.len(),
            identity.user_name
        );

        // Group memberships, then per-group fetches with bounded fan-out.
        let groups = drain_pages(|marker| {
            self.store.list_groups_for_user(&identity.user_name, marker)
        })
        .await?;

        debug!("{} belongs to {} group(s)", identity.user_name, groups.len());

        let group_documents: Vec<Vec<PolicyDocument>> = stream::iter(groups)
            .map(|group| self.fetch_group_documents(group))
            .buffer_unordered(self.max_concurrency)
            .try_collect()
            .await?;

        // Fan-in. A managed policy attached to several of the principal's
        // groups contributes one document.
        let mut seen_managed = HashSet::new();
        for document in group_documents.into_iter().flatten() {
            if let PolicyProvenance::GroupManaged { arn, .. } = &document.provenance {
                if !seen_managed.insert(arn.clone()) {
                    debug!("Skipping duplicate managed policy {}", arn);
                    continue;
                }
            }
            documents.push(document);
        }

        Ok(EffectivePermissionSet {
            principal_arn: identity.arn.clone(),
            documents,
        })
    }

    /// Fetches one group's inline and managed policy documents.
    async fn fetch_group_documents(
        &self,
        group: String,
    ) -> Result<Vec<PolicyDocument>, StoreError> {
        debug!("Retrieving policies for group {}", group);

        let mut documents = Vec::new();

        let inline_names =
            drain_pages(|marker| self.store.list_group_policies(&group, marker)).await?;

        for name in inline_names {
            let raw = self.store.get_group_policy(&group, &name).await?;
            documents.push(PolicyDocument {
                document: decode_document(&name, &raw),
                name,
                provenance: PolicyProvenance::GroupInline {
                    group: group.clone(),
                },
            });
        }

        let attached =
            drain_pages(|marker| self.store.list_attached_group_policies(&group, marker)).await?;

        for policy in attached {
            // Managed policies are versioned; the document of the current
            // default version is what is in effect.
            let version = self.store.get_policy_default_version(&policy.arn).await?;
            let raw = self
                .store
                .get_policy_version_document(&policy.arn, &version)
                .await?;

            documents.push(PolicyDocument {
                document: decode_document(&policy.name, &raw),
                name: policy.name,
                provenance: PolicyProvenance::GroupManaged {
                    group: group.clone(),
                    arn: policy.arn,
                },
            });
        }

        Ok(documents)
    }
}

/// Decodes a percent-encoded policy document as returned by the policy
/// store. Decode failures are non-fatal: the raw document is attached and
/// may fail to simulate later.
fn decode_document(name: &str, raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            warn!("Could not percent-decode policy document {}: {}", name, e);
            raw.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iam::store::{ManagedPolicyRef, Page};
    use async_trait::async_trait;
    use std::collections::HashMap;

    const DOC: &str = "%7B%22Version%22%3A%20%222012-10-17%22%7D";
    const DECODED_DOC: &str = "{\"Version\": \"2012-10-17\"}";

    /// In-memory store with configurable page size and failure injection.
    #[derive(Default)]
    struct MockStore {
        user_policies: Vec<(String, String)>,
        groups: Vec<String>,
        group_inline: HashMap<String, Vec<(String, String)>>,
        group_managed: HashMap<String, Vec<ManagedPolicyRef>>,
        versions: HashMap<String, (String, String)>,
        page_size: usize,
        fail_op: Option<&'static str>,
    }

    impl MockStore {
        fn new() -> Self {
            Self {
                page_size: 10,
                ..Self::default()
            }
        }

        fn page_of<T: Clone>(&self, items: &[T], marker: Option<String>) -> Page<T> {
            let offset: usize = marker.as_deref().map(|m| m.parse().unwrap()).unwrap_or(0);
            let end = (offset + self.page_size).min(items.len());
            Page {
                items: items[offset..end].to_vec(),
                marker: if end < items.len() {
                    Some(end.to_string())
                } else {
                    None
                },
            }
        }

        fn check(&self, op: &'static str) -> Result<(), StoreError> {
            if self.fail_op == Some(op) {
                return Err(StoreError::Api(format!("{} failed", op)));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl PolicyStore for MockStore {
        async fn list_user_policies(
            &self,
            _user_name: &str,
            marker: Option<String>,
        ) -> Result<Page<String>, StoreError> {
            self.check("list_user_policies")?;
            let names: Vec<String> =
                self.user_policies.iter().map(|(n, _)| n.clone()).collect();
            Ok(self.page_of(&names, marker))
        }

        async fn get_user_policy(
            &self,
            _user_name: &str,
            policy_name: &str,
        ) -> Result<String, StoreError> {
            self.check("get_user_policy")?;
            self.user_policies
                .iter()
                .find(|(n, _)| n == policy_name)
                .map(|(_, d)| d.clone())
                .ok_or(StoreError::MissingField("policy"))
        }

        async fn list_groups_for_user(
            &self,
            _user_name: &str,
            marker: Option<String>,
        ) -> Result<Page<String>, StoreError> {
            self.check("list_groups_for_user")?;
            Ok(self.page_of(&self.groups, marker))
        }

        async fn list_group_policies(
            &self,
            group_name: &str,
            marker: Option<String>,
        ) -> Result<Page<String>, StoreError> {
            self.check("list_group_policies")?;
            let names: Vec<String> = self
                .group_inline
                .get(group_name)
                .map(|v| v.iter().map(|(n, _)| n.clone()).collect())
                .unwrap_or_default();
            Ok(self.page_of(&names, marker))
        }

        async fn get_group_policy(
            &self,
            group_name: &str,
            policy_name: &str,
        ) -> Result<String, StoreError> {
            self.check("get_group_policy")?;
            self.group_inline
                .get(group_name)
                .and_then(|v| v.iter().find(|(n, _)| n == policy_name))
                .map(|(_, d)| d.clone())
                .ok_or(StoreError::MissingField("policy"))
        }

        async fn list_attached_group_policies(
            &self,
            group_name: &str,
            marker: Option<String>,
        ) -> Result<Page<ManagedPolicyRef>, StoreError> {
            self.check("list_attached_group_policies")?;
            let refs = self
                .group_managed
                .get(group_name)
                .cloned()
                .unwrap_or_default();
            Ok(self.page_of(&refs, marker))
        }

        async fn get_policy_default_version(
            &self,
            policy_arn: &str,
        ) -> Result<String, StoreError> {
            self.check("get_policy_default_version")?;
            self.versions
                .get(policy_arn)
                .map(|(v, _)| v.clone())
                .ok_or(StoreError::MissingField("default policy version id"))
        }

        async fn get_policy_version_document(
            &self,
            policy_arn: &str,
            version_id: &str,
        ) -> Result<String, StoreError> {
            self.check("get_policy_version_document")?;
            self.versions
                .get(policy_arn)
                .filter(|(v, _)| v == version_id)
                .map(|(_, d)| d.clone())
                .ok_or(StoreError::MissingField("policy version document"))
        }
    }

    fn identity() -> PrincipalIdentity {
        PrincipalIdentity {
            arn: "arn:aws:iam::123456789012:user/Alice".to_string(),
            user_name: "Alice".to_string(),
        }
    }

    fn managed(name: &str, arn: &str) -> ManagedPolicyRef {
        ManagedPolicyRef {
            name: name.to_string(),
            arn: arn.to_string(),
        }
    }

    #[tokio::test]
    async fn inline_and_managed_yield_two_documents_with_provenance() {
        let mut store = MockStore::new();
        store
            .user_policies
            .push(("user-inline".to_string(), DOC.to_string()));
        store.groups.push("admins".to_string());
        store.group_managed.insert(
            "admins".to_string(),
            vec![managed("PowerUser", "arn:aws:iam::aws:policy/PowerUser")],
        );
        store.versions.insert(
            "arn:aws:iam::aws:policy/PowerUser".to_string(),
            ("v3".to_string(), DOC.to_string()),
        );

        let aggregator = PermissionAggregator::new(&store, 4);
        let set = aggregator.aggregate(&identity()).await.unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.documents[0].name, "user-inline");
        assert_eq!(set.documents[0].provenance, PolicyProvenance::UserInline);
        assert_eq!(set.documents[1].name, "PowerUser");
        assert_eq!(
            set.documents[1].provenance,
            PolicyProvenance::GroupManaged {
                group: "admins".to_string(),
                arn: "arn:aws:iam::aws:policy/PowerUser".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn group_inline_policies_carry_group_provenance() {
        let mut store = MockStore::new();
        store.groups.push("devs".to_string());
        store.group_inline.insert(
            "devs".to_string(),
            vec![("dev-inline".to_string(), DOC.to_string())],
        );

        let aggregator = PermissionAggregator::new(&store, 4);
        let set = aggregator.aggregate(&identity()).await.unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(
            set.documents[0].provenance,
            PolicyProvenance::GroupInline {
                group: "devs".to_string()
            }
        );
    }

    #[tokio::test]
    async fn documents_are_percent_decoded() {
        let mut store = MockStore::new();
        store
            .user_policies
            .push(("user-inline".to_string(), DOC.to_string()));

        let aggregator = PermissionAggregator::new(&store, 4);
        let set = aggregator.aggregate(&identity()).await.unwrap();

        assert_eq!(set.documents[0].document, DECODED_DOC);
    }

    #[tokio::test]
    async fn pagination_is_drained_for_every_list() {
        let mut store = MockStore::new();
        store.page_size = 1;
        for i in 0..3 {
            store
                .user_policies
                .push((format!("inline-{}", i), DOC.to_string()));
        }
        store.groups = vec!["g0".to_string(), "g1".to_string(), "g2".to_string()];
        for group in &store.groups {
            store.group_inline.insert(
                group.clone(),
                vec![
                    (format!("{}-a", group), DOC.to_string()),
                    (format!("{}-b", group), DOC.to_string()),
                ],
            );
        }

        let aggregator = PermissionAggregator::new(&store, 2);
        let set = aggregator.aggregate(&identity()).await.unwrap();

        // 3 user inline + 3 groups x 2 inline
        assert_eq!(set.len(), 9);
    }

    #[tokio::test]
    async fn fetch_failure_aborts_the_whole_aggregation() {
        for fail_op in [
            "list_user_policies",
            "get_user_policy",
            "list_groups_for_user",
            "list_group_policies",
            "get_group_policy",
            "list_attached_group_policies",
            "get_policy_default_version",
            "get_policy_version_document",
        ] {
            let mut store = MockStore::new();
            store
                .user_policies
                .push(("user-inline".to_string(), DOC.to_string()));
            store.groups.push("admins".to_string());
            store.group_inline.insert(
                "admins".to_string(),
                vec![("admin-inline".to_string(), DOC.to_string())],
            );
            store.group_managed.insert(
                "admins".to_string(),
                vec![managed("PowerUser", "arn:aws:iam::aws:policy/PowerUser")],
            );
            store.versions.insert(
                "arn:aws:iam::aws:policy/PowerUser".to_string(),
                ("v1".to_string(), DOC.to_string()),
            );
            store.fail_op = Some(fail_op);

            let aggregator = PermissionAggregator::new(&store, 4);
            let result = aggregator.aggregate(&identity()).await;

            assert!(result.is_err(), "expected failure for {}", fail_op);
        }
    }

    #[tokio::test]
    async fn managed_policy_shared_by_groups_appears_once() {
        let mut store = MockStore::new();
        store.groups = vec!["a".to_string(), "b".to_string()];
        let shared = managed("Shared", "arn:aws:iam::123456789012:policy/Shared");
        store
            .group_managed
            .insert("a".to_string(), vec![shared.clone()]);
        store.group_managed.insert("b".to_string(), vec![shared]);
        store.versions.insert(
            "arn:aws:iam::123456789012:policy/Shared".to_string(),
            ("v2".to_string(), DOC.to_string()),
        );

        let aggregator = PermissionAggregator::new(&store, 4);
        let set = aggregator.aggregate(&identity()).await.unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(set.documents[0].name, "Shared");
    }

    #[tokio::test]
    async fn undecodable_document_is_attached_raw() {
        // Truncated percent escape cannot decode.
        let mut store = MockStore::new();
        store
            .user_policies
            .push(("broken".to_string(), "%E0%A4%A".to_string()));

        let aggregator = PermissionAggregator::new(&store, 4);
        let set = aggregator.aggregate(&identity()).await.unwrap();

        assert_eq!(set.documents[0].document, "%E0%A4%A");
    }

    #[tokio::test]
    async fn principal_without_policies_yields_empty_set() {
        let store = MockStore::new();
        let aggregator = PermissionAggregator::new(&store, 4);
        let set = aggregator.aggregate(&identity()).await.unwrap();

        assert!(set.is_empty());
        assert_eq!(set.principal_arn, identity().arn);
    }
}
