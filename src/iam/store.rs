//! Policy store contract.
//!
//! The aggregator consumes policy documents through this trait; the AWS
//! implementation lives in [`super::aws`]. Every list operation is
//! paginated with a continuation marker, and callers are expected to
//! drain pagination with [`drain_pages`] before using the results.

use std::future::Future;

use async_trait::async_trait;
use thiserror::Error;

/// One page of a paginated list operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,

    /// Continuation marker for the next page; `None` on the last page.
    pub marker: Option<String>,
}

impl<T> Page<T> {
    /// A single, final page.
    pub fn complete(items: Vec<T>) -> Self {
        Self {
            items,
            marker: None,
        }
    }
}

/// Reference to a managed policy attached to a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedPolicyRef {
    pub name: String,
    pub arn: String,
}

/// Errors raised by a policy store.
///
/// Any store error aborts the aggregation it occurs in; there is no
/// partial-result mode (see [`super::aggregator`]).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Api(String),

    #[error("Policy store response missing {0}")]
    MissingField(&'static str),
}

/// List/get operations over a principal's reachable policies.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Names of the principal's own inline policies.
    async fn list_user_policies(
        &self,
        user_name: &str,
        marker: Option<String>,
    ) -> Result<Page<String>, StoreError>;

    /// Document of one of the principal's inline policies.
    async fn get_user_policy(
        &self,
        user_name: &str,
        policy_name: &str,
    ) -> Result<String, StoreError>;

    /// Names of the groups the principal belongs to.
    async fn list_groups_for_user(
        &self,
        user_name: &str,
        marker: Option<String>,
    ) -> Result<Page<String>, StoreError>;

    /// Names of a group's inline policies.
    async fn list_group_policies(
        &self,
        group_name: &str,
        marker: Option<String>,
    ) -> Result<Page<String>, StoreError>;

    /// Document of one of a group's inline policies.
    async fn get_group_policy(
        &self,
        group_name: &str,
        policy_name: &str,
    ) -> Result<String, StoreError>;

    /// Managed policies attached to a group.
    async fn list_attached_group_policies(
        &self,
        group_name: &str,
        marker: Option<String>,
    ) -> Result<Page<ManagedPolicyRef>, StoreError>;

    /// Identifier of a managed policy's currently effective version.
    async fn get_policy_default_version(&self, policy_arn: &str) -> Result<String, StoreError>;

    /// Document of a specific managed policy version.
    async fn get_policy_version_document(
        &self,
        policy_arn: &str,
        version_id: &str,
    ) -> Result<String, StoreError>;
}

/// Drains a paginated list operation to exhaustion.
///
/// The fetch closure is called with the continuation marker of the
/// previous page (`None` for the first) until a page without a marker is
/// returned. Stopping at the first page would silently under-report, so
/// every list call in the aggregator goes through here.
pub async fn drain_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>, StoreError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, StoreError>>,
{
    let mut items = Vec::new();
    let mut marker: Option<String> = None;

    loop {
        let page = fetch(marker.take()).await?;
        items.extend(page.items);

        match page.marker {
            Some(next) => marker = Some(next),
            None => break,
        }
    }

    Ok(items)
}
