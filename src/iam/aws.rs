//! AWS-backed implementations of the policy store and simulator.
//!
//! Thin adapters over the IAM API: pagination is exposed through the
//! marker contract of [`Page`], percent-decoding and aggregation policy
//! live in the aggregator, and verdict interpretation in the analyzer.

use async_trait::async_trait;

use aws_sdk_iam::error::DisplayErrorContext;
use aws_sdk_iam::types::PolicyEvaluationDecisionType;

use super::simulator::{ActionDecision, PolicySimulator, SimulationError, Verdict};
use super::store::{ManagedPolicyRef, Page, PolicyStore, StoreError};

/// Policy store backed by the IAM API.
pub struct AwsPolicyStore {
    client: aws_sdk_iam::Client,
}

impl AwsPolicyStore {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_iam::Client::new(config),
        }
    }
}

fn api_error<E>(err: E) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    StoreError::Api(format!("{}", DisplayErrorContext(err)))
}

/// Converts IAM's `is_truncated`/`marker` pair into the page contract.
fn next_marker(is_truncated: bool, marker: Option<&str>) -> Option<String> {
    if is_truncated {
        marker.map(str::to_string)
    } else {
        None
    }
}

#[async_trait]
impl PolicyStore for AwsPolicyStore {
    async fn list_user_policies(
        &self,
        user_name: &str,
        marker: Option<String>,
    ) -> Result<Page<String>, StoreError> {
        let output = self
            .client
            .list_user_policies()
            .user_name(user_name)
            .set_marker(marker)
            .send()
            .await
            .map_err(api_error)?;

        Ok(Page {
            items: output.policy_names().to_vec(),
            marker: next_marker(output.is_truncated(), output.marker()),
        })
    }

    async fn get_user_policy(
        &self,
        user_name: &str,
        policy_name: &str,
    ) -> Result<String, StoreError> {
        let output = self
            .client
            .get_user_policy()
            .user_name(user_name)
            .policy_name(policy_name)
            .send()
            .await
            .map_err(api_error)?;

        Ok(output.policy_document().to_string())
    }

    async fn list_groups_for_user(
        &self,
        user_name: &str,
        marker: Option<String>,
    ) -> Result<Page<String>, StoreError> {
        let output = self
            .client
            .list_groups_for_user()
            .user_name(user_name)
            .set_marker(marker)
            .send()
            .await
            .map_err(api_error)?;

        Ok(Page {
            items: output
                .groups()
                .iter()
                .map(|g| g.group_name().to_string())
                .collect(),
            marker: next_marker(output.is_truncated(), output.marker()),
        })
    }

    async fn list_group_policies(
        &self,
        group_name: &str,
        marker: Option<String>,
    ) -> Result<Page<String>, StoreError> {
        let output = self
            .client
            .list_group_policies()
            .group_name(group_name)
            .set_marker(marker)
            .send()
            .await
            .map_err(api_error)?;

        Ok(Page {
            items: output.policy_names().to_vec(),
            marker: next_marker(output.is_truncated(), output.marker()),
        })
    }

    async fn get_group_policy(
        &self,
        group_name: &str,
        policy_name: &str,
    ) -> Result<String, StoreError> {
        let output = self
            .client
            .get_group_policy()
            .group_name(group_name)
            .policy_name(policy_name)
            .send()
            .await
            .map_err(api_error)?;

        Ok(output.policy_document().to_string())
    }

    async fn list_attached_group_policies(
        &self,
        group_name: &str,
        marker: Option<String>,
    ) -> Result<Page<ManagedPolicyRef>, StoreError> {
        let output = self
            .client
            .list_attached_group_policies()
            .group_name(group_name)
            .set_marker(marker)
            .send()
            .await
            .map_err(api_error)?;

        let items = output
            .attached_policies()
            .iter()
            .filter_map(|p| match (p.policy_name(), p.policy_arn()) {
                (Some(name), Some(arn)) => Some(ManagedPolicyRef {
                    name: name.to_string(),
                    arn: arn.to_string(),
                }),
                _ => {
                    log::warn!(
                        "Attached policy on group {} missing name or ARN, skipping",
                        group_name
                    );
                    None
                }
            })
            .collect();

        Ok(Page {
            items,
            marker: next_marker(output.is_truncated(), output.marker()),
        })
    }

    async fn get_policy_default_version(&self, policy_arn: &str) -> Result<String, StoreError> {
        let output = self
            .client
            .get_policy()
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(api_error)?;

        output
            .policy()
            .and_then(|p| p.default_version_id())
            .map(str::to_string)
            .ok_or(StoreError::MissingField("default policy version id"))
    }

    async fn get_policy_version_document(
        &self,
        policy_arn: &str,
        version_id: &str,
    ) -> Result<String, StoreError> {
        let output = self
            .client
            .get_policy_version()
            .policy_arn(policy_arn)
            .version_id(version_id)
            .send()
            .await
            .map_err(api_error)?;

        output
            .policy_version()
            .and_then(|v| v.document())
            .map(str::to_string)
            .ok_or(StoreError::MissingField("policy version document"))
    }
}

/// Simulator backed by `SimulatePrincipalPolicy`.
pub struct AwsPolicySimulator {
    client: aws_sdk_iam::Client,
}

impl AwsPolicySimulator {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_iam::Client::new(config),
        }
    }
}

#[async_trait]
impl PolicySimulator for AwsPolicySimulator {
    async fn simulate(
        &self,
        principal_arn: &str,
        actions: &[String],
    ) -> Result<Vec<ActionDecision>, SimulationError> {
        let mut decisions = Vec::new();
        let mut marker: Option<String> = None;

        // The simulation's own results are paginated as well.
        loop {
            let output = self
                .client
                .simulate_principal_policy()
                .policy_source_arn(principal_arn)
                .set_action_names(Some(actions.to_vec()))
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| SimulationError::Api(format!("{}", DisplayErrorContext(e))))?;

            for result in output.evaluation_results() {
                decisions.push(ActionDecision {
                    action: result.eval_action_name().to_string(),
                    verdict: decision_verdict(result.eval_decision()),
                });
            }

            match next_marker(output.is_truncated(), output.marker()) {
                Some(next) => marker = Some(next),
                None => break,
            }
        }

        Ok(decisions)
    }
}

/// Maps the simulator's raw decision onto a verdict. Anything that is not
/// a definite allow or deny counts as indeterminate.
fn decision_verdict(decision: &PolicyEvaluationDecisionType) -> Verdict {
    match decision {
        PolicyEvaluationDecisionType::Allowed => Verdict::Allowed,
        PolicyEvaluationDecisionType::ExplicitDeny | PolicyEvaluationDecisionType::ImplicitDeny => {
            Verdict::Denied
        }
        _ => Verdict::Indeterminate,
    }
}
