use std::sync::Arc;

use crate::campaign_client::CampaignClient;
use crate::submission::RetryPolicy;

/// Shared router state. The campaign client keeps one connection pool for
/// the whole process; everything per-submission lives in the pipeline each
/// request constructs for itself.
#[derive(Clone)]
pub struct AppState {
    pub campaign_client: Arc<CampaignClient>,
    pub retry_policy: RetryPolicy,
}

impl AppState {
    pub fn new(campaign_client: CampaignClient, retry_policy: RetryPolicy) -> Self {
        Self {
            campaign_client: Arc::new(campaign_client),
            retry_policy,
        }
    }
}
