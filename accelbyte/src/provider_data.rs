//! Provider data structure passed to resources and data sources

use crate::api::Client;
use std::sync::Arc;
use std::time::Duration;

/// Wait after match pool writes before the service's read path is trusted
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(20);

/// The logged-in session shared by every resource and data source instance
#[derive(Clone)]
pub struct AccelByteProviderData {
    pub client: Arc<Client>,
    pub settle_delay: Duration,
}

impl AccelByteProviderData {
    pub fn new(client: Client) -> Self {
        Self {
            client: Arc::new(client),
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }
}
