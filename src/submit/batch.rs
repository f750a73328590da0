//! Asynchronous (fire-and-forget) submission through the scheduler.

use async_trait::async_trait;
use log::{info, warn};
use std::sync::Arc;

use super::traits::Submitter;
use crate::domain::{JobDescriptor, SubmissionResult};
use crate::scheduler::{SchedulerClient, SubmitThrottle};

/// Submits descriptors to the batch scheduler, one attempt each, spaced by
/// the courtesy throttle.
pub struct SchedulerSubmitter {
    client: Arc<dyn SchedulerClient>,
    throttle: SubmitThrottle,
}

impl SchedulerSubmitter {
    pub fn new(client: Arc<dyn SchedulerClient>) -> Self {
        Self {
            client,
            throttle: SubmitThrottle::default(),
        }
    }

    pub fn with_throttle(mut self, throttle: SubmitThrottle) -> Self {
        self.throttle = throttle;
        self
    }
}

#[async_trait]
impl Submitter for SchedulerSubmitter {
    async fn submit(&self, descriptor: JobDescriptor) -> SubmissionResult {
        self.throttle.acquire().await;
        match self.client.submit(&descriptor).await {
            Ok(handle) => {
                info!("Submitted {} as job {}", descriptor.name, handle);
                SubmissionResult::Submitted { handle }
            }
            Err(e) => {
                warn!("Scheduler rejected {}: {}", descriptor.name, e);
                SubmissionResult::SubmissionRejected { message: e.to_string() }
            }
        }
    }

    fn description(&self) -> &str {
        self.client.name()
    }
}
