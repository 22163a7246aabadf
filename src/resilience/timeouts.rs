//! Timeout enforcement for outbound calls.

use std::future::Future;
use std::time::Duration;

use tokio::time::error::Elapsed;

use crate::config::schema::TimeoutConfig;

/// Deadlines applied to every outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutboundTimeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl OutboundTimeouts {
    pub fn from_config(config: &TimeoutConfig) -> Self {
        Self {
            connect: Duration::from_secs(config.connect_secs),
            request: Duration::from_secs(config.request_secs),
        }
    }

    /// Run `fut` under the total request deadline.
    pub async fn bounded<F: Future>(&self, fut: F) -> Result<F::Output, Elapsed> {
        tokio::time::timeout(self.request, fut).await
    }
}

impl Default for OutboundTimeouts {
    fn default() -> Self {
        Self::from_config(&TimeoutConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let timeouts = OutboundTimeouts::from_config(&TimeoutConfig {
            connect_secs: 2,
            request_secs: 7,
        });
        assert_eq!(timeouts.connect, Duration::from_secs(2));
        assert_eq!(timeouts.request, Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_expires() {
        let timeouts = OutboundTimeouts {
            connect: Duration::from_secs(1),
            request: Duration::from_secs(1),
        };
        let slow = tokio::time::sleep(Duration::from_secs(5));
        assert!(timeouts.bounded(slow).await.is_err());

        let fast = async { 42 };
        assert_eq!(timeouts.bounded(fast).await.unwrap(), 42);
    }
}
