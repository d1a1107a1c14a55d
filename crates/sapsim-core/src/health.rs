//! Per-system liveness probes.
//!
//! The registry only aggregates; what "healthy" means is chosen per system
//! in configuration. Probes never fail: any error counts as unhealthy and
//! is logged.

use std::time::Duration;

use sapsim_store::DataProvider;
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tracing::debug;

/// How a system decides whether it is healthy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HealthProbe {
    /// A fixed answer.
    Static {
        /// The reported status.
        healthy: bool,
    },
    /// Healthy when a TCP connection to `address` opens within the timeout.
    Tcp {
        /// `host:port` to connect to.
        address: String,
        /// Connect timeout in milliseconds.
        #[serde(default = "default_tcp_timeout_ms")]
        timeout_ms: u64,
    },
    /// Healthy when the mock data provider answers a ping.
    DataStore,
}

const fn default_tcp_timeout_ms() -> u64 {
    1000
}

impl Default for HealthProbe {
    fn default() -> Self {
        Self::Static { healthy: true }
    }
}

impl HealthProbe {
    /// Run the probe.
    pub async fn check(&self, data: &DataProvider) -> bool {
        match self {
            Self::Static { healthy } => *healthy,
            Self::Tcp {
                address,
                timeout_ms,
            } => {
                let connect = TcpStream::connect(address.as_str());
                match tokio::time::timeout(Duration::from_millis(*timeout_ms), connect).await {
                    Ok(Ok(_)) => true,
                    Ok(Err(e)) => {
                        debug!(address = %address, error = %e, "TCP health probe failed");
                        false
                    }
                    Err(_) => {
                        debug!(address = %address, timeout_ms, "TCP health probe timed out");
                        false
                    }
                }
            }
            Self::DataStore => match data.ping().await {
                Ok(()) => true,
                Err(e) => {
                    debug!(backend = data.name(), error = %e, "Data store health probe failed");
                    false
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_probe_reports_flag() {
        let data = DataProvider::in_memory();
        assert!(HealthProbe::Static { healthy: true }.check(&data).await);
        assert!(!HealthProbe::Static { healthy: false }.check(&data).await);
    }

    #[tokio::test]
    async fn data_store_probe_uses_ping() {
        let data = DataProvider::in_memory();
        assert!(HealthProbe::DataStore.check(&data).await);
    }

    #[tokio::test]
    async fn tcp_probe_reaches_listener() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await;
        let Ok(listener) = listener else { return };
        let Ok(addr) = listener.local_addr() else { return };

        let probe = HealthProbe::Tcp {
            address: addr.to_string(),
            timeout_ms: 500,
        };
        assert!(probe.check(&DataProvider::in_memory()).await);

        drop(listener);
        let closed = HealthProbe::Tcp {
            address: addr.to_string(),
            timeout_ms: 500,
        };
        assert!(!closed.check(&DataProvider::in_memory()).await);
    }

    #[test]
    fn probe_deserializes_from_yaml() {
        let probe: Result<HealthProbe, _> = serde_yml::from_str("kind: tcp\naddress: localhost:3300\n");
        assert_eq!(
            probe.ok(),
            Some(HealthProbe::Tcp {
                address: String::from("localhost:3300"),
                timeout_ms: 1000,
            })
        );
    }
}
