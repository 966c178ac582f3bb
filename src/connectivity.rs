//! TCP-level reachability check for the measurement service.
//!
//! Used once at startup to pick the coordinator's initial mode, and again
//! only when the application explicitly asks for a re-probe.

use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::config::Config;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
}

impl Probe {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.probe_host.clone(), config.probe_port, config.probe_timeout())
    }

    /// True if a TCP connection to any resolved address of the host opens
    /// within the timeout. The connection is closed straight away.
    pub fn is_reachable(&self) -> bool {
        let addrs = match (self.host.as_str(), self.port).to_socket_addrs() {
            Ok(addrs) => addrs,
            Err(e) => {
                info!(host = %self.host, error = %e, "probe: host did not resolve");
                return false;
            }
        };

        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(_) => {
                    debug!(%addr, "probe: connected");
                    return true;
                }
                Err(e) => debug!(%addr, error = %e, "probe: connect failed"),
            }
        }

        info!(host = %self.host, port = self.port, "probe: service unreachable");
        false
    }
}
