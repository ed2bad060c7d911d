//! Power-command agent for PC Remote Control.
//!
//! A small always-on HTTP daemon that runs on the target desktop and maps
//! four routes to OS power actions (see [`http`] for the wire contract).
//! The host platform is resolved once at startup; `TEST_MODE` switches the
//! executor into simulate mode so the HTTP contract can be exercised
//! without actually powering off the machine.

pub mod config;
pub mod error;
pub mod executor;
pub mod http;
pub mod platform;

use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use hyper::service::{make_service_fn, service_fn};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

pub use config::AgentConfig;
pub use error::{AgentError, Result};
pub use executor::CommandExecutor;
pub use http::AgentContext;
pub use platform::Platform;

/// Handle to a running agent. Stops the server when shut down or dropped.
pub struct AgentHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
    local_addr: SocketAddr,
}

impl AgentHandle {
    /// Address the server actually bound (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop the server gracefully and wait for it to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.task).await;
    }
}

impl Drop for AgentHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Bind all interfaces on `config.port` and serve the agent routes until
/// the returned handle is shut down.
pub async fn serve(config: AgentConfig) -> Result<AgentHandle> {
    let platform = Platform::detect();
    let ctx = Arc::new(AgentContext::new(platform, config.test_mode));

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port));
    let make_service = make_service_fn(move |_conn| {
        let ctx = ctx.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| http::handle_request(req, ctx.clone())))
        }
    });

    let server = hyper::Server::try_bind(&addr)?.serve(make_service);
    let local_addr = server.local_addr();

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let graceful = server.with_graceful_shutdown(async {
        let _ = shutdown_rx.await;
    });

    info!(
        port = local_addr.port(),
        local_ip = %local_ipv4(),
        platform = platform.as_str(),
        test_mode = config.test_mode,
        "remote control agent listening on all interfaces"
    );
    info!("endpoints available: /shutdown, /restart, /sleep, /health");

    let task = tokio::spawn(async move {
        if let Err(e) = graceful.await {
            error!("agent server error: {e}");
        }
    });

    Ok(AgentHandle {
        shutdown: Some(shutdown_tx),
        task,
        local_addr,
    })
}

/// Best-effort local (non-loopback) IPv4 address, for the startup log so
/// users can find the agent from their phone. Falls back to loopback.
///
/// Uses the connected-datagram trick instead of interface enumeration: no
/// packet is actually sent to the probe address.
pub fn local_ipv4() -> IpAddr {
    std::net::UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .and_then(|socket| {
            socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80))?;
            socket.local_addr()
        })
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}
