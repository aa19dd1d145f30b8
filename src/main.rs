//! Entry point: parses the command line, binds one UDP endpoint per
//! neighbor, sends the startup handshakes, and runs the single-threaded
//! cooperative poll loop.

use std::process::ExitCode;
use std::time::Duration;

use tracing::{error, info};

use routerd::config::RouterConfig;
use routerd::error::RouterError;
use routerd::neighbor::{Neighbor, NeighborTable};
use routerd::router::Router;
use routerd::transport::Endpoint;

/// Readiness poll interval when no socket has data waiting.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "fatal startup error");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), RouterError> {
    let config = RouterConfig::from_args()?;

    info!(asn = config.asn, neighbor_count = config.neighbors.len(), "starting router");

    let mut neighbors = Vec::with_capacity(config.neighbors.len());
    for conn in &config.neighbors {
        info!(addr = %conn.addr, relation = ?conn.relationship, port = conn.port, "configuring neighbor");
        let endpoint = Endpoint::bind(conn.port)?;
        neighbors.push(Neighbor {
            addr: conn.addr,
            relationship: conn.relationship,
            endpoint,
        });
    }

    let addrs: Vec<_> = neighbors.iter().map(|n| n.addr).collect();
    let table = NeighborTable::new(neighbors);
    let mut router = Router::new(config.asn, table);
    router.send_handshakes();

    poll_loop(&mut router, &addrs);
    Ok(())
}

/// Round-robins every neighbor socket each iteration; a full round with no
/// datagram delivered sleeps for [`POLL_INTERVAL`] before trying again.
/// No locks, no shared mutable state -- every datagram is processed to
/// completion before the next is read.
fn poll_loop(router: &mut Router, addrs: &[routerd::prefix::Addr]) {
    loop {
        let mut any_ready = false;
        for &addr in addrs {
            let bytes = {
                let neighbor = router
                    .neighbors()
                    .get(addr)
                    .expect("addrs drawn from the same neighbor table");
                neighbor.endpoint.try_recv()
            };
            if let Some(bytes) = bytes {
                any_ready = true;
                router.dispatch(addr, &bytes);
            }
        }
        if !any_ready {
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}
