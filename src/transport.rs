//! One UDP endpoint per neighbor, bound to an ephemeral loopback port.
//! Kept deliberately thin so the interesting logic in dispatch/table/
//! selector stays testable without a socket in the loop.

use std::net::UdpSocket;

use tracing::warn;

use crate::error::RouterError;

const MAX_DATAGRAM: usize = 65535;

/// A bound, nonblocking UDP socket plus the neighbor's remote port.
/// Datagrams are exchanged over `localhost`.
pub struct Endpoint {
    socket: UdpSocket,
    remote_port: u16,
}

impl Endpoint {
    pub fn bind(remote_port: u16) -> Result<Self, RouterError> {
        let socket = UdpSocket::bind("127.0.0.1:0")
            .map_err(|e| RouterError::BindFailed(e.to_string()))?;
        socket
            .set_nonblocking(true)
            .map_err(|e| RouterError::BindFailed(e.to_string()))?;
        Ok(Endpoint { socket, remote_port })
    }

    pub fn send(&self, bytes: &[u8]) {
        if let Err(e) = self
            .socket
            .send_to(bytes, ("127.0.0.1", self.remote_port))
        {
            warn!(port = self.remote_port, error = %e, "failed to send datagram");
        }
    }

    /// Non-blocking receive attempt. `None` means nothing was ready; callers
    /// drive the poll loop themselves.
    pub fn try_recv(&self) -> Option<Vec<u8>> {
        let mut buf = [0u8; MAX_DATAGRAM];
        match self.socket.recv(&mut buf) {
            Ok(n) => Some(buf[..n].to_vec()),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => None,
            Err(e) => {
                warn!(port = self.remote_port, error = %e, "recv error");
                None
            }
        }
    }
}
