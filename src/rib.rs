//! The route-information base: an append-only, insertion-ordered log of
//! every announcement received, used to rebuild the forwarding table after
//! a withdrawal.

use crate::message::UpdateBody;
use crate::prefix::Addr;

#[derive(Clone, Debug)]
pub enum Announcement {
    Update { source: Addr, body: UpdateBody },
    /// Recorded for completeness, but carries no route payload -- a
    /// handshake's `update table` step is a documented no-op (see
    /// DESIGN.md "Open Questions").
    Handshake { source: Addr },
}

impl Announcement {
    pub fn source(&self) -> Addr {
        match self {
            Announcement::Update { source, .. } => *source,
            Announcement::Handshake { source } => *source,
        }
    }
}

#[derive(Default)]
pub struct Rib {
    records: Vec<Announcement>,
}

impl Rib {
    pub fn new() -> Self {
        Rib { records: Vec::new() }
    }

    pub fn append_update(&mut self, source: Addr, body: UpdateBody) {
        self.records.push(Announcement::Update { source, body });
    }

    pub fn append_handshake(&mut self, source: Addr) {
        self.records.push(Announcement::Handshake { source });
    }

    /// Removes the first record from `source` whose (network, netmask)
    /// matches. Returns whether a record was found; a withdraw for an
    /// unknown prefix is a no-op, not an error.
    pub fn remove_matching(&mut self, source: Addr, network: &str, netmask: &str) -> bool {
        if let Some(idx) = self.records.iter().position(|rec| match rec {
            Announcement::Update { source: s, body } => {
                *s == source && body.network == network && body.netmask == netmask
            }
            Announcement::Handshake { .. } => false,
        }) {
            self.records.remove(idx);
            true
        } else {
            false
        }
    }

    pub fn records(&self) -> &[Announcement] {
        &self.records
    }
}
