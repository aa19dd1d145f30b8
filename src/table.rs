//! The forwarding table and its aggregator. Attributes live directly on each
//! `Route` since the interesting operation here isn't attribute dedup but
//! adjacent-prefix merging. The aggregation loop never mutates the live
//! table while scanning it: every pass computes candidate merges from an
//! immutable snapshot and only then replaces entries, repeating to a fixed
//! point.

use crate::message::{Origin, TableEntry};
use crate::prefix::{self, Addr};
use crate::rib::{Announcement, Rib};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    pub network: u32,
    pub netmask: u32,
    pub peer: Addr,
    pub origin: Origin,
    pub localpref: u32,
    pub self_origin: bool,
    pub as_path: Vec<u32>,
}

impl Route {
    /// All attributes relevant to aggregation's `sameAttributes` check
    /// (origin, localpref, netmask, ASPath, selfOrigin, peer) -- network
    /// itself is handled separately since it must be equal or adjacent,
    /// not equal.
    fn same_attributes(&self, other: &Route) -> bool {
        self.origin == other.origin
            && self.localpref == other.localpref
            && self.netmask == other.netmask
            && self.as_path == other.as_path
            && self.self_origin == other.self_origin
            && self.peer == other.peer
    }

    fn to_table_entry(&self, self_asn: u32) -> TableEntry {
        // ASPath is stored locally with self prepended; a dump strips it.
        let mut as_path = self.as_path.clone();
        if as_path.first() == Some(&self_asn) {
            as_path.remove(0);
        }
        TableEntry {
            origin: self.origin,
            localpref: self.localpref,
            network: prefix::u32_to_ip(self.network),
            as_path,
            netmask: prefix::u32_to_ip(self.netmask),
            peer: self.peer.to_string(),
            self_origin: self.self_origin,
        }
    }
}

#[derive(Default)]
pub struct ForwardingTable {
    routes: Vec<Route>,
}

impl ForwardingTable {
    pub fn new() -> Self {
        ForwardingTable { routes: Vec::new() }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Appends a route, then runs aggregation to a fixed point (called
    /// after every `update`).
    pub fn install(&mut self, route: Route) {
        self.routes.push(route);
        self.aggregate();
    }

    /// Clears the table and replays every announcement in the RIB through
    /// the same route-construction path as `install`, then aggregates once
    /// at the end (equivalent to aggregating after each replay step, since
    /// aggregation is idempotent at a fixed point).
    pub fn rebuild(&mut self, rib: &Rib, self_asn: u32) {
        self.routes.clear();
        for record in rib.records() {
            match record {
                Announcement::Update { source, body } => {
                    if let Ok(route) = route_from_update(*source, self_asn, body) {
                        self.routes.push(route);
                    }
                }
                // A handshake carries no route payload: the "update table"
                // step on receipt of a handshake is a no-op. See DESIGN.md
                // "Open Questions".
                Announcement::Handshake { .. } => {}
            }
        }
        self.aggregate();
    }

    /// Fixed-point merge of adjacent, equal-attribute entries. Computes
    /// candidate merges from an immutable snapshot each pass and only then
    /// mutates `self.routes`, repeating until a full pass finds nothing to
    /// merge.
    pub fn aggregate(&mut self) {
        loop {
            let mut snapshot: Vec<Route> = self.routes.clone();
            snapshot.sort_by_key(|r| r.network);

            let merge = find_first_merge(&snapshot);
            let Some((lower, upper, merged)) = merge else {
                break;
            };

            remove_one(&mut self.routes, &lower);
            remove_one(&mut self.routes, &upper);
            self.routes.push(merged);
        }
    }

    pub fn to_table_entries(&self, self_asn: u32) -> Vec<TableEntry> {
        self.routes.iter().map(|r| r.to_table_entry(self_asn)).collect()
    }
}

fn remove_one(routes: &mut Vec<Route>, target: &Route) {
    if let Some(idx) = routes.iter().position(|r| r == target) {
        routes.remove(idx);
    }
}

/// Scans a network-sorted snapshot for the first adjacent, equal-attribute
/// pair and returns (lower, upper, merged).
fn find_first_merge(snapshot: &[Route]) -> Option<(Route, Route, Route)> {
    for e in snapshot {
        for f in snapshot {
            if std::ptr::eq(e, f) {
                continue;
            }
            if !e.same_attributes(f) {
                continue;
            }
            let (lower, upper) = if e.network <= f.network { (e, f) } else { (f, e) };
            let (low, high) = prefix::range(lower.network, lower.netmask);
            let adjacent = low <= upper.network && upper.network <= high.saturating_add(1);
            if !adjacent {
                continue;
            }

            let merged = if lower.network == upper.network {
                // Same prefix duplicated under equal attributes: this
                // should never have been duplicated in the first place.
                // Treat as a no-op merge: drop the duplicate, keep the
                // mask unchanged.
                lower.clone()
            } else {
                let cidr = prefix::mask_to_cidr(lower.netmask).unwrap_or(0);
                let shortened = prefix::cidr_to_mask(cidr.saturating_sub(1));
                Route {
                    network: lower.network,
                    netmask: shortened,
                    ..lower.clone()
                }
            };
            return Some((lower.clone(), upper.clone(), merged));
        }
    }
    None
}

/// Builds a `Route` from an inbound update body, prepending the router's
/// own AS number. An empty inbound ASPath becomes `[self_asn]` rather than
/// prepending onto nothing.
pub fn route_from_update(
    source: Addr,
    self_asn: u32,
    body: &crate::message::UpdateBody,
) -> Result<Route, crate::error::RouterError> {
    use crate::error::RouterError;

    let network = prefix::ip_to_u32(&body.network)?;
    let netmask = prefix::ip_to_u32(&body.netmask)?;
    prefix::mask_to_cidr(netmask)?; // validates contiguity
    let network = network & netmask; // enforce well-formed-prefix invariant

    let localpref = body
        .localpref
        .ok_or_else(|| RouterError::MalformedMessage("update missing localpref".into()))?;
    let origin = body
        .origin
        .ok_or_else(|| RouterError::MalformedMessage("update missing origin".into()))?;
    let self_origin = body
        .self_origin
        .ok_or_else(|| RouterError::MalformedMessage("update missing selfOrigin".into()))?;

    let as_path = if body.as_path.is_empty() {
        vec![self_asn]
    } else {
        std::iter::once(self_asn).chain(body.as_path.iter().copied()).collect()
    };

    Ok(Route {
        network,
        netmask,
        peer: source,
        origin,
        localpref,
        self_origin,
        as_path,
    })
}
