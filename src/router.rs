//! The message dispatcher and dump responder. Classifies inbound envelopes
//! by `type` and invokes the RIB, forwarding table, selector, and policy
//! filter; emits outbound envelopes through the neighbor table's transport
//! handles.

use tracing::{debug, warn};

use crate::error::RouterError;
use crate::message::{Empty, Envelope, Message, PrefixKey, UpdateBody};
use crate::neighbor::{self, Neighbor, NeighborTable, Relationship};
use crate::prefix::{self, Addr};
use crate::rib::Rib;
use crate::table::{self, ForwardingTable, Route};

pub struct Router {
    pub asn: u32,
    neighbors: NeighborTable,
    rib: Rib,
    table: ForwardingTable,
}

impl Router {
    pub fn new(asn: u32, neighbors: NeighborTable) -> Self {
        Router {
            asn,
            neighbors,
            rib: Rib::new(),
            table: ForwardingTable::new(),
        }
    }

    pub fn forwarding_table(&self) -> &ForwardingTable {
        &self.table
    }

    /// Exposes the neighbor table so the poll loop can read each
    /// neighbor's transport handle without the router borrowing itself
    /// mutably for the whole round.
    pub fn neighbors(&self) -> &NeighborTable {
        &self.neighbors
    }

    /// Sends one handshake to every configured neighbor, intended to be
    /// called once at startup.
    pub fn send_handshakes(&self) {
        for n in self.neighbors.iter() {
            self.send_to(n, Message::Handshake(Empty {}));
        }
    }

    /// Dispatches one inbound datagram received from `from_neighbor`.
    /// Unknown neighbors, malformed JSON, and unknown message types are
    /// logged and dropped, never fatal.
    pub fn dispatch(&mut self, from_neighbor: Addr, raw: &[u8]) {
        if self.neighbors.get(from_neighbor).is_none() {
            warn!(neighbor = %from_neighbor, "dropping datagram from unknown neighbor");
            return;
        }

        let envelope = match Envelope::from_bytes(raw) {
            Ok(e) => e,
            Err(e) => {
                warn!(neighbor = %from_neighbor, error = %e, "dropping malformed JSON");
                return;
            }
        };

        let kind = envelope_kind(&envelope.message);
        debug!(neighbor = %from_neighbor, kind, "dispatching message");

        let result = match envelope.message {
            Message::Handshake(_) => self.handle_handshake(from_neighbor),
            Message::Update(body) => self.handle_update(from_neighbor, body),
            Message::Withdraw(prefixes) => self.handle_withdraw(from_neighbor, prefixes),
            Message::Dump(_) => self.handle_dump(from_neighbor),
            Message::Data(payload) => self.handle_data(from_neighbor, &envelope.src, &envelope.dst, payload),
            // Reply-only message kinds; a well-behaved peer never sends
            // these to us.
            Message::Table(_) | Message::NoRoute(_) => {
                Err(RouterError::UnknownMessageType(kind.to_string()))
            }
        };

        if let Err(e) = result {
            warn!(neighbor = %from_neighbor, error = %e, "error processing message");
        }
    }

    fn handle_handshake(&mut self, from_neighbor: Addr) -> Result<(), RouterError> {
        self.rib.append_handshake(from_neighbor);
        // A handshake carries no route, so "update table" has nothing to
        // install; aggregate is still invoked for conformance with the
        // dispatch table, but it is a no-op here.
        self.table.aggregate();
        Ok(())
    }

    fn handle_update(&mut self, from_neighbor: Addr, body: UpdateBody) -> Result<(), RouterError> {
        let route = table::route_from_update(from_neighbor, self.asn, &body)?;
        self.rib.append_update(from_neighbor, body);
        self.table.install(route.clone());
        self.announce_update(from_neighbor, &route);
        Ok(())
    }

    fn handle_withdraw(&mut self, from_neighbor: Addr, prefixes: Vec<PrefixKey>) -> Result<(), RouterError> {
        for p in &prefixes {
            // Returns false for an unknown prefix; that is a documented
            // no-op, not an error.
            self.rib.remove_matching(from_neighbor, &p.network, &p.netmask);
        }
        self.table.rebuild(&self.rib, self.asn);
        self.announce_withdraw(from_neighbor, prefixes);
        Ok(())
    }

    fn handle_dump(&mut self, from_neighbor: Addr) -> Result<(), RouterError> {
        let entries = self.table.to_table_entries(self.asn);
        let neighbor = self.neighbors.get(from_neighbor).expect("checked in dispatch");
        self.send_to(neighbor, Message::Table(entries));
        Ok(())
    }

    fn handle_data(
        &mut self,
        from_neighbor: Addr,
        src: &str,
        dst: &str,
        payload: serde_json::Value,
    ) -> Result<(), RouterError> {
        let src_addr = prefix::ip_to_u32(src)?;
        let dst_addr = prefix::ip_to_u32(dst)?;

        let chosen_for_dst = self.best_covering(dst_addr);
        let chosen_for_src = self.best_covering(src_addr);

        let Some(dst_route) = chosen_for_dst else {
            self.reply_no_route(from_neighbor, chosen_for_src, src);
            return Ok(());
        };

        let rel_outbound = self.neighbors.relationship_of(dst_route.peer);
        let rel_inbound = chosen_for_src.and_then(|r| self.neighbors.relationship_of(r.peer));

        let allowed = rel_outbound == Some(Relationship::Customer)
            || rel_inbound == Some(Relationship::Customer);

        if !allowed {
            self.reply_no_route(from_neighbor, chosen_for_src, src);
            return Ok(());
        }

        let next_hop = self
            .neighbors
            .get(dst_route.peer)
            .expect("route peer is always a configured neighbor");
        let envelope = Envelope::new(src.to_string(), dst.to_string(), Message::Data(payload));
        next_hop.endpoint.send(&envelope.to_bytes());
        Ok(())
    }

    /// Finds the best route covering `addr` (selector applied to the
    /// candidate set whose prefix covers the address).
    fn best_covering(&self, addr: u32) -> Option<&Route> {
        let candidates: Vec<&Route> = self
            .table
            .routes()
            .iter()
            .filter(|r| prefix::covers(addr, r.network, r.netmask))
            .collect();
        if candidates.is_empty() {
            None
        } else {
            Some(crate::selector::select(&candidates, addr))
        }
    }

    /// Sends `{type: "no route", src: our_addr(target), dst: S, msg: []}`
    /// to the neighbor that best covers S, falling back to the neighbor the
    /// datagram physically arrived from if no such route exists.
    fn reply_no_route(&self, from_neighbor: Addr, chosen_for_src: Option<&Route>, src: &str) {
        let target_addr = chosen_for_src.map(|r| r.peer).unwrap_or(from_neighbor);
        if let Some(neighbor) = self.neighbors.get(target_addr) {
            let envelope = Envelope::new(
                neighbor::our_addr(target_addr).to_string(),
                src.to_string(),
                Message::NoRoute(vec![]),
            );
            neighbor.endpoint.send(&envelope.to_bytes());
        }
    }

    fn announce_update(&self, from_neighbor: Addr, route: &Route) {
        let Some(source_rel) = self.neighbors.relationship_of(from_neighbor) else {
            return;
        };
        let body = UpdateBody::announce_only(
            prefix::u32_to_ip(route.network),
            prefix::u32_to_ip(route.netmask),
            route.as_path.clone(),
        );
        for n in self.neighbors.iter() {
            if n.addr == from_neighbor {
                continue;
            }
            if crate::policy::export_allowed(source_rel, n.relationship) {
                self.send_to(n, Message::Update(body.clone()));
            }
        }
    }

    fn announce_withdraw(&self, from_neighbor: Addr, prefixes: Vec<PrefixKey>) {
        let Some(source_rel) = self.neighbors.relationship_of(from_neighbor) else {
            return;
        };
        for n in self.neighbors.iter() {
            if n.addr == from_neighbor {
                continue;
            }
            if crate::policy::export_allowed(source_rel, n.relationship) {
                self.send_to(n, Message::Withdraw(prefixes.clone()));
            }
        }
    }

    fn send_to(&self, neighbor: &Neighbor, message: Message) {
        let envelope = Envelope::new(
            crate::neighbor::our_addr(neighbor.addr).to_string(),
            neighbor.addr.to_string(),
            message,
        );
        neighbor.endpoint.send(&envelope.to_bytes());
    }
}

fn envelope_kind(message: &Message) -> &'static str {
    match message {
        Message::Handshake(_) => "handshake",
        Message::Update(_) => "update",
        Message::Withdraw(_) => "withdraw",
        Message::Data(_) => "data",
        Message::Dump(_) => "dump",
        Message::Table(_) => "table",
        Message::NoRoute(_) => "no route",
    }
}
