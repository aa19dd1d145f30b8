//! Wire format: JSON envelopes over UDP. Parsed once at the dispatcher
//! boundary into a tagged `Message` enum rather than re-parsed per field
//! access downstream.

use serde::{Deserialize, Serialize};

/// BGP ORIGIN attribute, restricted to the three values this protocol
/// carries. Declaration order doubles as tie-break rank for the selector
/// (IGP best, matching the "lowest wins" convention used throughout path
/// selection).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Origin {
    #[serde(rename = "IGP")]
    Igp,
    #[serde(rename = "EGP")]
    Egp,
    #[serde(rename = "UNK")]
    Unk,
}

/// `{}`, carried by handshake and dump requests, which have no payload.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Empty {}

/// `{network, netmask}`, the unit withdrawn routes are keyed by.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixKey {
    pub network: String,
    pub netmask: String,
}

/// The `update` message body. Inbound updates carry all five fields;
/// outbound re-announcements carry only network/netmask/ASPath, so the
/// attribute fields are optional and skipped on serialization when absent.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdateBody {
    pub network: String,
    pub netmask: String,
    #[serde(rename = "ASPath")]
    pub as_path: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub localpref: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
    #[serde(default, rename = "selfOrigin", skip_serializing_if = "Option::is_none")]
    pub self_origin: Option<bool>,
}

impl UpdateBody {
    /// Builds the trimmed three-field body used for re-announcement.
    pub fn announce_only(network: String, netmask: String, as_path: Vec<u32>) -> Self {
        UpdateBody {
            network,
            netmask,
            as_path,
            localpref: None,
            origin: None,
            self_origin: None,
        }
    }
}

/// One entry of a `table` reply.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TableEntry {
    pub origin: Origin,
    pub localpref: u32,
    pub network: String,
    #[serde(rename = "ASPath")]
    pub as_path: Vec<u32>,
    pub netmask: String,
    pub peer: String,
    #[serde(rename = "selfOrigin")]
    pub self_origin: bool,
}

/// The message kinds exchanged with neighbors, adjacently tagged by `type`
/// with the payload under `msg`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "msg")]
pub enum Message {
    #[serde(rename = "handshake")]
    Handshake(Empty),
    #[serde(rename = "update")]
    Update(UpdateBody),
    #[serde(rename = "withdraw")]
    Withdraw(Vec<PrefixKey>),
    #[serde(rename = "data")]
    Data(serde_json::Value),
    #[serde(rename = "dump")]
    Dump(Empty),
    #[serde(rename = "table")]
    Table(Vec<TableEntry>),
    #[serde(rename = "no route")]
    NoRoute(Vec<serde_json::Value>),
}

/// The full envelope: `{src, dst, type, msg}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub src: String,
    pub dst: String,
    #[serde(flatten)]
    pub message: Message,
}

impl Envelope {
    pub fn new(src: String, dst: String, message: Message) -> Self {
        Envelope { src, dst, message }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("Envelope always serializes")
    }

    pub fn from_bytes(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_roundtrips() {
        let env = Envelope::new(
            "192.168.0.1".into(),
            "192.168.0.2".into(),
            Message::Handshake(Empty {}),
        );
        let bytes = env.to_bytes();
        let parsed = Envelope::from_bytes(&bytes).unwrap();
        assert!(matches!(parsed.message, Message::Handshake(_)));
    }

    #[test]
    fn update_outbound_omits_attribute_fields() {
        let body = UpdateBody::announce_only("10.0.0.0".into(), "255.0.0.0".into(), vec![1, 2]);
        let env = Envelope::new("a".into(), "b".into(), Message::Update(body));
        let json = serde_json::to_string(&env).unwrap();
        assert!(!json.contains("localpref"));
        assert!(!json.contains("selfOrigin"));
        assert!(json.contains("ASPath"));
    }

    #[test]
    fn update_inbound_parses_full_body() {
        let raw = r#"{
            "src": "192.168.0.2", "dst": "192.168.0.1", "type": "update",
            "msg": {
                "network": "10.0.0.0", "netmask": "255.0.0.0",
                "localpref": 100, "ASPath": [1], "origin": "IGP", "selfOrigin": true
            }
        }"#;
        let env = Envelope::from_bytes(raw.as_bytes()).unwrap();
        match env.message {
            Message::Update(body) => {
                assert_eq!(body.localpref, Some(100));
                assert_eq!(body.origin, Some(Origin::Igp));
                assert_eq!(body.self_origin, Some(true));
            }
            _ => panic!("expected update"),
        }
    }

    #[test]
    fn no_route_serializes_with_space_in_type() {
        let env = Envelope::new("a".into(), "b".into(), Message::NoRoute(vec![]));
        let json = serde_json::to_string(&env).unwrap();
        assert!(json.contains("\"no route\""));
    }

    #[test]
    fn origin_rank_prefers_igp() {
        assert!(Origin::Igp < Origin::Egp);
        assert!(Origin::Egp < Origin::Unk);
    }
}
