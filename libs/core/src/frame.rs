use serde::{Deserialize, Serialize};

use crate::action::{ActionCode, ResultCode};
use crate::error::{Error, Result};
use crate::group::TransactionGroup;

/// Body of a frame
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    #[default]
    None,
    /// Client description sent with heartbeats
    MetaInfo(String),
    TransactionGroup(TransactionGroup),
}

/// A single message on the coordinator link, in either direction
///
/// `key` correlates a reply with the call that caused it. Broadcasts and
/// heartbeats leave it empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub action: i32,
    pub key: Option<String>,
    pub serial_protocol: u8,
    pub result: Option<i32>,
    pub payload: Payload,
}

impl Frame {
    pub fn new(action: ActionCode) -> Self {
        Self {
            action: action.code(),
            key: None,
            serial_protocol: 0,
            result: None,
            payload: Payload::None,
        }
    }

    /// Heartbeat carrying the client's meta info
    pub fn heart(meta_info: impl Into<String>, serial_protocol: u8) -> Self {
        Self {
            serial_protocol,
            payload: Payload::MetaInfo(meta_info.into()),
            ..Self::new(ActionCode::Heart)
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_result(mut self, result: ResultCode) -> Self {
        self.result = Some(result.code());
        self
    }

    pub fn with_group(mut self, group: TransactionGroup) -> Self {
        self.payload = Payload::TransactionGroup(group);
        self
    }

    /// Decoded action, or `None` for codes this client does not know
    pub fn action_code(&self) -> Option<ActionCode> {
        ActionCode::from_code(self.action)
    }

    pub fn transaction_group(&self) -> Option<&TransactionGroup> {
        match &self.payload {
            Payload::TransactionGroup(group) => Some(group),
            _ => None,
        }
    }

    pub fn require_group(&self) -> Result<&TransactionGroup> {
        self.transaction_group().ok_or(Error::MissingGroup)
    }

    pub fn into_transaction_group(self) -> Option<TransactionGroup> {
        match self.payload {
            Payload::TransactionGroup(group) => Some(group),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::TransactionItem;

    #[test]
    fn heart_frame_has_no_key() {
        let frame = Frame::heart("order-service@10.0.0.7", 1);
        assert_eq!(frame.action_code(), Some(ActionCode::Heart));
        assert_eq!(frame.key, None);
        assert_eq!(frame.serial_protocol, 1);
        assert_eq!(
            frame.payload,
            Payload::MetaInfo("order-service@10.0.0.7".to_string())
        );
    }

    #[test]
    fn unknown_action_survives_decoding() {
        let mut frame = Frame::new(ActionCode::Receive).with_key("k1");
        frame.action = 99;

        let bytes = bincode::serialize(&frame).unwrap();
        let decoded: Frame = bincode::deserialize(&bytes).unwrap();

        assert_eq!(decoded.action, 99);
        assert_eq!(decoded.action_code(), None);
        assert_eq!(decoded.key.as_deref(), Some("k1"));
    }

    #[test]
    fn group_accessors() {
        let group = TransactionGroup::new("g1", 2).with_item(TransactionItem::new("t1", 1));
        let frame = Frame::new(ActionCode::Rollback).with_group(group.clone());

        assert_eq!(frame.transaction_group(), Some(&group));
        assert_eq!(frame.require_group().unwrap().item_list.len(), 1);
        assert_eq!(frame.into_transaction_group(), Some(group));

        let empty = Frame::new(ActionCode::Rollback);
        assert!(matches!(empty.require_group(), Err(Error::MissingGroup)));
    }
}
