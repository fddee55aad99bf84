//! Routes inbound frames to the calls waiting for them.

use std::sync::Arc;

use txlink_core::{ActionCode, Frame, ResultCode};
use txlink_fabric::codec::Codec;

use crate::pending::{Producer, Reply};
use crate::registry::Registry;

/// What became of one inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A waiting call was resolved
    Resolved(String),
    /// The call under this key had already been resolved, e.g. by its timeout
    Late(String),
    /// Nobody is waiting for this key (or the frame had none)
    Unmatched(Option<String>),
    /// Heartbeats, outbound-only actions, unknown actions, empty notifications
    Ignored,
    /// Undecodable bytes or a frame missing its payload
    Malformed,
}

/// Stateless frame router; one instance serves every link
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Decode and dispatch raw bytes; bad input is logged and dropped
    pub fn dispatch_bytes<C: Codec>(&self, codec: &C, bytes: &[u8]) -> Dispatch {
        match codec.decode::<Frame>(bytes) {
            Ok(frame) => self.dispatch(frame),
            Err(e) => {
                tracing::warn!(len = bytes.len(), error = %e, "dropping undecodable frame");
                Dispatch::Malformed
            }
        }
    }

    pub fn dispatch(&self, frame: Frame) -> Dispatch {
        let action = match ActionCode::try_from_code(frame.action) {
            Ok(action) => action,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring frame");
                return Dispatch::Ignored;
            }
        };
        tracing::debug!(%action, key = ?frame.key, "inbound frame");

        match action {
            ActionCode::Heart => Dispatch::Ignored,
            ActionCode::Receive => {
                let success = frame.result == Some(ResultCode::Success.code());
                self.resolve(frame.key.as_deref(), ready(Reply::Success(success)))
            }
            ActionCode::Rollback | ActionCode::CompleteCommit => self.notify_participant(&frame),
            ActionCode::GetTransactionGroupStatus => {
                // A missing group surfaces to the waiter, not here
                let key = frame.key.clone();
                self.resolve(
                    key.as_deref(),
                    Box::new(move || Ok(Reply::Status(frame.require_group()?.status))),
                )
            }
            ActionCode::FindTransactionGroupInfo => {
                let key = frame.key.clone();
                self.resolve(key.as_deref(), ready(Reply::Group(frame.into_transaction_group())))
            }
            ActionCode::CreateGroup
            | ActionCode::AddTransaction
            | ActionCode::UpdateTransaction
            | ActionCode::PreCommit => Dispatch::Ignored,
        }
    }

    /// Commit/rollback notices address the participant named by the first item
    fn notify_participant(&self, frame: &Frame) -> Dispatch {
        let group = match frame.require_group() {
            Ok(group) => group,
            Err(e) => {
                tracing::warn!(action = frame.action, error = %e, "dropping frame");
                return Dispatch::Malformed;
            }
        };

        match group.item_list.first() {
            Some(item) => self.resolve(Some(&item.task_key), ready(Reply::Status(item.status))),
            None => Dispatch::Ignored,
        }
    }

    fn resolve(&self, key: Option<&str>, producer: Producer) -> Dispatch {
        let Some(key) = key else {
            return Dispatch::Unmatched(None);
        };
        let Some(call) = self.registry.lookup(key) else {
            tracing::debug!(key, "no pending call; dropping reply");
            return Dispatch::Unmatched(Some(key.to_string()));
        };

        if call.resolve(producer) {
            Dispatch::Resolved(key.to_string())
        } else {
            tracing::debug!(key, "call already resolved; dropping late reply");
            Dispatch::Late(key.to_string())
        }
    }
}

fn ready(reply: Reply) -> Producer {
    Box::new(move || Ok(reply))
}

#[cfg(test)]
mod tests {
    use txlink_core::{TransactionGroup, TransactionItem};
    use txlink_fabric::codec::BincodeCodec;

    use super::*;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(Registry::new()))
    }

    #[test]
    fn receive_resolves_with_success_flag() {
        let dispatcher = dispatcher();
        let ok = dispatcher.registry().register("k1").unwrap();
        let failed = dispatcher.registry().register("k2").unwrap();

        let frame = Frame::new(ActionCode::Receive)
            .with_key("k1")
            .with_result(ResultCode::Success);
        assert_eq!(dispatcher.dispatch(frame), Dispatch::Resolved("k1".into()));

        let frame = Frame::new(ActionCode::Receive)
            .with_key("k2")
            .with_result(ResultCode::Fail);
        assert_eq!(dispatcher.dispatch(frame), Dispatch::Resolved("k2".into()));

        assert_eq!(ok.take_reply(), Some(Reply::Success(true)));
        assert_eq!(failed.take_reply(), Some(Reply::Success(false)));
    }

    #[test]
    fn receive_without_result_is_failure() {
        let dispatcher = dispatcher();
        let call = dispatcher.registry().register("k1").unwrap();

        dispatcher.dispatch(Frame::new(ActionCode::Receive).with_key("k1"));
        assert_eq!(call.take_reply(), Some(Reply::Success(false)));
    }

    #[test]
    fn rollback_notifies_first_item_only() {
        let dispatcher = dispatcher();
        let first = dispatcher.registry().register("task-a").unwrap();
        let second = dispatcher.registry().register("task-b").unwrap();

        let group = TransactionGroup::new("g1", 0)
            .with_item(TransactionItem::new("task-a", 5))
            .with_item(TransactionItem::new("task-b", 6));
        let frame = Frame::new(ActionCode::Rollback).with_group(group);

        assert_eq!(
            dispatcher.dispatch(frame),
            Dispatch::Resolved("task-a".into())
        );
        assert_eq!(first.take_reply(), Some(Reply::Status(5)));
        assert!(!second.is_resolved());
    }

    #[test]
    fn complete_commit_with_empty_items_is_a_no_op() {
        let dispatcher = dispatcher();
        let call = dispatcher.registry().register("k1").unwrap();

        let frame = Frame::new(ActionCode::CompleteCommit)
            .with_key("k1")
            .with_group(TransactionGroup::new("g1", 4));

        assert_eq!(dispatcher.dispatch(frame), Dispatch::Ignored);
        assert!(!call.is_resolved());
    }

    #[test]
    fn group_status_and_info() {
        let dispatcher = dispatcher();
        let status = dispatcher.registry().register("s").unwrap();
        let info = dispatcher.registry().register("i").unwrap();
        let group = TransactionGroup::new("g1", 4).with_item(TransactionItem::new("t", 1));

        dispatcher.dispatch(
            Frame::new(ActionCode::GetTransactionGroupStatus)
                .with_key("s")
                .with_group(group.clone()),
        );
        dispatcher.dispatch(
            Frame::new(ActionCode::FindTransactionGroupInfo)
                .with_key("i")
                .with_group(group.clone()),
        );

        assert_eq!(status.take_reply(), Some(Reply::Status(4)));
        assert_eq!(info.take_reply(), Some(Reply::Group(Some(group))));
    }

    #[test]
    fn find_info_without_group_resolves_to_none() {
        let dispatcher = dispatcher();
        let call = dispatcher.registry().register("i").unwrap();

        dispatcher.dispatch(Frame::new(ActionCode::FindTransactionGroupInfo).with_key("i"));
        assert_eq!(call.take_reply(), Some(Reply::Group(None)));
    }

    #[test]
    fn notice_without_group_is_malformed() {
        let dispatcher = dispatcher();
        let call = dispatcher.registry().register("k1").unwrap();

        for action in [ActionCode::Rollback, ActionCode::CompleteCommit] {
            let frame = Frame::new(action).with_key("k1");
            assert_eq!(dispatcher.dispatch(frame), Dispatch::Malformed);
        }
        assert!(!call.is_resolved());
        assert_eq!(dispatcher.registry().len(), 1);
    }

    #[test]
    fn status_without_group_fails_for_the_waiter() {
        let dispatcher = dispatcher();
        let call = dispatcher.registry().register("s").unwrap();

        let frame = Frame::new(ActionCode::GetTransactionGroupStatus).with_key("s");
        assert_eq!(dispatcher.dispatch(frame), Dispatch::Resolved("s".into()));
        assert!(call.is_resolved());
        assert_eq!(call.take_reply(), None);
    }

    #[test]
    fn unmatched_reply_leaves_other_calls_alone() {
        let dispatcher = dispatcher();
        let waiting = dispatcher.registry().register("k1").unwrap();

        let frame = Frame::new(ActionCode::Receive)
            .with_key("gone")
            .with_result(ResultCode::Success);
        assert_eq!(
            dispatcher.dispatch(frame),
            Dispatch::Unmatched(Some("gone".into()))
        );
        assert!(!waiting.is_resolved());
        assert_eq!(dispatcher.registry().len(), 1);
    }

    #[test]
    fn late_reply_does_not_override_timeout() {
        let dispatcher = dispatcher();
        let call = dispatcher.registry().register("k1").unwrap();
        call.resolve_with(Reply::Success(false));

        let frame = Frame::new(ActionCode::Receive)
            .with_key("k1")
            .with_result(ResultCode::Success);
        assert_eq!(dispatcher.dispatch(frame), Dispatch::Late("k1".into()));
        assert_eq!(call.take_reply(), Some(Reply::Success(false)));
    }

    #[test]
    fn heartbeats_and_unknown_actions_are_ignored() {
        let dispatcher = dispatcher();
        assert_eq!(
            dispatcher.dispatch(Frame::heart("meta", 1)),
            Dispatch::Ignored
        );

        let mut unknown = Frame::new(ActionCode::Receive).with_key("k1");
        unknown.action = 1234;
        assert_eq!(dispatcher.dispatch(unknown), Dispatch::Ignored);
    }

    #[test]
    fn garbage_bytes_are_dropped() {
        let dispatcher = dispatcher();
        assert_eq!(
            dispatcher.dispatch_bytes(&BincodeCodec, &[0xff, 0x01]),
            Dispatch::Malformed
        );

        let call = dispatcher.registry().register("k1").unwrap();
        let bytes = BincodeCodec
            .encode(
                &Frame::new(ActionCode::Receive)
                    .with_key("k1")
                    .with_result(ResultCode::Success),
            )
            .unwrap();
        assert_eq!(
            dispatcher.dispatch_bytes(&BincodeCodec, &bytes),
            Dispatch::Resolved("k1".into())
        );
        assert!(call.is_resolved());
    }
}
