use serde::{Deserialize, Serialize};

/// Aggregate state of a distributed transaction as reported by the manager
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionGroup {
    pub id: String,
    pub status: i32,
    pub item_list: Vec<TransactionItem>,
}

/// One participant of a transaction group
///
/// `task_key` is the correlation key of the participant's blocked call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionItem {
    pub task_key: String,
    pub status: i32,
    pub tx_group_id: String,
}

impl TransactionGroup {
    pub fn new(id: impl Into<String>, status: i32) -> Self {
        Self {
            id: id.into(),
            status,
            item_list: Vec::new(),
        }
    }

    pub fn with_item(mut self, item: TransactionItem) -> Self {
        self.item_list.push(item);
        self
    }
}

impl TransactionItem {
    pub fn new(task_key: impl Into<String>, status: i32) -> Self {
        Self {
            task_key: task_key.into(),
            status,
            tx_group_id: String::new(),
        }
    }
}
