use crate::error::{Error, Result};

/// Action carried by every frame exchanged with the transaction manager
///
/// Codes are stable on the wire; frames keep the raw `i32` so that codes this
/// client does not know about still decode and can be skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionCode {
    CreateGroup,
    AddTransaction,
    UpdateTransaction,
    PreCommit,
    CompleteCommit,
    Rollback,
    Heart,
    Receive,
    GetTransactionGroupStatus,
    FindTransactionGroupInfo,
}

impl ActionCode {
    pub const ALL: [ActionCode; 10] = [
        ActionCode::CreateGroup,
        ActionCode::AddTransaction,
        ActionCode::UpdateTransaction,
        ActionCode::PreCommit,
        ActionCode::CompleteCommit,
        ActionCode::Rollback,
        ActionCode::Heart,
        ActionCode::Receive,
        ActionCode::GetTransactionGroupStatus,
        ActionCode::FindTransactionGroupInfo,
    ];

    /// Wire code for this action
    pub fn code(self) -> i32 {
        match self {
            ActionCode::CreateGroup => 0,
            ActionCode::AddTransaction => 1,
            ActionCode::UpdateTransaction => 2,
            ActionCode::PreCommit => 3,
            ActionCode::CompleteCommit => 4,
            ActionCode::Rollback => 5,
            ActionCode::Heart => 6,
            ActionCode::Receive => 7,
            ActionCode::GetTransactionGroupStatus => 8,
            ActionCode::FindTransactionGroupInfo => 9,
        }
    }

    /// Look up an action by wire code
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.code() == code)
    }

    pub fn try_from_code(code: i32) -> Result<Self> {
        Self::from_code(code).ok_or(Error::UnknownAction(code))
    }

    pub fn description(self) -> &'static str {
        match self {
            ActionCode::CreateGroup => "create transaction group",
            ActionCode::AddTransaction => "add transaction",
            ActionCode::UpdateTransaction => "update transaction status",
            ActionCode::PreCommit => "pre-commit",
            ActionCode::CompleteCommit => "complete commit",
            ActionCode::Rollback => "rollback",
            ActionCode::Heart => "heartbeat",
            ActionCode::Receive => "receive",
            ActionCode::GetTransactionGroupStatus => "get transaction group status",
            ActionCode::FindTransactionGroupInfo => "find transaction group info",
        }
    }
}

impl std::fmt::Display for ActionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// Outcome code reported by the transaction manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    Fail,
    Success,
    /// Sentinel for a status query that got no answer in time
    Timeout,
}

impl ResultCode {
    pub fn code(self) -> i32 {
        match self {
            ResultCode::Fail => 0,
            ResultCode::Success => 1,
            ResultCode::Timeout => -1,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(ResultCode::Fail),
            1 => Some(ResultCode::Success),
            -1 => Some(ResultCode::Timeout),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let mut codes: Vec<i32> = ActionCode::ALL.iter().map(|a| a.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), ActionCode::ALL.len());
    }

    #[test]
    fn unknown_code_is_not_an_action() {
        assert_eq!(ActionCode::from_code(42), None);
        assert!(matches!(
            ActionCode::try_from_code(-7),
            Err(Error::UnknownAction(-7))
        ));
    }

    #[test]
    fn heart_and_receive_codes() {
        assert_eq!(ActionCode::from_code(6), Some(ActionCode::Heart));
        assert_eq!(ActionCode::from_code(7), Some(ActionCode::Receive));
    }

    #[test]
    fn timeout_result_is_negative() {
        assert_eq!(ResultCode::Timeout.code(), -1);
        assert_eq!(ResultCode::from_code(1), Some(ResultCode::Success));
        assert_eq!(ResultCode::from_code(5), None);
    }
}
