use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("Unknown action code: {0}")]
    UnknownAction(i32),

    #[error("Frame has no transaction group payload")]
    MissingGroup,
}

pub type Result<T> = std::result::Result<T, Error>;
