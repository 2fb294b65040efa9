use thiserror::Error;

use crate::game::GameStatus;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("cell ({row}, {col}) is outside the {size}x{size} grid")]
    OutOfBounds { row: usize, col: usize, size: usize },

    #[error("cell ({row}, {col}) is a given and cannot be changed")]
    GivenCell { row: usize, col: usize },

    #[error("value {value} is not allowed in this puzzle")]
    IllegalValue { value: u8 },

    #[error("action not allowed while the game is {0:?}")]
    InvalidState(GameStatus),

    #[error("this puzzle type does not support that action")]
    UnsupportedAction,

    #[error("no hints left")]
    HintsExhausted,

    #[error("nothing left to hint")]
    NothingToHint,
}
