use anchor_lang::prelude::*;

/// Rejections raised by the sequence tracker. Both abort the message.
#[error_code]
pub enum SequenceError {
    #[msg("Sequence already consumed")]
    Replay,

    #[msg("Sequence too far ahead of the window")]
    SequenceTooFarAhead,
}

#[error_code(offset = 7000)]
pub enum GatewayError {
    #[msg("System is disabled")]
    SystemDisabled,

    #[msg("Unauthorized authority")]
    UnauthorizedAuthority,

    #[msg("Unauthorized consumer")]
    UnauthorizedConsumer,

    #[msg("Invalid chain ID")]
    InvalidChainId,

    #[msg("Max advance steps out of range")]
    InvalidMaxAdvanceSteps,

    #[msg("Overflow segment account not provided")]
    MissingSegmentAccount,

    #[msg("Overflow segment account does not match channel and range")]
    InvalidSegmentAccount,

    #[msg("Overflow segment still has outstanding sequences")]
    SegmentNotExhausted,

    #[msg("Overflow segment is not linked to the given neighbour")]
    InvalidSegmentLink,
}
