use anchor_lang::prelude::*;

pub mod constants;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod state;
pub mod tracker;

use instructions::*;
use state::ChannelKind;

declare_id!("45vtvsgbWvBGSzLQ6ReGQWbeK91V9WWy4Ld6QakXcaGe");

/// Sequence Tracker Program
///
/// At-most-once execution of incoming cross-chain sequences, one
/// bounded-cost tracker per remote channel
#[program]
pub mod sequence_tracker {
    use super::*;

    /// Initialize the gateway for a specific chain
    pub fn initialize_gateway(
        ctx: Context<InitializeGateway>,
        chain_id: u64,
        max_advance_steps: u16,
    ) -> Result<()> {
        instructions::initialize::handler(ctx, chain_id, max_advance_steps)
    }

    /// Create the replay-protection state for a remote channel
    pub fn initialize_channel(
        ctx: Context<InitializeChannel>,
        kind: ChannelKind,
        remote_chain_id: u64,
    ) -> Result<()> {
        instructions::initialize_channel::handler(ctx, kind, remote_chain_id)
    }

    /// Consume a verified sequence; fails on replay or on a jump beyond the advance budget
    pub fn consume_sequence<'info>(
        ctx: Context<'_, '_, '_, 'info, ConsumeSequence<'info>>,
        kind: ChannelKind,
        remote_chain_id: u64,
        sequence: u64,
    ) -> Result<()> {
        instructions::consume_sequence::handler(ctx, kind, remote_chain_id, sequence)
    }

    /// Close an exhausted overflow segment and refund its rent to the consumer
    pub fn close_segment<'info>(
        ctx: Context<'_, '_, '_, 'info, CloseSegment<'info>>,
        kind: ChannelKind,
        remote_chain_id: u64,
        begin: u64,
    ) -> Result<()> {
        instructions::close_segment::handler(ctx, kind, remote_chain_id, begin)
    }

    /// Update system enabled status (admin only)
    pub fn set_system_enabled(ctx: Context<UpdateGateway>, enabled: bool) -> Result<()> {
        instructions::admin::set_system_enabled(ctx, enabled)
    }

    /// Update the per-call window advance budget (admin only)
    pub fn set_max_advance_steps(
        ctx: Context<UpdateGateway>,
        max_advance_steps: u16,
    ) -> Result<()> {
        instructions::admin::set_max_advance_steps(ctx, max_advance_steps)
    }

    /// Change the signer allowed to consume sequences (admin only)
    pub fn set_consumer(ctx: Context<UpdateGateway>, consumer: Pubkey) -> Result<()> {
        instructions::admin::set_consumer(ctx, consumer)
    }
}
