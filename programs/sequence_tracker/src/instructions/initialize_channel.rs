use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::GatewayError;
use crate::events::ChannelInitialized;
use crate::state::{ChannelKind, ChannelSequence, Gateway};
use crate::tracker::SequenceTracker;

pub fn handler(
    ctx: Context<InitializeChannel>,
    kind: ChannelKind,
    remote_chain_id: u64,
) -> Result<()> {
    require!(remote_chain_id > 0, GatewayError::InvalidChainId);

    let channel = &mut ctx.accounts.channel_sequence;
    channel.kind = kind;
    channel.remote_chain_id = remote_chain_id;
    channel.tracker = SequenceTracker::default();
    channel.bump = ctx.bumps.channel_sequence;

    emit!(ChannelInitialized {
        kind,
        remote_chain_id,
        channel: ctx.accounts.channel_sequence.key(),
    });

    msg!(
        "{:?} channel initialized for remote_chain_id={}",
        kind,
        remote_chain_id
    );
    Ok(())
}

#[derive(Accounts)]
#[instruction(kind: ChannelKind, remote_chain_id: u64)]
pub struct InitializeChannel<'info> {
    /// Created exactly once; a second initialize for the same channel fails
    #[account(
        init,
        payer = authority,
        space = 8 + ChannelSequence::SIZE,
        seeds = [
            CHANNEL_SEED,
            &kind.discriminant().to_le_bytes(),
            &remote_chain_id.to_le_bytes()
        ],
        bump
    )]
    pub channel_sequence: Account<'info, ChannelSequence>,

    #[account(
        seeds = [GATEWAY_SEED, gateway.chain_id.to_le_bytes().as_ref()],
        bump = gateway.bump,
        has_one = authority @ GatewayError::UnauthorizedAuthority
    )]
    pub gateway: Account<'info, Gateway>,

    #[account(mut)]
    pub authority: Signer<'info>,

    pub system_program: Program<'info, System>,
}
