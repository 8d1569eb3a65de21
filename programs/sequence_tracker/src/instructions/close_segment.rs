use anchor_lang::prelude::*;

use super::segment_accounts::{load_segment, segment_address, write_segment};
use crate::constants::*;
use crate::errors::GatewayError;
use crate::events::SegmentReclaimed;
use crate::state::{ChannelKind, ChannelSequence, Gateway};

/// Closes an exhausted overflow segment and returns its rent to the consumer.
///
/// Unless the segment is the chain head, remaining account 0 must be its
/// child: the segment whose `parent` points at it.
pub fn handler<'info>(
    ctx: Context<'_, '_, '_, 'info, CloseSegment<'info>>,
    kind: ChannelKind,
    remote_chain_id: u64,
    begin: u64,
) -> Result<()> {
    let channel_key = ctx.accounts.channel_sequence.key();

    let mut child = None;
    if let Some(info) = ctx.remaining_accounts.first() {
        let segment =
            load_segment(info)?.ok_or_else(|| error!(GatewayError::InvalidSegmentAccount))?;
        let (address, _) = segment_address(&channel_key, segment.begin);
        require_keys_eq!(info.key(), address, GatewayError::InvalidSegmentAccount);
        child = Some((info, segment));
    }

    let segment = &ctx.accounts.segment;
    let tracker = &mut ctx.accounts.channel_sequence.tracker;
    match child.as_mut() {
        Some((info, child)) => {
            tracker.unlink_segment(segment, Some(&mut *child))?;
            write_segment(info, child)?;
        }
        None => tracker.unlink_segment(segment, None)?,
    }

    emit!(SegmentReclaimed {
        kind,
        remote_chain_id,
        segment_begin: begin,
    });

    msg!(
        "Reclaimed overflow segment begin={} of {:?} chain {}",
        begin,
        kind,
        remote_chain_id
    );
    Ok(())
}

#[derive(Accounts)]
#[instruction(kind: ChannelKind, remote_chain_id: u64, begin: u64)]
pub struct CloseSegment<'info> {
    #[account(
        seeds = [GATEWAY_SEED, gateway.chain_id.to_le_bytes().as_ref()],
        bump = gateway.bump,
        has_one = consumer @ GatewayError::UnauthorizedConsumer
    )]
    pub gateway: Account<'info, Gateway>,

    #[account(
        mut,
        seeds = [
            CHANNEL_SEED,
            &kind.discriminant().to_le_bytes(),
            &remote_chain_id.to_le_bytes()
        ],
        bump = channel_sequence.bump
    )]
    pub channel_sequence: Account<'info, ChannelSequence>,

    #[account(
        mut,
        close = consumer,
        seeds = [
            OVERFLOW_SEED,
            channel_sequence.key().as_ref(),
            &begin.to_le_bytes()
        ],
        bump = segment.bump,
        constraint = segment.is_exhausted() @ GatewayError::SegmentNotExhausted
    )]
    pub segment: Account<'info, crate::tracker::OverflowSegment>,

    #[account(mut)]
    pub consumer: Signer<'info>,
}
