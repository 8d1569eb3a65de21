use anchor_lang::prelude::*;

use super::segment_accounts::{
    create_segment_account, load_segment, next_segment_account, write_segment, LoadedSegments,
};
use crate::constants::*;
use crate::errors::GatewayError;
use crate::events::{SequenceConsumed, SequencesFlushed};
use crate::state::{ChannelKind, ChannelSequence, Gateway};
use crate::tracker::{segment_begin, ConsumePath};

/// Remaining accounts, in order:
/// - the segment PDA for `segment_begin(sequence)` when `sequence` is below
///   the window (it may not exist yet; the consume then fails as a replay)
/// - one segment PDA per window advance that flushes outstanding sequences,
///   oldest first
pub fn handler<'info>(
    ctx: Context<'_, '_, '_, 'info, ConsumeSequence<'info>>,
    kind: ChannelKind,
    remote_chain_id: u64,
    sequence: u64,
) -> Result<()> {
    let gateway = &ctx.accounts.gateway;

    // Validate system is enabled
    require!(gateway.system_enabled, GatewayError::SystemDisabled);

    let config = gateway.tracker_config()?;
    let channel_key = ctx.accounts.channel_sequence.key();
    let mut remaining = ctx.remaining_accounts.iter();

    let mut segments = LoadedSegments::default();
    let mut covering = None;
    if sequence < ctx.accounts.channel_sequence.tracker.window_start() {
        let (info, _) = next_segment_account(&mut remaining, &channel_key, segment_begin(sequence))?;
        segments.existing = load_segment(info)?;
        covering = Some(info);
    }

    let channel = &mut ctx.accounts.channel_sequence;
    let consumption = channel.tracker.consume(sequence, &config, &mut segments)?;

    if consumption.path == ConsumePath::Overflow {
        if let (Some(info), Some(segment)) = (covering, segments.existing.as_ref()) {
            write_segment(info, segment)?;
        }
    }

    for (segment, flushed) in segments.created.iter_mut().zip(consumption.flushed.iter()) {
        let (info, bump) = next_segment_account(&mut remaining, &channel_key, segment.begin)?;
        segment.bump = bump;
        create_segment_account(
            ctx.accounts.consumer.to_account_info(),
            info.clone(),
            ctx.accounts.system_program.to_account_info(),
            &channel_key,
            segment,
        )?;
        write_segment(info, segment)?;

        let count = flushed.len() as u16;
        msg!(
            "Flushed {} unconsumed sequences from segment begin={}",
            count,
            flushed.begin
        );
        emit!(SequencesFlushed {
            kind,
            remote_chain_id,
            segment_begin: flushed.begin,
            pending: flushed.pending,
            count,
        });
    }

    let late = consumption.path == ConsumePath::Overflow;
    emit!(SequenceConsumed {
        kind,
        remote_chain_id,
        sequence,
        late,
        window_start: channel.tracker.window_start(),
    });

    msg!(
        "Consumed sequence={} from {:?} chain {} (late={})",
        sequence,
        kind,
        remote_chain_id,
        late
    );
    Ok(())
}

#[derive(Accounts)]
#[instruction(kind: ChannelKind, remote_chain_id: u64)]
pub struct ConsumeSequence<'info> {
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

    /// Pays rent for new overflow segments
    #[account(mut)]
    pub consumer: Signer<'info>,

    pub system_program: Program<'info, System>,
}
