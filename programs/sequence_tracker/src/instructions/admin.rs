use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::GatewayError;
use crate::events::{ConsumerUpdated, SystemStatusChanged, TrackerConfigUpdated};
use crate::state::Gateway;
use crate::tracker::TrackerConfig;

pub fn set_system_enabled(ctx: Context<UpdateGateway>, enabled: bool) -> Result<()> {
    let gateway = &mut ctx.accounts.gateway;
    gateway.system_enabled = enabled;

    emit!(SystemStatusChanged { enabled });

    msg!("System {}", if enabled { "enabled" } else { "disabled" });
    Ok(())
}

pub fn set_max_advance_steps(ctx: Context<UpdateGateway>, max_advance_steps: u16) -> Result<()> {
    let config = TrackerConfig::new(max_advance_steps)?;
    let gateway = &mut ctx.accounts.gateway;

    let old_steps = gateway.max_advance_steps;
    gateway.max_advance_steps = config.max_advance_steps;

    emit!(TrackerConfigUpdated {
        max_advance_steps: config.max_advance_steps,
    });

    msg!(
        "Updated max_advance_steps from {} to {}",
        old_steps,
        config.max_advance_steps
    );
    Ok(())
}

pub fn set_consumer(ctx: Context<UpdateGateway>, consumer: Pubkey) -> Result<()> {
    let gateway = &mut ctx.accounts.gateway;
    gateway.consumer = consumer;

    emit!(ConsumerUpdated { consumer });

    msg!("Consumer set to {}", consumer);
    Ok(())
}

#[derive(Accounts)]
pub struct UpdateGateway<'info> {
    #[account(
        mut,
        seeds = [GATEWAY_SEED, gateway.chain_id.to_le_bytes().as_ref()],
        bump = gateway.bump,
        has_one = authority @ GatewayError::UnauthorizedAuthority
    )]
    pub gateway: Account<'info, Gateway>,

    pub authority: Signer<'info>,
}
