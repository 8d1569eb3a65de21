use anchor_lang::prelude::*;

use crate::constants::*;
use crate::state::Gateway;
use crate::tracker::TrackerConfig;

pub fn handler(
    ctx: Context<InitializeGateway>,
    chain_id: u64,
    max_advance_steps: u16,
) -> Result<()> {
    let config = TrackerConfig::new(max_advance_steps)?;
    let gateway = &mut ctx.accounts.gateway;

    gateway.authority = ctx.accounts.authority.key();
    gateway.consumer = ctx.accounts.authority.key();
    gateway.chain_id = chain_id;
    gateway.system_enabled = true;
    gateway.max_advance_steps = config.max_advance_steps;
    gateway.bump = ctx.bumps.gateway;

    msg!(
        "Gateway initialized for chain: {:?}, max_advance_steps={}",
        chain_id,
        config.max_advance_steps
    );
    Ok(())
}

#[derive(Accounts)]
#[instruction(chain_id: u64)]
pub struct InitializeGateway<'info> {
    #[account(
        init,
        payer = authority,
        space = 8 + Gateway::SIZE,
        seeds = [GATEWAY_SEED, chain_id.to_le_bytes().as_ref()],
        bump
    )]
    pub gateway: Account<'info, Gateway>,

    #[account(mut)]
    pub authority: Signer<'info>,

    pub system_program: Program<'info, System>,
}
