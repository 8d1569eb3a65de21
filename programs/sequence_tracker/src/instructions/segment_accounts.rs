use anchor_lang::prelude::*;
use anchor_lang::system_program::{self, Allocate, Assign, CreateAccount, Transfer};

use crate::constants::OVERFLOW_SEED;
use crate::errors::GatewayError;
use crate::tracker::{OverflowSegment, OverflowStore};

/// Segments touched by one consume: at most one existing segment (the one
/// covering a late sequence) plus the segments pushed by window advances.
#[derive(Default)]
pub struct LoadedSegments {
    pub existing: Option<OverflowSegment>,
    pub created: Vec<OverflowSegment>,
}

impl OverflowStore for LoadedSegments {
    fn segment_mut(&mut self, begin: u64) -> Option<&mut OverflowSegment> {
        self.existing
            .as_mut()
            .filter(|segment| segment.begin == begin)
    }

    fn push_segment(&mut self, segment: OverflowSegment) {
        self.created.push(segment);
    }
}

pub fn segment_address(channel: &Pubkey, begin: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[OVERFLOW_SEED, channel.as_ref(), &begin.to_le_bytes()],
        &crate::ID,
    )
}

/// Takes the next remaining account and checks it is the segment PDA for `begin`
pub fn next_segment_account<'a, 'info>(
    remaining: &mut impl Iterator<Item = &'a AccountInfo<'info>>,
    channel: &Pubkey,
    begin: u64,
) -> Result<(&'a AccountInfo<'info>, u8)>
where
    'info: 'a,
{
    let info = remaining
        .next()
        .ok_or_else(|| error!(GatewayError::MissingSegmentAccount))?;
    let (address, bump) = segment_address(channel, begin);
    require_keys_eq!(info.key(), address, GatewayError::InvalidSegmentAccount);
    Ok((info, bump))
}

/// `None` when no segment was ever created at this address
pub fn load_segment(info: &AccountInfo) -> Result<Option<OverflowSegment>> {
    if info.owner != &crate::ID || info.data_is_empty() {
        return Ok(None);
    }
    let data = info.try_borrow_data()?;
    let segment = OverflowSegment::try_deserialize(&mut &data[..])?;
    Ok(Some(segment))
}

pub fn write_segment(info: &AccountInfo, segment: &OverflowSegment) -> Result<()> {
    let mut data = info.try_borrow_mut_data()?;
    segment.try_serialize(&mut &mut data[..])
}

/// Creates the segment PDA, also when the address was pre-funded
pub fn create_segment_account<'info>(
    payer: AccountInfo<'info>,
    target: AccountInfo<'info>,
    system: AccountInfo<'info>,
    channel: &Pubkey,
    segment: &OverflowSegment,
) -> Result<()> {
    let begin = segment.begin.to_le_bytes();
    let bump = [segment.bump];
    let seeds: &[&[u8]] = &[OVERFLOW_SEED, channel.as_ref(), &begin, &bump];
    let signer_seeds = &[seeds];

    let space = 8 + OverflowSegment::SIZE;
    let required = Rent::get()?.minimum_balance(space);
    let current = target.lamports();

    if current == 0 {
        system_program::create_account(
            CpiContext::new_with_signer(
                system,
                CreateAccount {
                    from: payer,
                    to: target,
                },
                signer_seeds,
            ),
            required,
            space as u64,
            &crate::ID,
        )?;
        return Ok(());
    }

    let top_up = required.saturating_sub(current);
    if top_up > 0 {
        system_program::transfer(
            CpiContext::new(
                system.clone(),
                Transfer {
                    from: payer,
                    to: target.clone(),
                },
            ),
            top_up,
        )?;
    }
    system_program::allocate(
        CpiContext::new_with_signer(
            system.clone(),
            Allocate {
                account_to_allocate: target.clone(),
            },
            signer_seeds,
        ),
        space as u64,
    )?;
    system_program::assign(
        CpiContext::new_with_signer(
            system,
            Assign {
                account_to_assign: target,
            },
            signer_seeds,
        ),
        &crate::ID,
    )
}
