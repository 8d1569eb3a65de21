/// PDA seeds
pub const GATEWAY_SEED: &[u8] = b"gateway";
pub const CHANNEL_SEED: &[u8] = b"channel";
pub const OVERFLOW_SEED: &[u8] = b"overflow";

/// Width of one bitmap segment; the live window spans two of them
pub const WINDOW_SIZE: u64 = 256;

/// Window advances allowed in a single consume unless reconfigured
pub const DEFAULT_MAX_ADVANCE_STEPS: u16 = 1;

/// Upper bound for `max_advance_steps` to keep a consume within compute limits
pub const MAX_ADVANCE_STEPS_LIMIT: u16 = 16;
