/// Opus always decodes and encodes at this rate internally.
pub const OPUS_SAMPLE_RATE: u32 = 48_000;

/// 20 ms frame at 48 kHz, per channel.
pub const OPUS_FRAME_SIZE: usize = 960;

/// Longest legal Opus packet (120 ms at 48 kHz), per channel.
pub const MAX_PACKET_SAMPLES: usize = 5_760;

/// Recommended upper bound for a single encoded Opus packet.
pub const MAX_PACKET_BYTES: usize = 4_000;

/// Opus streams carry at most this many channels without a mapping table.
pub const MAX_CHANNELS: u8 = 2;

pub const DEFAULT_BITRATE: u32 = 48_000;

/// Highest libopus complexity.
pub const MAX_COMPLEXITY: u8 = 10;

pub const DEFAULT_COMPLEXITY: u8 = MAX_COMPLEXITY;

pub const VENDOR_STRING: &str = concat!("voice-morph-core ", env!("CARGO_PKG_VERSION"));
