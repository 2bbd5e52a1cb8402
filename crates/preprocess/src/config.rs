/// Square input side used when a model does not say otherwise.
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// Channels per pixel in every tensor this crate produces (RGB).
pub const CHANNELS: usize = 3;
