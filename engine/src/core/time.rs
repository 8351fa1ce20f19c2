use std::time::Duration;

/// Nanoseconds per frame at 60 frames per second.
pub const SIXTY_FPS: u64 = 16_666_666;

/// Nanoseconds per frame at 1 frame per second.
pub const ONE_FPS: u64 = 1_000_000_000;

/// The frame period for a frequency in hertz. Zero is treated as one.
pub fn period_of(hz: u32) -> Duration {
    Duration::from_nanos(ONE_FPS / u64::from(hz.max(1)))
}
