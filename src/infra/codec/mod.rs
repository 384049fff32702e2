//! Host link framing: `$`-prefixed, `*`-terminated ASCII hex, two characters
//! per bus byte.
pub mod accumulator;
pub mod hex;
