//! Audio decoding.

pub mod compressed;
pub mod wav;

pub use wav::DecodedAudio;
