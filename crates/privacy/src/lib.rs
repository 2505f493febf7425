//! Privacy math for the Cobalt engine.
//!
//! Two concerns live here:
//! - `index`: pure numeric routines mapping values and event vectors into
//!   private index space (randomized rounding, mixed-radix encoding,
//!   clipping).
//! - `noise`: the shuffled-DP noise generator that dilutes real indices
//!   with Poisson-distributed fabricated ones.
//!
//! Every function that consumes randomness takes the RNG explicitly so noise
//! generation and index rounding are deterministic under test. Production
//! callers must supply a cryptographically strong source; the privacy
//! guarantees depend on unpredictability.

pub mod index;
pub mod noise;

pub use index::{clip_value, double_to_index, event_vector_to_index, num_event_vectors};
pub use noise::{add_noise, generate_noise};
