//! Production implementations of the relay traits.
//!
//! These talk to real chains through Alloy, to Circle's Iris API through
//! reqwest, and to the Tokio timer. Tests use the fakes in
//! [`crate::testing`] instead.

mod alloy;
mod iris;
mod tokio_clock;

pub use self::alloy::{AlloyDestinationChain, AlloySourceChain};
pub use self::iris::IrisAttestationProvider;
pub use self::tokio_clock::TokioClock;
