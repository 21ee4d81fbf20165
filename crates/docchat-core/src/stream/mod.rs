//! Answer stream decoding and reduction.

pub mod decoder;
pub mod reducer;

pub use decoder::{DecodedLine, NdjsonDecoder};
pub use reducer::{TurnOutcome, TurnReducer, TurnState};
