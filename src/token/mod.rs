//! Token representations handed from the tokenizer to the tree builder.
//!
//! `CompactToken` is the frozen form that crosses the thread boundary in
//! parsed chunks. `AtomicToken` is what tree construction consumes,
//! regardless of which side tokenized the input.

mod atomic_token;
mod compact_token;

pub use self::atomic_token::{Attribute, AtomicToken};
pub use self::compact_token::{CompactAttribute, CompactToken};
