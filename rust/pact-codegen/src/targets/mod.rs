//! Language targets.
//!
//! A target renders a [`CompiledContract`](crate::CompiledContract) as source
//! text. Targets only read the compiled model; every naming and keying
//! decision has already been made by [`compile`](crate::compile).

pub mod rust;
