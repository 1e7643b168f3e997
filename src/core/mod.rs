//! # Core Envelope Components
//!
//! The packet lifecycle, the pool that recycles packets, and the session
//! state packets read from.
//!
//! ## Components
//! - **Packet**: buffer, type tag, session and crypto binding with
//!   idempotent commit/finish phases
//! - **Factory**: object pool that binds crypto per type and composes
//!   (merge/clone) packets
//! - **Session**: liveness counter and key material
//!
//! ## Lifecycle
//! ```text
//! acquire -> append -> commit -> finish -> send | merge -> retire
//! ```

pub mod factory;
pub mod packet;
pub mod session;
