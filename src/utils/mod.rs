//! # Utility Modules
//!
//! Supporting utilities for cryptography, logging and metrics.
//!
//! ## Components
//! - **Crypto**: XChaCha20-Poly1305 AEAD
//! - **Logging**: Structured logging configuration
//! - **Metrics**: Thread-safe pool and transmission counters
//!
//! ## Security
//! - Cryptographically secure RNG (getrandom)
//! - Memory zeroing for plaintext and keys (zeroize crate)

pub mod crypto;
pub mod logging;
pub mod metrics;

pub use metrics::{MetricsSnapshot, PoolMetrics};
