#![forbid(unsafe_code)]

//! `stickybox-web` provides a deterministic document host for `stickybox-core`.
//!
//! Design goals:
//! - **Host-driven events**: callers scroll, resize and mutate the document
//!   explicitly; listener and observer deliveries are queued, not fired
//!   re-entrantly.
//! - **Explicit macrotasks**: deferred tick clears run only when the caller
//!   ends a macrotask, so coalescing is observable step by step.
//! - **No platform bindings**: geometry is declared, not laid out.
//!
//! The crate does not bind to `wasm-bindgen`. It exists so the core's
//! behavior can be driven end to end from plain tests, and so a real
//! browser binding has a reference host to match.

pub mod document;
pub mod page;

pub use document::{NodeSpec, SyntheticDocument};
pub use page::StickyPage;
