//! Elecraft extended Kenwood protocol backend for catlink.
//!
//! Elecraft K2 and K3-family radios answer the Kenwood `ID;` command with
//! `017` and add per-unit extension commands (`K2;`, `K3;`) whose replies
//! report which optional command subset the firmware has enabled. Opening a
//! rig runs the full negotiation once and caches the result for the life of
//! the session:
//!
//! 1. identify (`ID;` → `ID017;`)
//! 2. probe each sub-device in the model's plan (`K2;` → `K22;`, `K3;` → `K31;`)
//! 3. hand back an [`ElecraftRig`] holding the immutable [`CapabilityCache`]
//!
//! - **Models** ([`models`]) -- K2, K3, K3S, KX3, KX2 descriptors.
//! - **Extension levels** ([`extension`]) -- the capability table.
//! - **Negotiation** ([`negotiate`]) -- probe plans and the state machine.
//! - **Commands** ([`commands`]) -- request builders and reply parsers.
//! - **Rig session** ([`rig`]) and **builder** ([`builder`]).
//!
//! # Example
//!
//! ```
//! use catlink_elecraft::extension::{lookup_extension, ExtensionLevel};
//!
//! assert_eq!(lookup_extension("K22"), ExtensionLevel::K22);
//! assert_eq!(lookup_extension("K99"), ExtensionLevel::None);
//! ```

pub mod builder;
pub mod commands;
pub mod extension;
pub mod models;
pub mod negotiate;
pub mod rig;

// Re-export the primary types for ergonomic `use catlink_elecraft::*`.
pub use builder::ElecraftBuilder;
pub use extension::{ExtensionLevel, SubDevice};
pub use models::ElecraftModel;
pub use negotiate::{CapabilityCache, NegotiationState, Negotiator};
pub use rig::ElecraftRig;
