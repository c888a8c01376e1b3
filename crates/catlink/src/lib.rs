//! # catlink -- CAT transactions and capability negotiation
//!
//! `catlink` talks to amateur radio transceivers over semicolon-terminated
//! CAT links. It provides a retrying request/reply engine, rig
//! identification, and the Elecraft extension-level negotiation that runs
//! when a session is opened.
//!
//! ## Quick Start
//!
//! ```no_run
//! use catlink::elecraft::{ElecraftBuilder, SubDevice, models::k3};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let rig = ElecraftBuilder::new(k3())
//!         .serial_port("/dev/ttyUSB0")
//!         .build()
//!         .await?;
//!
//!     println!("ID {} K3 level {}", rig.identity(), rig.extension_level(SubDevice::K3));
//!     println!("VFO-A: {} Hz", rig.get_frequency().await?);
//!     rig.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! | Crate                  | Purpose                                          |
//! |------------------------|--------------------------------------------------|
//! | `catlink-core`         | [`Transport`] trait, [`RigFamily`], errors       |
//! | `catlink-transport`    | Serial transport                                 |
//! | `catlink-text-io`      | Frame codec, transaction engine, identification  |
//! | `catlink-elecraft`     | Elecraft models and extension negotiation        |
//! | **`catlink`**          | This facade crate -- re-exports everything       |
//!
//! ## Feature Flags
//!
//! | Feature    | Enables                      | Default |
//! |------------|------------------------------|---------|
//! | `elecraft` | [`elecraft`] module          | yes     |

pub use catlink_core::*;

/// Frame codec, transaction engine and identification.
pub mod text_io {
    pub use catlink_text_io::*;
}

/// Link transports.
pub mod transport {
    pub use catlink_transport::*;
}

/// Elecraft K2/K3-family backend.
#[cfg(feature = "elecraft")]
pub mod elecraft {
    pub use catlink_elecraft::*;
}
