//! Elecraft model definitions.
//!
//! Each supported rig is described by an [`ElecraftModel`] returned from a
//! factory function (e.g. [`k3()`]). The `model_id` selects the negotiation
//! probe plan: the K2 exposes only the `K2` extension command, while the
//! K3 family exposes both `K2` and `K3`.
//!
//! | Model | Model id | Baud  | Sub RX     |
//! |-------|----------|-------|------------|
//! | K2    | K2       | 4800  | No         |
//! | K3    | K3       | 38400 | Yes (KRX3) |
//! | K3S   | K3       | 38400 | Yes (KRX3) |
//! | KX3   | K3       | 38400 | No         |
//! | KX2   | K3       | 38400 | No         |

use catlink_core::RigFamily;

/// Static model definition for an Elecraft transceiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElecraftModel {
    /// Human-readable model name (e.g. "K2", "KX3").
    pub name: &'static str,
    /// Command-set identifier; keys the negotiation probe plan.
    pub model_id: &'static str,
    /// Factory default CAT baud rate.
    pub default_baud_rate: u32,
    /// Whether the rig can carry a sub receiver.
    pub has_sub_receiver: bool,
}

impl ElecraftModel {
    /// Protocol family; every Elecraft rig speaks the Kenwood-compatible
    /// dialect and identifies as `017`.
    pub fn family(&self) -> RigFamily {
        RigFamily::Elecraft
    }
}

/// K2 model definition.
///
/// The K2 is a 10/100W HF kit transceiver. Its RS-232 option (KIO2) runs at
/// 4800 baud by default and only understands the `K2` extension command.
pub fn k2() -> ElecraftModel {
    ElecraftModel {
        name: "K2",
        model_id: "K2",
        default_baud_rate: 4800,
        has_sub_receiver: false,
    }
}

/// K3 model definition.
pub fn k3() -> ElecraftModel {
    ElecraftModel {
        name: "K3",
        model_id: "K3",
        default_baud_rate: 38_400,
        has_sub_receiver: true,
    }
}

/// K3S model definition. Same command set as the K3.
pub fn k3s() -> ElecraftModel {
    ElecraftModel {
        name: "K3S",
        model_id: "K3",
        default_baud_rate: 38_400,
        has_sub_receiver: true,
    }
}

/// KX3 model definition. Portable, K3 command set.
pub fn kx3() -> ElecraftModel {
    ElecraftModel {
        name: "KX3",
        model_id: "K3",
        default_baud_rate: 38_400,
        has_sub_receiver: false,
    }
}

/// KX2 model definition. Portable, K3 command set.
pub fn kx2() -> ElecraftModel {
    ElecraftModel {
        name: "KX2",
        model_id: "K3",
        default_baud_rate: 38_400,
        has_sub_receiver: false,
    }
}

/// Every supported Elecraft model.
pub fn all_elecraft_models() -> Vec<ElecraftModel> {
    vec![k2(), k3(), k3s(), kx3(), kx2()]
}

/// Look up a model by name, ignoring case.
pub fn find_model(name: &str) -> Option<ElecraftModel> {
    all_elecraft_models()
        .into_iter()
        .find(|m| m.name.eq_ignore_ascii_case(name))
}
