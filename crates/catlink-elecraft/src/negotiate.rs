//! Capability negotiation: identification followed by extension probes.
//!
//! [`Negotiator`] walks a small state machine over a [`Transactor`]:
//!
//! ```text
//! Unresolved --ID;--> Identified --K2;[,K3;]--> LevelsResolved
//! ```
//!
//! Each [`step`](Negotiator::step) either advances one state or returns the
//! error and leaves the state unchanged. The probe plan comes from
//! [`PROBE_PLANS`], keyed by the model's command-set id. Probes run in plan
//! order; a K3-family rig is always asked `K2;` before `K3;`.

use tracing::{debug, error, info};

use catlink_core::{Error, Result};
use catlink_text_io::{verify_identity, IdentityCode, Transactor};

use crate::commands::cmd_probe_extension;
use crate::extension::{lookup_extension, ExtensionLevel, SubDevice};
use crate::models::ElecraftModel;

/// Which sub-devices to probe for one command set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbePlan {
    pub model_id: &'static str,
    pub sub_devices: &'static [SubDevice],
}

/// Every command set that can be negotiated.
pub const PROBE_PLANS: &[ProbePlan] = &[
    ProbePlan {
        model_id: "K2",
        sub_devices: &[SubDevice::K2],
    },
    ProbePlan {
        model_id: "K3",
        sub_devices: &[SubDevice::K2, SubDevice::K3],
    },
];

/// Probe plan for `model_id`, or [`Error::UnsupportedModel`].
pub fn probe_plan(model_id: &str) -> Result<&'static ProbePlan> {
    PROBE_PLANS
        .iter()
        .find(|plan| plan.model_id == model_id)
        .ok_or_else(|| {
            Error::UnsupportedModel(format!("no extension probe plan for model id {model_id:?}"))
        })
}

/// Negotiated capabilities of one open session.
///
/// Populated once by the negotiator and read-only afterwards. A sub-device
/// the model does not have reads as [`ExtensionLevel::None`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityCache {
    identity: IdentityCode,
    k2: ExtensionLevel,
    k3: ExtensionLevel,
}

impl CapabilityCache {
    fn new(identity: IdentityCode) -> Self {
        CapabilityCache {
            identity,
            k2: ExtensionLevel::None,
            k3: ExtensionLevel::None,
        }
    }

    fn record(&mut self, sub: SubDevice, level: ExtensionLevel) {
        match sub {
            SubDevice::K2 => self.k2 = level,
            SubDevice::K3 => self.k3 = level,
        }
    }

    /// The verified identity code (`017` for every Elecraft rig).
    pub fn identity(&self) -> &IdentityCode {
        &self.identity
    }

    /// Extension level reported by `sub`.
    pub fn level(&self, sub: SubDevice) -> ExtensionLevel {
        match sub {
            SubDevice::K2 => self.k2,
            SubDevice::K3 => self.k3,
        }
    }
}

/// Progress of a negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationState {
    Unresolved,
    Identified(IdentityCode),
    LevelsResolved(CapabilityCache),
}

/// Drives identification and extension probing for one model.
#[derive(Debug)]
pub struct Negotiator<'m> {
    model: &'m ElecraftModel,
    state: NegotiationState,
}

impl<'m> Negotiator<'m> {
    pub fn new(model: &'m ElecraftModel) -> Self {
        Negotiator {
            model,
            state: NegotiationState::Unresolved,
        }
    }

    pub fn state(&self) -> &NegotiationState {
        &self.state
    }

    /// Advance one state. A no-op once levels are resolved.
    pub async fn step(&mut self, engine: &mut Transactor) -> Result<()> {
        let next = match &self.state {
            NegotiationState::Unresolved => {
                if engine.family() != self.model.family() {
                    return Err(Error::InvalidArgument(format!(
                        "engine speaks {} framing, {} needs {}",
                        engine.family(),
                        self.model.name,
                        self.model.family()
                    )));
                }
                let identity = verify_identity(engine).await?;
                info!(model = self.model.name, %identity, "rig identified");
                NegotiationState::Identified(identity)
            }
            NegotiationState::Identified(identity) => {
                let cache = self.resolve_levels(engine, identity).await?;
                NegotiationState::LevelsResolved(cache)
            }
            NegotiationState::LevelsResolved(_) => return Ok(()),
        };
        self.state = next;
        Ok(())
    }

    /// Step until levels are resolved and return the cache.
    pub async fn run(mut self, engine: &mut Transactor) -> Result<CapabilityCache> {
        loop {
            self.step(engine).await?;
            if let NegotiationState::LevelsResolved(cache) = &self.state {
                return Ok(cache.clone());
            }
        }
    }

    async fn resolve_levels(
        &self,
        engine: &mut Transactor,
        identity: &IdentityCode,
    ) -> Result<CapabilityCache> {
        let plan = probe_plan(self.model.model_id).inspect_err(|_| {
            error!(model = self.model.name, model_id = self.model.model_id, "unsupported model")
        })?;

        let mut cache = CapabilityCache::new(identity.clone());
        for &sub in plan.sub_devices {
            let level = probe_extension(engine, sub).await?;
            info!(model = self.model.name, sub_device = %sub, %level, "extension level resolved");
            cache.record(sub, level);
        }
        Ok(cache)
    }
}

/// Send one extension probe and map the reply through the capability table.
pub async fn probe_extension(engine: &mut Transactor, sub: SubDevice) -> Result<ExtensionLevel> {
    debug!(sub_device = %sub, "probing extension level");
    let reply = engine
        .transact(&cmd_probe_extension(sub))
        .await
        .inspect_err(|e| error!(sub_device = %sub, error = %e, "cannot get extension level"))?;
    Ok(lookup_extension(reply.body()))
}
