//! ElecraftRig -- an open, negotiated session with one Elecraft transceiver.
//!
//! A session can only be obtained through [`ElecraftRig::open`] (usually via
//! [`ElecraftBuilder`](crate::builder::ElecraftBuilder)), which identifies
//! the rig and probes its extension levels before returning. The resulting
//! [`CapabilityCache`] never changes for the life of the session.
//!
//! The transaction engine sits behind a [`tokio::sync::Mutex`] so that one
//! request/reply exchange completes before the next starts, even when the
//! rig is shared between tasks.

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use catlink_core::{Result, RigFamily};
use catlink_text_io::{IdentityCode, Reply, Request, Transactor};

use crate::commands::{cmd_read_frequency_a, cmd_set_frequency_a, format_frequency, parse_frequency};
use crate::extension::{ExtensionLevel, SubDevice};
use crate::models::ElecraftModel;
use crate::negotiate::{CapabilityCache, Negotiator};

/// An Elecraft transceiver with negotiated capabilities.
pub struct ElecraftRig {
    engine: Mutex<Transactor>,
    model: ElecraftModel,
    capabilities: CapabilityCache,
}

impl ElecraftRig {
    /// Run the open sequence over `engine`: identify, then probe every
    /// sub-device in the model's plan.
    ///
    /// On failure the transport is closed and the first error is returned.
    pub async fn open(mut engine: Transactor, model: ElecraftModel) -> Result<Self> {
        debug!(model = model.name, "opening Elecraft rig");

        match Negotiator::new(&model).run(&mut engine).await {
            Ok(capabilities) => {
                info!(
                    model = model.name,
                    identity = %capabilities.identity(),
                    k2 = %capabilities.level(SubDevice::K2),
                    k3 = %capabilities.level(SubDevice::K3),
                    "Elecraft rig open"
                );
                Ok(ElecraftRig {
                    engine: Mutex::new(engine),
                    model,
                    capabilities,
                })
            }
            Err(e) => {
                error!(model = model.name, error = %e, "Elecraft open failed");
                if let Err(close_err) = engine.close().await {
                    warn!(error = %close_err, "failed to close transport after open failure");
                }
                Err(e)
            }
        }
    }

    pub fn model(&self) -> &ElecraftModel {
        &self.model
    }

    pub fn family(&self) -> RigFamily {
        self.model.family()
    }

    /// The verified identity code.
    pub fn identity(&self) -> &IdentityCode {
        self.capabilities.identity()
    }

    /// The full capability cache.
    pub fn capabilities(&self) -> &CapabilityCache {
        &self.capabilities
    }

    pub fn extension_level(&self, sub: SubDevice) -> ExtensionLevel {
        self.capabilities.level(sub)
    }

    /// Whether `sub` reported at least `level`.
    pub fn supports(&self, sub: SubDevice, level: ExtensionLevel) -> bool {
        self.extension_level(sub) >= level
    }

    /// Send an arbitrary request through the engine and return its reply.
    pub async fn command(&self, request: &Request<'_>) -> Result<Reply> {
        self.engine.lock().await.transact(request).await
    }

    /// Send a command that has no reply on success.
    pub async fn set(&self, request: &Request<'_>) -> Result<()> {
        self.engine.lock().await.execute(request).await
    }

    /// Read the VFO-A frequency in hertz.
    pub async fn get_frequency(&self) -> Result<u64> {
        let request = cmd_read_frequency_a();
        let reply = self.command(&request).await?;
        parse_frequency(reply.data(request.token()))
    }

    /// Tune VFO-A to `freq_hz`.
    pub async fn set_frequency(&self, freq_hz: u64) -> Result<()> {
        let digits = format_frequency(freq_hz)?;
        debug!(freq_hz, "setting VFO-A frequency");
        self.set(&cmd_set_frequency_a(&digits)).await
    }

    /// End the session and release the transport.
    pub async fn close(self) -> Result<()> {
        info!(model = self.model.name, "closing Elecraft rig");
        self.engine.into_inner().close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{k2, k3};
    use catlink_core::{Error, Transport};
    use catlink_test_harness::MockTransport;
    use catlink_text_io::RetryPolicy;
    use std::time::Duration;

    fn engine(mock: &MockTransport) -> Transactor {
        Transactor::new(Box::new(mock.clone()), RigFamily::Elecraft)
            .with_policy(RetryPolicy::new(3, Duration::from_millis(1)).unwrap())
            .with_attempt_timeout(Duration::from_millis(50))
            .with_set_drain(Duration::from_millis(10))
    }

    async fn open_k3(mock: &MockTransport) -> ElecraftRig {
        mock.expect(b"ID;", b"ID017;");
        mock.expect(b"K2;", b"K22;");
        mock.expect(b"K3;", b"K31;");
        ElecraftRig::open(engine(mock), k3()).await.unwrap()
    }

    #[tokio::test]
    async fn open_populates_capabilities() {
        let mock = MockTransport::new();
        let rig = open_k3(&mock).await;

        assert_eq!(rig.identity().as_str(), "017");
        assert_eq!(rig.extension_level(SubDevice::K2), ExtensionLevel::K22);
        assert_eq!(rig.extension_level(SubDevice::K3), ExtensionLevel::K31);
        assert_eq!(rig.family(), RigFamily::Elecraft);
        assert_eq!(rig.model().name, "K3");
    }

    #[tokio::test]
    async fn supports_compares_levels() {
        let mock = MockTransport::new();
        let rig = open_k3(&mock).await;

        assert!(rig.supports(SubDevice::K2, ExtensionLevel::K20));
        assert!(rig.supports(SubDevice::K2, ExtensionLevel::K22));
        assert!(!rig.supports(SubDevice::K2, ExtensionLevel::K23));
        assert!(rig.supports(SubDevice::K3, ExtensionLevel::K31));
    }

    #[tokio::test]
    async fn accessors_do_no_io() {
        let mock = MockTransport::new();
        let rig = open_k3(&mock).await;
        let sends = mock.send_count();

        let _ = rig.capabilities().clone();
        let _ = rig.extension_level(SubDevice::K3);
        let _ = rig.identity();
        assert_eq!(mock.send_count(), sends);
    }

    #[tokio::test]
    async fn open_failure_closes_transport() {
        let mock = MockTransport::new();
        mock.expect(b"ID;", b"ID018;");

        let err = ElecraftRig::open(engine(&mock), k2()).await.err().unwrap();
        assert!(matches!(err, Error::ProtocolViolation(_)));
        assert!(!mock.is_connected());
    }

    #[tokio::test]
    async fn silent_rig_fails_open() {
        let mock = MockTransport::new();
        for _ in 0..3 {
            mock.expect_silence(b"ID;");
        }

        let err = ElecraftRig::open(engine(&mock), k2()).await.err().unwrap();
        assert!(matches!(err, Error::CommunicationFailure { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn command_passthrough() {
        let mock = MockTransport::new();
        let rig = open_k3(&mock).await;
        mock.expect(b"MD;", b"MD2;");

        let reply = rig.command(&Request::new("MD")).await.unwrap();
        assert_eq!(reply.data("MD"), "2");
    }

    #[tokio::test]
    async fn frequency_round_trip() {
        let mock = MockTransport::new();
        let rig = open_k3(&mock).await;
        mock.expect_silence(b"FA00007040000;");
        mock.expect(b"FA;", b"FA00007040000;");

        rig.set_frequency(7_040_000).await.unwrap();
        assert_eq!(rig.get_frequency().await.unwrap(), 7_040_000);
    }

    #[tokio::test]
    async fn set_frequency_out_of_range() {
        let mock = MockTransport::new();
        let rig = open_k3(&mock).await;
        let sends = mock.send_count();

        let err = rig.set_frequency(100_000_000_000).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(mock.send_count(), sends);
    }

    #[tokio::test]
    async fn close_releases_transport() {
        let mock = MockTransport::new();
        let rig = open_k3(&mock).await;

        rig.close().await.unwrap();
        assert!(!mock.is_connected());
    }
}
