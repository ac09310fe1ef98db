//! Device wait / reconnect loop around the coordinator.

use std::sync::Arc;

use anyhow::Context;
use deck::{prepare_session, Coordinator, DeckConfig};
use surface::{DeviceError, EventSource, SurfaceDevice};
use surface_emulator::{Emulator, EmulatorDevice, EmulatorInput};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Something that can open a session with a control surface.
pub trait Connect: Send + Sync {
    /// Output half of a session.
    type Device: SurfaceDevice;
    /// Input half of a session.
    type Events: EventSource;

    /// Try to open a session. [`DeviceError::NotFound`] means "not yet".
    fn connect(&self) -> Result<(Self::Device, Self::Events), DeviceError>;
}

impl Connect for Emulator {
    type Device = EmulatorDevice;
    type Events = EmulatorInput;

    fn connect(&self) -> Result<(EmulatorDevice, EmulatorInput), DeviceError> {
        Emulator::connect(self)
    }
}

/// How one session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Shutdown was requested.
    Shutdown,
    /// The connection dropped or failed; wait for the device again.
    Lost,
}

/// Long-running supervisor: one coordinator per connection.
pub struct Daemon<C> {
    connector: C,
    config: DeckConfig,
}

impl<C: Connect> Daemon<C> {
    pub fn new(connector: C, config: DeckConfig) -> Self {
        Self { connector, config }
    }

    pub fn config(&self) -> &DeckConfig {
        &self.config
    }

    /// Serve sessions until `shutdown` fires. Returns how many sessions were
    /// opened.
    pub async fn run(&self, shutdown: &CancellationToken) -> anyhow::Result<u32> {
        let mut sessions = 0u32;
        while let Some((device, events)) = self.wait_for_device(shutdown).await {
            sessions += 1;
            tracing::info!(session = sessions, model = %device.info().model, "device connected");
            match self.run_session(device, events, shutdown).await? {
                SessionEnd::Shutdown => break,
                SessionEnd::Lost => {
                    tracing::info!(session = sessions, "device lost, waiting for reconnect");
                }
            }
        }
        tracing::info!(sessions, "daemon exiting");
        Ok(sessions)
    }

    /// Poll the connector every `reconnect_poll` until it yields a session.
    ///
    /// Returns `None` if `shutdown` fires first. The first attempt is
    /// immediate.
    pub async fn wait_for_device(
        &self,
        shutdown: &CancellationToken,
    ) -> Option<(C::Device, C::Events)> {
        let mut ticker = tokio::time::interval(self.config.reconnect_poll());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut announced = false;
        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => return None,
                _ = ticker.tick() => {}
            }
            match self.connector.connect() {
                Ok(session) => return Some(session),
                Err(e) if !announced => {
                    tracing::info!(error = %e, "waiting for device");
                    announced = true;
                }
                Err(e) => tracing::debug!(error = %e, "device still absent"),
            }
        }
    }

    /// Run one connection to completion: prepare the device, register fresh
    /// modules, run the coordinator and stop it within `stop_timeout`.
    pub async fn run_session(
        &self,
        device: C::Device,
        events: C::Events,
        shutdown: &CancellationToken,
    ) -> anyhow::Result<SessionEnd> {
        let device = Arc::new(device);
        match prepare_session(&*device, self.config.coordinator.brightness).await {
            Ok(()) => {}
            Err(e) if e.is_fatal() => {
                tracing::warn!(error = %e, "device dropped while preparing session");
                return Ok(SessionEnd::Lost);
            }
            Err(e) => tracing::warn!(error = %e, "session preparation incomplete"),
        }

        let strip = device.info().strip.map(|rect| rect.size);
        let mut coordinator = Coordinator::with_config(device, self.config.coordinator.clone());
        let modules = modules::compose(&self.config, strip).context("building modules")?;
        for (module, grant) in modules {
            let handle = coordinator.register_module(module, grant);
            tracing::debug!(%handle, "module registered");
        }

        let outcome = coordinator.start(events, shutdown).await;

        let limit = self.config.stop_timeout();
        match tokio::time::timeout(limit, coordinator.stop()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "coordinator stopped with errors"),
            Err(_) => tracing::warn!(
                timeout_ms = self.config.stop_timeout_ms,
                "coordinator did not stop in time"
            ),
        }

        match outcome {
            Ok(()) if shutdown.is_cancelled() => Ok(SessionEnd::Shutdown),
            Ok(()) => Ok(SessionEnd::Lost),
            Err(e) if e.is_disconnect() => {
                tracing::info!(error = %e, "device disconnected");
                Ok(SessionEnd::Lost)
            }
            Err(e) => {
                tracing::warn!(error = %e, "session ended with error");
                Ok(SessionEnd::Lost)
            }
        }
    }
}
