//! Coordinator lifecycle.
//!
//! One [`Coordinator`] drives one device connection:
//!
//! 1. [`register_module`](Coordinator::register_module) for every module
//! 2. [`start`](Coordinator::start) initialises modules, spawns the listener
//!    and render tasks, and waits until the run scope is cancelled or the
//!    listener ends
//! 3. [`stop`](Coordinator::stop) cancels the scope, stops every module and
//!    joins the tasks
//!
//! The caller owns reconnect policy: build a fresh coordinator with fresh
//! modules for the next connection.

use std::sync::Arc;

use surface::{DeviceError, EventSource, KeyId, SurfaceDevice};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::CoordinatorConfig;
use crate::error::CoordinatorError;
use crate::module::{Module, ModuleHandle};
use crate::registry::Registry;
use crate::render::Renderer;
use crate::resources::Resources;
use crate::router::Router;

/// Tasks and scope of a started coordinator.
struct Running {
    scope: CancellationToken,
    render: JoinHandle<()>,
    /// `None` once `start` has already joined it
    listener: Option<JoinHandle<Result<(), CoordinatorError>>>,
}

/// Owns the modules of one device session and drives them.
pub struct Coordinator<D: SurfaceDevice> {
    device: Arc<D>,
    config: CoordinatorConfig,
    registry: Arc<Registry>,
    running: Option<Running>,
}

impl<D: SurfaceDevice> Coordinator<D> {
    /// Coordinator with default settings.
    pub fn new(device: Arc<D>) -> Self {
        Self::with_config(device, CoordinatorConfig::default())
    }

    /// Coordinator with explicit settings.
    pub fn with_config(device: Arc<D>, config: CoordinatorConfig) -> Self {
        Self {
            device,
            config,
            registry: Arc::new(Registry::new()),
            running: None,
        }
    }

    /// Grant `resources` to `module`.
    ///
    /// Keys and dials already granted to an earlier module move to this one.
    /// Registering while running only affects the next `start`.
    pub fn register_module(&mut self, module: Arc<dyn Module>, resources: Resources) -> ModuleHandle {
        if self.running.is_some() {
            tracing::warn!(module = module.id(), "registered while running, takes effect on next start");
        }
        Arc::make_mut(&mut self.registry).register(module, resources)
    }

    /// The device this coordinator drives.
    pub fn device(&self) -> &Arc<D> {
        &self.device
    }

    /// Settings in use.
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Registry snapshot (routing tables and failure flags).
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Whether `handle` failed to initialise on the current connection.
    pub fn is_failed(&self, handle: ModuleHandle) -> bool {
        self.registry.is_failed(handle)
    }

    /// Number of registered modules.
    pub fn module_count(&self) -> usize {
        self.registry.len()
    }

    /// Whether `start` ran and `stop` has not.
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Initialise modules and drive the device until `parent` is cancelled or
    /// `source` ends.
    ///
    /// A module whose `init` fails is excluded for this connection; the rest
    /// keep working. Returns `Ok(())` on cancellation and the listener's
    /// error otherwise. Call [`stop`](Self::stop) afterwards in both cases.
    pub async fn start<S: EventSource>(
        &mut self,
        source: S,
        parent: &CancellationToken,
    ) -> Result<(), CoordinatorError> {
        if self.running.is_some() {
            return Err(CoordinatorError::AlreadyStarted);
        }
        let scope = parent.child_token();
        let registry = Arc::clone(&self.registry);

        let info = self.device.info();
        if !info.has_strip() {
            tracing::info!(model = %info.model, "no touch strip, strip rendering disabled");
        }

        registry.reset_failures();
        for entry in registry.entries() {
            match entry.module().init(scope.clone(), entry.resources()) {
                Ok(()) => tracing::debug!(module = entry.id(), "module initialised"),
                Err(e) => {
                    tracing::warn!(
                        module = entry.id(),
                        error = %e,
                        "module init failed, disabled for this connection"
                    );
                    registry.mark_failed(entry.handle());
                }
            }
        }

        let router = Router::new(Arc::clone(&registry), self.config.handler_errors);
        let renderer = Renderer::new(Arc::clone(&self.device), Arc::clone(&registry), &self.config);
        let listener = tokio::spawn(listen(source, router, scope.clone()));
        let render = tokio::spawn(renderer.run(self.config.render_interval(), scope.clone()));
        tracing::info!(
            modules = registry.len(),
            failed = registry.entries().filter(|e| e.is_failed()).count(),
            "coordinator started"
        );

        let running = self.running.insert(Running {
            scope: scope.clone(),
            render,
            listener: Some(listener),
        });
        let Some(listener) = running.listener.as_mut() else {
            return Ok(());
        };

        let joined = tokio::select! {
            biased;
            joined = listener => Some(joined),
            () = scope.cancelled() => None,
        };
        let Some(joined) = joined else {
            return Ok(());
        };

        // Listener is done; end the run scope so the render loop and module
        // background work stop too.
        running.listener = None;
        scope.cancel();
        let outcome = joined.map_err(CoordinatorError::from).and_then(|r| r);
        if let Err(e) = &outcome {
            tracing::warn!(error = %e, "event listener ended");
        }
        outcome
    }

    /// Cancel the run scope, stop every module (failed ones included) and
    /// wait for the render loop to exit.
    ///
    /// Does nothing if the coordinator is not running.
    pub async fn stop(&mut self) -> Result<(), CoordinatorError> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };
        running.scope.cancel();

        let mut failures = Vec::new();
        for entry in self.registry.entries() {
            if let Err(e) = entry.module().stop() {
                tracing::warn!(module = entry.id(), error = %e, "module stop failed");
                failures.push((entry.id().to_string(), e));
            }
        }

        if let Some(listener) = running.listener {
            match listener.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::debug!(error = %e, "listener ended with error during stop"),
                Err(e) => tracing::warn!(error = %e, "listener task failed"),
            }
        }
        running.render.await?;
        tracing::info!("coordinator stopped");

        if failures.is_empty() {
            Ok(())
        } else {
            Err(CoordinatorError::ModuleStop { failures })
        }
    }
}

impl<D: SurfaceDevice> Drop for Coordinator<D> {
    fn drop(&mut self) {
        if let Some(running) = &self.running {
            running.scope.cancel();
        }
    }
}

/// Listener task: pull events and route them until cancelled or the source
/// fails.
async fn listen<S: EventSource>(
    mut source: S,
    mut router: Router,
    cancel: CancellationToken,
) -> Result<(), CoordinatorError> {
    loop {
        let event = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            event = source.next_event() => event?,
        };
        router.dispatch(event)?;
    }
}

/// Get a freshly connected device into a known state: brightness set and
/// every key blanked. Run before registering modules.
pub async fn prepare_session<D: SurfaceDevice>(device: &D, brightness: u8) -> Result<(), DeviceError> {
    device.set_brightness(brightness.min(100)).await?;
    for key in KeyId::ALL {
        device.clear_key(key).await?;
    }
    tracing::debug!(brightness, "session prepared");
    Ok(())
}
