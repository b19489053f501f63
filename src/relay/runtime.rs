//! Tokio runtime for [`Bridge`].

use std::{fmt, sync::Arc};

use futures::Future;
use tokio::{select, signal, task::yield_now, time::sleep};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{Instrument, debug, info_span, warn};

use super::{Shared, poll_downstream_once, poll_upstream_once};
use crate::{
    config::{BridgeConfig, PollConfig},
    diagnostic::{DiagnosticSink, NoopDiagnostics},
    error::{BridgeError, RelayError},
    metrics::Direction,
    pump::{DownstreamPump, Progress, UpstreamPump},
    transport::{ControllerTransport, HostTransport},
};

/// Bridge between a host transport and a controller transport.
///
/// [`run_with_shutdown`](Self::run_with_shutdown) spawns one task per
/// direction. The tasks share only the two transports, each behind its own
/// [`Shared`] lock, so the host transport's bookkeeping is never entered from
/// both tasks at once.
pub struct Bridge<H, C> {
    host: Shared<H>,
    controller: Shared<C>,
    config: BridgeConfig,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl<H, C> fmt::Debug for Bridge<H, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<H, C> Bridge<H, C>
where
    H: HostTransport + Send + 'static,
    C: ControllerTransport + Send + 'static,
{
    /// Create a bridge with the default configuration.
    #[must_use]
    pub fn new(host: H, controller: C) -> Self {
        Self {
            host: Shared::new(host),
            controller: Shared::new(controller),
            config: BridgeConfig::default(),
            diagnostics: Arc::new(NoopDiagnostics),
        }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Trace traffic from both directions to `diagnostics`.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Handle to the host transport, usable while the bridge runs.
    #[must_use]
    pub fn host(&self) -> Shared<H> { self.host.clone() }

    /// Handle to the controller transport, usable while the bridge runs.
    #[must_use]
    pub fn controller(&self) -> Shared<C> { self.controller.clone() }

    /// Relay until Ctrl+C is received.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Task`] if a relay task panicked.
    pub async fn run(self) -> Result<(), BridgeError> {
        self.run_with_shutdown(async {
            let _ = signal::ctrl_c().await;
        })
        .await
    }

    /// Relay until `shutdown` resolves.
    ///
    /// Step errors are logged and never stop a direction. A panic in one
    /// direction leaves the other running; it is reported once `shutdown`
    /// resolves.
    ///
    /// # Examples
    ///
    /// ```
    /// use hci_bridge::{
    ///     relay::Bridge,
    ///     transport::{MemoryController, MemoryHost},
    /// };
    /// use tokio::sync::oneshot;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), hci_bridge::error::BridgeError> {
    /// let bridge = Bridge::new(MemoryHost::new(), MemoryController::new());
    /// let (tx, rx) = oneshot::channel::<()>();
    /// let handle = tokio::spawn(bridge.run_with_shutdown(async {
    ///     let _ = rx.await;
    /// }));
    ///
    /// let _ = tx.send(());
    /// handle.await.expect("join bridge task")?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Task`] if a relay task panicked.
    #[expect(
        clippy::integer_division_remainder_used,
        reason = "tokio::select! expands to modulus internally"
    )]
    pub async fn run_with_shutdown<S>(self, shutdown: S) -> Result<(), BridgeError>
    where
        S: Future<Output = ()> + Send,
    {
        let Bridge {
            host,
            controller,
            config,
            diagnostics,
        } = self;
        let token = CancellationToken::new();
        let tracker = TaskTracker::new();
        let poll = config.poll();

        let mut upstream = UpstreamPump::new(&config).with_diagnostics(Arc::clone(&diagnostics));
        let up_host = host.clone();
        let up_controller = controller.clone();
        let upstream_task = tracker.spawn(
            drive(poll, token.clone(), move || {
                poll_upstream_once(&mut upstream, &up_host, &up_controller)
            })
            .instrument(info_span!(
                "relay",
                direction = Direction::HostToController.as_str()
            )),
        );

        let mut downstream = DownstreamPump::new(&config).with_diagnostics(diagnostics);
        let downstream_task = tracker.spawn(
            drive(poll, token.clone(), move || {
                poll_downstream_once(&mut downstream, &host, &controller)
            })
            .instrument(info_span!(
                "relay",
                direction = Direction::ControllerToHost.as_str()
            )),
        );

        tracker.close();
        select! {
            () = shutdown => token.cancel(),
            () = tracker.wait() => {},
        }
        token.cancel();
        tracker.wait().await;

        upstream_task.await?;
        downstream_task.await?;
        Ok(())
    }
}

/// Poll `step` until `token` is cancelled.
async fn drive<F, E>(poll: PollConfig, token: CancellationToken, mut step: F)
where
    F: FnMut() -> Result<Progress, RelayError<E>>,
    E: std::error::Error,
{
    debug!("relay context started");
    while !token.is_cancelled() {
        let progress = match step() {
            Ok(progress) => progress,
            Err(err) => {
                warn!(reason = err.reason(), "relay step failed: {err}");
                Progress::Idle
            }
        };
        if progress.is_idle() {
            idle(poll, &token).await;
        } else {
            yield_now().await;
        }
    }
    debug!("relay context stopped");
}

#[expect(
    clippy::integer_division_remainder_used,
    reason = "tokio::select! expands to modulus internally"
)]
async fn idle(poll: PollConfig, token: &CancellationToken) {
    if poll.idle_delay.is_zero() {
        yield_now().await;
        return;
    }
    select! {
        () = token.cancelled() => {},
        () = sleep(poll.idle_delay) => {},
    }
}
