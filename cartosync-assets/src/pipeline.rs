//! Background image loading with completions delivered to the UI thread.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use cartosync_core::{AssetCompletion, AssetRequest, AssetSink};
use image::RgbaImage;
use log::debug;
use tokio::runtime::{Builder, Runtime};

use crate::error::AssetBuildError;
use crate::loader::AssetLoader;

/// Image payload produced by the pipeline.
pub type LoadedImage = Arc<RgbaImage>;

/// Worker threads used by [`AssetPipeline::new`].
pub const DEFAULT_WORKER_THREADS: usize = 2;

/// Runs [`AssetRequest`]s on a private Tokio runtime.
///
/// `submit` returns immediately. Finished loads queue up until the owning
/// thread collects them with [`drain`](Self::drain) or
/// [`recv_timeout`](Self::recv_timeout) and feeds them to
/// `MapController::apply_asset`. Loads are never cancelled; completions for
/// overlays that have since gone are discarded by the controller.
pub struct AssetPipeline<H> {
    loader: AssetLoader,
    runtime: Runtime,
    sender: Sender<AssetCompletion<H, LoadedImage>>,
    receiver: Receiver<AssetCompletion<H, LoadedImage>>,
    in_flight: Arc<AtomicUsize>,
}

impl<H> fmt::Debug for AssetPipeline<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetPipeline")
            .field("loader", &self.loader)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}

impl<H: Send + 'static> AssetPipeline<H> {
    /// Start a pipeline with [`DEFAULT_WORKER_THREADS`] workers.
    ///
    /// # Errors
    ///
    /// Returns [`AssetBuildError::Runtime`] if the runtime cannot start.
    pub fn new(loader: AssetLoader) -> Result<Self, AssetBuildError> {
        Self::with_workers(loader, DEFAULT_WORKER_THREADS)
    }

    /// Start a pipeline with `workers` runtime threads (at least one).
    ///
    /// # Errors
    ///
    /// Returns [`AssetBuildError::Runtime`] if the runtime cannot start.
    pub fn with_workers(loader: AssetLoader, workers: usize) -> Result<Self, AssetBuildError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(workers.max(1))
            .thread_name("cartosync-assets")
            .enable_all()
            .build()
            .map_err(AssetBuildError::Runtime)?;
        let (sender, receiver) = mpsc::channel();
        Ok(Self {
            loader,
            runtime,
            sender,
            receiver,
            in_flight: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// The loader used for every request.
    #[must_use]
    pub const fn loader(&self) -> &AssetLoader {
        &self.loader
    }

    /// Start loading `request` in the background.
    pub fn submit(&self, request: AssetRequest<H>) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let loader = self.loader.clone();
        let sender = self.sender.clone();
        self.runtime.spawn(async move {
            let image = loader.resolve_sized(&request.reference, request.size).await;
            if sender.send(AssetCompletion { request, image }).is_err() {
                debug!("asset pipeline closed before a load finished");
            }
        });
    }

    /// Every completion that has arrived so far, without blocking.
    pub fn drain(&self) -> Vec<AssetCompletion<H, LoadedImage>> {
        let completions: Vec<_> = self.receiver.try_iter().collect();
        self.in_flight.fetch_sub(completions.len(), Ordering::SeqCst);
        completions
    }

    /// Wait up to `timeout` for the next completion.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<AssetCompletion<H, LoadedImage>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(completion) => {
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                Some(completion)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Wait until every submitted load has been delivered or `timeout`
    /// passes, returning what arrived.
    pub fn drain_blocking(&self, timeout: Duration) -> Vec<AssetCompletion<H, LoadedImage>> {
        let started = Instant::now();
        let mut completions = self.drain();
        while self.in_flight() > 0 {
            let remaining = timeout.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                break;
            }
            if let Some(completion) = self.recv_timeout(remaining) {
                completions.push(completion);
            }
        }
        completions.extend(self.drain());
        completions
    }
}

impl<H> AssetPipeline<H> {
    /// Loads submitted but not yet collected through [`drain`](Self::drain),
    /// [`recv_timeout`](Self::recv_timeout) or
    /// [`drain_blocking`](Self::drain_blocking).
    ///
    /// A load that has finished but is still queued counts as in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

impl<H: Send + 'static> AssetSink<H> for AssetPipeline<H> {
    fn submit(&self, request: AssetRequest<H>) {
        Self::submit(self, request);
    }
}
