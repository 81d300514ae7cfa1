//! Per-layer slicing pipeline: intersect, assemble, process.
//!
//! Layers only read the shared mesh and write their own output, so they run
//! independently (on the rayon pool with the `parallel` feature). Results are
//! collected by layer index, never by completion order.

use crate::contour::{AssemblyOptions, ContourAssembler, ContourProcessor, ProcessingOptions};
use crate::errors::{SliceError, SliceResult};
use crate::float_types::{Real, tolerance};
use crate::layer::Layer;
use crate::mesh::Mesh;
use crate::slice::PlaneIntersector;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::thread::JoinHandle;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Settings for one generation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    /// On-plane distance for vertex classification.
    pub plane_epsilon: Real,
    pub assembly: AssemblyOptions,
    pub processing: ProcessingOptions,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            plane_epsilon: tolerance(),
            assembly: AssemblyOptions::default(),
            processing: ProcessingOptions::default(),
        }
    }
}

/// Progress snapshot: how many layers are finished out of how many.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    /// Get progress as a fraction (0.0 to 1.0).
    #[inline]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Called after each finished layer, possibly from several threads.
pub type ProgressCallback = Box<dyn Fn(&Progress) + Send + Sync>;

/// Shared flag for cooperative cancellation. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Check if cancellation was requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Cancellation and progress hooks for [`generate_layers`].
#[derive(Default)]
pub struct GenerationControl {
    pub token: CancellationToken,
    pub progress: Option<ProgressCallback>,
}

impl GenerationControl {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            progress: None,
        }
    }

    pub fn with_progress(mut self, callback: impl Fn(&Progress) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    fn report(&self, completed: usize, total: usize) {
        if let Some(cb) = &self.progress {
            cb(&Progress { completed, total });
        }
    }
}

/// Cuts `mesh` at one elevation and returns the cleaned layer.
pub fn slice_layer(mesh: &Mesh, index: usize, elevation: Real, options: &GenerationOptions) -> Layer {
    let segments = PlaneIntersector::new(options.plane_epsilon).intersect(mesh, elevation);
    let assembly = ContourAssembler::new(options.assembly).assemble(&segments);
    let polygons = ContourProcessor::new(options.processing).process(&assembly.polygons);

    if assembly.report.discarded_chains > 0 {
        tracing::warn!(
            index,
            elevation,
            discarded = assembly.report.discarded_chains,
            "layer has open contour chains"
        );
    }
    tracing::debug!(
        index,
        elevation,
        segments = segments.len(),
        polygons = polygons.len(),
        "sliced layer"
    );

    Layer {
        index,
        elevation,
        polygons,
        discarded_chains: assembly.report.discarded_chains,
    }
}

/// Slices `mesh` at every elevation, returning layers in the order requested.
///
/// Cancellation is checked before each layer starts; a cancelled run returns
/// [`SliceError::Cancelled`]. Non-finite elevations are rejected up front.
pub fn generate_layers(
    mesh: &Mesh,
    elevations: &[Real],
    options: &GenerationOptions,
    control: &GenerationControl,
) -> SliceResult<Vec<Layer>> {
    if let Some(bad) = elevations.iter().find(|e| !e.is_finite()) {
        return Err(SliceError::InvalidInput(format!("layer elevation {bad} is not finite")));
    }

    let total = elevations.len();
    let done = AtomicUsize::new(0);
    let slice_one = |(index, &elevation): (usize, &Real)| -> SliceResult<Layer> {
        if control.token.is_cancelled() {
            return Err(SliceError::Cancelled);
        }
        let layer = slice_layer(mesh, index, elevation, options);
        let completed = done.fetch_add(1, Ordering::Relaxed) + 1;
        control.report(completed, total);
        Ok(layer)
    };

    #[cfg(feature = "parallel")]
    let layers: SliceResult<Vec<Layer>> = elevations.par_iter().enumerate().map(slice_one).collect();

    #[cfg(not(feature = "parallel"))]
    let layers: SliceResult<Vec<Layer>> = elevations.iter().enumerate().map(slice_one).collect();

    match &layers {
        Ok(layers) => tracing::info!(
            layers = layers.len(),
            empty = layers.iter().filter(|l| l.is_empty()).count(),
            "generated layers"
        ),
        Err(SliceError::Cancelled) => tracing::info!("layer generation cancelled"),
        Err(err) => tracing::warn!(%err, "layer generation failed"),
    }
    layers
}

/// Messages from a background [`GenerationTask`].
#[derive(Debug)]
pub enum GenerationEvent {
    Progress(Progress),
    Finished(SliceResult<Vec<Layer>>),
}

/// A generation run on its own thread, observed through a channel.
pub struct GenerationTask {
    token: CancellationToken,
    events: mpsc::Receiver<GenerationEvent>,
    handle: Option<JoinHandle<()>>,
}

impl GenerationTask {
    /// Starts slicing `mesh` at `elevations` in the background.
    pub fn spawn(mesh: Arc<Mesh>, elevations: Vec<Real>, options: GenerationOptions) -> Self {
        let (tx, events) = mpsc::channel();
        let token = CancellationToken::new();

        let progress_tx = tx.clone();
        let control = GenerationControl::new(token.clone()).with_progress(move |p| {
            let _ = progress_tx.send(GenerationEvent::Progress(*p));
        });

        let handle = std::thread::spawn(move || {
            let result = generate_layers(&mesh, &elevations, &options, &control);
            let _ = tx.send(GenerationEvent::Finished(result));
        });

        Self {
            token,
            events,
            handle: Some(handle),
        }
    }

    /// Asks the run to stop before its next layer.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Next pending event, without blocking.
    pub fn try_event(&self) -> Option<GenerationEvent> {
        self.events.try_recv().ok()
    }

    /// Blocks until the run finishes, skipping any remaining progress events.
    ///
    /// If the `Finished` event was already taken with [`try_event`](Self::try_event),
    /// this reports a [`SliceError::Worker`] error.
    pub fn wait(mut self) -> SliceResult<Vec<Layer>> {
        let outcome = loop {
            match self.events.recv() {
                Ok(GenerationEvent::Progress(_)) => continue,
                Ok(GenerationEvent::Finished(result)) => break result,
                Err(_) => break Err(SliceError::Worker("no result was delivered".into())),
            }
        };
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                return Err(SliceError::Worker("generation thread panicked".into()));
            }
        }
        outcome
    }
}

impl Drop for GenerationTask {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.token.cancel();
        }
    }
}
