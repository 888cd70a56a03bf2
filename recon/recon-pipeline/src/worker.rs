//! Background fusion worker.
//!
//! The producer/consumer split from the session design: a camera-facing
//! producer thread copies frames into owned [`DepthFrame`]s and queues
//! them, while this worker owns the [`ScanSession`] (and with it the
//! grid's single writer) and drains the queue in temporal order.
//! Extraction and measurement round-trip over reply channels, so they
//! observe a quiescent grid between fusion steps.

use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use recon_measure::VolumeResult;
use recon_types::{SampleCloud, TriangleMesh};
use tracing::{debug, warn};

use crate::config::ScanConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::frame::DepthFrame;
use crate::session::ScanSession;

enum Command {
    Depth(DepthFrame),
    SampledDepth(DepthFrame),
    Points(SampleCloud),
    Extract(mpsc::Sender<TriangleMesh>),
    Measure(mpsc::Sender<Option<VolumeResult>>),
    Reset,
}

/// A background thread owning a [`ScanSession`].
///
/// Frames submitted while the worker is busy queue up and fuse strictly
/// in submission order. Dropping the worker (or calling
/// [`finish`](FusionWorker::finish)) closes the queue, drains it, and
/// joins the thread.
///
/// # Example
///
/// ```
/// use recon_pipeline::{FusionWorker, ScanConfig};
/// use recon_fusion::VolumeConfig;
/// use nalgebra::Point3;
///
/// let config = ScanConfig::new(VolumeConfig::new(
///     (16, 16, 16),
///     Point3::origin(),
///     0.01,
/// ));
/// let worker = FusionWorker::spawn(config).unwrap();
///
/// let mesh = worker.extract_mesh().unwrap();
/// assert!(mesh.is_empty());
///
/// let session = worker.finish().unwrap();
/// assert_eq!(session.frame_count(), 0);
/// ```
#[derive(Debug)]
pub struct FusionWorker {
    sender: Option<mpsc::Sender<Command>>,
    handle: Option<JoinHandle<ScanSession>>,
}

impl FusionWorker {
    /// Validates the configuration and spawns the worker thread.
    ///
    /// # Errors
    ///
    /// Returns a configuration error before any thread is spawned.
    pub fn spawn(config: ScanConfig) -> PipelineResult<Self> {
        let session = ScanSession::new(config)?;
        let (sender, receiver) = mpsc::channel();

        let handle = thread::spawn(move || run(session, &receiver));

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Queues a depth frame for the primary depth-based fusion path.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::WorkerStopped`] if the worker thread is
    /// gone.
    pub fn submit_depth_frame(&self, frame: DepthFrame) -> PipelineResult<()> {
        self.send(Command::Depth(frame))
    }

    /// Queues a depth frame for the sample-denoise-fuse point path.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::WorkerStopped`] if the worker thread is
    /// gone.
    pub fn submit_sampled_frame(&self, frame: DepthFrame) -> PipelineResult<()> {
        self.send(Command::SampledDepth(frame))
    }

    /// Queues an externally supplied point batch.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::WorkerStopped`] if the worker thread is
    /// gone.
    pub fn submit_point_batch(&self, cloud: SampleCloud) -> PipelineResult<()> {
        self.send(Command::Points(cloud))
    }

    /// Queues a reset of the fusion grid.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::WorkerStopped`] if the worker thread is
    /// gone.
    pub fn reset(&self) -> PipelineResult<()> {
        self.send(Command::Reset)
    }

    /// Extracts the current surface, after all previously queued frames
    /// have fused.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::WorkerStopped`] if the worker thread is
    /// gone.
    pub fn extract_mesh(&self) -> PipelineResult<TriangleMesh> {
        let (reply, response) = mpsc::channel();
        self.send(Command::Extract(reply))?;
        response.recv().map_err(|_| PipelineError::WorkerStopped)
    }

    /// Measures the current surface, after all previously queued frames
    /// have fused.
    ///
    /// Returns `Ok(None)` when the grid holds no surface.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::WorkerStopped`] if the worker thread is
    /// gone.
    pub fn measure(&self) -> PipelineResult<Option<VolumeResult>> {
        let (reply, response) = mpsc::channel();
        self.send(Command::Measure(reply))?;
        response.recv().map_err(|_| PipelineError::WorkerStopped)
    }

    /// Closes the queue, drains remaining work, and returns the session.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::WorkerStopped`] if the worker thread
    /// panicked.
    pub fn finish(mut self) -> PipelineResult<ScanSession> {
        self.sender = None;
        let handle = self.handle.take().ok_or(PipelineError::WorkerStopped)?;
        handle.join().map_err(|_| PipelineError::WorkerStopped)
    }

    fn send(&self, command: Command) -> PipelineResult<()> {
        self.sender
            .as_ref()
            .ok_or(PipelineError::WorkerStopped)?
            .send(command)
            .map_err(|_| PipelineError::WorkerStopped)
    }
}

impl Drop for FusionWorker {
    fn drop(&mut self) {
        self.sender = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("fusion worker panicked");
            }
        }
    }
}

/// Worker loop: drain commands in order until the queue closes.
fn run(mut session: ScanSession, receiver: &mpsc::Receiver<Command>) -> ScanSession {
    for command in receiver {
        match command {
            Command::Depth(frame) => session.integrate_depth_frame(&frame),
            Command::SampledDepth(frame) => {
                // Config was validated at spawn, so only degraded frame
                // data can reach this point; it fuses as nothing.
                if let Err(error) = session.integrate_sampled_frame(&frame) {
                    warn!(%error, "sampled frame dropped");
                }
            }
            Command::Points(cloud) => {
                if let Err(error) = session.integrate_point_batch(&cloud) {
                    warn!(%error, "point batch dropped");
                }
            }
            Command::Extract(reply) => {
                let _ = reply.send(session.extract_mesh());
            }
            Command::Measure(reply) => {
                let result = match session.measure() {
                    Ok(volume) => volume,
                    Err(error) => {
                        warn!(%error, "measurement failed");
                        None
                    }
                };
                let _ = reply.send(result);
            }
            Command::Reset => session.reset(),
        }
    }
    debug!("fusion worker queue closed");
    session
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use nalgebra::{Isometry3, Point3};
    use recon_fusion::VolumeConfig;
    use recon_types::{CameraIntrinsics, TrackingQuality};

    fn centered_config() -> ScanConfig {
        ScanConfig::new(VolumeConfig::new(
            (24, 24, 24),
            Point3::new(-0.12, -0.12, 0.2),
            0.01,
        ))
    }

    fn plane_frame(depth_value: f32) -> DepthFrame {
        let depth = vec![depth_value; 48 * 48];
        DepthFrame::new(
            &depth,
            48,
            48,
            CameraIntrinsics::new(48.0, 48.0, 24.0, 24.0),
            Isometry3::identity(),
            TrackingQuality::Normal,
        )
        .unwrap()
    }

    #[test]
    fn test_worker_fuses_queued_frames_in_order() {
        let worker = FusionWorker::spawn(centered_config()).unwrap();
        worker.submit_depth_frame(plane_frame(0.3)).unwrap();
        worker.submit_depth_frame(plane_frame(0.3)).unwrap();

        let session = worker.finish().unwrap();
        assert_eq!(session.frame_count(), 2);
        assert!(session.volume().observed_cell_count() > 0);
    }

    #[test]
    fn test_extract_observes_all_prior_frames() {
        let worker = FusionWorker::spawn(centered_config()).unwrap();
        worker.submit_depth_frame(plane_frame(0.3)).unwrap();

        // The reply round-trip serializes behind the queued frame
        let mesh = worker.extract_mesh().unwrap();
        assert!(!mesh.is_empty());
    }

    #[test]
    fn test_measure_on_empty_worker_is_none() {
        let worker = FusionWorker::spawn(centered_config()).unwrap();
        assert!(worker.measure().unwrap().is_none());
    }

    #[test]
    fn test_reset_through_queue() {
        let worker = FusionWorker::spawn(centered_config()).unwrap();
        worker.submit_depth_frame(plane_frame(0.3)).unwrap();
        worker.reset().unwrap();

        let session = worker.finish().unwrap();
        assert_eq!(session.frame_count(), 0);
        assert_eq!(session.volume().observed_cell_count(), 0);
    }

    #[test]
    fn test_invalid_config_fails_before_spawn() {
        let config = ScanConfig::new(VolumeConfig::new((0, 4, 4), Point3::origin(), 0.01));
        assert!(FusionWorker::spawn(config).is_err());
    }

    #[test]
    fn test_point_batches_flow_through_queue() {
        let worker = FusionWorker::spawn(centered_config()).unwrap();
        let cloud = SampleCloud::from_positions(&[
            Point3::new(0.0, 0.0, 0.3),
            Point3::new(0.01, 0.0, 0.3),
            Point3::new(0.0, 0.01, 0.3),
        ]);
        worker.submit_point_batch(cloud).unwrap();

        let session = worker.finish().unwrap();
        assert!(session.volume().observed_cell_count() > 0);
    }
}
