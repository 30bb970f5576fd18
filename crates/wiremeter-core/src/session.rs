//! Capture session lifecycle.
//!
//! One producer thread owns the live source, the pipeline, and the sink;
//! frame decoding runs synchronously on it. Stop lets the in-flight
//! packet finish and hands the sink back. Switching devices is
//! stop-then-start with a fresh pipeline, so no sink call ever carries
//! state derived from a previous device's flow buffers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::analysis::Pipeline;
use crate::sink::Sink;
use crate::source::{LiveSource, SourceError};
use crate::{CaptureConfig, PipelineCounters};

pub struct CaptureSession<S: Sink + Send + 'static> {
    config: CaptureConfig,
    counters: Arc<Mutex<PipelineCounters>>,
    worker: Option<Worker<S>>,
    parked_sink: Option<S>,
}

struct Worker<S: Sink> {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<Pipeline<S>>,
}

impl<S: Sink + Send + 'static> CaptureSession<S> {
    pub fn new(config: CaptureConfig, sink: S) -> Self {
        Self {
            config,
            counters: Arc::new(Mutex::new(PipelineCounters::default())),
            worker: None,
            parked_sink: Some(sink),
        }
    }

    /// Starts capturing on the configured device (or the default).
    pub fn start(&mut self) -> Result<(), SourceError> {
        let selected = self.config.selected_device;
        self.start_on(selected)
    }

    /// Starts capturing on an explicit device index.
    pub fn start_on(&mut self, device: Option<usize>) -> Result<(), SourceError> {
        self.stop();
        // open synchronously so device errors surface to the caller
        let mut source = LiveSource::open_selected(device.or(self.config.selected_device))?;
        let sink = self
            .parked_sink
            .take()
            .ok_or_else(|| SourceError::Capture("sink lost by a previous worker".to_string()))?;

        log::info!("capturing on {}", source.device().name);
        let mut pipeline = Pipeline::new(self.config.clone(), sink);
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let shared = Arc::clone(&self.counters);
        if let Ok(mut counters) = shared.lock() {
            *counters = PipelineCounters::default();
        }

        let handle = std::thread::Builder::new()
            .name("wiremeter-capture".to_string())
            .spawn(move || {
                while !stop_flag.load(Ordering::Relaxed) {
                    match source.try_next() {
                        Ok(Some(event)) => {
                            pipeline.handle_packet(&event);
                            if let Ok(mut counters) = shared.lock() {
                                *counters = pipeline.counters().clone();
                            }
                        }
                        Ok(None) => {}
                        Err(err) => {
                            log::warn!("capture worker stopping: {err}");
                            break;
                        }
                    }
                }
                pipeline
            })
            .map_err(SourceError::Io)?;

        self.worker = Some(Worker { stop, handle });
        Ok(())
    }

    /// Stops the worker, waits for the in-flight packet, and recovers
    /// the sink. Idempotent.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        worker.stop.store(true, Ordering::Relaxed);
        match worker.handle.join() {
            Ok(pipeline) => {
                if let Ok(mut counters) = self.counters.lock() {
                    *counters = pipeline.counters().clone();
                }
                self.parked_sink = Some(pipeline.into_sink());
            }
            Err(_) => log::error!("capture worker panicked; sink lost"),
        }
    }

    /// Full close-and-reopen: drops every per-flow buffer and the local
    /// player before the new device delivers its first byte.
    pub fn switch_device(&mut self, index: usize) -> Result<(), SourceError> {
        self.stop();
        self.start_on(Some(index))
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.handle.is_finished())
    }

    /// Snapshot of the current (or last finished) run's counters.
    pub fn counters(&self) -> PipelineCounters {
        self.counters
            .lock()
            .map(|counters| counters.clone())
            .unwrap_or_default()
    }

    /// The sink, available while no worker is running.
    pub fn sink_mut(&mut self) -> Option<&mut S> {
        self.parked_sink.as_mut()
    }

    /// Stops the worker and takes the sink out of the session.
    pub fn into_sink(mut self) -> Option<S> {
        self.stop();
        self.parked_sink.take()
    }
}

impl<S: Sink + Send + 'static> Drop for CaptureSession<S> {
    fn drop(&mut self) {
        self.stop();
    }
}
