use crate::core::{SegmentError, TrafficRecord};
use crate::input::{parse_segment_id, RecordSource};
use crate::playback::{PlaybackConfig, PlaybackController};
use crate::render::SceneModel;
use chrono::Local;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tracing::{debug, error, info};

/// Results of a background fetch
#[derive(Debug)]
pub enum LoadingUpdate {
    Complete {
        generation: u64,
        segment: i64,
        records: Vec<TrafficRecord>,
    },
    Error {
        generation: u64,
        segment: i64,
        error: SegmentError,
    },
}

/// Blocking message shown until the user dismisses it
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    /// Increases with every notice raised, so the UI can tell a new one apart
    pub serial: u64,
    pub title: String,
    pub message: String,
}

/// Everything the window needs between frames
pub struct AppState {
    controller: PlaybackController,
    pub scene: SceneModel,
    source: Arc<dyn RecordSource>,
    runtime: Handle,
    sender: Sender<LoadingUpdate>,
    receiver: Receiver<LoadingUpdate>,
    request_generation: u64,
    loading: Option<i64>,
    notice: Option<Notice>,
    notices_raised: u64,
    status_message: Option<String>,
}

impl AppState {
    pub fn new(config: PlaybackConfig, source: Arc<dyn RecordSource>, runtime: Handle) -> Self {
        let mut scene = SceneModel::new(config.background_tiles, config.capacity, config.spokes_per_wheel);
        let mut controller = PlaybackController::new(config);
        controller.reset(&mut scene);

        let (sender, receiver) = channel();
        Self {
            controller,
            scene,
            source,
            runtime,
            sender,
            receiver,
            request_generation: 0,
            loading: None,
            notice: None,
            notices_raised: 0,
            status_message: None,
        }
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn config(&self) -> &PlaybackConfig {
        self.controller.context().config()
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Swap the record source. Playback and any fetch in flight are abandoned.
    pub fn set_source(&mut self, source: Arc<dyn RecordSource>) {
        self.request_generation += 1;
        self.loading = None;
        self.controller.reset(&mut self.scene);
        self.source = source;
        self.set_status(format!("Using {}", self.source.name()));
        info!(source = self.source.name(), "record source changed");
    }

    /// Start loading the segment named by `input`.
    ///
    /// Input that is not a segment id is rejected before anything changes.
    /// Otherwise the current segment is torn down at once and the fetch runs
    /// in the background; `process_loading` picks up the result.
    pub fn trigger(&mut self, input: &str) -> Result<i64, SegmentError> {
        let segment = parse_segment_id(input)?;

        self.controller.reset(&mut self.scene);
        self.notice = None;
        self.request_generation += 1;
        self.loading = Some(segment);
        self.set_status(format!("Loading segment {} from {}...", segment, self.source.name()));

        let generation = self.request_generation;
        let source = Arc::clone(&self.source);
        let tx = self.sender.clone();
        self.runtime.spawn(async move {
            let update = match source.fetch_segment(segment).await {
                Ok(records) => LoadingUpdate::Complete {
                    generation,
                    segment,
                    records,
                },
                Err(error) => LoadingUpdate::Error {
                    generation,
                    segment,
                    error,
                },
            };
            let _ = tx.send(update);
        });

        debug!(segment, generation, "fetch requested");
        Ok(segment)
    }

    /// Apply finished fetches. Results of superseded triggers are dropped.
    pub fn process_loading(&mut self, now: Instant) {
        while let Ok(update) = self.receiver.try_recv() {
            let (generation, segment) = match &update {
                LoadingUpdate::Complete { generation, segment, .. } => (*generation, *segment),
                LoadingUpdate::Error { generation, segment, .. } => (*generation, *segment),
            };
            if generation != self.request_generation {
                debug!(segment, generation, "discarding stale fetch result");
                continue;
            }
            self.loading = None;

            let result = match update {
                LoadingUpdate::Complete { records, .. } => {
                    self.controller.load_segment(segment, records, &mut self.scene, now)
                }
                LoadingUpdate::Error { error, .. } => Err(error),
            };

            match result {
                Ok(count) => self.set_status(format!("Playing segment {} ({} records)", segment, count)),
                Err(e) => self.fail(segment, e),
            }
        }
    }

    /// Once per event loop pass: fetch results, then the record tick if due
    pub fn update(&mut self, now: Instant) {
        self.process_loading(now);
        self.controller.poll(&mut self.scene, now);
    }

    /// Once per rendered frame, `delta_ms` after the previous one
    pub fn frame(&mut self, delta_ms: f32) {
        self.controller.frame(&mut self.scene, delta_ms);
    }

    fn fail(&mut self, segment: i64, e: SegmentError) {
        error!(segment, error = %e, "segment load failed");
        self.notices_raised += 1;
        self.notice = Some(Notice {
            serial: self.notices_raised,
            title: format!("Segment {}", segment),
            message: e.to_string(),
        });
        self.set_status(format!("Failed to load segment {}", segment));
    }

    fn set_status(&mut self, message: String) {
        self.status_message = Some(format!("[{}] {}", Local::now().format("%H:%M:%S"), message));
    }
}
