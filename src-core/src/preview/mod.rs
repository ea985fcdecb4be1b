//! Live preview: playback-clock-driven rendering.
//!
//! A preview session samples the real playback position and renders frames
//! at a fixed cadence, with captions and the position indicator refreshed on
//! their own slower cadences. All three tick tasks are cooperative,
//! re-armed only while the session is `Playing`, and wind down together
//! when the state leaves `Playing`.

pub mod engine;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::audio::AmplitudeBuffer;
use crate::captions::CaptionTrack;
use crate::render::text::CaptionFont;
use crate::render::{Composer, Frame, RenderConfig};
use crate::{Error, Result};

/// Frame render cadence (~30 fps).
pub const FRAME_TICK: Duration = Duration::from_millis(33);
/// Caption refresh cadence.
pub const CAPTION_TICK: Duration = Duration::from_millis(200);
/// Position indicator cadence.
pub const POSITION_TICK: Duration = Duration::from_millis(100);

/// Preview session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewState {
    /// Not started yet.
    Idle,
    /// Audio playing, all tick tasks live.
    Playing,
    /// Audio frozen; tick tasks idle but armed.
    Paused,
    /// Terminal: stopped by the user or by end of audio.
    Stopped,
}

/// Audio playback engine collaborator.
///
/// The rodio implementation lives in [`engine`]; tests drive the loop with
/// a fake clock.
pub trait PlaybackEngine: Send + Sync {
    /// Begin playback from the current position.
    fn start(&self) -> Result<()>;
    fn pause(&self);
    fn resume(&self);
    fn stop(&self);
    /// Seek to `t` seconds and continue playing.
    fn seek(&self, t: f64) -> Result<()>;
    /// Current playback position in seconds.
    fn position_secs(&self) -> f64;
    /// True once the underlying audio has run out.
    fn is_finished(&self) -> bool;
}

/// Receives preview output. Implementations are expected to be cheap; the
/// frame callback runs on the render tick.
pub trait PreviewSink: Send + Sync {
    fn on_frame(&self, frame: Frame);
    /// Called only when the resolved caption text changed.
    fn on_caption(&self, text: &str);
    /// Playback progress in percent of total duration, 0..=100.
    fn on_position(&self, percent: f64);
    /// Called once when the session reaches `Stopped` via end of audio.
    fn on_finished(&self) {}
}

/// Everything the composer needs, snapshotted at session start.
pub struct SessionData {
    pub buffer: AmplitudeBuffer,
    pub track: CaptionTrack,
    pub config: RenderConfig,
    pub font: Option<CaptionFont>,
}

impl SessionData {
    fn composer(&self) -> Composer<'_> {
        Composer::new(&self.buffer, &self.track, &self.config, self.font.as_ref())
    }
}

/// A live preview session over one audio source.
pub struct PreviewSession {
    engine: Arc<dyn PlaybackEngine>,
    sink: Arc<dyn PreviewSink>,
    data: Arc<SessionData>,
    state: Arc<RwLock<PreviewState>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl PreviewSession {
    pub fn new(
        data: SessionData,
        engine: Arc<dyn PlaybackEngine>,
        sink: Arc<dyn PreviewSink>,
    ) -> Self {
        Self {
            engine,
            sink,
            data: Arc::new(data),
            state: Arc::new(RwLock::new(PreviewState::Idle)),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub async fn state(&self) -> PreviewState {
        *self.state.read().await
    }

    /// Start playback and arm the three tick tasks.
    pub async fn start(&self) -> Result<()> {
        {
            let state = self.state.read().await;
            if *state != PreviewState::Idle {
                return Err(Error::playback("preview already started"));
            }
        }

        self.engine.start()?;
        {
            let mut state = self.state.write().await;
            *state = PreviewState::Playing;
        }

        let mut tasks = self.tasks.lock().await;
        tasks.push(self.spawn_frame_task());
        tasks.push(self.spawn_caption_task());
        tasks.push(self.spawn_position_task());

        tracing::info!("preview started");
        Ok(())
    }

    /// Freeze playback; tick tasks stay armed but idle.
    pub async fn pause(&self) {
        let mut state = self.state.write().await;
        if *state == PreviewState::Playing {
            self.engine.pause();
            *state = PreviewState::Paused;
        }
    }

    /// Resume a paused session.
    pub async fn resume(&self) {
        let mut state = self.state.write().await;
        if *state == PreviewState::Paused {
            self.engine.resume();
            *state = PreviewState::Playing;
        }
    }

    /// Seek the audio engine. Seeking always resumes playback.
    pub async fn seek(&self, t: f64) -> Result<()> {
        {
            let state = self.state.read().await;
            if *state != PreviewState::Playing && *state != PreviewState::Paused {
                return Err(Error::playback("cannot seek: preview not running"));
            }
        }
        self.engine.seek(t)?;
        let mut state = self.state.write().await;
        *state = PreviewState::Playing;
        Ok(())
    }

    /// Stop the session and wait for the tick tasks to wind down.
    pub async fn stop(&self) {
        {
            let mut state = self.state.write().await;
            if *state == PreviewState::Stopped {
                return;
            }
            *state = PreviewState::Stopped;
        }
        self.engine.stop();

        let mut tasks = self.tasks.lock().await;
        for task in tasks.drain(..) {
            let _ = task.await;
        }
        tracing::info!("preview stopped");
    }

    fn spawn_frame_task(&self) -> JoinHandle<()> {
        let engine = self.engine.clone();
        let sink = self.sink.clone();
        let data = self.data.clone();
        let state = self.state.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(FRAME_TICK);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                match *state.read().await {
                    PreviewState::Stopped => break,
                    PreviewState::Idle | PreviewState::Paused => continue,
                    PreviewState::Playing => {}
                }

                // Natural end of audio stops the whole session.
                if engine.is_finished() {
                    let mut state = state.write().await;
                    if *state != PreviewState::Stopped {
                        *state = PreviewState::Stopped;
                        engine.stop();
                        sink.on_finished();
                    }
                    break;
                }

                let t = engine.position_secs();
                let frame = data.composer().frame_at(t);
                sink.on_frame(frame);
            }
        })
    }

    fn spawn_caption_task(&self) -> JoinHandle<()> {
        let engine = self.engine.clone();
        let sink = self.sink.clone();
        let data = self.data.clone();
        let state = self.state.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CAPTION_TICK);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let mut last = String::new();
            loop {
                interval.tick().await;
                match *state.read().await {
                    PreviewState::Stopped => break,
                    PreviewState::Idle | PreviewState::Paused => continue,
                    PreviewState::Playing => {}
                }

                let caption = data.track.resolve(engine.position_secs());
                // Suppress redundant caption redraws.
                if caption != last {
                    last = caption.to_string();
                    sink.on_caption(caption);
                }
            }
        })
    }

    fn spawn_position_task(&self) -> JoinHandle<()> {
        let engine = self.engine.clone();
        let sink = self.sink.clone();
        let data = self.data.clone();
        let state = self.state.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(POSITION_TICK);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                match *state.read().await {
                    PreviewState::Stopped => break,
                    PreviewState::Idle | PreviewState::Paused => continue,
                    PreviewState::Playing => {}
                }

                let duration = data.buffer.duration_secs();
                if duration > 0.0 {
                    let percent = (engine.position_secs() / duration * 100.0).clamp(0.0, 100.0);
                    sink.on_position(percent);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcribe::{TranscriptSegment, Word};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    /// Playback engine driven by the (test-controlled) tokio clock.
    struct ClockEngine {
        started_at: StdMutex<Option<tokio::time::Instant>>,
        duration: f64,
    }

    impl ClockEngine {
        fn new(duration: f64) -> Self {
            Self {
                started_at: StdMutex::new(None),
                duration,
            }
        }
    }

    impl PlaybackEngine for ClockEngine {
        fn start(&self) -> Result<()> {
            *self.started_at.lock().unwrap() = Some(tokio::time::Instant::now());
            Ok(())
        }
        fn pause(&self) {}
        fn resume(&self) {}
        fn stop(&self) {}
        fn seek(&self, _t: f64) -> Result<()> {
            Ok(())
        }
        fn position_secs(&self) -> f64 {
            self.started_at
                .lock()
                .unwrap()
                .map(|at| at.elapsed().as_secs_f64())
                .unwrap_or(0.0)
        }
        fn is_finished(&self) -> bool {
            self.position_secs() >= self.duration
        }
    }

    #[derive(Default)]
    struct CollectingSink {
        frames: AtomicUsize,
        captions: StdMutex<Vec<String>>,
        positions: StdMutex<Vec<f64>>,
        finished: AtomicBool,
    }

    impl PreviewSink for CollectingSink {
        fn on_frame(&self, _frame: Frame) {
            self.frames.fetch_add(1, Ordering::Relaxed);
        }
        fn on_caption(&self, text: &str) {
            self.captions.lock().unwrap().push(text.to_string());
        }
        fn on_position(&self, percent: f64) {
            self.positions.lock().unwrap().push(percent);
        }
        fn on_finished(&self) {
            self.finished.store(true, Ordering::Relaxed);
        }
    }

    fn session_data(duration_secs: usize, track: CaptionTrack) -> SessionData {
        SessionData {
            buffer: AmplitudeBuffer::from_raw(vec![0.5; duration_secs * 100], 100),
            track,
            config: RenderConfig::default(),
            font: None,
        }
    }

    fn caption_track() -> CaptionTrack {
        CaptionTrack::from_transcript(
            &[TranscriptSegment {
                words: vec![
                    Word {
                        word: "hello".into(),
                        start: 0.0,
                        end: 1.0,
                    },
                    Word {
                        word: "world".into(),
                        start: 1.0,
                        end: 2.0,
                    },
                ],
            }],
            10,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn session_emits_frames_captions_and_positions() {
        let sink = Arc::new(CollectingSink::default());
        let session = PreviewSession::new(
            session_data(60, caption_track()),
            Arc::new(ClockEngine::new(60.0)),
            sink.clone(),
        );

        session.start().await.unwrap();
        assert_eq!(session.state().await, PreviewState::Playing);

        tokio::time::sleep(Duration::from_millis(500)).await;
        session.stop().await;

        assert_eq!(session.state().await, PreviewState::Stopped);
        assert!(sink.frames.load(Ordering::Relaxed) >= 10);
        // Caption resolved once and never re-emitted while unchanged.
        assert_eq!(sink.captions.lock().unwrap().as_slice(), ["hello world"]);
        let positions = sink.positions.lock().unwrap();
        assert!(!positions.is_empty());
        assert!(positions.iter().all(|p| (0.0..=100.0).contains(p)));
    }

    #[tokio::test(start_paused = true)]
    async fn end_of_audio_stops_the_session() {
        let sink = Arc::new(CollectingSink::default());
        let session = PreviewSession::new(
            session_data(1, CaptionTrack::default()),
            Arc::new(ClockEngine::new(1.0)),
            sink.clone(),
        );

        session.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(session.state().await, PreviewState::Stopped);
        assert!(sink.finished.load(Ordering::Relaxed));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_freezes_output_and_resume_continues() {
        let sink = Arc::new(CollectingSink::default());
        let session = PreviewSession::new(
            session_data(60, CaptionTrack::default()),
            Arc::new(ClockEngine::new(60.0)),
            sink.clone(),
        );

        session.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        session.pause().await;
        assert_eq!(session.state().await, PreviewState::Paused);

        let frames_at_pause = sink.frames.load(Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(sink.frames.load(Ordering::Relaxed), frames_at_pause);

        session.resume().await;
        assert_eq!(session.state().await, PreviewState::Playing);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(sink.frames.load(Ordering::Relaxed) > frames_at_pause);

        session.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn seek_resets_pause_to_playing() {
        let sink = Arc::new(CollectingSink::default());
        let session = PreviewSession::new(
            session_data(60, CaptionTrack::default()),
            Arc::new(ClockEngine::new(60.0)),
            sink,
        );

        session.start().await.unwrap();
        session.pause().await;
        session.seek(10.0).await.unwrap();
        assert_eq!(session.state().await, PreviewState::Playing);
        session.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn start_twice_is_an_error() {
        let sink = Arc::new(CollectingSink::default());
        let session = PreviewSession::new(
            session_data(60, CaptionTrack::default()),
            Arc::new(ClockEngine::new(60.0)),
            sink,
        );

        session.start().await.unwrap();
        let err = session.start().await.unwrap_err();
        assert!(matches!(err, Error::Playback(_)));
        session.stop().await;
    }
}
