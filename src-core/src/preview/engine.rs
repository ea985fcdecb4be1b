//! Rodio-backed playback engine.
//!
//! The cpal output stream is not `Send`, so it lives on a dedicated audio
//! thread for the lifetime of the engine; the `Sink` handle it hands back
//! is thread-safe and drives all control from the preview loop.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use rodio::{Decoder, OutputStreamBuilder, Sink};

use crate::preview::PlaybackEngine;
use crate::{Error, Result};

pub struct RodioEngine {
    sink: Sink,
    // Dropping this tells the audio thread to tear the stream down.
    _shutdown: mpsc::Sender<()>,
}

impl RodioEngine {
    /// Open the default output device and queue the audio file, paused.
    pub fn open(path: &Path) -> Result<Self> {
        let path: PathBuf = path.to_path_buf();
        let (init_tx, init_rx) = mpsc::channel::<Result<Sink>>();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        std::thread::Builder::new()
            .name("wavesub-audio".into())
            .spawn(move || {
                let stream = match OutputStreamBuilder::open_default_stream() {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = init_tx.send(Err(Error::playback(format!(
                            "cannot open audio output: {}",
                            e
                        ))));
                        return;
                    }
                };

                let sink = Sink::connect_new(stream.mixer());
                sink.pause();

                let source = File::open(&path)
                    .map_err(|e| Error::io(&path, e))
                    .and_then(|file| {
                        Decoder::new(BufReader::new(file)).map_err(|e| {
                            Error::playback(format!("cannot decode {}: {}", path.display(), e))
                        })
                    });
                match source {
                    Ok(source) => {
                        sink.append(source);
                        let _ = init_tx.send(Ok(sink));
                    }
                    Err(e) => {
                        let _ = init_tx.send(Err(e));
                        return;
                    }
                }

                // Keep the output stream alive until the engine is dropped.
                let _ = shutdown_rx.recv();
            })
            .map_err(|e| Error::playback(format!("cannot spawn audio thread: {}", e)))?;

        let sink = init_rx
            .recv()
            .map_err(|_| Error::playback("audio thread exited during setup"))??;

        Ok(Self {
            sink,
            _shutdown: shutdown_tx,
        })
    }
}

impl PlaybackEngine for RodioEngine {
    fn start(&self) -> Result<()> {
        self.sink.play();
        Ok(())
    }

    fn pause(&self) {
        self.sink.pause();
    }

    fn resume(&self) {
        self.sink.play();
    }

    fn stop(&self) {
        self.sink.stop();
    }

    fn seek(&self, t: f64) -> Result<()> {
        self.sink
            .try_seek(Duration::from_secs_f64(t.max(0.0)))
            .map_err(|e| Error::playback(format!("seek failed: {}", e)))?;
        self.sink.play();
        Ok(())
    }

    fn position_secs(&self) -> f64 {
        self.sink.get_pos().as_secs_f64()
    }

    fn is_finished(&self) -> bool {
        self.sink.empty()
    }
}

impl Drop for RodioEngine {
    fn drop(&mut self) {
        self.sink.stop();
    }
}
