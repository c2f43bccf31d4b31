//! Real-time audio output using cpal
//! Works with JACK, ALSA, CoreAudio, WASAPI, etc.
//!
//! cpal streams are not `Send`, so the stream lives on a dedicated audio
//! thread and the context drives it through a command channel. The
//! real-time callback only locks the shared destination mixer.

use crate::context::{AudioContext, ContextFactory, ContextState};
use crate::error::{FlypastError, Result};
use crate::graph::VoiceGraph;
use crate::mixer::{GraphHandle, Mixer};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Longest wait for the host to hand over an output stream
const OPEN_TIMEOUT: Duration = Duration::from_secs(3);

enum StreamCommand {
    Play,
    Pause,
    Close,
}

/// Context backed by the default output device
pub struct DeviceContext {
    sample_rate: f32,
    mixer: Arc<Mutex<Mixer>>,
    commands: mpsc::Sender<StreamCommand>,
    thread: Option<thread::JoinHandle<()>>,
    state: ContextState,
}

impl DeviceContext {
    /// Open the default output device. The context starts suspended.
    ///
    /// Blocks while the host sets up the stream, at most `OPEN_TIMEOUT`.
    pub fn open(master_gain: f32) -> Result<Self> {
        let (command_tx, command_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        let thread = thread::Builder::new()
            .name("flypast-audio".into())
            .spawn(move || run_stream(master_gain, command_rx, ready_tx))?;

        match ready_rx.recv_timeout(OPEN_TIMEOUT) {
            Ok(Ok((sample_rate, mixer))) => Ok(Self {
                sample_rate,
                mixer,
                commands: command_tx,
                thread: Some(thread),
                state: ContextState::Suspended,
            }),
            Ok(Err(e)) => {
                release(thread);
                Err(e)
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                // The thread exits on its own once the command sender is dropped
                Err(FlypastError::UnsupportedAudioEnvironment(format!(
                    "no output stream after {:?}",
                    OPEN_TIMEOUT
                )))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(FlypastError::UnsupportedAudioEnvironment(
                    "audio thread exited before opening a stream".into(),
                ))
            }
        }
    }

    fn send(&self, command: StreamCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| FlypastError::NotReady)
    }
}

impl AudioContext for DeviceContext {
    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn current_time(&self) -> f64 {
        self.mixer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .current_time()
    }

    fn state(&self) -> ContextState {
        self.state
    }

    fn resume(&mut self) -> Result<()> {
        if self.state == ContextState::Closed {
            return Err(FlypastError::NotReady);
        }
        self.send(StreamCommand::Play)?;
        self.state = ContextState::Running;
        Ok(())
    }

    fn suspend(&mut self) -> Result<()> {
        if self.state == ContextState::Closed {
            return Err(FlypastError::NotReady);
        }
        self.send(StreamCommand::Pause)?;
        self.state = ContextState::Suspended;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.state == ContextState::Closed {
            return Err(FlypastError::Disposal("device context already closed".into()));
        }
        self.state = ContextState::Closed;

        // The thread may already be gone if the stream failed
        let _ = self.commands.send(StreamCommand::Close);
        if let Some(thread) = self.thread.take() {
            release(thread);
        }
        self.mixer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }

    fn connect(&mut self, graph: VoiceGraph) -> Result<GraphHandle> {
        if self.state == ContextState::Closed {
            return Err(FlypastError::NotReady);
        }
        Ok(self
            .mixer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .connect(graph))
    }
}

impl Drop for DeviceContext {
    fn drop(&mut self) {
        if self.state != ContextState::Closed {
            let _ = self.close();
        }
    }
}

/// Factory opening the default output device
#[derive(Debug, Clone)]
pub struct DeviceContextFactory {
    pub master_gain: f32,
}

impl DeviceContextFactory {
    pub fn new(master_gain: f32) -> Self {
        Self { master_gain }
    }
}

impl ContextFactory for DeviceContextFactory {
    fn create(&self) -> Result<Box<dyn AudioContext>> {
        Ok(Box::new(DeviceContext::open(self.master_gain)?))
    }
}

/// Join a finished audio thread
///
/// Inside a tokio runtime the join moves to the blocking pool, so a
/// scheduler task tearing down the context never waits on the host.
fn release(thread: thread::JoinHandle<()>) {
    let join = move || {
        if thread.join().is_err() {
            warn!("Audio thread panicked during shutdown");
        }
    };
    match tokio::runtime::Handle::try_current() {
        Ok(runtime) => {
            runtime.spawn_blocking(join);
        }
        Err(_) => join(),
    }
}

type Ready = Result<(f32, Arc<Mutex<Mixer>>)>;

fn run_stream(
    master_gain: f32,
    commands: mpsc::Receiver<StreamCommand>,
    ready: mpsc::Sender<Ready>,
) {
    let (stream, sample_rate, mixer) = match open_stream(master_gain) {
        Ok(opened) => opened,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    // Some hosts start streams on creation; contexts start suspended
    if let Err(e) = stream.pause() {
        debug!("Could not pause new stream: {}", e);
    }

    if ready.send(Ok((sample_rate, mixer))).is_err() {
        return;
    }

    while let Ok(command) = commands.recv() {
        match command {
            StreamCommand::Play => {
                if let Err(e) = stream.play() {
                    error!("Failed to start audio stream: {}", e);
                }
            }
            StreamCommand::Pause => {
                if let Err(e) = stream.pause() {
                    warn!("Failed to pause audio stream: {}", e);
                }
            }
            StreamCommand::Close => break,
        }
    }

    drop(stream);
    info!("Audio stream closed");
}

fn open_stream(master_gain: f32) -> Result<(cpal::Stream, f32, Arc<Mutex<Mixer>>)> {
    // Get the default audio host (JACK/ALSA/CoreAudio/WASAPI)
    let host = cpal::default_host();
    info!("Audio host: {:?}", host.id());

    let device = host.default_output_device().ok_or_else(|| {
        FlypastError::UnsupportedAudioEnvironment("No audio output device found".into())
    })?;
    info!(
        "Audio device: {}",
        device.name().unwrap_or_else(|_| "<unnamed>".into())
    );

    let config = device
        .default_output_config()
        .map_err(|e| FlypastError::UnsupportedAudioEnvironment(e.to_string()))?;
    info!("Audio config: {:?}", config);

    let sample_rate = config.sample_rate().0 as f32;
    let channels = config.channels() as usize;
    let mixer = Arc::new(Mutex::new(Mixer::new(sample_rate, master_gain)));
    let stream_config: cpal::StreamConfig = config.config();

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => {
            build_stream::<f32>(&device, &stream_config, mixer.clone(), channels)
        }
        cpal::SampleFormat::I16 => {
            build_stream::<i16>(&device, &stream_config, mixer.clone(), channels)
        }
        cpal::SampleFormat::U16 => {
            build_stream::<u16>(&device, &stream_config, mixer.clone(), channels)
        }
        other => Err(FlypastError::UnsupportedAudioEnvironment(format!(
            "Unsupported sample format {other:?}"
        ))),
    }?;

    info!("Audio stream ready at {} Hz, {} channels", sample_rate, channels);
    Ok((stream, sample_rate, mixer))
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mixer: Arc<Mutex<Mixer>>,
    channels: usize,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let mut mixer = mixer.lock().unwrap_or_else(PoisonError::into_inner);
                mixer.process_interleaved(data, channels);
            },
            |err| error!("Audio stream error: {}", err),
            None,
        )
        .map_err(|e| FlypastError::UnsupportedAudioEnvironment(e.to_string()))
}
