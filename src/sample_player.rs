// src/sample_player.rs
use crate::config;
use anyhow::Result;
use rodio::buffer::SamplesBuffer;
use rodio::source::Source;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Opaque handle to a decoded, in-memory sample resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResourceHandle(u64);

impl ResourceHandle {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Opaque handle to one concurrently-sounding playback of a resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlaybackHandle(u64);

impl PlaybackHandle {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Playback backend consumed by the voice engine. The engine never sees the
/// concrete shape of the audio library, only these handles.
///
/// All methods are no-ops (or `None`) for unknown handles; the engine relies
/// on that to keep its teardown paths idempotent.
pub trait SamplePlayer {
    /// Resolves and decodes `key` ("folder/file"). `None` means the sample
    /// is missing or undecodable; playback degrades to silence.
    fn load(&mut self, key: &str) -> Option<ResourceHandle>;
    fn play(&mut self, resource: ResourceHandle) -> Option<PlaybackHandle>;
    fn gain(&self, playback: PlaybackHandle) -> Option<f32>;
    fn set_gain(&mut self, playback: PlaybackHandle, gain: f32);
    fn fade_gain(&mut self, playback: PlaybackHandle, from: f32, to: f32, duration: Duration);
    fn stop(&mut self, playback: PlaybackHandle);
    fn unload(&mut self, resource: ResourceHandle);
    /// Advances in-flight fades. Called once per frame.
    fn tick(&mut self, _now: Instant) {}
    /// Drains the set of playbacks that reached their natural end since the
    /// last call.
    fn take_ended(&mut self) -> Vec<PlaybackHandle> {
        Vec::new()
    }
}

/// A decoded sample held in memory, shareable across playbacks.
struct LoadedSample {
    channels: u16,
    sample_rate: u32,
    data: Arc<Vec<i16>>,
}

struct Fade {
    from: f32,
    to: f32,
    start: Instant,
    duration: Duration,
}

struct ActiveSink {
    sink: Sink,
    fade: Option<Fade>,
}

/// rodio-backed [`SamplePlayer`]: one shared output stream, one `Sink` per
/// playback handle, gain fades advanced per frame on the UI thread.
pub struct RodioPlayer {
    // Must stay alive for the duration of the session or all sinks go silent.
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    resources: HashMap<ResourceHandle, LoadedSample>,
    sinks: HashMap<PlaybackHandle, ActiveSink>,
    next_resource_id: u64,
    next_playback_id: u64,
}

impl RodioPlayer {
    pub fn new() -> Result<Self> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| anyhow::anyhow!("No default audio output device: {}", e))?;
        Ok(Self {
            _stream: stream,
            stream_handle,
            resources: HashMap::new(),
            sinks: HashMap::new(),
            next_resource_id: 0,
            next_playback_id: 0,
        })
    }

    fn decode(key: &str) -> Result<LoadedSample> {
        let path = config::SAMPLES_DIR.join(format!("{}.mp3", key));
        let file = BufReader::new(File::open(&path)?);
        let source = Decoder::new(file)?;

        let channels = source.channels();
        let sample_rate = source.sample_rate();
        let data: Vec<i16> = source.collect();

        Ok(LoadedSample {
            channels,
            sample_rate,
            data: Arc::new(data),
        })
    }
}

impl SamplePlayer for RodioPlayer {
    fn load(&mut self, key: &str) -> Option<ResourceHandle> {
        match Self::decode(key) {
            Ok(sample) => {
                let handle = ResourceHandle::new(self.next_resource_id);
                self.next_resource_id += 1;
                self.resources.insert(handle, sample);
                Some(handle)
            }
            Err(e) => {
                eprintln!("Failed to load sample {}: {}", key, e);
                None
            }
        }
    }

    fn play(&mut self, resource: ResourceHandle) -> Option<PlaybackHandle> {
        let sample = self.resources.get(&resource)?;
        let sink = match Sink::try_new(&self.stream_handle) {
            Ok(sink) => sink,
            Err(e) => {
                eprintln!("Failed to open playback sink: {}", e);
                return None;
            }
        };
        sink.append(SamplesBuffer::new(
            sample.channels,
            sample.sample_rate,
            sample.data.as_ref().clone(),
        ));

        let handle = PlaybackHandle::new(self.next_playback_id);
        self.next_playback_id += 1;
        self.sinks.insert(handle, ActiveSink { sink, fade: None });
        Some(handle)
    }

    fn gain(&self, playback: PlaybackHandle) -> Option<f32> {
        self.sinks.get(&playback).map(|entry| entry.sink.volume())
    }

    fn set_gain(&mut self, playback: PlaybackHandle, gain: f32) {
        if let Some(entry) = self.sinks.get_mut(&playback) {
            entry.fade = None;
            entry.sink.set_volume(gain.clamp(0.0, 1.0));
        }
    }

    fn fade_gain(&mut self, playback: PlaybackHandle, from: f32, to: f32, duration: Duration) {
        if let Some(entry) = self.sinks.get_mut(&playback) {
            entry.sink.set_volume(from.clamp(0.0, 1.0));
            entry.fade = Some(Fade {
                from,
                to,
                start: Instant::now(),
                duration,
            });
        }
    }

    fn stop(&mut self, playback: PlaybackHandle) {
        if let Some(entry) = self.sinks.remove(&playback) {
            entry.sink.stop();
        }
    }

    fn unload(&mut self, resource: ResourceHandle) {
        self.resources.remove(&resource);
    }

    fn tick(&mut self, now: Instant) {
        for entry in self.sinks.values_mut() {
            if let Some(fade) = &entry.fade {
                let elapsed = now.saturating_duration_since(fade.start);
                let t = if fade.duration.is_zero() {
                    1.0
                } else {
                    (elapsed.as_secs_f32() / fade.duration.as_secs_f32()).min(1.0)
                };
                let gain = fade.from + (fade.to - fade.from) * t;
                entry.sink.set_volume(gain.clamp(0.0, 1.0));
                if t >= 1.0 {
                    entry.fade = None;
                }
            }
        }
    }

    fn take_ended(&mut self) -> Vec<PlaybackHandle> {
        let ended: Vec<PlaybackHandle> = self
            .sinks
            .iter()
            .filter(|(_, entry)| entry.sink.empty())
            .map(|(handle, _)| *handle)
            .collect();
        for handle in &ended {
            self.sinks.remove(handle);
        }
        ended
    }
}
