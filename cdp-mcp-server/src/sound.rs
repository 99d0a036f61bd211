//! Sound file inspection.
//!
//! Decodes the whole file with symphonia to report its length, layout and
//! peak amplitude. Decoding is CPU-bound and synchronous; callers on the
//! async runtime should go through `spawn_blocking`.

use cdp_mcp_common::error::Error;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use symphonia::core::{
    audio::SampleBuffer,
    codecs::{CODEC_TYPE_NULL, DecoderOptions},
    errors::Error as SymphoniaError,
    formats::FormatOptions,
    io::MediaSourceStream,
    meta::MetadataOptions,
    probe::Hint,
};
use tracing::{debug, instrument, warn};

/// Properties reported by `analyze_sound`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundInfo {
    /// Duration in seconds.
    pub duration: f64,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of channels.
    pub channels: usize,
    /// Highest absolute sample value, 1.0 = full scale.
    pub peak_amplitude: f64,
    /// Container tag (`WAV`, `AIFF`, `FLAC`, ...).
    pub format: String,
    /// Codec short name (`pcm_s16le`, `flac`, ...).
    pub subtype: String,
    /// Number of sample frames.
    pub frames: u64,
}

/// Container tag derived from the file extension.
pub fn format_tag(path: &Path) -> String {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("wav") | Some("wave") => "WAV".to_string(),
        Some("aif") | Some("aiff") | Some("aifc") => "AIFF".to_string(),
        Some("oga") | Some("ogg") => "OGG".to_string(),
        Some(other) if !other.is_empty() => other.to_ascii_uppercase(),
        _ => "UNKNOWN".to_string(),
    }
}

/// Decode `path` and collect its [`SoundInfo`].
#[instrument(level = "debug")]
pub fn analyze(path: &Path) -> Result<SoundInfo, Error> {
    let file = File::open(path)?;
    let source = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, source, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| Error::audio(format!("unrecognised sound file: {}", e)))?;
    let mut reader = probed.format;

    let track = reader
        .tracks()
        .iter()
        .find(|track| track.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::audio("no decodable audio track"))?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    let sample_rate = params
        .sample_rate
        .ok_or_else(|| Error::audio("sample rate missing from stream"))?;
    let subtype = symphonia::default::get_codecs()
        .get_codec(params.codec)
        .map(|descriptor| descriptor.short_name.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let mut decoder = symphonia::default::get_codecs()
        .make(&params, &DecoderOptions::default())
        .map_err(|e| Error::audio(format!("no decoder for {}: {}", subtype, e)))?;

    let mut channels = params.channels.map(|c| c.count()).unwrap_or(0);
    let mut decoded_frames: u64 = 0;
    let mut peak: f32 = 0.0;
    // (frame capacity, buffer)
    let mut buffer: Option<(u64, SampleBuffer<f32>)> = None;

    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(Error::audio(format!("reading packets: {}", e))),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(message)) => {
                warn!(reason = message, "Skipping undecodable packet");
                continue;
            }
            Err(e) => return Err(Error::audio(format!("decoding: {}", e))),
        };

        let spec = *decoded.spec();
        channels = spec.channels.count();
        decoded_frames += decoded.frames() as u64;

        let capacity = decoded.capacity() as u64;
        let reusable = buffer
            .as_ref()
            .is_some_and(|(frames, _)| *frames >= capacity);
        if !reusable {
            buffer = Some((capacity, SampleBuffer::new(capacity, spec)));
        }
        if let Some((_, samples)) = buffer.as_mut() {
            samples.copy_interleaved_ref(decoded);
            peak = samples.samples().iter().fold(peak, |max, s| max.max(s.abs()));
        }
    }

    let frames = params.n_frames.unwrap_or(decoded_frames);
    let duration = frames as f64 / f64::from(sample_rate);
    debug!(frames, sample_rate, channels, peak, "Analyzed sound file");

    Ok(SoundInfo {
        duration,
        sample_rate,
        channels,
        peak_amplitude: f64::from(peak),
        format: format_tag(path),
        subtype,
        frames,
    })
}
