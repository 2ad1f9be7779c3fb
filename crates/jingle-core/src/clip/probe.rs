//! Clip duration probing with symphonia

use std::io::Cursor;
use std::time::Duration;

use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::store::ClipBlob;

/// File extension symphonia expects for a MIME type
fn extension_for_mime(mime: &str) -> Option<&'static str> {
    match mime.trim().to_ascii_lowercase().as_str() {
        "audio/wav" | "audio/x-wav" | "audio/wave" | "audio/vnd.wave" => Some("wav"),
        "audio/flac" | "audio/x-flac" => Some("flac"),
        "audio/mpeg" | "audio/mp3" => Some("mp3"),
        "audio/ogg" | "audio/vorbis" => Some("ogg"),
        _ => None,
    }
}

/// Read the clip length from its container headers
///
/// Returns `None` when the format is unknown or the container does not carry
/// a frame count; such clips stay "not ready" and never auto-end.
pub fn probe_duration(blob: &ClipBlob) -> Option<Duration> {
    let source = Cursor::new(blob.bytes.clone());
    let mss = MediaSourceStream::new(Box::new(source), Default::default());

    let mut hint = Hint::new();
    hint.mime_type(&blob.mime_type);
    if let Some(ext) = extension_for_mime(&blob.mime_type) {
        hint.with_extension(ext);
    }

    let probed = match symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    ) {
        Ok(probed) => probed,
        Err(e) => {
            log::warn!("probe_duration: Unrecognised clip ({}): {}", blob.mime_type, e);
            return None;
        }
    };

    let track = probed.format.default_track()?;
    let params = &track.codec_params;
    let frames = params.n_frames?;

    let duration = match (params.time_base, params.sample_rate) {
        (Some(time_base), _) => {
            let time = time_base.calc_time(frames);
            Duration::from_secs(time.seconds) + Duration::from_secs_f64(time.frac)
        }
        (None, Some(rate)) if rate > 0 => Duration::from_secs_f64(frames as f64 / rate as f64),
        _ => return None,
    };

    log::debug!("probe_duration: {} frames, {:?}", frames, duration);
    Some(duration)
}
