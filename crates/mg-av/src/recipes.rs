//! ffmpeg argument lists for each gateway operation.
//!
//! Every path is a separate list element. Nothing here quotes or escapes,
//! because nothing here is ever interpreted by a shell.

use std::path::{Path, PathBuf};

use mg_core::config::ConversionConfig;

fn path_arg(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

/// Outputs are positional, so one starting with `-` would parse as an option.
fn output_arg(p: &Path) -> String {
    let arg = path_arg(p);
    if arg.starts_with('-') {
        format!("./{arg}")
    } else {
        arg
    }
}

/// `-hide_banner -nostdin [-y] -i <input>`
fn input_prelude(input: &Path, overwrite: bool) -> Vec<String> {
    let mut args = vec!["-hide_banner".to_string(), "-nostdin".to_string()];
    if overwrite {
        args.push("-y".into());
    }
    args.push("-i".into());
    args.push(path_arg(input));
    args
}

fn codec_args(args: &mut Vec<String>, config: &ConversionConfig) {
    args.extend([
        "-c:v".to_string(),
        config.video_codec.clone(),
        "-c:a".to_string(),
        config.audio_codec.clone(),
    ]);
}

/// Force a keyframe at every segment boundary so segments come out at the
/// requested length.
fn keyframe_args(args: &mut Vec<String>, segment_duration: u32) {
    args.push("-force_key_frames".into());
    args.push(format!("expr:gte(t,n_forced*{segment_duration})"));
}

/// Single-file MP4 with the moov atom relocated to the front.
pub fn mp4(input: &Path, output: &Path, config: &ConversionConfig) -> Vec<String> {
    let mut args = input_prelude(input, true);
    codec_args(&mut args, config);
    args.extend(["-movflags".to_string(), "+faststart".to_string()]);
    args.push(output_arg(output));
    args
}

/// Information probe: open the input, declare no output.
///
/// ffmpeg exits non-zero ("At least one output file must be specified") but
/// has already printed the container and stream summary.
pub fn probe(input: &Path) -> Vec<String> {
    input_prelude(input, false)
}

/// Paths produced by an HLS run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HlsLayout {
    pub manifest: PathBuf,
    /// Segment filename template as the muxer reads it: `%` in the
    /// directory part is doubled so only the pattern's placeholder expands.
    pub segment_template: PathBuf,
}

impl HlsLayout {
    pub fn new(output_dir: &Path, config: &ConversionConfig) -> Self {
        let template_dir = PathBuf::from(path_arg(output_dir).replace('%', "%%"));
        Self {
            manifest: output_dir.join(&config.manifest_name),
            segment_template: template_dir.join(&config.segment_pattern),
        }
    }
}

/// HLS: fixed-length segments, unbounded playlist, numbered segment files.
pub fn hls(
    input: &Path,
    layout: &HlsLayout,
    segment_duration: u32,
    config: &ConversionConfig,
) -> Vec<String> {
    let mut args = input_prelude(input, true);
    codec_args(&mut args, config);
    keyframe_args(&mut args, segment_duration);
    args.extend([
        "-f".to_string(),
        "hls".to_string(),
        "-hls_time".to_string(),
        segment_duration.to_string(),
        "-hls_list_size".to_string(),
        "0".to_string(),
        "-hls_segment_filename".to_string(),
        output_arg(&layout.segment_template),
    ]);
    args.push(output_arg(&layout.manifest));
    args
}

/// Fragmented MP4: a fragment per keyframe, an empty leading moov,
/// self-contained fragment headers, fragments capped at
/// `segment_duration`, timestamps shifted to start at zero.
pub fn fragmented_mp4(
    input: &Path,
    output: &Path,
    segment_duration: u32,
    config: &ConversionConfig,
) -> Vec<String> {
    let mut args = input_prelude(input, true);
    codec_args(&mut args, config);
    keyframe_args(&mut args, segment_duration);
    args.extend([
        "-movflags".to_string(),
        "frag_keyframe+empty_moov+default_base_moof".to_string(),
        "-frag_duration".to_string(),
        (u64::from(segment_duration) * 1_000_000).to_string(),
        "-avoid_negative_ts".to_string(),
        "make_zero".to_string(),
        "-f".to_string(),
        "mp4".to_string(),
    ]);
    args.push(output_arg(output));
    args
}

/// Decode-only analysis pass; output goes to the null muxer and the status
/// line carries the `time=` progress tokens.
pub fn analysis(input: &Path) -> Vec<String> {
    let mut args = input_prelude(input, false);
    args.extend(["-f".to_string(), "null".to_string(), "-".to_string()]);
    args
}
