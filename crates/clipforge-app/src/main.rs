//! Clipforge - headless project renderer
//!
//! Loads a project file, renders a frame range through the compositor and
//! writes raw RGBA frames suitable for `ffmpeg -f rawvideo`.

use anyhow::{bail, Context, Result};
use clipforge_core::{Color, FrameBuffer, FrameRate, SharedFrameBuffer};
use clipforge_playback::SessionConfig;
use clipforge_render::{
    export_frames, transition_filters, BoxOverlayRenderer, CompositorConfig, ExportCancel,
    ExportRequest, FrameCompositor, FrameSink, MediaSource,
};
use clipforge_timeline::{MediaRef, ProjectFile};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const USAGE: &str = "usage: clipforge <project.json> <out.rgba> [--fps N] [--start S] [--end E] [--config session.json]";

struct Args {
    project: PathBuf,
    output: PathBuf,
    fps: Option<u32>,
    start: f64,
    end: Option<f64>,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut positional = Vec::new();
    let mut fps = None;
    let mut start = 0.0;
    let mut end = None;
    let mut config = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        let mut value = |flag: &str| args.next().with_context(|| format!("{flag} needs a value"));
        match arg.as_str() {
            "--fps" => fps = Some(value("--fps")?.parse().context("--fps must be an integer")?),
            "--start" => start = value("--start")?.parse().context("--start must be a number")?,
            "--end" => end = Some(value("--end")?.parse().context("--end must be a number")?),
            "--config" => config = Some(PathBuf::from(value("--config")?)),
            "-h" | "--help" => bail!(USAGE),
            _ => positional.push(PathBuf::from(arg)),
        }
    }

    let [project, output] = <[PathBuf; 2]>::try_from(positional).map_err(|_| anyhow::anyhow!(USAGE))?;
    Ok(Args {
        project,
        output,
        fps,
        start,
        end,
        config,
    })
}

/// Media stand-in: `#rrggbb` sources render as solid color, anything else
/// as color bars.
struct ColorBarsSource {
    width: u32,
    height: u32,
}

impl MediaSource for ColorBarsSource {
    fn sample(&self, source: &MediaRef, _local_time: f64) -> Option<SharedFrameBuffer> {
        let frame = match Color::from_hex(source.as_str()) {
            Ok(color) => FrameBuffer::filled(self.width, self.height, color),
            Err(_) => FrameBuffer::test_pattern(self.width, self.height),
        };
        Some(Arc::new(frame))
    }
}

/// Writes frames back to back as raw RGBA.
struct RawVideoSink {
    out: BufWriter<File>,
    bytes: u64,
}

impl FrameSink for RawVideoSink {
    fn write_frame(&mut self, _index: usize, _time: f64, frame: &FrameBuffer) -> std::io::Result<()> {
        self.out.write_all(frame.data())?;
        self.bytes += frame.data().len() as u64;
        Ok(())
    }

    fn finish(&mut self) -> std::io::Result<()> {
        self.out.flush()
    }
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = parse_args()?;

    let config = match &args.config {
        Some(path) => {
            let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            SessionConfig::from_json(&data)?
        }
        None => SessionConfig::default(),
    };

    let data = std::fs::read(&args.project)
        .with_context(|| format!("reading {}", args.project.display()))?;
    let project = ProjectFile::from_json(&data)?.project;
    info!(name = %project.name, duration = project.duration(), "project loaded");

    let settings = &project.settings;
    let compositor_config = CompositorConfig {
        width: settings.width,
        height: settings.height,
        background: settings.background_color,
        ..config.compositor
    };
    let media = ColorBarsSource {
        width: settings.width,
        height: settings.height,
    };
    let mut compositor = FrameCompositor::new(
        compositor_config,
        config.cache,
        Box::new(media),
        Box::new(BoxOverlayRenderer),
    );

    let frame_rate = args.fps.map(FrameRate::fps).unwrap_or_else(|| settings.frame_rate());
    let end = args.end.unwrap_or_else(|| project.duration());
    let request = ExportRequest::new(args.start, end, frame_rate);
    if request.total_frames() == 0 {
        warn!(start = args.start, end, "nothing to render");
        return Ok(());
    }

    for (clip, filter) in transition_filters(&project.timeline) {
        info!(%clip, %filter, "transition");
    }

    let file = File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    let mut sink = RawVideoSink {
        out: BufWriter::new(file),
        bytes: 0,
    };
    let summary = export_frames(
        &mut compositor,
        &project.timeline,
        &request,
        &mut sink,
        |p| {
            if p.frames_done % 30 == 0 || p.frames_done == p.total_frames {
                info!(
                    done = p.frames_done,
                    total = p.total_frames,
                    percent = (p.fraction() * 100.0).round(),
                    "rendering"
                );
            }
        },
        &ExportCancel::new(),
    )?;

    info!(
        frames = summary.frames,
        bytes = sink.bytes,
        elapsed = summary.elapsed_secs,
        "export complete; encode with: ffmpeg {}",
        request.ffmpeg_input_args(summary.width, summary.height).join(" ")
    );
    Ok(())
}
