use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::ReelConfig;
use crate::error::{EngineError, Result, Stage};
use crate::render::{
    BoxLayer, Canvas, ComposeRequest, Layout, LogoPlacement, RendererRegistry, TextLayer,
    TimeWindow, VideoComposer,
};

/// Composes reels by driving the `ffmpeg` binary.
///
/// Text is passed to drawtext through scratch files next to the output, so
/// script content never needs filtergraph escaping.
pub struct FfmpegComposer {
    registry: RendererRegistry,
    reel: ReelConfig,
    logo_path: PathBuf,
}

impl FfmpegComposer {
    pub fn new(registry: RendererRegistry, reel: ReelConfig, logo_path: PathBuf) -> Self {
        Self {
            registry,
            reel,
            logo_path,
        }
    }

    async fn probe_duration(&self, input: &Path) -> Option<f64> {
        let output = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(input)
            .output()
            .await
            .ok()?;
        if !output.status.success() {
            return None;
        }
        String::from_utf8_lossy(&output.stdout).trim().parse::<f64>().ok()
    }
}

#[async_trait]
impl VideoComposer for FfmpegComposer {
    async fn compose(&self, request: ComposeRequest<'_>) -> Result<PathBuf> {
        let renderer = self.registry.get(request.style.renderer)?;

        let source_duration = self.probe_duration(request.video).await;
        if source_duration.is_none() {
            warn!("Could not probe {}, assuming full reel length", request.video.display());
        }
        let duration = source_duration
            .unwrap_or(self.reel.duration_seconds)
            .min(self.reel.duration_seconds);
        let canvas = Canvas {
            width: self.reel.width,
            height: self.reel.height,
            duration,
        };
        let layout = renderer.layout(request.script, request.style, &canvas);

        let scratch = request.output.with_extension("layers");
        tokio::fs::create_dir_all(&scratch).await?;
        let mut text_files = Vec::with_capacity(layout.texts.len());
        for (index, layer) in layout.texts.iter().enumerate() {
            let path = scratch.join(format!("text_{:03}.txt", index));
            tokio::fs::write(&path, &layer.text).await?;
            text_files.push(path);
        }

        let logo = if layout.logo.is_some() && self.logo_path.exists() {
            Some(self.reel.logo_width)
        } else {
            if layout.logo.is_some() {
                debug!("Logo {} not found, rendering without it", self.logo_path.display());
            }
            None
        };
        let graph = build_filter_graph(&layout, &canvas, &text_files, logo, self.reel.music_volume);
        debug!("Filter graph: {}", graph);

        info!(
            "Rendering {} with '{}' ({:.1}s)",
            request.output.display(),
            renderer.kind().label(),
            duration
        );
        let mut command = Command::new("ffmpeg");
        command
            .arg("-y")
            .arg("-i")
            .arg(request.video)
            .arg("-i")
            .arg(request.music);
        if logo.is_some() {
            command.args(["-loop", "1", "-i"]).arg(&self.logo_path);
        }
        command
            .arg("-filter_complex")
            .arg(&graph)
            .args(["-map", "[vout]", "-map", "[aout]"])
            .arg("-t")
            .arg(format!("{:.3}", duration))
            .args(["-r", "30", "-c:v", "libx264", "-pix_fmt", "yuv420p", "-c:a", "aac"])
            .arg(request.output);

        let result = command.output().await;
        if let Err(err) = tokio::fs::remove_dir_all(&scratch).await {
            debug!("Could not remove {}: {}", scratch.display(), err);
        }

        let output = result.map_err(|err| {
            EngineError::unavailable(Stage::Render, format!("failed to launch ffmpeg: {}", err))
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: String = stderr.lines().rev().take(5).collect::<Vec<_>>().join(" | ");
            return Err(EngineError::unavailable(
                Stage::Render,
                format!("ffmpeg exited with {}: {}", output.status, tail),
            ));
        }
        Ok(request.output.to_path_buf())
    }
}

/// Full `-filter_complex` graph. Input 0 is the footage, input 1 the music and
/// input 2 the logo when `logo_width` is set. Outputs `[vout]` and `[aout]`.
pub fn build_filter_graph(
    layout: &Layout,
    canvas: &Canvas,
    text_files: &[PathBuf],
    logo_width: Option<u32>,
    music_volume: f64,
) -> String {
    let mut video = vec![
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=increase",
            w = canvas.width,
            h = canvas.height
        ),
        format!("crop={}:{}", canvas.width, canvas.height),
        "setsar=1".to_string(),
        format!("trim=duration={:.3}", canvas.duration),
        "setpts=PTS-STARTPTS".to_string(),
    ];
    video.extend(layout.boxes.iter().map(drawbox));
    video.extend(
        layout
            .texts
            .iter()
            .zip(text_files)
            .map(|(layer, file)| drawtext(layer, file)),
    );
    if let Some(fade) = layout.fade {
        video.push(format!("fade=t=in:st=0:d={}", fade));
        video.push(format!(
            "fade=t=out:st={:.3}:d={}",
            (canvas.duration - fade).max(0.0),
            fade
        ));
    }

    let mut graph = Vec::new();
    match (logo_width, layout.logo.as_ref()) {
        (Some(width), Some(placement)) => {
            graph.push(format!("[0:v]{}[base]", video.join(",")));
            graph.push(format!("[2:v]{}[logo]", logo_chain(width, placement)));
            graph.push(format!("[base][logo]{}[vout]", overlay(placement)));
        }
        _ => graph.push(format!("[0:v]{}[vout]", video.join(","))),
    }
    graph.push(format!(
        "[1:a]volume={},atrim=duration={:.3},asetpts=PTS-STARTPTS[aout]",
        music_volume, canvas.duration
    ));
    graph.join(";")
}

fn drawbox(layer: &BoxLayer) -> String {
    format!(
        "drawbox=x={}:y={}:w={}:h={}:color={}@{:.2}:t=fill",
        layer.x, layer.y, layer.width, layer.height, layer.color, layer.opacity
    )
}

fn drawtext(layer: &TextLayer, text_file: &Path) -> String {
    let mut filter = format!(
        "drawtext=fontfile='{}':textfile='{}':expansion=none:fontsize={}:fontcolor={}:x={}:y={}",
        escape_path(Path::new(&layer.font)),
        escape_path(text_file),
        layer.size,
        layer.color,
        layer.x,
        layer.y
    );
    if let Some(window) = layer.window {
        filter.push_str(&format!(":enable='{}'", enable_expr(&window)));
        filter.push_str(&format!(":alpha='{}'", alpha_expr(&window)));
    }
    filter
}

fn logo_chain(width: u32, placement: &LogoPlacement) -> String {
    let mut chain = format!("scale={}:-1,format=rgba", width);
    if let Some(window) = placement.window {
        if window.fade_in > 0.0 {
            chain.push_str(&format!(
                ",fade=t=in:st={:.3}:d={}:alpha=1",
                window.start, window.fade_in
            ));
        }
    }
    chain
}

fn overlay(placement: &LogoPlacement) -> String {
    let mut filter = format!("overlay=x={}:y={}", placement.x, placement.y);
    if let Some(window) = placement.window {
        filter.push_str(&format!(":enable='{}'", enable_expr(&window)));
    }
    filter
}

fn enable_expr(window: &TimeWindow) -> String {
    format!("between(t,{:.3},{:.3})", window.start, window.end)
}

fn alpha_expr(window: &TimeWindow) -> String {
    let rise = if window.fade_in > 0.0 {
        format!("(t-{:.3})/{}", window.start, window.fade_in)
    } else {
        "1".to_string()
    };
    let fall = if window.fade_out > 0.0 {
        format!("({:.3}-t)/{}", window.end, window.fade_out)
    } else {
        "1".to_string()
    };
    format!(
        "if(lt(t,{:.3}),{},if(gt(t,{:.3}),{},1))",
        window.start + window.fade_in,
        rise,
        window.end - window.fade_out,
        fall
    )
}

fn escape_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace(':', "\\:")
        .replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> Canvas {
        Canvas {
            width: 1080,
            height: 1920,
            duration: 12.0,
        }
    }

    #[test]
    fn graph_without_logo_routes_base_to_output() {
        let layout = Layout::default();
        let graph = build_filter_graph(&layout, &canvas(), &[], None, 0.4);
        assert!(graph.starts_with("[0:v]scale=1080:1920:force_original_aspect_ratio=increase,crop=1080:1920"));
        assert!(graph.contains("[vout]"));
        assert!(graph.contains("[1:a]volume=0.4,atrim=duration=12.000"));
        assert!(!graph.contains("[2:v]"));
    }

    #[test]
    fn timed_text_gets_enable_and_alpha() {
        let layout = Layout {
            texts: vec![TextLayer {
                text: "HELLO".to_string(),
                font: "fonts/a.ttf".to_string(),
                size: 120,
                color: "#FFFFFF".to_string(),
                x: "(w-text_w)/2".to_string(),
                y: "(h-text_h)/2".to_string(),
                window: Some(TimeWindow {
                    start: 0.5,
                    end: 3.0,
                    fade_in: 0.2,
                    fade_out: 0.2,
                }),
            }],
            ..Layout::default()
        };
        let files = vec![PathBuf::from("/tmp/reel/text_000.txt")];
        let graph = build_filter_graph(&layout, &canvas(), &files, None, 0.4);
        assert!(graph.contains("textfile='/tmp/reel/text_000.txt'"));
        assert!(graph.contains(":enable='between(t,0.500,3.000)'"));
        assert!(graph.contains(":alpha='if(lt(t,0.700),(t-0.500)/0.2,if(gt(t,2.800),(3.000-t)/0.2,1))'"));
    }

    #[test]
    fn logo_is_overlaid_when_present() {
        let layout = Layout {
            logo: Some(LogoPlacement {
                x: "(W-w)/2".to_string(),
                y: "H-h".to_string(),
                window: None,
            }),
            fade: Some(0.5),
            ..Layout::default()
        };
        let graph = build_filter_graph(&layout, &canvas(), &[], Some(280), 0.4);
        assert!(graph.contains("[2:v]scale=280:-1,format=rgba[logo]"));
        assert!(graph.contains("[base][logo]overlay=x=(W-w)/2:y=H-h[vout]"));
        assert!(graph.contains("fade=t=out:st=11.500:d=0.5"));
    }

    #[test]
    fn paths_are_escaped_for_filter_options() {
        assert_eq!(escape_path(Path::new("C:\\fonts\\it's.ttf")), "C\\:/fonts/it\\'s.ttf");
    }
}
