pub mod ffmpeg;
pub mod glassmorphism;
pub mod kinetic;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use crate::config::EditStyle;
use crate::error::{EngineError, Result};
use crate::llm::Script;

pub use ffmpeg::FfmpegComposer;
pub use glassmorphism::GlassmorphismRenderer;
pub use kinetic::KineticRenderer;

/// Renderer named by an editing style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererKind {
    Glassmorphism,
    KineticReveal,
}

impl RendererKind {
    pub fn label(self) -> &'static str {
        match self {
            RendererKind::Glassmorphism => "glassmorphism",
            RendererKind::KineticReveal => "kinetic_reveal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub duration: f64,
}

/// Filled rectangle, `color` as `#RRGGBB`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxLayer {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub color: String,
    pub opacity: f64,
}

/// One line of text. `x`/`y` are ffmpeg drawtext expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayer {
    pub text: String,
    pub font: String,
    pub size: u32,
    pub color: String,
    pub x: String,
    pub y: String,
    pub window: Option<TimeWindow>,
}

/// Visible from `start` to `end` seconds, with linear alpha ramps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
    pub fade_in: f64,
    pub fade_out: f64,
}

/// Logo position as ffmpeg overlay expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct LogoPlacement {
    pub x: String,
    pub y: String,
    pub window: Option<TimeWindow>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    pub boxes: Vec<BoxLayer>,
    pub texts: Vec<TextLayer>,
    pub logo: Option<LogoPlacement>,
    pub fade: Option<f64>,
}

pub trait FrameRenderer: Send + Sync {
    fn kind(&self) -> RendererKind;
    fn layout(&self, script: &Script, style: &EditStyle, canvas: &Canvas) -> Layout;
}

pub struct RendererRegistry {
    renderers: HashMap<RendererKind, Box<dyn FrameRenderer>>,
}

impl RendererRegistry {
    pub fn empty() -> Self {
        Self {
            renderers: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(GlassmorphismRenderer));
        registry.register(Box::new(KineticRenderer));
        registry
    }

    pub fn register(&mut self, renderer: Box<dyn FrameRenderer>) {
        self.renderers.insert(renderer.kind(), renderer);
    }

    pub fn get(&self, kind: RendererKind) -> Result<&dyn FrameRenderer> {
        self.renderers
            .get(&kind)
            .map(|renderer| renderer.as_ref())
            .ok_or_else(|| {
                EngineError::Configuration(format!("no renderer registered for '{}'", kind.label()))
            })
    }
}

pub struct ComposeRequest<'a> {
    pub video: &'a Path,
    pub music: &'a Path,
    pub script: &'a Script,
    pub style: &'a EditStyle,
    pub output: &'a Path,
}

#[async_trait]
pub trait VideoComposer: Send + Sync {
    async fn compose(&self, request: ComposeRequest<'_>) -> Result<PathBuf>;
}

/// Greedy word wrap; a word longer than `max_chars` gets its own line.
pub fn wrap_words(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
