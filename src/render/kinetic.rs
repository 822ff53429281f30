use crate::config::EditStyle;
use crate::llm::Script;
use crate::render::{
    BoxLayer, Canvas, FrameRenderer, Layout, LogoPlacement, RendererKind, TextLayer, TimeWindow,
};

const HOOK_START: f64 = 0.5;
const HOOK_STEP: f64 = 0.3;
const HOOK_HOLD: f64 = 2.5;
const HOOK_FADE: f64 = 0.2;
const REVELATION_GAP: f64 = 0.2;
const REVELATION_STEP: f64 = 0.25;
const REVELATION_HOLD: f64 = 0.45;
const REVELATION_FADE: f64 = 0.1;
const HIGHLIGHT_MIN_CHARS: usize = 5;

/// Darkened footage with the script flashed word by word.
pub struct KineticRenderer;

impl FrameRenderer for KineticRenderer {
    fn kind(&self) -> RendererKind {
        RendererKind::KineticReveal
    }

    fn layout(&self, script: &Script, style: &EditStyle, canvas: &Canvas) -> Layout {
        let mut texts = Vec::new();
        let mut start = HOOK_START;

        for word in script.hook.to_uppercase().split_whitespace() {
            texts.push(centered_word(
                word,
                &style.font_hook,
                style.font_size_hook,
                &style.text_color,
                TimeWindow {
                    start,
                    end: start + HOOK_HOLD,
                    fade_in: HOOK_FADE,
                    fade_out: HOOK_FADE,
                },
            ));
            start += HOOK_STEP;
        }

        start += REVELATION_GAP;
        let highlight = style.highlight_color.as_deref().unwrap_or(&style.text_color);
        for word in script.revelation.split_whitespace() {
            let color = if word.chars().count() >= HIGHLIGHT_MIN_CHARS {
                highlight
            } else {
                &style.text_color
            };
            texts.push(centered_word(
                word,
                &style.font_revelation,
                style.font_size_revelation,
                color,
                TimeWindow {
                    start,
                    end: start + REVELATION_HOLD,
                    fade_in: REVELATION_FADE,
                    fade_out: 0.0,
                },
            ));
            start += REVELATION_STEP;
        }

        let logo_start = start + 0.5;
        Layout {
            boxes: vec![BoxLayer {
                x: 0,
                y: 0,
                width: canvas.width,
                height: canvas.height,
                color: "#000000".to_string(),
                opacity: style.background_opacity.unwrap_or(0.4),
            }],
            texts,
            logo: Some(LogoPlacement {
                x: "(W-w)/2".to_string(),
                y: "H-h".to_string(),
                window: Some(TimeWindow {
                    start: logo_start,
                    end: logo_start + 3.0,
                    fade_in: 0.5,
                    fade_out: 0.0,
                }),
            }),
            fade: None,
        }
    }
}

fn centered_word(word: &str, font: &str, size: u32, color: &str, window: TimeWindow) -> TextLayer {
    TextLayer {
        text: word.to_string(),
        font: font.to_string(),
        size,
        color: color.to_string(),
        x: "(w-text_w)/2".to_string(),
        y: "(h-text_h)/2".to_string(),
        window: Some(window),
    }
}
