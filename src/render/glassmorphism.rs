use crate::config::EditStyle;
use crate::llm::Script;
use crate::render::{
    wrap_words, BoxLayer, Canvas, FrameRenderer, Layout, LogoPlacement, RendererKind, TextLayer,
};

const CARD_WIDTH: u32 = 980;
const CARD_HEIGHT: u32 = 1200;
const CARD_PADDING_TOP: u32 = 100;
const LOGO_MARGIN: u32 = 50;
const PARAGRAPH_GAP: u32 = 50;
const FADE_SECONDS: f64 = 0.5;

/// Semi-transparent card centred on the footage, hook above revelation.
pub struct GlassmorphismRenderer;

impl FrameRenderer for GlassmorphismRenderer {
    fn kind(&self) -> RendererKind {
        RendererKind::Glassmorphism
    }

    fn layout(&self, script: &Script, style: &EditStyle, canvas: &Canvas) -> Layout {
        let card_width = CARD_WIDTH.min(canvas.width);
        let card_height = CARD_HEIGHT.min(canvas.height);
        let card_x = (canvas.width - card_width) / 2;
        let card_y = (canvas.height - card_height) / 2;
        let text_width = f64::from(card_width) * 0.9;

        let mut texts = Vec::new();
        let mut cursor = card_y + CARD_PADDING_TOP;
        cursor = push_paragraph(
            &mut texts,
            &script.hook.to_uppercase(),
            &style.font_hook,
            style.font_size_hook,
            &style.text_color,
            text_width,
            cursor,
        );
        push_paragraph(
            &mut texts,
            &script.revelation,
            &style.font_revelation,
            style.font_size_revelation,
            &style.text_color,
            text_width,
            cursor + PARAGRAPH_GAP,
        );

        Layout {
            boxes: vec![BoxLayer {
                x: card_x,
                y: card_y,
                width: card_width,
                height: card_height,
                color: style.card_color.clone().unwrap_or_else(|| "#000000".to_string()),
                opacity: style.card_opacity.unwrap_or(0.3),
            }],
            texts,
            logo: Some(LogoPlacement {
                x: "(W-w)/2".to_string(),
                y: format!("{}-h", card_y + card_height - LOGO_MARGIN),
                window: None,
            }),
            fade: Some(FADE_SECONDS),
        }
    }
}

/// Adds one centred line per wrapped row and returns the y below the block.
fn push_paragraph(
    texts: &mut Vec<TextLayer>,
    text: &str,
    font: &str,
    size: u32,
    color: &str,
    text_width: f64,
    top: u32,
) -> u32 {
    let max_chars = (text_width / (f64::from(size) * 0.55)).floor().max(1.0) as usize;
    let line_height = (f64::from(size) * 1.25).round() as u32;
    let mut y = top;
    for line in wrap_words(text, max_chars) {
        texts.push(TextLayer {
            text: line,
            font: font.to_string(),
            size,
            color: color.to_string(),
            x: "(w-text_w)/2".to_string(),
            y: y.to_string(),
            window: None,
        });
        y += line_height;
    }
    y
}
