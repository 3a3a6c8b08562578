//! Canvas2D renderer.
//!
//! Draws the scene onto the design's `<canvas>` element. The backing store
//! is sized in device pixels, so everything is drawn under a
//! `device_pixel_ratio` scale; zoom is applied by the host as a CSS
//! transform and never touches the bitmap.

use mocko_core::geometry::local_affine;
use mocko_core::{Bounds, NodeIndex, NodeKind, PathCmd, SceneGraph, Style, TEXT_LINE_HEIGHT, TextAlign};
use std::collections::HashMap;
use std::f64::consts::TAU;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

const SELECTION_COLOR: &str = "#3b82f6";
const DEFAULT_BACKGROUND: &str = "#ffffff";

/// Loaded `<img>` elements keyed by source URL.
pub type ImageCache = HashMap<String, HtmlImageElement>;

/// Everything a frame needs besides the scene itself.
pub struct Overlay<'a> {
    pub selected: &'a [NodeIndex],
    pub bounds: &'a HashMap<NodeIndex, Bounds>,
    pub marquee: Option<Bounds>,
}

/// Render the scene to a Canvas2D context.
pub fn render_scene(
    ctx: &CanvasRenderingContext2d,
    graph: &SceneGraph,
    canvas_width: f64,
    canvas_height: f64,
    pixel_ratio: f64,
    images: &ImageCache,
    overlay: &Overlay<'_>,
) {
    let _ = ctx.set_transform(pixel_ratio, 0.0, 0.0, pixel_ratio, 0.0, 0.0);
    ctx.clear_rect(0.0, 0.0, canvas_width, canvas_height);
    ctx.set_fill_style_str(graph.background.as_deref().unwrap_or(DEFAULT_BACKGROUND));
    ctx.fill_rect(0.0, 0.0, canvas_width, canvas_height);

    for idx in graph.top_level() {
        render_node(ctx, graph, *idx, images);
    }

    for idx in overlay.selected {
        if let Some(b) = overlay.bounds.get(idx) {
            draw_selection(ctx, b);
        }
    }
    if let Some(rect) = overlay.marquee {
        draw_marquee(ctx, &rect);
    }
}

/// Make sure every image source in the scene has an `<img>` loading.
/// Sources no longer referenced are dropped.
pub fn sync_images(graph: &SceneGraph, images: &mut ImageCache) {
    let mut live: Vec<&str> = Vec::new();
    collect_image_sources(graph, graph.root, &mut live);
    images.retain(|src, _| live.contains(&src.as_str()));
    for src in live {
        if images.contains_key(src) {
            continue;
        }
        match HtmlImageElement::new() {
            Ok(img) => {
                img.set_src(src);
                images.insert(src.to_string(), img);
            }
            Err(err) => log::warn!("cannot create image element: {err:?}"),
        }
    }
}

fn collect_image_sources<'g>(graph: &'g SceneGraph, idx: NodeIndex, out: &mut Vec<&'g str>) {
    if let NodeKind::Image { src, .. } = &graph.graph[idx].kind {
        out.push(src);
    }
    for child in graph.children(idx) {
        collect_image_sources(graph, *child, out);
    }
}

fn render_node(ctx: &CanvasRenderingContext2d, graph: &SceneGraph, idx: NodeIndex, images: &ImageCache) {
    let node = &graph.graph[idx];
    let [a, b, c, d, e, f] = local_affine(&node.transform).as_coeffs();

    ctx.save();
    let _ = ctx.transform(a, b, c, d, e, f);
    if node.style.opacity < 1.0 {
        ctx.set_global_alpha(ctx.global_alpha() * node.style.opacity.max(0.0));
    }

    let style = &node.style;
    match &node.kind {
        NodeKind::Root => {}
        NodeKind::Rect {
            width,
            height,
            rx,
            ry,
        } => {
            rounded_rect_path(ctx, *width, *height, rx.max(*ry));
            paint(ctx, style, false);
        }
        NodeKind::Circle { radius } => {
            ctx.begin_path();
            let _ = ctx.arc(*radius, *radius, *radius, 0.0, TAU);
            paint(ctx, style, false);
        }
        NodeKind::Triangle { width, height } => {
            ctx.begin_path();
            ctx.move_to(width / 2.0, 0.0);
            ctx.line_to(*width, *height);
            ctx.line_to(0.0, *height);
            ctx.close_path();
            paint(ctx, style, false);
        }
        NodeKind::Line { x1, y1, x2, y2 } => {
            ctx.begin_path();
            ctx.move_to(*x1, *y1);
            ctx.line_to(*x2, *y2);
            paint(ctx, style, false);
        }
        NodeKind::Textbox {
            text,
            width,
            font_size,
            font_family,
            font_weight,
            text_align,
        } => {
            ctx.set_font(&format!("{font_weight} {font_size}px {font_family}"));
            ctx.set_fill_style_str(style.fill.as_deref().unwrap_or("#000000"));
            let (align, x) = match text_align {
                TextAlign::Center => ("center", width / 2.0),
                TextAlign::Right => ("right", *width),
                TextAlign::Left | TextAlign::Justify => ("left", 0.0),
            };
            ctx.set_text_align(align);
            let line_height = font_size * TEXT_LINE_HEIGHT;
            for (i, line) in text.lines().enumerate() {
                let _ = ctx.fill_text(line, x, line_height * i as f64 + font_size);
            }
        }
        NodeKind::Image { src, width, height } => match images.get(src) {
            Some(img) if img.complete() && img.natural_width() > 0 => {
                let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
                    img, 0.0, 0.0, *width, *height,
                );
            }
            // Still loading: reserve the area.
            _ => {
                ctx.set_fill_style_str("rgba(148, 163, 184, 0.25)");
                ctx.fill_rect(0.0, 0.0, *width, *height);
            }
        },
        NodeKind::Path { commands } => {
            path(ctx, commands);
            paint(ctx, style, true);
        }
        NodeKind::Group => {
            for child in graph.children(idx) {
                render_node(ctx, graph, *child, images);
            }
        }
    }
    ctx.restore();
}

/// Fill and stroke the current path with the object's style.
fn paint(ctx: &CanvasRenderingContext2d, style: &Style, round_joins: bool) {
    if let Some(fill) = &style.fill {
        ctx.set_fill_style_str(fill);
        ctx.fill();
    }
    if let Some(stroke) = &style.stroke {
        if style.stroke_width > 0.0 {
            ctx.set_stroke_style_str(stroke);
            ctx.set_line_width(style.stroke_width);
            if round_joins {
                ctx.set_line_cap("round");
                ctx.set_line_join("round");
            }
            ctx.stroke();
        }
    }
}

fn path(ctx: &CanvasRenderingContext2d, commands: &[PathCmd]) {
    ctx.begin_path();
    for cmd in commands {
        match *cmd {
            PathCmd::MoveTo(x, y) => ctx.move_to(x, y),
            PathCmd::LineTo(x, y) => ctx.line_to(x, y),
            PathCmd::QuadTo(cx, cy, x, y) => ctx.quadratic_curve_to(cx, cy, x, y),
            PathCmd::Close => ctx.close_path(),
        }
    }
}

fn rounded_rect_path(ctx: &CanvasRenderingContext2d, w: f64, h: f64, r: f64) {
    let r = r.min(w / 2.0).min(h / 2.0).max(0.0);
    ctx.begin_path();
    ctx.move_to(r, 0.0);
    ctx.line_to(w - r, 0.0);
    ctx.arc_to(w, 0.0, w, r, r).unwrap_or(());
    ctx.line_to(w, h - r);
    ctx.arc_to(w, h, w - r, h, r).unwrap_or(());
    ctx.line_to(r, h);
    ctx.arc_to(0.0, h, 0.0, h - r, r).unwrap_or(());
    ctx.line_to(0.0, r);
    ctx.arc_to(0.0, 0.0, r, 0.0, r).unwrap_or(());
    ctx.close_path();
}

// ─── Overlays ───────────────────────────────────────────────────────────

fn draw_selection(ctx: &CanvasRenderingContext2d, b: &Bounds) {
    let handle = 8.0;
    let half = handle / 2.0;

    ctx.save();
    ctx.set_stroke_style_str(SELECTION_COLOR);
    ctx.set_line_width(1.0);
    ctx.stroke_rect(b.x, b.y, b.width, b.height);

    ctx.set_fill_style_str("#ffffff");
    let corners = [
        (b.x, b.y),
        (b.right(), b.y),
        (b.x, b.bottom()),
        (b.right(), b.bottom()),
    ];
    for (x, y) in corners {
        ctx.fill_rect(x - half, y - half, handle, handle);
        ctx.stroke_rect(x - half, y - half, handle, handle);
    }
    ctx.restore();
}

fn draw_marquee(ctx: &CanvasRenderingContext2d, b: &Bounds) {
    if b.width < 1.0 && b.height < 1.0 {
        return;
    }
    ctx.save();
    ctx.set_fill_style_str("rgba(59, 130, 246, 0.08)");
    ctx.fill_rect(b.x, b.y, b.width, b.height);
    ctx.set_stroke_style_str(SELECTION_COLOR);
    ctx.set_line_width(1.0);
    let _ = ctx.set_line_dash(&js_sys::Array::of2(
        &wasm_bindgen::JsValue::from_f64(4.0),
        &wasm_bindgen::JsValue::from_f64(4.0),
    ));
    ctx.stroke_rect(b.x, b.y, b.width, b.height);
    ctx.restore();
}
