//! SVG export.
//!
//! Each object becomes a `<g>` carrying its local transform as a matrix,
//! with the shape drawn in its local frame. Groups nest, so the output
//! mirrors the scene tree.

use mocko_core::geometry::local_affine;
use mocko_core::{NodeIndex, NodeKind, PathCmd, SceneGraph, Style, TEXT_LINE_HEIGHT, TextAlign};
use log::debug;
use std::fmt::Write;

/// Render the scene as a standalone SVG document of the given canvas size.
pub fn render_svg(graph: &SceneGraph, width: f64, height: f64) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    if let Some(bg) = &graph.background {
        let _ = write!(
            out,
            r#"<rect x="0" y="0" width="{width}" height="{height}" fill="{}"/>"#,
            escape(bg)
        );
    }
    for idx in graph.top_level() {
        render_node(graph, *idx, &mut out);
    }
    out.push_str("</svg>");
    debug!(
        "svg export: {} objects, {} bytes",
        graph.object_count(),
        out.len()
    );
    out
}

fn render_node(graph: &SceneGraph, idx: NodeIndex, out: &mut String) {
    let node = &graph.graph[idx];
    // `+ 0.0` folds negative zero so matrices print as `0`, not `-0`.
    let [a, b, c, d, e, f] = local_affine(&node.transform)
        .as_coeffs()
        .map(|v| v + 0.0);
    let _ = write!(
        out,
        r#"<g id="{}" transform="matrix({a} {b} {c} {d} {e} {f})""#,
        escape(node.id.as_str())
    );
    if node.style.opacity < 1.0 {
        let _ = write!(out, r#" opacity="{}""#, node.style.opacity);
    }
    out.push('>');

    let paint = paint_attrs(&node.style, &node.kind);
    match &node.kind {
        NodeKind::Root => {}
        NodeKind::Rect {
            width,
            height,
            rx,
            ry,
        } => {
            let _ = write!(
                out,
                r#"<rect x="0" y="0" width="{width}" height="{height}" rx="{rx}" ry="{ry}"{paint}/>"#
            );
        }
        NodeKind::Circle { radius } => {
            let _ = write!(out, r#"<circle cx="{radius}" cy="{radius}" r="{radius}"{paint}/>"#);
        }
        NodeKind::Triangle { width, height } => {
            let _ = write!(
                out,
                r#"<polygon points="{} 0 {width} {height} 0 {height}"{paint}/>"#,
                width / 2.0
            );
        }
        NodeKind::Line { x1, y1, x2, y2 } => {
            let _ = write!(out, r#"<line x1="{x1}" y1="{y1}" x2="{x2}" y2="{y2}"{paint}/>"#);
        }
        NodeKind::Textbox {
            text,
            width,
            font_size,
            font_family,
            font_weight,
            text_align,
        } => {
            let (anchor, x) = match text_align {
                TextAlign::Center => ("middle", width / 2.0),
                TextAlign::Right => ("end", *width),
                TextAlign::Left | TextAlign::Justify => ("start", 0.0),
            };
            let _ = write!(
                out,
                r#"<text font-family="{}" font-size="{font_size}" font-weight="{}" text-anchor="{anchor}"{paint}>"#,
                escape(font_family),
                escape(font_weight)
            );
            let line_height = font_size * TEXT_LINE_HEIGHT;
            for (i, line) in text.lines().enumerate() {
                let _ = write!(
                    out,
                    r#"<tspan x="{x}" y="{}">{}</tspan>"#,
                    line_height * i as f64 + font_size,
                    escape(line)
                );
            }
            out.push_str("</text>");
        }
        NodeKind::Image { src, width, height } => {
            let _ = write!(
                out,
                r#"<image href="{}" width="{width}" height="{height}" preserveAspectRatio="none"/>"#,
                escape(src)
            );
        }
        NodeKind::Path { commands } => {
            let _ = write!(out, r#"<path d="{}"{paint}/>"#, path_data(commands));
        }
        NodeKind::Group => {
            for child in graph.children(idx) {
                render_node(graph, *child, out);
            }
        }
    }
    out.push_str("</g>");
}

fn paint_attrs(style: &Style, kind: &NodeKind) -> String {
    let fill = match (&style.fill, kind) {
        (Some(fill), _) => escape(fill),
        // Text without an explicit fill renders black.
        (None, NodeKind::Textbox { .. }) => "#000000".to_string(),
        (None, _) => "none".to_string(),
    };
    let mut attrs = format!(r#" fill="{fill}""#);
    if let Some(stroke) = &style.stroke {
        let _ = write!(
            attrs,
            r#" stroke="{}" stroke-width="{}""#,
            escape(stroke),
            style.stroke_width
        );
    }
    attrs
}

fn path_data(commands: &[PathCmd]) -> String {
    commands
        .iter()
        .map(|cmd| match *cmd {
            PathCmd::MoveTo(x, y) => format!("M {x} {y}"),
            PathCmd::LineTo(x, y) => format!("L {x} {y}"),
            PathCmd::QuadTo(cx, cy, x, y) => format!("Q {cx} {cy} {x} {y}"),
            PathCmd::Close => "Z".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mocko_core::{ObjectId, SceneNode, parse_canvas_json};
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_scene_has_frame_only() {
        let svg = render_svg(&SceneGraph::new(), 800.0, 600.0);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"viewBox="0 0 800 600""#));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn text_is_escaped_and_split_into_lines() {
        let json = r#"{"version":"5.3.0","objects":[
            {"type":"textbox","id":"sv_txt","text":"Fish & <Chips>\nToday","width":100,"fontSize":10,"fontFamily":"Inter","textAlign":"center"}
        ]}"#;
        let svg = render_svg(&parse_canvas_json(json).unwrap(), 200.0, 200.0);
        assert!(svg.contains("Fish &amp; &lt;Chips&gt;"));
        assert_eq!(svg.matches("<tspan").count(), 2);
        assert!(svg.contains(r#"text-anchor="middle""#));
        assert!(svg.contains(r##"fill="#000000""##));
    }

    #[test]
    fn transform_and_paint_are_emitted() {
        let mut graph = SceneGraph::new();
        let root = graph.root;
        let mut node = SceneNode::new(ObjectId::intern("sv_rect"), NodeKind::Rect {
            width: 10.0,
            height: 20.0,
            rx: 0.0,
            ry: 0.0,
        })
        .at(5.0, 6.0)
        .styled(Style::filled("#ff0000"));
        node.style.stroke = Some("#000".into());
        node.style.stroke_width = 2.0;
        node.style.opacity = 0.5;
        graph.add_node(root, node);
        graph.background = Some("#fff".into());

        let svg = render_svg(&graph, 100.0, 100.0);
        assert!(svg.contains(r#"transform="matrix(1 0 0 1 5 6)""#));
        assert!(svg.contains(r#"opacity="0.5""#));
        assert!(svg.contains(r##"fill="#ff0000" stroke="#000" stroke-width="2""##));
        assert!(svg.contains(r##"<rect x="0" y="0" width="100" height="100" fill="#fff"/>"##));
    }

    #[test]
    fn path_data_is_space_separated() {
        let data = path_data(&[
            PathCmd::MoveTo(0.0, 0.0),
            PathCmd::QuadTo(1.0, 2.0, 3.0, 4.0),
            PathCmd::Close,
        ]);
        assert_eq!(data, "M 0 0 Q 1 2 3 4 Z");
    }
}
