use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use indicatif::ProgressBar;

use crate::{
    config::RenderStyle,
    datatypes::{Bounds, MeshData, Vertex},
    error::MeshPlotError,
};

/// Maps mesh coordinates onto image pixels with equal x and y scale
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    center: Vertex,
    scale: f64,
    width: u32,
    height: u32,
}

impl Viewport {
    /// Fits `bounds` into the image, leaving `margin` pixels on every side
    pub fn fit(bounds: &Bounds, width: u32, height: u32, margin: u32) -> Viewport {
        let usable_w = width.saturating_sub(margin.saturating_mul(2)).max(1) as f64;
        let usable_h = height.saturating_sub(margin.saturating_mul(2)).max(1) as f64;

        // a single node or a flat mesh still needs a finite scale
        let mut dx = bounds.x_max - bounds.x_min;
        let mut dy = bounds.y_max - bounds.y_min;
        if dx <= 0.0 {
            dx = 1.0;
        }
        if dy <= 0.0 {
            dy = 1.0;
        }

        Viewport {
            center: Vertex {
                x: 0.5 * (bounds.x_min + bounds.x_max),
                y: 0.5 * (bounds.y_min + bounds.y_max),
            },
            scale: f64::min(usable_w / dx, usable_h / dy),
            width,
            height,
        }
    }

    /// Pixel position of a mesh point; y grows upwards in the mesh
    pub fn to_pixel(&self, vertex: &Vertex) -> (f64, f64) {
        (
            0.5 * self.width as f64 + (vertex.x - self.center.x) * self.scale,
            0.5 * self.height as f64 - (vertex.y - self.center.y) * self.scale,
        )
    }
}

/// An owned drawing surface for a single frame
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgba<u8>) -> Canvas {
        Canvas {
            image: RgbaImage::from_pixel(width, height, background),
        }
    }

    /// Source-over blend of `color` onto one pixel
    fn blend(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        let dst = self.image.get_pixel_mut(x, y);

        let src_a = color[3] as f64 / 255.0;
        let dst_a = dst[3] as f64 / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);
        if out_a <= 0.0 {
            return;
        }

        for c in 0..3 {
            let value =
                (color[c] as f64 * src_a + dst[c] as f64 * dst_a * (1.0 - src_a)) / out_a;
            dst[c] = value.round().clamp(0.0, 255.0) as u8;
        }
        dst[3] = (out_a * 255.0).round() as u8;
    }

    /// Clamps a pixel-space box to the image, `None` when it lies outside
    fn clip(
        &self,
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
    ) -> Option<(u32, u32, u32, u32)> {
        let (w, h) = self.image.dimensions();
        if x_max < 0.0 || y_max < 0.0 || x_min >= w as f64 || y_min >= h as f64 {
            return None;
        }

        Some((
            x_min.floor().max(0.0) as u32,
            (x_max.ceil() as u32).min(w - 1),
            y_min.floor().max(0.0) as u32,
            (y_max.ceil() as u32).min(h - 1),
        ))
    }

    /// Fills every pixel whose centre lies inside the triangle
    pub fn fill_triangle(
        &mut self,
        p0: (f64, f64),
        p1: (f64, f64),
        p2: (f64, f64),
        color: Rgba<u8>,
    ) {
        let edge = |a: (f64, f64), b: (f64, f64), p: (f64, f64)| {
            (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
        };

        let area = edge(p0, p1, p2);
        if area == 0.0 {
            return;
        }

        let bbox = self.clip(
            p0.0.min(p1.0).min(p2.0),
            p0.0.max(p1.0).max(p2.0),
            p0.1.min(p1.1).min(p2.1),
            p0.1.max(p1.1).max(p2.1),
        );
        let (x0, x1, y0, y1) = match bbox {
            Some(b) => b,
            None => return,
        };

        for y in y0..=y1 {
            for x in x0..=x1 {
                let p = (x as f64 + 0.5, y as f64 + 0.5);
                // normalise by the winding so both orientations fill
                let w0 = edge(p1, p2, p) * area.signum();
                let w1 = edge(p2, p0, p) * area.signum();
                let w2 = edge(p0, p1, p) * area.signum();

                if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                    self.blend(x, y, color);
                }
            }
        }
    }

    /// Strokes a segment `width` pixels wide with round caps
    pub fn stroke_segment(
        &mut self,
        a: (f64, f64),
        b: (f64, f64),
        width: f64,
        color: Rgba<u8>,
    ) {
        let half = 0.5 * width;

        let bbox = self.clip(
            a.0.min(b.0) - half,
            a.0.max(b.0) + half,
            a.1.min(b.1) - half,
            a.1.max(b.1) + half,
        );
        let (x0, x1, y0, y1) = match bbox {
            Some(b) => b,
            None => return,
        };

        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let length_sq = dx * dx + dy * dy;

        for y in y0..=y1 {
            for x in x0..=x1 {
                let p = (x as f64 + 0.5, y as f64 + 0.5);

                let t = if length_sq > 0.0 {
                    (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / length_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let closest = (a.0 + t * dx, a.1 + t * dy);
                let distance =
                    f64::sqrt(f64::powi(p.0 - closest.0, 2) + f64::powi(p.1 - closest.1, 2));

                if distance <= half {
                    self.blend(x, y, color);
                }
            }
        }
    }

    /// Writes the canvas as a png
    pub fn save(&self, path: &Path) -> Result<(), MeshPlotError> {
        match self.image.save(path) {
            Ok(()) => Ok(()),
            Err(err) => Err(MeshPlotError::Export(format!(
                "Failed to write {}: {err}",
                path.display()
            ))),
        }
    }
}

/// Draws the first `step` triangles of the mesh onto a fresh canvas
///
/// # Arguments
/// * `mesh` - The parsed mesh
/// * `step` - Number of leading triangles to draw
/// * `viewport` - Mapping from mesh coordinates to pixels
/// * `style` - Colors and line width of the frame
pub fn render_frame(
    mesh: &MeshData,
    step: usize,
    viewport: &Viewport,
    style: &RenderStyle,
) -> Result<Canvas, MeshPlotError> {
    let mut canvas = Canvas::new(style.width, style.height, style.background);

    for triangle in mesh.triangles.iter().take(step) {
        let mut corners = [(0.0, 0.0); 3];

        for (corner, node_idx) in corners.iter_mut().zip(triangle.nodes) {
            let node = match usize::try_from(node_idx)
                .ok()
                .and_then(|i| mesh.nodes.get(i))
            {
                Some(n) => n,
                None => {
                    return Err(MeshPlotError::Render(format!(
                        "Triangle {} references node {} but the mesh only has {} nodes",
                        triangle.index,
                        node_idx,
                        mesh.nodes.len()
                    )))
                }
            };
            *corner = viewport.to_pixel(node);
        }

        canvas.fill_triangle(corners[0], corners[1], corners[2], style.face_color);
        for i in 0..3 {
            canvas.stroke_segment(
                corners[i],
                corners[(i + 1) % 3],
                style.line_width,
                style.edge_color,
            );
        }
    }

    Ok(canvas)
}

/// Renders the mesh growth frames into `export_path`
///
/// Frame `k` shows all but the last `k` triangles and is written to
/// `mesh_step_<k>.png`. Axis bounds always cover every node.
///
/// # Arguments
/// * `mesh` - The parsed mesh
/// * `export_path` - Existing directory that receives the images
/// * `frames` - Number of frames to render
/// * `style` - Visual settings shared by every frame
///
/// # Returns
/// The paths of the written images, in frame order
pub fn render_frames(
    mesh: &MeshData,
    export_path: &Path,
    frames: usize,
    style: &RenderStyle,
) -> Result<Vec<PathBuf>, MeshPlotError> {
    if frames == 0 {
        return Err(MeshPlotError::Input(
            "At least one frame must be rendered".to_owned(),
        ));
    }
    if !export_path.is_dir() {
        return Err(MeshPlotError::Export(format!(
            "Export path {} is not a directory",
            export_path.display()
        )));
    }

    let bounds = match mesh.bounds() {
        Some(b) => b,
        None => {
            return Err(MeshPlotError::Render(
                "Mesh has no nodes to derive plot bounds from".to_owned(),
            ))
        }
    };

    let n_tris = mesh.triangles.len();
    let mut frames = frames;
    if frames > n_tris + 1 {
        println!(
            "warning [plot]: only {} frames possible for {} triangles, rendering those",
            n_tris + 1,
            n_tris
        );
        frames = n_tris + 1;
    }

    let viewport = Viewport::fit(&bounds, style.width, style.height, style.margin);

    let bar = if frames > 1 {
        ProgressBar::new(frames as u64)
    } else {
        ProgressBar::hidden()
    };

    let mut written: Vec<PathBuf> = Vec::with_capacity(frames);

    for k in 0..frames {
        let fig_path = export_path.join(format!("mesh_step_{k}"));
        bar.suspend(|| println!("Exporting {}", fig_path.display()));

        let canvas = render_frame(mesh, n_tris - k, &viewport, style)?;
        let png_path = fig_path.with_extension("png");
        canvas.save(&png_path)?;
        drop(canvas);

        bar.suspend(|| println!("Done"));
        bar.inc(1);
        written.push(png_path);
    }

    bar.finish_and_clear();

    Ok(written)
}
