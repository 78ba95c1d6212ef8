/// Truecolor cell rasterizer for terminal rendering
use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::Point3;
use std::io::Write;

use pickview_core::geometry::Triangle;
use pickview_core::lighting::shade_flat;
use pickview_core::scene::{Material, PhongMaterial, Side};
use pickview_core::{
    Color as LinearColor, MeshGeometry, PerspectiveCamera, RenderSurface, Scene, ViewerResult,
};

/// Terminal cells are roughly twice as tall as they are wide
pub const CELL_ASPECT: f32 = 2.0;

/// Wireframe edges win the depth test when within this distance of a surface
const WIRE_DEPTH_BIAS: f32 = 0.05;

/// One rasterized terminal cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub depth: f32,
    /// sRGB fill from a shaded triangle
    pub fill: Option<[u8; 3]>,
    /// Wireframe glyph and its sRGB color
    pub glyph: Option<(char, [u8; 3])>,
}

impl Cell {
    const EMPTY: Cell = Cell {
        depth: f32::INFINITY,
        fill: None,
        glyph: None,
    };
}

/// A projected vertex: cell-space position plus linear view depth
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    depth: f32,
}

/// Renderer that converts the scene to colored terminal cells
pub struct TerminalRenderer {
    display: (u32, u32),
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    background: [u8; 3],
}

impl TerminalRenderer {
    pub fn new(columns: u16, rows: u16) -> Self {
        Self {
            display: (columns as u32, rows as u32),
            width: 0,
            height: 0,
            cells: Vec::new(),
            background: [0, 0, 0],
        }
    }

    /// Record a new terminal size; the buffer follows on the next frame.
    pub fn set_display_size(&mut self, columns: u16, rows: u16) {
        self.display = (columns as u32, rows as u32);
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        if x < self.width && y < self.height {
            self.cells.get(y * self.width + x)
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::EMPTY);
    }

    fn project(&self, camera: &PerspectiveCamera, point: &Point3<f32>) -> Option<ScreenVertex> {
        let ndc = camera.project(point)?;
        Some(ScreenVertex {
            x: (ndc.x + 1.0) * 0.5 * self.width as f32,
            y: (1.0 - ndc.y) * 0.5 * self.height as f32,
            depth: camera.linear_depth(ndc.z),
        })
    }

    /// Project a triangle, dropping it if clipped or facing away under `Side::Front`.
    fn project_triangle(
        &self,
        camera: &PerspectiveCamera,
        triangle: &Triangle,
        side: Side,
    ) -> Option<[ScreenVertex; 3]> {
        let v0 = self.project(camera, &triangle.vertices[0])?;
        let v1 = self.project(camera, &triangle.vertices[1])?;
        let v2 = self.project(camera, &triangle.vertices[2])?;

        // Screen y points down, so front faces have negative signed area
        let area = (v1.x - v0.x) * (v2.y - v0.y) - (v2.x - v0.x) * (v1.y - v0.y);
        if side == Side::Front && area >= 0.0 {
            return None;
        }

        Some([v0, v1, v2])
    }

    fn render_fill(
        &mut self,
        scene: &Scene,
        camera: &PerspectiveCamera,
        geometry: &MeshGeometry,
        material: &PhongMaterial,
    ) {
        let colors = geometry.colors().filter(|_| material.vertex_colors);

        for (index, triangle) in geometry.triangles().enumerate() {
            let Some(screen) = self.project_triangle(camera, &triangle, material.side) else {
                continue;
            };

            let albedo = match (colors, geometry.face(index)) {
                (Some(colors), Some(face)) => {
                    let sum = face
                        .vertices()
                        .iter()
                        .filter_map(|&v| colors.get(v))
                        .fold(LinearColor::BLACK, |acc, c| acc + c);
                    material.color * sum.scale(1.0 / 3.0)
                }
                _ => material.color,
            };

            let normal = triangle.calculate_normal();
            let shaded = shade_flat(&normal, albedo, &scene.lights).to_srgb_u8();
            self.rasterize_triangle(&screen, shaded);
        }
    }

    fn rasterize_triangle(&mut self, v: &[ScreenVertex; 3], fill: [u8; 3]) {
        let (v0, v1, v2) = (v[0], v[1], v[2]);

        // Bounding box
        let min_x = v0.x.min(v1.x).min(v2.x).floor() as i32;
        let max_x = v0.x.max(v1.x).max(v2.x).ceil() as i32;
        let min_y = v0.y.min(v1.y).min(v2.y).floor() as i32;
        let max_y = v0.y.max(v1.y).max(v2.y).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let Some((w0, w1, w2)) =
                    barycentric((v0.x, v0.y), (v1.x, v1.y), (v2.x, v2.y), (px, py))
                else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v0.depth + w1 * v1.depth + w2 * v2.depth;
                let cell = &mut self.cells[y as usize * self.width + x as usize];
                if depth < cell.depth {
                    cell.depth = depth;
                    cell.fill = Some(fill);
                    cell.glyph = None;
                }
            }
        }
    }

    fn render_wireframe(
        &mut self,
        camera: &PerspectiveCamera,
        geometry: &MeshGeometry,
        color: [u8; 3],
        side: Side,
    ) {
        for triangle in geometry.triangles() {
            let Some([v0, v1, v2]) = self.project_triangle(camera, &triangle, side) else {
                continue;
            };
            for (a, b) in [(v0, v1), (v1, v2), (v2, v0)] {
                self.draw_edge(a, b, color);
            }
        }
    }

    fn draw_edge(&mut self, a: ScreenVertex, b: ScreenVertex, color: [u8; 3]) {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let glyph = edge_glyph(dx, dy);
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;

        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = (a.x + dx * t).floor();
            let y = (a.y + dy * t).floor();
            if x < 0.0 || y < 0.0 || x >= self.width as f32 || y >= self.height as f32 {
                continue;
            }

            let depth = a.depth + (b.depth - a.depth) * t;
            let cell = &mut self.cells[y as usize * self.width + x as usize];
            if depth <= cell.depth + WIRE_DEPTH_BIAS {
                cell.depth = cell.depth.min(depth);
                cell.glyph = Some((glyph, color));
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let mut last_bg = None;
        let mut last_fg = None;

        for y in 0..self.height {
            writer.queue(cursor::MoveTo(0, y as u16))?;
            for x in 0..self.width {
                let cell = &self.cells[y * self.width + x];

                let bg = cell.fill.unwrap_or(self.background);
                if last_bg != Some(bg) {
                    writer.queue(SetBackgroundColor(rgb(bg)))?;
                    last_bg = Some(bg);
                }

                match cell.glyph {
                    Some((c, fg)) => {
                        if last_fg != Some(fg) {
                            writer.queue(SetForegroundColor(rgb(fg)))?;
                            last_fg = Some(fg);
                        }
                        writer.queue(Print(c))?;
                    }
                    None => {
                        writer.queue(Print(' '))?;
                    }
                }
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl RenderSurface for TerminalRenderer {
    fn display_size(&self) -> (u32, u32) {
        self.display
    }

    fn buffer_size(&self) -> (u32, u32) {
        (self.width as u32, self.height as u32)
    }

    fn set_buffer_size(&mut self, width: u32, height: u32) {
        self.width = width as usize;
        self.height = height as usize;
        self.cells = vec![Cell::EMPTY; self.width * self.height];
    }

    fn aspect(&self) -> f32 {
        let (columns, rows) = self.display;
        columns as f32 / (rows as f32 * CELL_ASPECT)
    }

    fn render(&mut self, scene: &mut Scene, camera: &PerspectiveCamera) -> ViewerResult<()> {
        self.clear();
        self.background = scene.background.to_srgb_u8();

        let order = scene.traverse();

        // Shaded surfaces first so wireframes can depth-test against them
        for &id in &order {
            let Some(object) = scene.object(id) else { continue };
            let Material::Phong(material) = object.material else { continue };
            if let Some(geometry) = scene.geometry(object.geometry) {
                self.render_fill(scene, camera, geometry, &material);
            }
        }

        for &id in &order {
            let Some(object) = scene.object(id) else { continue };
            let Material::Wireframe(material) = object.material else { continue };
            if let Some(geometry) = scene.geometry(object.geometry) {
                let color = material.color.to_srgb_u8();
                self.render_wireframe(camera, geometry, color, material.side);
            }
        }

        // Every frame reads colors straight from the geometry
        for geometry in scene.geometries_mut() {
            if let Some(colors) = geometry.colors_mut() {
                colors.clear_needs_update();
            }
        }

        Ok(())
    }
}

fn rgb(c: [u8; 3]) -> Color {
    Color::Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
    }
}

/// Pick a line-drawing character matching the edge's on-screen slope
fn edge_glyph(dx: f32, dy: f32) -> char {
    // Cells are taller than wide, so compare in square units
    let dy = dy * CELL_ASPECT;
    let (ax, ay) = (dx.abs(), dy.abs());
    if ay < ax * 0.4 {
        '-'
    } else if ax < ay * 0.4 {
        '|'
    } else if (dx > 0.0) == (dy > 0.0) {
        '\\'
    } else {
        '/'
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
