/// WebGL2 renderer: flat-shaded vertex colors plus a blended wireframe overlay
use std::collections::HashMap;

use js_sys::Float32Array;
use web_sys::{
    WebGl2RenderingContext as Gl, WebGlBuffer, WebGlProgram, WebGlShader, WebGlUniformLocation,
    WebGlVertexArrayObject,
};

use pickview_core::scene::{GeometryId, Material, Side};
use pickview_core::{Color, MeshGeometry, PerspectiveCamera, Scene, ViewerError, ViewerResult};

use crate::buffers::{color_data, position_data, wireframe_data, LightUniforms};

const POSITION_LOCATION: u32 = 0;
const COLOR_LOCATION: u32 = 1;

const MESH_VERTEX_SHADER: &str = r#"#version 300 es
layout(location = 0) in vec3 position;
layout(location = 1) in vec3 color;
uniform mat4 viewProjection;
out vec3 vWorldPosition;
out vec3 vColor;
void main() {
    vWorldPosition = position;
    vColor = color;
    gl_Position = viewProjection * vec4(position, 1.0);
}
"#;

const MESH_FRAGMENT_SHADER: &str = r#"#version 300 es
precision highp float;
const int MAX_LIGHTS = 4;
const float PI = 3.141592653589793;
in vec3 vWorldPosition;
in vec3 vColor;
uniform vec3 materialColor;
uniform int hemisphereCount;
uniform vec3 skyColor[MAX_LIGHTS];
uniform vec3 groundColor[MAX_LIGHTS];
uniform vec3 hemisphereUp[MAX_LIGHTS];
uniform int directionalCount;
uniform vec3 directionalColor[MAX_LIGHTS];
uniform vec3 directionalDirection[MAX_LIGHTS];
out vec4 fragColor;

vec3 linearToSrgb(vec3 c) {
    c = clamp(c, 0.0, 1.0);
    return mix(c * 12.92, 1.055 * pow(c, vec3(1.0 / 2.4)) - 0.055, step(vec3(0.0031308), c));
}

void main() {
    vec3 normal = normalize(cross(dFdx(vWorldPosition), dFdy(vWorldPosition)));
    vec3 irradiance = vec3(0.0);
    for (int i = 0; i < MAX_LIGHTS; i++) {
        if (i >= hemisphereCount) break;
        float w = 0.5 * dot(normal, hemisphereUp[i]) + 0.5;
        irradiance += mix(groundColor[i], skyColor[i], w);
    }
    for (int i = 0; i < MAX_LIGHTS; i++) {
        if (i >= directionalCount) break;
        irradiance += directionalColor[i] * max(dot(normal, directionalDirection[i]), 0.0);
    }
    vec3 albedo = materialColor * vColor;
    fragColor = vec4(linearToSrgb(albedo / PI * irradiance), 1.0);
}
"#;

const LINE_VERTEX_SHADER: &str = r#"#version 300 es
layout(location = 0) in vec3 position;
uniform mat4 viewProjection;
void main() {
    gl_Position = viewProjection * vec4(position, 1.0);
}
"#;

const LINE_FRAGMENT_SHADER: &str = r#"#version 300 es
precision highp float;
uniform vec4 lineColor;
out vec4 fragColor;
void main() {
    fragColor = lineColor;
}
"#;

pub fn make_webgl_program(
    context: &Gl,
    vertex_shader_str: &str,
    frag_shader_str: &str,
) -> Result<WebGlProgram, String> {
    let vertex_shader = compile_shader(context, Gl::VERTEX_SHADER, vertex_shader_str)?;
    let frag_shader = compile_shader(context, Gl::FRAGMENT_SHADER, frag_shader_str)?;
    link_program(context, &vertex_shader, &frag_shader)
}

fn compile_shader(context: &Gl, shader_type: u32, source: &str) -> Result<WebGlShader, String> {
    let shader = context
        .create_shader(shader_type)
        .ok_or_else(|| String::from("Unable to create shader object"))?;
    context.shader_source(&shader, source);
    context.compile_shader(&shader);

    if context
        .get_shader_parameter(&shader, Gl::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(shader)
    } else {
        Err(context
            .get_shader_info_log(&shader)
            .unwrap_or_else(|| String::from("Unknown error creating shader")))
    }
}

fn link_program(
    context: &Gl,
    vert_shader: &WebGlShader,
    frag_shader: &WebGlShader,
) -> Result<WebGlProgram, String> {
    let program = context
        .create_program()
        .ok_or_else(|| String::from("Unable to create program object"))?;

    context.attach_shader(&program, vert_shader);
    context.attach_shader(&program, frag_shader);
    context.link_program(&program);

    if context
        .get_program_parameter(&program, Gl::LINK_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(program)
    } else {
        Err(context
            .get_program_info_log(&program)
            .unwrap_or_else(|| String::from("Unknown error creating program object")))
    }
}

/// GPU copies of one scene geometry
struct GpuGeometry {
    mesh_vao: WebGlVertexArrayObject,
    color_buffer: WebGlBuffer,
    color_version: Option<u32>,
    vertex_count: i32,
    line_vao: WebGlVertexArrayObject,
    line_vertex_count: i32,
}

pub struct GlRenderer {
    gl: Gl,
    mesh_program: WebGlProgram,
    line_program: WebGlProgram,
    geometries: HashMap<GeometryId, GpuGeometry>,
}

impl GlRenderer {
    pub fn new(gl: Gl) -> ViewerResult<Self> {
        let mesh_program = make_webgl_program(&gl, MESH_VERTEX_SHADER, MESH_FRAGMENT_SHADER)
            .map_err(ViewerError::Render)?;
        let line_program = make_webgl_program(&gl, LINE_VERTEX_SHADER, LINE_FRAGMENT_SHADER)
            .map_err(ViewerError::Render)?;

        gl.enable(Gl::DEPTH_TEST);

        Ok(Self {
            gl,
            mesh_program,
            line_program,
            geometries: HashMap::new(),
        })
    }

    pub fn set_viewport(&self, width: u32, height: u32) {
        self.gl.viewport(0, 0, width as i32, height as i32);
    }

    fn create_array_buffer(&self, data: &[f32], usage: u32) -> ViewerResult<WebGlBuffer> {
        let buffer = self
            .gl
            .create_buffer()
            .ok_or_else(|| ViewerError::Render("failed to create buffer".to_string()))?;
        self.gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&buffer));
        let array = Float32Array::from(data);
        self.gl
            .buffer_data_with_array_buffer_view(Gl::ARRAY_BUFFER, &array, usage);
        Ok(buffer)
    }

    fn create_vao(&self) -> ViewerResult<WebGlVertexArrayObject> {
        let vao = self
            .gl
            .create_vertex_array()
            .ok_or_else(|| ViewerError::Render("failed to create vertex array".to_string()))?;
        self.gl.bind_vertex_array(Some(&vao));
        Ok(vao)
    }

    fn bind_vec3_attribute(&self, location: u32, buffer: &WebGlBuffer) {
        self.gl.bind_buffer(Gl::ARRAY_BUFFER, Some(buffer));
        self.gl
            .vertex_attrib_pointer_with_i32(location, 3, Gl::FLOAT, false, 0, 0);
        self.gl.enable_vertex_attrib_array(location);
    }

    fn upload(&self, geometry: &MeshGeometry) -> ViewerResult<GpuGeometry> {
        let mesh_vao = self.create_vao()?;
        let positions = self.create_array_buffer(&position_data(geometry), Gl::STATIC_DRAW)?;
        self.bind_vec3_attribute(POSITION_LOCATION, &positions);

        let colors = match geometry.colors() {
            Some(colors) => color_data(colors),
            None => vec![1.0; geometry.vertex_count() * 3],
        };
        let color_buffer = self.create_array_buffer(&colors, Gl::DYNAMIC_DRAW)?;
        self.bind_vec3_attribute(COLOR_LOCATION, &color_buffer);

        let line_vao = self.create_vao()?;
        let lines = wireframe_data(geometry);
        let line_buffer = self.create_array_buffer(&lines, Gl::STATIC_DRAW)?;
        self.bind_vec3_attribute(POSITION_LOCATION, &line_buffer);

        self.gl.bind_vertex_array(None);

        Ok(GpuGeometry {
            mesh_vao,
            color_buffer,
            color_version: geometry.colors().map(|c| c.version()),
            vertex_count: geometry.vertex_count() as i32,
            line_vao,
            line_vertex_count: (lines.len() / 3) as i32,
        })
    }

    /// Upload new geometry and re-upload colors whose version moved on.
    fn sync_geometry(&mut self, id: GeometryId, geometry: &MeshGeometry) -> ViewerResult<()> {
        if !self.geometries.contains_key(&id) {
            let gpu = self.upload(geometry)?;
            self.geometries.insert(id, gpu);
            return Ok(());
        }

        let Some(colors) = geometry.colors() else {
            return Ok(());
        };
        let Some(gpu) = self.geometries.get_mut(&id) else {
            return Ok(());
        };
        if !colors.needs_update() && gpu.color_version == Some(colors.version()) {
            return Ok(());
        }

        self.gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&gpu.color_buffer));
        let array = Float32Array::from(color_data(colors).as_slice());
        self.gl
            .buffer_sub_data_with_i32_and_array_buffer_view(Gl::ARRAY_BUFFER, 0, &array);
        gpu.color_version = Some(colors.version());
        log::debug!("uploaded colors for {:?} (version {})", id, colors.version());
        Ok(())
    }

    fn uniform(&self, program: &WebGlProgram, name: &str) -> Option<WebGlUniformLocation> {
        self.gl.get_uniform_location(program, name)
    }

    fn set_side(&self, side: Side) {
        match side {
            Side::Front => {
                self.gl.enable(Gl::CULL_FACE);
                self.gl.cull_face(Gl::BACK);
            }
            Side::Double => self.gl.disable(Gl::CULL_FACE),
        }
    }

    pub fn render(&mut self, scene: &mut Scene, camera: &PerspectiveCamera) -> ViewerResult<()> {
        let [r, g, b, a] = clear_rgba(scene.background);
        self.gl.clear_color(r, g, b, a);
        self.gl.clear(Gl::COLOR_BUFFER_BIT | Gl::DEPTH_BUFFER_BIT);

        let order = scene.traverse();
        let mut used = Vec::new();
        for &id in &order {
            let Some(object) = scene.object(id) else { continue };
            if let Some(geometry) = scene.geometry(object.geometry) {
                self.sync_geometry(object.geometry, geometry)?;
                used.push(object.geometry);
            }
        }

        let view_projection = camera.view_projection();
        let lights = LightUniforms::from_lights(&scene.lights);

        // Shaded surfaces, pushed back slightly so coplanar wireframe lines win
        self.gl.use_program(Some(&self.mesh_program));
        self.gl.enable(Gl::POLYGON_OFFSET_FILL);
        self.gl.polygon_offset(1.0, 1.0);
        self.gl.disable(Gl::BLEND);
        self.set_mesh_uniforms(view_projection.as_slice(), &lights);

        for &id in &order {
            let Some(object) = scene.object(id) else { continue };
            let Material::Phong(material) = object.material else { continue };
            let Some(gpu) = self.geometries.get(&object.geometry) else { continue };

            let albedo = material.color.to_array();
            let color = self.uniform(&self.mesh_program, "materialColor");
            self.gl.uniform3fv_with_f32_array(color.as_ref(), &albedo);

            self.set_side(material.side);
            self.gl.bind_vertex_array(Some(&gpu.mesh_vao));
            if material.vertex_colors {
                self.gl.draw_arrays(Gl::TRIANGLES, 0, gpu.vertex_count);
            } else {
                // Constant white stands in for the color attribute
                self.gl.disable_vertex_attrib_array(COLOR_LOCATION);
                self.gl.vertex_attrib3f(COLOR_LOCATION, 1.0, 1.0, 1.0);
                self.gl.draw_arrays(Gl::TRIANGLES, 0, gpu.vertex_count);
                self.gl.enable_vertex_attrib_array(COLOR_LOCATION);
            }
        }
        self.gl.disable(Gl::POLYGON_OFFSET_FILL);

        // Wireframe overlays
        self.gl.use_program(Some(&self.line_program));
        let matrix = self.uniform(&self.line_program, "viewProjection");
        self.gl
            .uniform_matrix4fv_with_f32_array(matrix.as_ref(), false, view_projection.as_slice());

        for &id in &order {
            let Some(object) = scene.object(id) else { continue };
            let Material::Wireframe(material) = object.material else { continue };
            let Some(gpu) = self.geometries.get(&object.geometry) else { continue };

            if material.transparent {
                self.gl.enable(Gl::BLEND);
                self.gl.blend_func(Gl::SRC_ALPHA, Gl::ONE_MINUS_SRC_ALPHA);
            } else {
                self.gl.disable(Gl::BLEND);
            }
            let [r, g, b] = material.color.to_srgb_u8();
            let line_color = self.uniform(&self.line_program, "lineColor");
            self.gl.uniform4f(
                line_color.as_ref(),
                r as f32 / 255.0,
                g as f32 / 255.0,
                b as f32 / 255.0,
                material.opacity,
            );

            self.gl.bind_vertex_array(Some(&gpu.line_vao));
            self.gl.draw_arrays(Gl::LINES, 0, gpu.line_vertex_count);
        }

        self.gl.bind_vertex_array(None);

        for id in used {
            if let Some(colors) = scene.geometry_mut(id).and_then(|g| g.colors_mut()) {
                colors.clear_needs_update();
            }
        }

        Ok(())
    }

    fn set_mesh_uniforms(&self, view_projection: &[f32], lights: &LightUniforms) {
        let program = &self.mesh_program;
        let gl = &self.gl;

        gl.uniform_matrix4fv_with_f32_array(
            self.uniform(program, "viewProjection").as_ref(),
            false,
            view_projection,
        );
        gl.uniform1i(
            self.uniform(program, "hemisphereCount").as_ref(),
            lights.hemisphere_count,
        );
        gl.uniform3fv_with_f32_array(self.uniform(program, "skyColor").as_ref(), &lights.sky);
        gl.uniform3fv_with_f32_array(self.uniform(program, "groundColor").as_ref(), &lights.ground);
        gl.uniform3fv_with_f32_array(self.uniform(program, "hemisphereUp").as_ref(), &lights.up);
        gl.uniform1i(
            self.uniform(program, "directionalCount").as_ref(),
            lights.directional_count,
        );
        gl.uniform3fv_with_f32_array(
            self.uniform(program, "directionalColor").as_ref(),
            &lights.directional_color,
        );
        gl.uniform3fv_with_f32_array(
            self.uniform(program, "directionalDirection").as_ref(),
            &lights.directional_direction,
        );
    }
}

/// sRGB clear color for a linear background
fn clear_rgba(background: Color) -> [f32; 4] {
    let [r, g, b] = background.to_srgb_u8();
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0]
}
