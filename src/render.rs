use halo_core::geometry::Mesh;
use halo_core::{Camera, Drawable, RenderError, RenderSurface, SceneGraph, SurfaceSize};
use web_sys as web;

use crate::dom;

mod helpers;

use helpers::{PipelineDesc, ADDITIVE_BLENDING};

pub static SCENE_WGSL: &str = include_str!("../shaders/scene.wgsl");

// Unit quad (two triangles) for particle sprites, corners at +-0.5
const QUAD_CORNERS: [f32; 12] = [
    -0.5, -0.5, 0.5, -0.5, 0.5, 0.5, -0.5, -0.5, 0.5, 0.5, -0.5, 0.5,
];

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct NodeUniforms {
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    color: [f32; 4],
    params: [f32; 4],
}

enum NodeGeometry {
    Lines {
        vertices: wgpu::Buffer,
        indices: wgpu::Buffer,
        index_count: u32,
    },
    Points {
        centers: wgpu::Buffer,
        count: u32,
    },
}

struct NodeGpu {
    geometry: NodeGeometry,
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct Gpu {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    node_layout: wgpu::BindGroupLayout,
    lines_pipeline: wgpu::RenderPipeline,
    points_pipeline: wgpu::RenderPipeline,
    quad_vb: wgpu::Buffer,
    nodes: Vec<NodeGpu>,
    alpha_modes: Vec<wgpu::CompositeAlphaMode>,
    clear: wgpu::Color,
}

/// A canvas with its own WebGPU device, drawing one scene graph.
pub struct GpuSurface {
    canvas: web::HtmlCanvasElement,
    gpu: Option<Gpu>,
}

impl GpuSurface {
    pub async fn new(canvas: web::HtmlCanvasElement, size: SurfaceSize) -> anyhow::Result<Self> {
        dom::set_backing_size(&canvas, size);

        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("No WebGPU adapter"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    // Default limits: older WebGPU impls reject unknown fields
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: None,
                },
                None,
            )
            .await
            .map_err(|e| anyhow::anyhow!(format!("request_device error: {:?}", e)))?;
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| {
                matches!(
                    f,
                    wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Rgba8Unorm
                )
            })
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("surface reports no formats"))?;
        let alpha_modes = caps.alpha_modes.clone();
        let alpha_mode = pick_alpha_mode(&alpha_modes, true);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(SCENE_WGSL.into()),
        });
        let node_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("node_bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pl"),
            bind_group_layouts: &[&node_layout],
            push_constant_ranges: &[],
        });

        let line_buffers = [wgpu::VertexBufferLayout {
            array_stride: (std::mem::size_of::<f32>() * 3) as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: 0,
            }],
        }];
        let lines_pipeline = helpers::make_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            format,
            PipelineDesc {
                label: "lines_pipeline",
                vs_entry: "vs_lines",
                fs_entry: "fs_lines",
                buffers: &line_buffers,
                topology: wgpu::PrimitiveTopology::LineList,
                blend: wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING,
            },
        );

        let point_buffers = [
            // slot 0: quad corners
            wgpu::VertexBufferLayout {
                array_stride: (std::mem::size_of::<f32>() * 2) as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 0,
                    shader_location: 0,
                }],
            },
            // slot 1: particle centres
            wgpu::VertexBufferLayout {
                array_stride: (std::mem::size_of::<f32>() * 3) as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &[wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 0,
                    shader_location: 1,
                }],
            },
        ];
        let points_pipeline = helpers::make_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            format,
            PipelineDesc {
                label: "points_pipeline",
                vs_entry: "vs_points",
                fs_entry: "fs_points",
                buffers: &point_buffers,
                topology: wgpu::PrimitiveTopology::TriangleList,
                blend: ADDITIVE_BLENDING,
            },
        );
        let quad_vb =
            helpers::vertex_buffer(&device, "quad_vb", bytemuck::cast_slice(&QUAD_CORNERS));

        log::debug!(
            "[gpu] surface {}x{} format={:?} alpha={:?}",
            size.width,
            size.height,
            format,
            alpha_mode
        );
        Ok(Self {
            canvas,
            gpu: Some(Gpu {
                surface,
                device,
                queue,
                config,
                node_layout,
                lines_pipeline,
                points_pipeline,
                quad_vb,
                nodes: Vec::new(),
                alpha_modes,
                clear: wgpu::Color::TRANSPARENT,
            }),
        })
    }

    #[inline]
    pub fn canvas(&self) -> &web::HtmlCanvasElement {
        &self.canvas
    }
}

impl Gpu {
    fn set_transparent(&mut self, transparent: bool) {
        self.clear = if transparent {
            wgpu::Color::TRANSPARENT
        } else {
            wgpu::Color::BLACK
        };
        let alpha_mode = pick_alpha_mode(&self.alpha_modes, transparent);
        if alpha_mode != self.config.alpha_mode {
            self.config.alpha_mode = alpha_mode;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Upload vertex data once; the scene's topology never changes after build.
    fn upload_nodes(&mut self, scene: &SceneGraph) {
        if self.nodes.len() == scene.nodes().len() {
            return;
        }
        let nodes: Vec<NodeGpu> = scene
            .nodes()
            .iter()
            .map(|node| self.upload_node(node))
            .collect();
        self.nodes = nodes;
    }

    fn upload_node(&self, node: &Drawable) -> NodeGpu {
        let geometry = match &node.mesh {
            Mesh::Lines { positions, indices } => NodeGeometry::Lines {
                vertices: helpers::vertex_buffer(
                    &self.device,
                    "edge_vb",
                    bytemuck::cast_slice(positions),
                ),
                indices: helpers::index_buffer(&self.device, "edge_ib", indices),
                index_count: indices.len() as u32,
            },
            Mesh::Points(points) => NodeGeometry::Points {
                centers: helpers::vertex_buffer(
                    &self.device,
                    "points_vb",
                    bytemuck::cast_slice(points),
                ),
                count: points.len() as u32,
            },
        };
        let uniforms = helpers::uniform_buffer(
            &self.device,
            "node_uniforms",
            std::mem::size_of::<NodeUniforms>() as u64,
        );
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("node_bg"),
            layout: &self.node_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            }],
        });
        NodeGpu {
            geometry,
            uniforms,
            bind_group,
        }
    }

    fn acquire(&mut self) -> Result<wgpu::SurfaceTexture, RenderError> {
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(frame),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                Err(RenderError::SurfaceLost)
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(RenderError::OutOfMemory),
            Err(e) => Err(RenderError::Backend(e.to_string())),
        }
    }

    fn render(&mut self, camera: &Camera, scene: &SceneGraph) -> Result<(), RenderError> {
        self.upload_nodes(scene);
        let frame = self.acquire()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let view_m = camera.view_matrix().to_cols_array_2d();
        let proj_m = camera.projection_matrix().to_cols_array_2d();
        for (node, gpu) in scene.nodes().iter().zip(&self.nodes) {
            let m = &node.material;
            let uniforms = NodeUniforms {
                view: view_m,
                proj: proj_m,
                model: node.transform.matrix().to_cols_array_2d(),
                color: [m.color[0], m.color[1], m.color[2], m.opacity],
                params: [m.point_size, m.emissive, 0.0, 0.0],
            };
            self.queue
                .write_buffer(&gpu.uniforms, 0, bytemuck::bytes_of(&uniforms));
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            for gpu in &self.nodes {
                rpass.set_bind_group(0, &gpu.bind_group, &[]);
                match &gpu.geometry {
                    NodeGeometry::Lines {
                        vertices,
                        indices,
                        index_count,
                    } => {
                        rpass.set_pipeline(&self.lines_pipeline);
                        rpass.set_vertex_buffer(0, vertices.slice(..));
                        rpass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                        rpass.draw_indexed(0..*index_count, 0, 0..1);
                    }
                    NodeGeometry::Points { centers, count } => {
                        rpass.set_pipeline(&self.points_pipeline);
                        rpass.set_vertex_buffer(0, self.quad_vb.slice(..));
                        rpass.set_vertex_buffer(1, centers.slice(..));
                        rpass.draw(0..6, 0..*count);
                    }
                }
            }
        }
        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}

impl RenderSurface for GpuSurface {
    fn set_transparent(&mut self, transparent: bool) {
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.set_transparent(transparent);
        }
    }

    fn resize(&mut self, size: SurfaceSize) {
        dom::set_backing_size(&self.canvas, size);
        if let Some(gpu) = self.gpu.as_mut() {
            if gpu.config.width != size.width || gpu.config.height != size.height {
                gpu.config.width = size.width;
                gpu.config.height = size.height;
                gpu.surface.configure(&gpu.device, &gpu.config);
            }
        }
    }

    fn draw(&mut self, camera: &Camera, scene: &SceneGraph) -> Result<(), RenderError> {
        match self.gpu.as_mut() {
            Some(gpu) => gpu.render(camera, scene),
            None => Ok(()),
        }
    }

    fn release(&mut self) -> Result<(), RenderError> {
        if let Some(gpu) = self.gpu.take() {
            gpu.device.destroy();
            log::debug!("[gpu] device released");
        }
        Ok(())
    }

    fn detach(&mut self) -> Result<(), RenderError> {
        dom::detach_canvas(&self.canvas);
        Ok(())
    }
}

/// Premultiplied compositing for a transparent canvas, opaque otherwise,
/// falling back to whatever the surface offers first.
fn pick_alpha_mode(
    modes: &[wgpu::CompositeAlphaMode],
    transparent: bool,
) -> wgpu::CompositeAlphaMode {
    let wanted = if transparent {
        wgpu::CompositeAlphaMode::PreMultiplied
    } else {
        wgpu::CompositeAlphaMode::Opaque
    };
    modes
        .iter()
        .copied()
        .find(|m| *m == wanted)
        .or_else(|| modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}
