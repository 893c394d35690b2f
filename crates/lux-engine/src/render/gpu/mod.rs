//! wgpu implementation of [`RenderBackend`].
//!
//! Flushes append vertices to one frame-sized vertex buffer and record a
//! [`DrawCall`]. [`WgpuBackend::encode`] replays the recorded calls into a
//! single render pass once the frame's geometry is complete.

use std::collections::HashMap;
use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::paint::Color;
use crate::render::backend::{AppendCursor, DrawCall, RenderBackend};
use crate::render::error::{RenderError, RenderResult};
use crate::render::texture::{expected_rgba8_len, TextureId, TextureIdSource, TextureRef, WHITE_PIXEL};
use crate::render::vertex::{quad_indices, Vertex};
use crate::render::{RenderConfig, RenderCtx, RenderTarget};

// ── blend ─────────────────────────────────────────────────────────────────

fn alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

// ── globals uniform ───────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct GlobalsUniform {
    view_proj: [[f32; 4]; 4],
}

const GLOBALS_SIZE: u64 = std::mem::size_of::<GlobalsUniform>() as u64;
const GLOBALS_BINDING_SIZE: Option<NonZeroU64> = NonZeroU64::new(GLOBALS_SIZE);

struct GpuTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// Sprite backend over a wgpu device.
///
/// Owns the frame vertex buffer (`max_vertices * max_batches` vertices), the
/// shared 16-bit index buffer, one view-projection slot per batch, and every
/// texture it created.
pub struct WgpuBackend {
    config: RenderConfig,
    device: wgpu::Device,
    queue: wgpu::Queue,

    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,

    globals_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,

    vbo: wgpu::Buffer,
    ibo: wgpu::Buffer,
    cursor: AppendCursor,

    globals_ubo: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    globals_stride: u64,
    globals_capacity: usize,
    // view-projection written to each slot this frame
    globals: Vec<Mat4>,

    draws: Vec<(DrawCall, u32)>,
    textures: HashMap<TextureId, GpuTexture>,
    ids: TextureIdSource,
    white: TextureRef,

    warned_globals_full: bool,
    warned_missing_texture: bool,
}

impl WgpuBackend {
    /// Allocates buffers and the white texture. The pipeline is built on the
    /// first [`encode`](Self::encode) for the target's surface format.
    pub fn new(ctx: &RenderCtx<'_>, config: &RenderConfig) -> RenderResult<Self> {
        config.validate()?;
        let device = ctx.device.clone();
        let queue = ctx.queue.clone();

        let vbo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lux sprite vbo"),
            size: config.frame_vertex_capacity() * Vertex::SIZE,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let ibo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lux sprite ibo"),
            contents: bytemuck::cast_slice(&quad_indices(config.max_quads())),
            usage: wgpu::BufferUsages::INDEX,
        });

        let align = device.limits().min_uniform_buffer_offset_alignment as u64;
        let globals_stride = GLOBALS_SIZE.next_multiple_of(align.max(1));
        let globals_capacity = config.max_batches as usize;

        let globals_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lux sprite globals ubo"),
            size: globals_stride * globals_capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lux sprite globals bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: GLOBALS_BINDING_SIZE,
                },
                count: None,
            }],
        });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lux sprite globals bind group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &globals_ubo,
                    offset: 0,
                    size: GLOBALS_BINDING_SIZE,
                }),
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lux sprite texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("lux sprite sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let mut backend = Self {
            config: config.clone(),
            device,
            queue,
            pipeline_format: None,
            pipeline: None,
            globals_layout,
            texture_layout,
            sampler,
            vbo,
            ibo,
            cursor: AppendCursor::new(config.frame_vertex_capacity() * Vertex::SIZE),
            globals_ubo,
            globals_bind_group,
            globals_stride,
            globals_capacity,
            globals: Vec::with_capacity(globals_capacity),
            draws: Vec::new(),
            textures: HashMap::new(),
            ids: TextureIdSource::default(),
            white: TextureRef::default(),
            warned_globals_full: false,
            warned_missing_texture: false,
        };

        backend.white = backend.create_texture_rgba8(1, 1, &WHITE_PIXEL)?;
        log::debug!(
            "sprite backend ready: {} vertex bytes, {} globals slots of {} bytes",
            backend.cursor.capacity(),
            globals_capacity,
            globals_stride
        );
        Ok(backend)
    }

    // ── textures ──────────────────────────────────────────────────────────

    /// Uploads tightly packed RGBA8 (sRGB) pixels, rows top to bottom.
    pub fn create_texture_rgba8(
        &mut self,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> RenderResult<TextureRef> {
        if width == 0 || height == 0 {
            return Err(RenderError::EmptyTexture { width, height });
        }
        let max = self.device.limits().max_texture_dimension_2d;
        if width > max || height > max {
            return Err(RenderError::TextureTooLarge { width, height, max });
        }
        let expected = expected_rgba8_len(width, height);
        if pixels.len() != expected {
            return Err(RenderError::InvalidTextureData { expected, actual: pixels.len() });
        }

        let size = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lux sprite texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lux sprite texture bind group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let id = self.ids.next();
        self.textures.insert(id, GpuTexture { texture, bind_group });
        Ok(TextureRef::new(id, width, height))
    }

    /// Releases a texture. Visuals still pointing at it are skipped from then on.
    pub fn destroy_texture(&mut self, id: TextureId) -> RenderResult<()> {
        if id == self.white.id {
            return Err(RenderError::UnknownTexture(id));
        }
        let gpu = self.textures.remove(&id).ok_or(RenderError::UnknownTexture(id))?;
        gpu.texture.destroy();
        Ok(())
    }

    /// Draw calls recorded since the last `begin_frame`.
    pub fn draw_count(&self) -> usize {
        self.draws.len()
    }

    // ── encoding ──────────────────────────────────────────────────────────

    /// Replays this frame's draw calls into one render pass on `target`.
    ///
    /// `clear = None` loads the existing contents.
    pub fn encode(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>, clear: Option<Color>) {
        self.ensure_pipeline(ctx);

        let load = match clear {
            Some(c) => wgpu::LoadOp::Clear(wgpu::Color {
                r: c.r as f64,
                g: c.g as f64,
                b: c.b as f64,
                a: c.a as f64,
            }),
            None => wgpu::LoadOp::Load,
        };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("lux sprite pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations { load, store: wgpu::StoreOp::Store },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        if self.draws.is_empty() {
            return;
        }
        let Some(pipeline) = self.pipeline.as_ref() else { return };

        rpass.set_pipeline(pipeline);
        rpass.set_index_buffer(self.ibo.slice(..), wgpu::IndexFormat::Uint16);

        for (call, slot) in &self.draws {
            let Some(tex) = self.textures.get(&call.texture) else {
                if !self.warned_missing_texture {
                    log::warn!("draw references destroyed texture {}; skipped", call.texture);
                    self.warned_missing_texture = true;
                }
                continue;
            };

            let offset = (*slot as u64 * self.globals_stride) as u32;
            rpass.set_bind_group(0, &self.globals_bind_group, &[offset]);
            rpass.set_bind_group(1, &tex.bind_group, &[]);
            rpass.set_vertex_buffer(0, self.vbo.slice(call.vertex_offset..));
            rpass.draw_indexed(0..call.index_count, 0, 0..1);
        }
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }

        let shader = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lux sprite shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/sprite.wgsl").into()),
        });

        let layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lux sprite pipeline layout"),
            bind_group_layouts: &[&self.globals_layout, &self.texture_layout],
            immediate_size: 0,
        });

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("lux sprite pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[Vertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("sprite pipeline built for {:?}", ctx.surface_format);
        self.pipeline_format = Some(ctx.surface_format);
        self.pipeline = Some(pipeline);
    }

    /// Slot holding `view_proj` for this frame, writing a new one if needed.
    fn globals_slot(&mut self, view_proj: Mat4) -> u32 {
        if let Some(last) = self.globals.last() {
            if *last == view_proj {
                return (self.globals.len() - 1) as u32;
            }
            if self.globals.len() == self.globals_capacity {
                if !self.warned_globals_full {
                    log::warn!(
                        "camera changed more than {} times in one frame; reusing the last matrix",
                        self.globals_capacity
                    );
                    self.warned_globals_full = true;
                }
                return (self.globals.len() - 1) as u32;
            }
        }

        let slot = self.globals.len();
        let uniform = GlobalsUniform { view_proj: view_proj.to_cols_array_2d() };
        self.queue.write_buffer(
            &self.globals_ubo,
            slot as u64 * self.globals_stride,
            bytemuck::bytes_of(&uniform),
        );
        self.globals.push(view_proj);
        slot as u32
    }
}

impl RenderBackend for WgpuBackend {
    fn config(&self) -> &RenderConfig {
        &self.config
    }

    fn begin_frame(&mut self) {
        self.cursor.reset();
        self.draws.clear();
        self.globals.clear();
    }

    fn append_vertices(&mut self, vertices: &[Vertex]) -> RenderResult<u64> {
        let offset = self.cursor.reserve(vertices.len() as u64 * Vertex::SIZE)?;
        self.queue.write_buffer(&self.vbo, offset, bytemuck::cast_slice(vertices));
        Ok(offset)
    }

    fn draw(&mut self, call: DrawCall) {
        let slot = self.globals_slot(call.view_proj);
        self.draws.push((call, slot));
    }

    fn white_texture(&self) -> TextureRef {
        self.white
    }

    fn has_texture(&self, id: TextureId) -> bool {
        self.textures.contains_key(&id)
    }
}
