//! Blur Kernel Programs
//!
//! The GPU side of the pipeline as an opaque capability: four entry points in
//! one WGSL module, selected by [`KernelTag`]. The rest of the crate only
//! knows each kernel's read/write texture contract, never its internals.
//!
//! Construction is the single fallible step. The WGSL is parsed and validated
//! through naga *before* any device object is created, so a bad kernel shows
//! up as a recoverable [`BlurError`] instead of a device validation panic.

use std::borrow::Cow;

use crate::errors::{BlurError, Result};

const KERNEL_SOURCE: &str = include_str!("shaders/dual_kawase.wgsl");

// ============================================================================
// KernelTag
// ============================================================================

/// Selects one of the four kernel entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelTag {
    /// Reads one image, writes one smaller image.
    Downsample,
    /// Reads one image, writes one larger image. Also reused as a same-size
    /// resolve when depth of field is off.
    Upsample,
    /// Identity passthrough at matching size.
    Copy,
    /// Reads {original, blurred, depth}, writes the blended result.
    DepthBlend,
}

impl KernelTag {
    /// Stable pass index of this kernel within the program.
    #[inline]
    #[must_use]
    pub fn pass_index(self) -> u32 {
        match self {
            Self::Downsample => 0,
            Self::Upsample => 1,
            Self::Copy => 2,
            Self::DepthBlend => 3,
        }
    }

    /// Fragment entry point name.
    #[must_use]
    pub fn entry_point(self) -> &'static str {
        match self {
            Self::Downsample => "fs_downsample",
            Self::Upsample => "fs_upsample",
            Self::Copy => "fs_copy",
            Self::DepthBlend => "fs_depth_blend",
        }
    }

    /// Number of input images the kernel samples.
    #[inline]
    #[must_use]
    pub fn input_count(self) -> usize {
        match self {
            Self::DepthBlend => 3,
            _ => 1,
        }
    }
}

// ============================================================================
// KernelUniforms
// ============================================================================

/// Uniform block shared by all four entry points.
///
/// Layout matches `struct KernelUniforms` in the WGSL module: two vec4s
/// followed by four scalars, 48 bytes, no implicit padding.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct KernelUniforms {
    /// Blit UV transform: xy = scale, zw = bias.
    pub scale_bias: [f32; 4],
    /// Depth linearization constants: (near, far, far − near, 1 / far).
    pub camera_params: [f32; 4],
    /// Sampling offset scale for the blur taps.
    pub offset: f32,
    /// Focus plane distance (depth blend only).
    pub focus_distance: f32,
    /// Sharp zone in front of the focus plane (depth blend only).
    pub near_range: f32,
    /// Falloff behind the focus plane (depth blend only).
    pub far_range: f32,
}

impl Default for KernelUniforms {
    fn default() -> Self {
        Self {
            scale_bias: [1.0, 1.0, 0.0, 0.0],
            camera_params: [0.0; 4],
            offset: 0.0,
            focus_distance: 0.0,
            near_range: 0.0,
            far_range: 0.0,
        }
    }
}

impl KernelUniforms {
    /// Uniforms for a downsample/upsample/copy pass at full-image blit.
    #[must_use]
    pub fn for_blur(offset: f32) -> Self {
        Self {
            offset,
            ..Default::default()
        }
    }
}

// ============================================================================
// BlurKernels
// ============================================================================

/// The compiled kernel program: sampler, bind group layouts and the four
/// render pipelines, indexed by [`KernelTag::pass_index`].
pub struct BlurKernels {
    sampler: wgpu::Sampler,
    blur_layout: wgpu::BindGroupLayout,
    blend_layout: wgpu::BindGroupLayout,
    pipelines: [wgpu::RenderPipeline; 4],
}

impl BlurKernels {
    /// Validates and compiles the kernel module and builds all four
    /// pipelines targeting `color_format`.
    pub fn new(device: &wgpu::Device, color_format: wgpu::TextureFormat) -> Result<Self> {
        validate_kernel_source(KERNEL_SOURCE)?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Dual Kawase Kernels"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(KERNEL_SOURCE)),
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Dual Kawase Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let blur_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Dual Kawase Blur Layout"),
            entries: &[
                // Binding 0: Source texture
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
                // Binding 1: Sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                // Binding 2: Uniforms (the vertex stage reads the blit scale-bias)
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let blend_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Dual Kawase Depth Blend Layout"),
            entries: &[
                // Binding 0: Blurred texture
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
                // Binding 1: Sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                // Binding 2: Uniforms
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Binding 3: Original (sharp) texture
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // Binding 4: Scene depth
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });

        let build = |tag: KernelTag, layout: &wgpu::BindGroupLayout| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(tag.entry_point()),
                layout: Some(
                    &device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                        label: Some("Dual Kawase Pipeline Layout"),
                        bind_group_layouts: &[Some(layout)],
                        immediate_size: 0,
                    }),
                ),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_fullscreen"),
                    buffers: &[],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(tag.entry_point()),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: color_format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        };

        let pipelines = [
            build(KernelTag::Downsample, &blur_layout),
            build(KernelTag::Upsample, &blur_layout),
            build(KernelTag::Copy, &blur_layout),
            build(KernelTag::DepthBlend, &blend_layout),
        ];

        Ok(Self {
            sampler,
            blur_layout,
            blend_layout,
            pipelines,
        })
    }

    /// The render pipeline for a kernel.
    #[inline]
    #[must_use]
    pub fn pipeline(&self, tag: KernelTag) -> &wgpu::RenderPipeline {
        &self.pipelines[tag.pass_index() as usize]
    }

    /// The bind group layout a kernel's bindings must follow.
    #[inline]
    #[must_use]
    pub fn layout(&self, tag: KernelTag) -> &wgpu::BindGroupLayout {
        match tag {
            KernelTag::DepthBlend => &self.blend_layout,
            _ => &self.blur_layout,
        }
    }

    /// The shared clamp-to-edge linear sampler.
    #[inline]
    #[must_use]
    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }
}

/// Parses and validates a WGSL kernel module without touching the device.
pub fn validate_kernel_source(source: &str) -> Result<()> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| BlurError::KernelParse(e.to_string()))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| BlurError::KernelValidation(format!("{e:?}")))?;

    Ok(())
}
