//! Pass Executor
//!
//! The one primitive both backends bottom out in: bind a kernel's inputs and
//! uniforms, open a render pass on the output image, draw a 3-vertex
//! fullscreen triangle. Every invocation builds its uniform buffer and bind
//! group from scratch — no binding state survives from one pass to the next,
//! so a stale texture from an earlier draw can never leak into a later one.

use wgpu::util::DeviceExt;

use crate::kernel::{BlurKernels, KernelTag, KernelUniforms};

/// One fully resolved pass, ready to encode.
pub struct PassInvocation<'a> {
    pub label: &'a str,
    pub kernel: KernelTag,
    /// Input views in kernel order. One entry for the blur kernels;
    /// `[original, blurred, depth]` for the depth blend.
    pub reads: &'a [&'a wgpu::TextureView],
    pub target: &'a wgpu::TextureView,
    pub uniforms: KernelUniforms,
}

/// Encodes a single kernel pass into `encoder`.
pub fn execute_pass(
    device: &wgpu::Device,
    encoder: &mut wgpu::CommandEncoder,
    kernels: &BlurKernels,
    invocation: &PassInvocation<'_>,
) {
    if invocation.reads.len() != invocation.kernel.input_count() {
        log::error!(
            "pass '{}' bound {} inputs, kernel {:?} expects {}; pass dropped",
            invocation.label,
            invocation.reads.len(),
            invocation.kernel,
            invocation.kernel.input_count(),
        );
        return;
    }

    let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(invocation.label),
        contents: bytemuck::bytes_of(&invocation.uniforms),
        usage: wgpu::BufferUsages::UNIFORM,
    });

    let bind_group = match invocation.kernel {
        KernelTag::DepthBlend => {
            let (original, blurred, depth) = (
                invocation.reads[0],
                invocation.reads[1],
                invocation.reads[2],
            );
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(invocation.label),
                layout: kernels.layout(invocation.kernel),
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(blurred),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(kernels.sampler()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(original),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: wgpu::BindingResource::TextureView(depth),
                    },
                ],
            })
        }
        _ => device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(invocation.label),
            layout: kernels.layout(invocation.kernel),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(invocation.reads[0]),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(kernels.sampler()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
        }),
    };

    let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(invocation.label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: invocation.target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    });

    rpass.set_pipeline(kernels.pipeline(invocation.kernel));
    rpass.set_bind_group(0, &bind_group, &[]);
    rpass.draw(0..3, 0..1);
}
