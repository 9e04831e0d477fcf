//! Pass Sequencer Tests
//!
//! Drives the sequencer against a recording backend double and checks the
//! emitted allocation / pass / release stream:
//! - Full pyramid structure for a 1920×1080 frame (direct resolve)
//! - Depth-of-field variant (copy-original pre-pass + fused blend)
//! - Single-iteration edge case (no upsample phase)
//! - Release ordering (final up output released last, after the resolve)
//! - Frame skip guards (camera kind, missing color target, inert feature)

use dual_kawase::backend::{FrameGraph, LevelDesc, PassBackend, PassDesc};
use dual_kawase::kernel::{KernelTag, KernelUniforms};
use dual_kawase::sequencer::{DualKawaseBlur, sequence};
use dual_kawase::{CameraKind, DualKawaseSettings, FrameCamera, FrameDesc};

// ============================================================================
// Recording backend double
// ============================================================================

const COLOR: u32 = 900;
const DEPTH: u32 = 901;

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Allocate {
        handle: u32,
        label: &'static str,
        width: u32,
        height: u32,
    },
    Pass {
        label: &'static str,
        kernel: KernelTag,
        reads: Vec<u32>,
        write: u32,
        uniforms: KernelUniforms,
    },
    Release {
        handle: u32,
    },
}

struct RecordingBackend {
    has_color: bool,
    has_depth: bool,
    next_handle: u32,
    events: Vec<Event>,
}

impl RecordingBackend {
    fn new(has_color: bool, has_depth: bool) -> Self {
        Self {
            has_color,
            has_depth,
            next_handle: 0,
            events: Vec::new(),
        }
    }

    fn passes(&self) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Pass { .. }))
            .collect()
    }

    fn position(&self, wanted: &Event) -> usize {
        self.events
            .iter()
            .position(|e| e == wanted)
            .expect("event not recorded")
    }
}

impl PassBackend for RecordingBackend {
    type Handle = u32;

    fn color_target(&self) -> Option<u32> {
        self.has_color.then_some(COLOR)
    }

    fn scene_depth(&self) -> Option<u32> {
        self.has_depth.then_some(DEPTH)
    }

    fn allocate(&mut self, desc: &LevelDesc) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.events.push(Event::Allocate {
            handle,
            label: desc.label,
            width: desc.width,
            height: desc.height,
        });
        handle
    }

    fn issue(&mut self, pass: PassDesc<u32>) {
        self.events.push(Event::Pass {
            label: pass.label,
            kernel: pass.kernel,
            reads: pass.reads.to_vec(),
            write: pass.write,
            uniforms: pass.uniforms,
        });
    }

    fn release(&mut self, handle: u32) {
        self.events.push(Event::Release { handle });
    }
}

fn settings(iterations: u32, downscale: f32, depth_of_field: bool) -> DualKawaseSettings {
    let mut settings = DualKawaseSettings::default();
    settings.set_iterations(iterations);
    settings.set_downscale(downscale);
    settings.depth_of_field.enabled = depth_of_field;
    settings
}

fn game_frame(width: u32, height: u32) -> FrameDesc {
    FrameDesc::new(width, height, FrameCamera::new(0.1, 10.0))
}

fn pass_structure(event: &Event) -> (KernelTag, Vec<u32>, u32) {
    match event {
        Event::Pass {
            kernel,
            reads,
            write,
            ..
        } => (*kernel, reads.clone(), *write),
        other => panic!("expected a pass, got {other:?}"),
    }
}

// ============================================================================
// Direct Resolve Scenario (1920×1080, downscale 2, 3 iterations)
// ============================================================================

#[test]
fn full_hd_three_iterations_direct_resolve() {
    let mut backend = RecordingBackend::new(true, false);
    sequence(&settings(3, 2.0, false), &game_frame(1920, 1080), &mut backend);

    // Allocation order: down0, up0, down1, up1, down2.
    let expected_allocs = [
        (0, "blur_mip_down_0", 960, 540),
        (1, "blur_mip_up_0", 960, 540),
        (2, "blur_mip_down_1", 480, 270),
        (3, "blur_mip_up_1", 480, 270),
        (4, "blur_mip_down_2", 240, 135),
    ];
    let allocs: Vec<&Event> = backend
        .events
        .iter()
        .filter(|e| matches!(e, Event::Allocate { .. }))
        .collect();
    assert_eq!(allocs.len(), expected_allocs.len());
    for (event, (handle, label, width, height)) in allocs.iter().zip(expected_allocs) {
        assert_eq!(
            **event,
            Event::Allocate {
                handle,
                label,
                width,
                height
            }
        );
    }

    let passes = backend.passes();
    assert_eq!(passes.len(), 6);
    assert_eq!(
        pass_structure(passes[0]),
        (KernelTag::Downsample, vec![COLOR], 0)
    );
    assert_eq!(pass_structure(passes[1]), (KernelTag::Downsample, vec![0], 2));
    assert_eq!(pass_structure(passes[2]), (KernelTag::Downsample, vec![2], 4));
    assert_eq!(pass_structure(passes[3]), (KernelTag::Upsample, vec![4], 3));
    assert_eq!(pass_structure(passes[4]), (KernelTag::Upsample, vec![3], 1));
    // The resolve reuses the upsample kernel to write the color target in place.
    assert_eq!(
        pass_structure(passes[5]),
        (KernelTag::Upsample, vec![1], COLOR)
    );
}

#[test]
fn blur_radius_reaches_every_blur_pass() {
    let mut config = settings(2, 2.0, false);
    config.set_blur_radius(4.5);
    let mut backend = RecordingBackend::new(true, false);
    sequence(&config, &game_frame(640, 480), &mut backend);

    for pass in backend.passes() {
        let Event::Pass { uniforms, .. } = pass else {
            unreachable!()
        };
        assert_eq!(uniforms.offset, 4.5);
    }
}

// ============================================================================
// Depth-of-Field Scenario
// ============================================================================

#[test]
fn depth_of_field_adds_copy_and_fused_blend() {
    let mut backend = RecordingBackend::new(true, true);
    sequence(&settings(3, 2.0, true), &game_frame(1920, 1080), &mut backend);

    let passes = backend.passes();
    assert_eq!(passes.len(), 7);

    // The pristine copy runs before any downsample touches the color image.
    let Event::Pass { kernel, reads, write, .. } = passes[0] else {
        unreachable!()
    };
    assert_eq!(*kernel, KernelTag::Copy);
    assert_eq!(reads, &vec![COLOR]);
    let original = *write;
    let Event::Allocate { label, width, height, .. } = &backend.events[0] else {
        panic!("first event should allocate the original copy");
    };
    assert_eq!(*label, "blur_original");
    assert_eq!((*width, *height), (1920, 1080));

    // Final pass: fused blend of {original, blurred, depth} into the target.
    let Event::Pass { kernel, reads, write, uniforms, .. } = passes[6] else {
        unreachable!()
    };
    assert_eq!(*kernel, KernelTag::DepthBlend);
    assert_eq!(*write, COLOR);
    assert_eq!(reads.len(), 3);
    assert_eq!(reads[0], original);
    assert_eq!(reads[2], DEPTH);
    // reads[1] is the final up output: written by the last upsample pass.
    let (_, _, final_up) = pass_structure(passes[5]);
    assert_eq!(reads[1], final_up);

    // Camera linearization constants: (near, far, far − near, 1 / far).
    assert_eq!(
        uniforms.camera_params,
        [0.1, 10.0, 10.0 - 0.1, 1.0 / 10.0]
    );
    assert_eq!(uniforms.focus_distance, 10.0);
    assert_eq!(uniforms.near_range, 0.1);
    assert_eq!(uniforms.far_range, 10.0);
}

#[test]
fn depth_of_field_without_depth_image_falls_back_to_direct_resolve() {
    let mut backend = RecordingBackend::new(true, false);
    sequence(&settings(2, 2.0, true), &game_frame(1280, 720), &mut backend);

    let passes = backend.passes();
    let (kernel, _, write) = pass_structure(passes[passes.len() - 1]);
    assert_eq!(kernel, KernelTag::Upsample);
    assert_eq!(write, COLOR);
    assert!(
        !passes
            .iter()
            .any(|p| matches!(p, Event::Pass { kernel: KernelTag::Copy | KernelTag::DepthBlend, .. })),
        "no copy or blend pass without a depth image"
    );
}

// ============================================================================
// Single Iteration
// ============================================================================

#[test]
fn single_iteration_has_no_upsample_phase() {
    let mut backend = RecordingBackend::new(true, false);
    sequence(&settings(1, 2.0, false), &game_frame(1920, 1080), &mut backend);

    let passes = backend.passes();
    assert_eq!(passes.len(), 2);
    assert_eq!(
        pass_structure(passes[0]),
        (KernelTag::Downsample, vec![COLOR], 0)
    );
    // The resolve consumes the single down level directly.
    assert_eq!(
        pass_structure(passes[1]),
        (KernelTag::Upsample, vec![0], COLOR)
    );
}

#[test]
fn tiny_source_at_high_iteration_count_clamps_every_level() {
    let mut backend = RecordingBackend::new(true, false);
    sequence(&settings(10, 1.0, false), &game_frame(1, 1), &mut backend);

    for event in &backend.events {
        if let Event::Allocate { width, height, .. } = event {
            assert_eq!((*width, *height), (1, 1));
        }
    }
    assert_eq!(backend.passes().len(), 10 + 9 + 1);
}

// ============================================================================
// Resource Lifetime
// ============================================================================

#[test]
fn every_level_is_written_once_and_read_at_most_once() {
    let mut backend = RecordingBackend::new(true, true);
    sequence(&settings(4, 2.0, true), &game_frame(1920, 1080), &mut backend);

    let mut writes: Vec<u32> = Vec::new();
    let mut reads: Vec<u32> = Vec::new();
    for pass in backend.passes() {
        let Event::Pass { reads: r, write, .. } = pass else {
            unreachable!()
        };
        writes.push(*write);
        reads.extend(r.iter().copied());
    }

    for event in &backend.events {
        let Event::Allocate { handle, .. } = event else {
            continue;
        };
        assert_eq!(
            writes.iter().filter(|w| *w == handle).count(),
            1,
            "level {handle} must have exactly one writer"
        );
        assert!(
            reads.iter().filter(|r| *r == handle).count() <= 1,
            "level {handle} must have at most one reader"
        );
    }
}

#[test]
fn every_allocation_is_released_exactly_once() {
    let mut backend = RecordingBackend::new(true, true);
    sequence(&settings(3, 2.0, true), &game_frame(1920, 1080), &mut backend);

    let allocated: Vec<u32> = backend
        .events
        .iter()
        .filter_map(|e| match e {
            Event::Allocate { handle, .. } => Some(*handle),
            _ => None,
        })
        .collect();
    for handle in allocated {
        let releases = backend
            .events
            .iter()
            .filter(|e| **e == Event::Release { handle })
            .count();
        assert_eq!(releases, 1, "level {handle} released exactly once");
    }
    // Imported frame targets are never released by the sequencer.
    assert!(!backend.events.contains(&Event::Release { handle: COLOR }));
    assert!(!backend.events.contains(&Event::Release { handle: DEPTH }));
}

#[test]
fn final_up_output_is_released_last_and_only_after_the_resolve() {
    let mut backend = RecordingBackend::new(true, false);
    sequence(&settings(3, 2.0, false), &game_frame(1920, 1080), &mut backend);

    let passes = backend.passes();
    let (_, resolve_reads, _) = pass_structure(passes[passes.len() - 1]);
    let final_up = resolve_reads[0];

    let resolve_pos = backend.position(passes[passes.len() - 1]);
    let release_pos = backend.position(&Event::Release { handle: final_up });
    assert!(
        release_pos > resolve_pos,
        "the resolve input must not be recycled before the resolve runs"
    );

    let last_event = backend.events.last().expect("events recorded");
    assert_eq!(*last_event, Event::Release { handle: final_up });
}

// ============================================================================
// Frame Skip Guards
// ============================================================================

#[test]
fn non_game_cameras_are_skipped() {
    for kind in [CameraKind::SceneView, CameraKind::Preview] {
        let frame = FrameDesc::new(
            1920,
            1080,
            FrameCamera::new(0.1, 100.0).with_kind(kind),
        );
        let mut backend = RecordingBackend::new(true, true);
        sequence(&settings(3, 2.0, true), &frame, &mut backend);
        assert!(
            backend.events.is_empty(),
            "{kind:?} frames must pass through untouched"
        );
    }
}

#[test]
fn missing_color_target_skips_the_frame() {
    let mut backend = RecordingBackend::new(false, true);
    sequence(&settings(3, 2.0, true), &game_frame(1920, 1080), &mut backend);
    assert!(backend.events.is_empty());
}

#[test]
fn inert_feature_records_nothing() {
    let feature = DualKawaseBlur::inert(settings(3, 2.0, true));
    assert!(!feature.is_active());
    assert!(feature.kernels().is_none());

    let mut graph = FrameGraph::new();
    graph.import_color();
    graph.import_depth();
    feature.record(&game_frame(1920, 1080), &mut graph);
    assert_eq!(graph.pass_count(), 0);
}
