//! Settings Tests
//!
//! Every ranged parameter must clamp on write so out-of-range values can
//! never reach the kernels.

use dual_kawase::{DepthOfFieldSettings, DualKawaseSettings};

#[test]
fn defaults_match_the_documented_values() {
    let settings = DualKawaseSettings::default();
    assert_eq!(settings.blur_radius(), 1.0);
    assert_eq!(settings.iterations(), 2);
    assert_eq!(settings.downscale(), 2.0);

    let dof = settings.depth_of_field;
    assert!(dof.enabled);
    assert_eq!(dof.focus_distance(), 10.0);
    assert_eq!(dof.near_range(), 0.1);
    assert_eq!(dof.far_range(), 10.0);
}

#[test]
fn blur_radius_clamps_to_its_range() {
    let mut settings = DualKawaseSettings::default();
    settings.set_blur_radius(-3.0);
    assert_eq!(settings.blur_radius(), 0.0);
    settings.set_blur_radius(99.0);
    assert_eq!(settings.blur_radius(), 15.0);
    settings.set_blur_radius(7.25);
    assert_eq!(settings.blur_radius(), 7.25);
}

#[test]
fn iterations_clamp_to_the_slider_range() {
    let mut settings = DualKawaseSettings::default();
    settings.set_iterations(0);
    assert_eq!(settings.iterations(), 1);
    settings.set_iterations(64);
    assert_eq!(settings.iterations(), 10);
}

#[test]
fn downscale_clamps_to_its_range() {
    let mut settings = DualKawaseSettings::default();
    settings.set_downscale(0.5);
    assert_eq!(settings.downscale(), 1.0);
    settings.set_downscale(100.0);
    assert_eq!(settings.downscale(), 10.0);
}

#[test]
fn depth_of_field_ranges_clamp() {
    let mut dof = DepthOfFieldSettings::default();

    dof.set_focus_distance(0.0);
    assert_eq!(dof.focus_distance(), 0.1);
    dof.set_focus_distance(500.0);
    assert_eq!(dof.focus_distance(), 50.0);

    dof.set_near_range(0.0);
    assert_eq!(dof.near_range(), 0.1);
    dof.set_near_range(25.0);
    assert_eq!(dof.near_range(), 10.0);

    dof.set_far_range(0.0);
    assert_eq!(dof.far_range(), 0.1);
    dof.set_far_range(100.0);
    assert_eq!(dof.far_range(), 20.0);
}
