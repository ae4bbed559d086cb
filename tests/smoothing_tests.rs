// Host-side tests for pointer/scroll smoothing and the motion rules it feeds.

use halo_core::input::ease_toward;
use halo_core::motion::{self, icon_float, icon_wobble};
use halo_core::{
    build_background, build_icon, AnimationProfile, BackgroundParams, IconParams, InputState,
    MotionState, PointerTracker, SceneRig, ViewportState,
};

#[test]
fn smoothing_converges_monotonically_without_overshoot() {
    let tracker = PointerTracker {
        x: 800.0,
        y: -300.0,
        scroll: 0.0,
    };
    let mut input = InputState::default();
    let mut prev = (0.0f32, 0.0f32);
    for frame in 0..200 {
        input.tick(&tracker, frame as f32 / 60.0);
        let target = (input.raw_x, input.raw_y);
        let now = (input.smoothed_x, input.smoothed_y);
        assert!(now.0 >= prev.0 && now.0 <= target.0, "x overshoot at {frame}");
        assert!(now.1 <= prev.1 && now.1 >= target.1, "y overshoot at {frame}");
        prev = now;
    }
    assert!((input.smoothed_x - 0.8).abs() < 1e-4);
    assert!((input.smoothed_y + 0.3).abs() < 1e-4);
}

#[test]
fn first_tick_moves_ten_percent_toward_the_pointer() {
    let vp = ViewportState::new(1920.0, 1080.0, 1.0);
    let mut tracker = PointerTracker::default();
    tracker.set_pointer(1960.0, 540.0, &vp);
    let mut input = InputState::default();
    input.tick(&tracker, 0.016);
    assert!((input.raw_x - 1.0).abs() < 1e-6);
    assert!((input.smoothed_x - 0.1).abs() < 1e-6);
    assert_eq!(input.smoothed_y, 0.0);
}

#[test]
fn only_the_latest_pointer_sample_counts() {
    let vp = ViewportState::new(1000.0, 1000.0, 1.0);
    let mut tracker = PointerTracker::default();
    for x in [0.0, 250.0, 900.0, 600.0] {
        tracker.set_pointer(x, 500.0, &vp);
    }
    let mut input = InputState::default();
    input.tick(&tracker, 0.0);
    assert!((input.raw_x - 0.1).abs() < 1e-6);
}

#[test]
fn ease_toward_is_a_fixed_point_at_the_target() {
    assert_eq!(ease_toward(0.25, 0.25), 0.25);
    assert!((ease_toward(0.0, -1.0) + 0.1).abs() < 1e-6);
}

#[test]
fn scroll_tilts_the_particle_field() {
    let (mut scene, rig) = build_background(&BackgroundParams {
        particle_count: 8,
        ..BackgroundParams::with_seed(3)
    });
    let SceneRig::Background(bg) = rig else {
        panic!("expected background rig");
    };
    let tracker = PointerTracker {
        x: 0.0,
        y: 0.0,
        scroll: 2000.0,
    };
    let mut input = InputState::default();
    let mut state = MotionState::default();
    for frame in 0..120 {
        input.tick(&tracker, frame as f32 / 60.0);
        motion::apply(&mut scene, &rig, &input, AnimationProfile::Ambient, &mut state).unwrap();
    }
    let tilt = scene.node(bg.particles).transform.rotation.x;
    assert!(tilt > 0.19 && tilt <= 0.2 + 1e-6, "tilt {tilt}");
}

#[test]
fn icon_wobble_and_float_stay_small() {
    for i in 0..1000 {
        let t = i as f32 * 0.1;
        let w = icon_wobble(t);
        assert!(w.abs().max_element() <= 0.25 + 1e-6);
        assert!(icon_float(t).abs() <= 0.1 + 1e-6);
    }
}

#[test]
fn profile_only_changes_the_spin_slope() {
    let (mut a_scene, rig) = build_icon("three", &IconParams::default());
    let (mut b_scene, _) = build_icon("three", &IconParams::default());
    let input = InputState {
        elapsed: 3.0,
        ..InputState::default()
    };
    let mut a = MotionState::default();
    let mut b = MotionState::default();
    motion::apply(&mut a_scene, &rig, &input, AnimationProfile::Ambient, &mut a).unwrap();
    motion::apply(&mut b_scene, &rig, &input, AnimationProfile::Expanded, &mut b).unwrap();

    let ta = a_scene.nodes()[0].transform;
    let tb = b_scene.nodes()[0].transform;
    assert_eq!(ta.position, tb.position);
    assert_eq!(ta.rotation.x, tb.rotation.x);
    assert_eq!(ta.rotation.z, tb.rotation.z);
    assert!((tb.rotation.y - ta.rotation.y - 0.005).abs() < 1e-6);
}
