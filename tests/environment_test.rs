use cgmath::Deg;
use verseview::{
    EnvironmentState, FogSettings,
    camera::Projection,
    environment::{DEFAULT_BACKGROUND, DEFAULT_LIGHT_INTENSITY, rgb_from_hex},
};

#[test]
fn defaults_match_the_studio_look() {
    let state = EnvironmentState::default();
    assert_eq!(state.light_intensity, DEFAULT_LIGHT_INTENSITY);
    assert_eq!(state.light_intensity, 1.5);
    assert_eq!(state.background, rgb_from_hex(0x121212));
    assert_eq!(state.background, DEFAULT_BACKGROUND);
    assert!(state.fog.is_none());
    assert!(!state.show_grid);
}

#[test]
fn identical_states_produce_an_empty_delta() {
    let state = EnvironmentState {
        light_intensity: 0.7,
        background: rgb_from_hex(0x202030),
        fog: Some(FogSettings {
            color: [0.1, 0.1, 0.1],
            density: 0.02,
        }),
        show_grid: true,
    };
    assert!(state.diff(&state).is_empty());
}

#[test]
fn each_field_changes_independently() {
    let base = EnvironmentState::default();

    let mut next = base;
    next.light_intensity = 0.0;
    let delta = base.diff(&next);
    assert!(delta.light && !delta.background && !delta.fog && !delta.grid);

    let mut next = base;
    next.background = [1.0, 1.0, 1.0];
    let delta = base.diff(&next);
    assert!(!delta.light && delta.background && !delta.fog && !delta.grid);

    let mut next = base;
    next.fog = Some(FogSettings::default());
    let delta = base.diff(&next);
    assert!(!delta.light && !delta.background && delta.fog && !delta.grid);

    let mut next = base;
    next.show_grid = true;
    let delta = base.diff(&next);
    assert!(!delta.light && !delta.background && !delta.fog && delta.grid);
}

#[test]
fn fog_density_changes_are_detected() {
    let mut a = EnvironmentState::default();
    a.fog = Some(FogSettings {
        color: [0.2, 0.2, 0.2],
        density: 0.01,
    });
    let mut b = a;
    b.fog = Some(FogSettings {
        color: [0.2, 0.2, 0.2],
        density: 0.05,
    });
    assert!(a.diff(&b).fog);
}

#[test]
fn resize_with_same_dimensions_is_idempotent() {
    let mut projection = Projection::new(800, 600, Deg(60.0), 0.1, 1000.0);
    let before = projection.calc_matrix();

    projection.resize(800, 600);
    assert_eq!(projection.calc_matrix(), before);
    projection.resize(800, 600);
    assert_eq!(projection.calc_matrix(), before);
}

#[test]
fn resize_with_new_dimensions_changes_the_projection() {
    let mut projection = Projection::new(800, 600, Deg(60.0), 0.1, 1000.0);
    let before = projection.calc_matrix();

    projection.resize(1920, 1080);
    assert_ne!(projection.calc_matrix(), before);

    // and going back restores it exactly
    projection.resize(800, 600);
    assert_eq!(projection.calc_matrix(), before);
}
