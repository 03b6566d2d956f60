//! # Config Loader Boundary Test
//!
//! Templates arrive as serde data. TOML stands in for whatever format the
//! host application loads them from.

use ember_particles::config::{DEFAULT_EMISSION_RATE, DEFAULT_LIFE};
use ember_particles::{
    BlendMode, Color4F, EmitterConfig, EmitterMode, NullRenderer, ParticleError, ParticleSystem, PositionType,
    VarianceRng, Vec2, DEFAULT_CAPACITY,
};

const FIRE: &str = r#"
capacity = 64
emission_rate = 30.0
duration = 1.5
life = 0.8
life_var = 0.2
angle = 90.0
angle_var = 15.0
start_size = 12.0
end_size = 2.0
blend_additive = true
auto_remove_on_finish = true
position_type = "relative"
start_color = { r = 1.0, g = 0.7, b = 0.2, a = 1.0 }
end_color = { r = 0.8, g = 0.1, b = 0.0, a = 0.0 }

[gravity]
gravity = { x = 0.0, y = 40.0 }
speed = 60.0
speed_var = 10.0
"#;

const VORTEX: &str = r#"
mode = "radius"
position_type = "grouped"
texture = { id = 9, premultiplied_alpha = true }

[radius]
start_radius = 20.0
end_radius = 0.0
rotate_per_second = -180.0
"#;

fn parse(source: &str) -> EmitterConfig {
    toml::from_str(source).expect("template should parse")
}

/// Test: A full template loads and drives an emitter.
#[test]
fn test_fire_template() {
    let config = parse(FIRE);
    assert_eq!(config.capacity, Some(64));
    assert_eq!(config.duration, Some(1.5));
    assert_eq!(config.end_size, Some(2.0));
    assert_eq!(config.position_type, PositionType::Relative);
    assert_eq!(config.gravity.gravity, Vec2::new(0.0, 40.0));
    assert_eq!(config.end_color, Color4F::new(0.8, 0.1, 0.0, 0.0));

    let mut system = ParticleSystem::from_config(config, VarianceRng::seed_from_u64(1)).unwrap();
    assert_eq!(system.capacity(), 64);
    assert_eq!(system.blend_mode(), BlendMode::Additive);

    system.start_system();
    let report = system.update(0.5, &mut NullRenderer).unwrap();
    assert_eq!(report.spawned, 15);
}

/// Test: A partial template falls back to defaults for everything else.
#[test]
fn test_partial_template_uses_defaults() {
    let config = parse(VORTEX);
    assert_eq!(config.mode, EmitterMode::Radius);
    assert_eq!(config.capacity, None);
    assert_eq!(config.emission_rate, DEFAULT_EMISSION_RATE);
    assert_eq!(config.life, DEFAULT_LIFE);
    assert_eq!(config.duration, None);
    assert_eq!(config.radius.end_radius, Some(0.0));
    assert_eq!(config.radius.start_radius_var, 0.0);

    let system = ParticleSystem::from_config(config, VarianceRng::seed_from_u64(2)).unwrap();
    assert_eq!(system.capacity(), DEFAULT_CAPACITY);
    assert_eq!(system.blend_mode(), BlendMode::Premultiplied);
    assert!(system.opacity_modify_rgb());
}

/// Test: Applying a template without a capacity keeps the current storage.
#[test]
fn test_apply_without_capacity_keeps_storage() {
    let mut system = ParticleSystem::with_seed(12, 3).unwrap();
    system.add_particle().unwrap();
    system.apply_config(parse(VORTEX)).unwrap();
    assert_eq!(system.capacity(), 12);
    assert_eq!(system.particle_count(), 1);
    assert_eq!(system.config().capacity, Some(12));
}

/// Test: An invalid template is rejected whole and the emitter is untouched.
#[test]
fn test_invalid_template_rejected() {
    let mut system = ParticleSystem::with_seed(8, 4).unwrap();
    let before = system.config().clone();

    let config = parse("capacity = 32\nlife = 0.0\n");
    assert!(matches!(
        system.apply_config(config),
        Err(ParticleError::InvalidTemplate { parameter: "life", .. })
    ));

    let config = parse("capacity = -5\n");
    assert!(matches!(
        system.apply_config(config),
        Err(ParticleError::InvalidTemplate {
            parameter: "capacity",
            ..
        })
    ));

    let config = parse("capacity = 5000000\n");
    assert!(matches!(
        system.apply_config(config),
        Err(ParticleError::CapacityTooLarge { .. })
    ));

    assert_eq!(system.config(), &before);
    assert_eq!(system.capacity(), 8);
}

/// Test: Unknown enum names are a loader error, not an engine one.
#[test]
fn test_unknown_mode_is_a_parse_error() {
    assert!(toml::from_str::<EmitterConfig>("mode = \"spiral\"\n").is_err());
}
