//! Integration tests for talus-species.

use talus_species::calibration::{collision_time, harmonic_mean_mass, restitution};
use talus_species::{ContactParameters, FrictionLaw, NormalModel, Species, SpeciesTable};
use talus_types::SpeciesId;

fn test_species(name: &str, stiffness: f64, mu: f64) -> Species {
    Species::new(
        name,
        2000.0,
        ContactParameters {
            stiffness,
            dissipation: 0.01,
            sliding: FrictionLaw::new(stiffness * 2.0 / 7.0, 0.0, mu),
            ..ContactParameters::default()
        },
    )
}

// ─── Species Setter Tests ─────────────────────────────────────

#[test]
fn valid_setter_applies() {
    let mut s = test_species("a", 100.0, 0.5);
    assert!(s.set_density(1500.0));
    assert_eq!(s.density, 1500.0);
    assert!(s.set_sliding_friction(0.2));
    assert_eq!(s.contact.sliding.friction, 0.2);
    assert_eq!(s.contact.sliding.static_friction, 0.2);
}

#[test]
fn invalid_setter_keeps_previous_value() {
    let mut s = test_species("a", 100.0, 0.5);
    assert!(!s.set_density(-1.0));
    assert_eq!(s.density, 2000.0);
    assert!(!s.set_stiffness(0.0));
    assert_eq!(s.contact.stiffness, 100.0);
    assert!(!s.set_dissipation(f64::NAN));
    assert_eq!(s.contact.dissipation, 0.01);
    assert!(!s.set_rolling_friction(-0.1));
    assert_eq!(s.contact.rolling.friction, 0.0);
}

#[test]
fn collision_time_calibration() {
    let mut s = test_species("a", 100.0, 0.5);
    let mass = s.particle_mass(0.001, 3);
    assert!(s.set_collision_time_and_restitution(2.5e-3, 0.8, mass));
    let tc = s.collision_time(mass).unwrap();
    assert!((tc - 2.5e-3).abs() / 2.5e-3 < 1e-12);
    assert!((s.restitution(mass) - 0.8).abs() < 1e-12);
}

#[test]
fn calibration_rejects_restitution_above_one() {
    let mut s = test_species("a", 100.0, 0.5);
    assert!(!s.set_collision_time_and_restitution(1e-3, 1.5, 1.0));
    assert_eq!(s.contact.stiffness, 100.0);
}

#[test]
fn particle_mass_by_dimension() {
    let s = test_species("a", 100.0, 0.5);
    let m3 = s.particle_mass(0.5, 3);
    let m2 = s.particle_mass(0.5, 2);
    assert!((m3 - 4.0 / 3.0 * std::f64::consts::PI * 0.125 * 2000.0).abs() < 1e-9);
    assert!((m2 - std::f64::consts::PI * 0.25 * 2000.0).abs() < 1e-9);
}

#[test]
fn validation_rejects_whitespace_names() {
    let s = test_species("wet sand", 100.0, 0.5);
    assert!(s.validate().is_err());
}

#[test]
fn validation_rejects_dynamic_above_static() {
    let mut s = test_species("a", 100.0, 0.5);
    s.contact.sliding.friction = 0.6;
    assert!(s.validate().is_err());
}

// ─── Calibration Tests ────────────────────────────────────────

#[test]
fn restitution_is_one_without_dissipation() {
    assert!((restitution(10.0, 0.0, 1.0) - 1.0).abs() < 1e-15);
    assert!(collision_time(10.0, 0.0, 1.0).is_some());
}

#[test]
fn harmonic_mean_of_unequal_masses() {
    assert!((harmonic_mean_mass(1.0, 3.0) - 1.5).abs() < 1e-15);
}

// ─── SpeciesTable Tests ───────────────────────────────────────

#[test]
fn default_table_has_presets() {
    let table = SpeciesTable::with_defaults();
    assert_eq!(table.len(), 4);
    assert!(table.by_name("glass").is_some());
    assert!(table.by_name("unobtainium").is_none());
}

#[test]
fn same_species_pair_uses_own_parameters() {
    let mut table = SpeciesTable::new();
    let a = table.add(test_species("a", 100.0, 0.5)).unwrap();
    assert_eq!(table.pair(a, a).stiffness, 100.0);
}

#[test]
fn mixed_pair_defaults_to_mean() {
    let mut table = SpeciesTable::new();
    let a = table.add(test_species("a", 100.0, 0.2)).unwrap();
    let b = table.add(test_species("b", 300.0, 0.6)).unwrap();
    let ab = table.pair(a, b);
    assert!((ab.stiffness - 200.0).abs() < 1e-12);
    assert!((ab.sliding.friction - 0.4).abs() < 1e-12);
    // Symmetric lookup.
    assert_eq!(table.pair(b, a), ab);
}

#[test]
fn mixed_pair_override() {
    let mut table = SpeciesTable::new();
    let a = table.add(test_species("a", 100.0, 0.2)).unwrap();
    let b = table.add(test_species("b", 300.0, 0.6)).unwrap();
    let c = table.add(test_species("c", 500.0, 0.1)).unwrap();
    let custom = ContactParameters {
        stiffness: 42.0,
        ..ContactParameters::default()
    };
    table.set_mixed(c, a, custom).unwrap();
    assert_eq!(table.pair(a, c).stiffness, 42.0);
    assert!((table.pair(b, c).stiffness - 400.0).abs() < 1e-12);

    let overridden: Vec<_> = table
        .mixed_pairs()
        .filter(|(_, _, _, o)| *o)
        .map(|(x, y, _, _)| (x, y))
        .collect();
    assert_eq!(overridden, vec![(SpeciesId(2), SpeciesId(0))]);
}

#[test]
fn set_mixed_rejects_same_species() {
    let mut table = SpeciesTable::new();
    let a = table.add(test_species("a", 100.0, 0.2)).unwrap();
    assert!(table.set_mixed(a, a, ContactParameters::default()).is_err());
}

#[test]
fn duplicate_names_rejected() {
    let mut table = SpeciesTable::new();
    table.add(test_species("a", 100.0, 0.2)).unwrap();
    assert!(table.add(test_species("a", 200.0, 0.2)).is_err());
}

#[test]
fn mixing_linear_with_hertz_falls_back_to_linear() {
    let mut hertz = test_species("h", 1e7, 0.3);
    hertz.contact.normal_model = NormalModel::Hertz;
    let linear = test_species("l", 100.0, 0.3);
    let mixed = ContactParameters::mixed(&hertz.contact, &linear.contact);
    assert_eq!(mixed.normal_model, NormalModel::Linear);
}

// ─── Serialization Tests ──────────────────────────────────────

#[test]
fn species_toml_round_trip() {
    let s = test_species("glass", 2000.0, 0.3);
    let text = toml::to_string(&s).unwrap();
    let recovered: Species = toml::from_str(&text).unwrap();
    assert_eq!(recovered, s);
}

#[test]
fn species_json_defaults_optional_fields() {
    let json = r#"{
        "name": "x", "density": 1000.0,
        "contact": {
            "normal_model": "hertz", "stiffness": 1e7, "dissipation": 0.0,
            "sliding": {"stiffness": 0.0, "dissipation": 0.0, "friction": 0.0, "static_friction": 0.0},
            "rolling": {"stiffness": 0.0, "dissipation": 0.0, "friction": 0.0, "static_friction": 0.0},
            "torsion": {"stiffness": 0.0, "dissipation": 0.0, "friction": 0.0, "static_friction": 0.0}
        }
    }"#;
    let s: Species = serde_json::from_str(json).unwrap();
    assert_eq!(s.contact.normal_model, NormalModel::Hertz);
    assert!(!s.contact.allow_tension);
    assert_eq!(s.contact.cohesion, 0.0);
}
