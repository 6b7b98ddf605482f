//! Integration tests for talus-types.

use talus_types::{ContactTarget, ParticleId, SpeciesId, TalusError, WallId};

// ─── ID Tests ──────────────────────────────────────────────────

#[test]
fn particle_id_index() {
    let id = ParticleId(42);
    assert_eq!(id.index(), 42);
}

#[test]
fn wall_and_species_index() {
    assert_eq!(WallId(7).index(), 7);
    assert_eq!(SpeciesId(3).index(), 3);
}

#[test]
fn particle_ids_are_ordered() {
    assert!(ParticleId(1) < ParticleId(2));
    assert_eq!(ParticleId(5).max(ParticleId(3)), ParticleId(5));
}

#[test]
fn ids_are_serializable() {
    let id = ParticleId(100);
    let json = serde_json::to_string(&id).unwrap();
    let deserialized: ParticleId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, deserialized);
}

// ─── Contact Target Tests ─────────────────────────────────────

#[test]
fn contact_target_distinguishes_kinds() {
    let p = ContactTarget::Particle(ParticleId(4));
    let w = ContactTarget::Wall(WallId(4));
    assert_ne!(p, w);
    assert!(!p.is_wall());
    assert!(w.is_wall());
    assert_eq!(p.raw_id(), w.raw_id());
}

#[test]
fn contact_target_display() {
    assert_eq!(ContactTarget::Particle(ParticleId(9)).to_string(), "particle 9");
    assert_eq!(ContactTarget::Wall(WallId(2)).to_string(), "wall 2");
}

#[test]
fn contact_target_serialization() {
    let target = ContactTarget::Wall(WallId(11));
    let json = serde_json::to_string(&target).unwrap();
    let recovered: ContactTarget = serde_json::from_str(&json).unwrap();
    assert_eq!(recovered, target);
}

// ─── Error Tests ──────────────────────────────────────────────

#[test]
fn error_display() {
    let err = TalusError::InvalidParticle("radius -1 must be positive".into());
    assert!(err.to_string().contains("radius -1"));
}

#[test]
fn persistence_error_display() {
    let err = TalusError::Persistence {
        path: "out/run.data".into(),
        message: "permission denied".into(),
    };
    let msg = err.to_string();
    assert!(msg.contains("out/run.data"));
    assert!(msg.contains("permission denied"));
}

#[test]
fn io_error_converts() {
    fn fails() -> talus_types::TalusResult<()> {
        Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"))?;
        Ok(())
    }
    assert!(matches!(fails(), Err(TalusError::Io(_))));
}
