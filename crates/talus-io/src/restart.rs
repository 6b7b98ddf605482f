//! Restart files.
//!
//! A restart file holds the complete state of a run as whitespace
//! separated `key value` tokens: configuration, run context, species
//! (including explicit mixed pairs), walls, particles with their contact
//! histories, and the next particle id. Floats are written with Rust's
//! shortest round-trip formatting, so reading a file back reproduces every
//! value bit for bit.
//!
//! ```text
//! talus_restart 1
//! run name box time 0.0125 step 1250 save_index 2
//! config dt 1e-5 max_time 1 gravity 0 0 -9.81 ...
//! species 1
//! species name glass density 2500 normal_model linear stiffness 2000 ...
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use talus_contact::{
    ContactHistoryRecord, GridConfig, HalfSpace, HelixBlade, Wall, WallShape,
};
use talus_solver::{Engine, EngineConfig, OutputFrame, OutputSink, Particle, RunContext, World};
use talus_species::{ContactParameters, FrictionLaw, NormalModel, Species, SpeciesTable};
use talus_types::{
    ContactTarget, ParticleId, Scalar, SpeciesId, TalusError, TalusResult, WallId,
};

use crate::text::{self, flag, quat, vec3, Tokens};

const MAGIC: &str = "talus_restart";
const VERSION: u32 = 1;

/// Everything needed to continue a run.
#[derive(Debug)]
pub struct RestartState {
    pub config: EngineConfig,
    pub context: RunContext,
    pub world: World,
}

impl RestartState {
    /// An engine that continues from this state.
    pub fn into_engine(self) -> TalusResult<Engine> {
        Engine::resume(self.config, self.world, self.context)
    }
}

// ─── Writing ─────────────────────────────────────────────────

/// Writes the state of a run to `path`.
pub fn write_restart(
    path: &Path,
    config: &EngineConfig,
    context: &RunContext,
    world: &World,
) -> TalusResult<()> {
    let mut out = text::create_file(path)?;
    write_restart_to(&mut out, config, context, world).map_err(|e| match e {
        TalusError::Io(io) => text::persistence(path, io),
        other => other,
    })?;
    out.flush().map_err(|e| text::persistence(path, e))
}

/// Writes the state of a run to any writer.
pub fn write_restart_to<W: Write>(
    out: &mut W,
    config: &EngineConfig,
    context: &RunContext,
    world: &World,
) -> TalusResult<()> {
    if context.name.is_empty() || context.name.chars().any(char::is_whitespace) {
        return Err(TalusError::InvalidConfig(format!(
            "run name '{}' must be non-empty and contain no whitespace",
            context.name
        )));
    }
    writeln!(out, "{MAGIC} {VERSION}")?;
    writeln!(
        out,
        "run name {} time {} step {} save_index {}",
        context.name, context.time, context.step, context.save_index
    )?;
    write_config(out, config)?;

    let species = world.species();
    writeln!(out, "species {}", species.len())?;
    for (_, s) in species.iter() {
        writeln!(out, "species name {} density {} {}", s.name, s.density, contact_tokens(&s.contact))?;
    }
    let explicit: Vec<_> = species.mixed_pairs().filter(|m| m.3).collect();
    writeln!(out, "mixed {}", explicit.len())?;
    for (a, b, params, _) in explicit {
        writeln!(out, "mixed a {} b {} {}", a.0, b.0, contact_tokens(params))?;
    }

    writeln!(out, "walls {}", world.walls().len())?;
    for wall in world.walls() {
        writeln!(
            out,
            "wall id {} species {} velocity {} {}",
            wall.id.0,
            wall.species.0,
            vec3(wall.velocity),
            shape_tokens(&wall.shape)
        )?;
    }

    writeln!(
        out,
        "particles {} next_id {}",
        world.particle_count(),
        world.next_particle_id().0
    )?;
    for p in world.particles() {
        writeln!(
            out,
            "particle id {} species {} fixed {} radius {} position {} velocity {} angular_velocity {} orientation {} contacts {}",
            p.id.0,
            p.species.0,
            flag(p.is_fixed()),
            p.radius(),
            vec3(p.position),
            vec3(p.velocity),
            vec3(p.angular_velocity),
            quat(p.orientation),
            p.history.len()
        )?;
        for record in p.history.iter() {
            writeln!(out, "  {}", record_tokens(record))?;
        }
    }
    Ok(())
}

fn write_config<W: Write>(out: &mut W, config: &EngineConfig) -> TalusResult<()> {
    let grid = &config.grid;
    let capacity = config
        .history_capacity
        .map_or_else(|| "none".to_string(), |c| c.to_string());
    writeln!(
        out,
        "config dt {} max_time {} gravity {} save_count {} dimension {} domain_min {} domain_max {} history_capacity {capacity}",
        config.dt,
        config.max_time,
        vec3(config.gravity),
        config.save_count,
        config.dimension,
        vec3(config.domain_min),
        vec3(config.domain_max),
    )?;
    writeln!(
        out,
        "grid number_of_buckets {} cell_over_size_ratio {} level_ratio {} min_cell_size {}",
        grid.number_of_buckets, grid.cell_over_size_ratio, grid.level_ratio, grid.min_cell_size
    )?;
    Ok(())
}

fn friction_tokens(law: &FrictionLaw) -> String {
    format!(
        "{} {} {} {}",
        law.stiffness, law.dissipation, law.friction, law.static_friction
    )
}

fn contact_tokens(c: &ContactParameters) -> String {
    let model = match c.normal_model {
        NormalModel::Linear => "linear",
        NormalModel::Hertz => "hertz",
    };
    format!(
        "normal_model {model} stiffness {} dissipation {} allow_tension {} cohesion {} sliding {} rolling {} torsion {}",
        c.stiffness,
        c.dissipation,
        flag(c.allow_tension),
        c.cohesion,
        friction_tokens(&c.sliding),
        friction_tokens(&c.rolling),
        friction_tokens(&c.torsion),
    )
}

fn shape_tokens(shape: &WallShape) -> String {
    match shape {
        WallShape::Plane { normal, offset } => {
            format!("shape plane normal {} offset {offset}", vec3(*normal))
        }
        WallShape::Polygon { faces } => {
            let mut s = format!("shape polygon faces {}", faces.len());
            for face in faces {
                s.push_str(&format!(" {} {}", vec3(face.normal), face.offset));
            }
            s
        }
        WallShape::Cylinder {
            axis_origin,
            axis,
            radius,
        } => format!(
            "shape cylinder origin {} axis {} radius {radius}",
            vec3(*axis_origin),
            vec3(*axis)
        ),
        WallShape::Helix(b) => format!(
            "shape helix origin {} axis {} length {} radius {} pitch {} thickness {} angle {} angular_velocity {}",
            vec3(b.origin),
            vec3(b.axis),
            b.length,
            b.radius,
            b.pitch,
            b.thickness,
            b.angle,
            b.angular_velocity
        ),
    }
}

fn record_tokens(r: &ContactHistoryRecord) -> String {
    let (kind, id) = match r.target {
        ContactTarget::Particle(id) => ("particle", id.0),
        ContactTarget::Wall(id) => ("wall", id.0),
    };
    format!(
        "contact target {kind} {id} tangential {} rolling {} torsion {} sliding_force {} sliding {} rolling_sliding {} torsion_sliding {} last_touched {}",
        vec3(r.tangential),
        vec3(r.rolling),
        vec3(r.torsion),
        vec3(r.sliding_force),
        flag(r.sliding),
        flag(r.rolling_sliding),
        flag(r.torsion_sliding),
        r.last_touched
    )
}

// ─── Reading ─────────────────────────────────────────────────

/// Reads a restart file.
pub fn read_restart(path: &Path) -> TalusResult<RestartState> {
    let source = text::read_text(path)?;
    parse_restart(&source)
}

/// Parses the contents of a restart file.
pub fn parse_restart(source: &str) -> TalusResult<RestartState> {
    let mut t = Tokens::new(source);
    t.expect(MAGIC)?;
    let version: u32 = t.parse("version")?;
    if version != VERSION {
        return Err(TalusError::Parse {
            token: 2,
            message: format!("unsupported restart version {version}"),
        });
    }

    t.expect("run")?;
    let context = RunContext {
        name: t.keyed::<String>("name")?,
        time: t.keyed("time")?,
        step: t.keyed("step")?,
        save_index: t.keyed("save_index")?,
    };
    let config = read_config(&mut t)?;

    let mut species = SpeciesTable::new();
    let count: usize = t.keyed("species")?;
    for _ in 0..count {
        t.expect("species")?;
        let name: String = t.keyed("name")?;
        let density: Scalar = t.keyed("density")?;
        let contact = read_contact(&mut t)?;
        species.add(Species::new(name, density, contact))?;
    }
    let count: usize = t.keyed("mixed")?;
    for _ in 0..count {
        t.expect("mixed")?;
        let a = SpeciesId(t.keyed("a")?);
        let b = SpeciesId(t.keyed("b")?);
        let contact = read_contact(&mut t)?;
        species.set_mixed(a, b, contact)?;
    }

    let mut world = World::from_config(&config, species)?;
    let count: usize = t.keyed("walls")?;
    for _ in 0..count {
        t.expect("wall")?;
        let id = WallId(t.keyed("id")?);
        let species = SpeciesId(t.keyed("species")?);
        let velocity = t.keyed_vec3("velocity")?;
        let shape = read_shape(&mut t)?;
        let mut wall = Wall::new(species, shape).with_velocity(velocity);
        wall.id = id;
        world.restore_wall(wall)?;
    }

    let count: usize = t.keyed("particles")?;
    let next_id = ParticleId(t.keyed("next_id")?);
    for _ in 0..count {
        t.expect("particle")?;
        let id = ParticleId(t.keyed("id")?);
        let species = SpeciesId(t.keyed("species")?);
        let fixed = t.keyed_flag("fixed")?;
        let radius: Scalar = t.keyed("radius")?;
        let position = t.keyed_vec3("position")?;
        let mut particle = Particle::new(species, position, radius)
            .with_velocity(t.keyed_vec3("velocity")?)
            .with_angular_velocity(t.keyed_vec3("angular_velocity")?)
            .with_fixed(fixed);
        particle.id = id;
        particle.orientation = t.keyed_quat("orientation")?;
        let contacts: usize = t.keyed("contacts")?;
        for _ in 0..contacts {
            particle.history.insert_restored(read_record(&mut t)?);
        }
        world.restore_particle(particle)?;
    }
    world.reserve_particle_ids(next_id);

    if !t.is_exhausted() {
        let extra = t.word("end of file")?;
        return Err(TalusError::Parse {
            token: 0,
            message: format!("trailing data starting at '{extra}'"),
        });
    }
    Ok(RestartState {
        config,
        context,
        world,
    })
}

fn read_config(t: &mut Tokens<'_>) -> TalusResult<EngineConfig> {
    t.expect("config")?;
    let dt = t.keyed("dt")?;
    let max_time = t.keyed("max_time")?;
    let gravity = t.keyed_vec3("gravity")?;
    let save_count = t.keyed("save_count")?;
    let dimension = t.keyed("dimension")?;
    let domain_min = t.keyed_vec3("domain_min")?;
    let domain_max = t.keyed_vec3("domain_max")?;
    t.expect("history_capacity")?;
    let history_capacity = match t.word("history_capacity")? {
        "none" => None,
        n => Some(n.parse().map_err(|_| TalusError::Parse {
            token: 0,
            message: format!("bad history capacity '{n}'"),
        })?),
    };
    t.expect("grid")?;
    let grid = GridConfig {
        number_of_buckets: t.keyed("number_of_buckets")?,
        cell_over_size_ratio: t.keyed("cell_over_size_ratio")?,
        level_ratio: t.keyed("level_ratio")?,
        min_cell_size: t.keyed("min_cell_size")?,
    };
    Ok(EngineConfig {
        dt,
        max_time,
        gravity,
        save_count,
        dimension,
        domain_min,
        domain_max,
        grid,
        history_capacity,
    })
}

fn read_friction(t: &mut Tokens<'_>, key: &str) -> TalusResult<FrictionLaw> {
    t.expect(key)?;
    Ok(FrictionLaw {
        stiffness: t.scalar(key)?,
        dissipation: t.scalar(key)?,
        friction: t.scalar(key)?,
        static_friction: t.scalar(key)?,
    })
}

fn read_contact(t: &mut Tokens<'_>) -> TalusResult<ContactParameters> {
    t.expect("normal_model")?;
    let normal_model = match t.word("normal_model")? {
        "linear" => NormalModel::Linear,
        "hertz" => NormalModel::Hertz,
        other => {
            return Err(TalusError::Parse {
                token: 0,
                message: format!("unknown normal model '{other}'"),
            })
        }
    };
    Ok(ContactParameters {
        normal_model,
        stiffness: t.keyed("stiffness")?,
        dissipation: t.keyed("dissipation")?,
        allow_tension: t.keyed_flag("allow_tension")?,
        cohesion: t.keyed("cohesion")?,
        sliding: read_friction(t, "sliding")?,
        rolling: read_friction(t, "rolling")?,
        torsion: read_friction(t, "torsion")?,
    })
}

fn read_shape(t: &mut Tokens<'_>) -> TalusResult<WallShape> {
    t.expect("shape")?;
    let shape = match t.word("shape")? {
        "plane" => WallShape::Plane {
            normal: t.keyed_vec3("normal")?,
            offset: t.keyed("offset")?,
        },
        "polygon" => {
            let count: usize = t.keyed("faces")?;
            let mut faces = Vec::with_capacity(count);
            for _ in 0..count {
                faces.push(HalfSpace {
                    normal: t.vec3("face normal")?,
                    offset: t.scalar("face offset")?,
                });
            }
            WallShape::Polygon { faces }
        }
        "cylinder" => WallShape::Cylinder {
            axis_origin: t.keyed_vec3("origin")?,
            axis: t.keyed_vec3("axis")?,
            radius: t.keyed("radius")?,
        },
        "helix" => WallShape::Helix(HelixBlade {
            origin: t.keyed_vec3("origin")?,
            axis: t.keyed_vec3("axis")?,
            length: t.keyed("length")?,
            radius: t.keyed("radius")?,
            pitch: t.keyed("pitch")?,
            thickness: t.keyed("thickness")?,
            angle: t.keyed("angle")?,
            angular_velocity: t.keyed("angular_velocity")?,
        }),
        other => {
            return Err(TalusError::Parse {
                token: 0,
                message: format!("unknown wall shape '{other}'"),
            })
        }
    };
    Ok(shape)
}

fn read_record(t: &mut Tokens<'_>) -> TalusResult<ContactHistoryRecord> {
    t.expect("contact")?;
    t.expect("target")?;
    let target = match t.word("target kind")? {
        "particle" => ContactTarget::Particle(ParticleId(t.parse("target id")?)),
        "wall" => ContactTarget::Wall(WallId(t.parse("target id")?)),
        other => {
            return Err(TalusError::Parse {
                token: 0,
                message: format!("unknown contact target '{other}'"),
            })
        }
    };
    let mut record = ContactHistoryRecord::new(target, 0.0);
    record.tangential = t.keyed_vec3("tangential")?;
    record.rolling = t.keyed_vec3("rolling")?;
    record.torsion = t.keyed_vec3("torsion")?;
    record.sliding_force = t.keyed_vec3("sliding_force")?;
    record.sliding = t.keyed_flag("sliding")?;
    record.rolling_sliding = t.keyed_flag("rolling_sliding")?;
    record.torsion_sliding = t.keyed_flag("torsion_sliding")?;
    record.last_touched = t.keyed("last_touched")?;
    Ok(record)
}

// ─── Sink ────────────────────────────────────────────────────

/// Overwrites `<directory>/<run name>.restart` at every output frame.
///
/// Boundaries, hooks and sinks are not part of the state; a resumed run
/// attaches its own.
#[derive(Debug, Clone)]
pub struct RestartWriter {
    directory: PathBuf,
    last_path: Option<PathBuf>,
}

impl RestartWriter {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            last_path: None,
        }
    }

    /// Path written by the last frame.
    pub fn last_path(&self) -> Option<&Path> {
        self.last_path.as_deref()
    }
}

impl OutputSink for RestartWriter {
    fn write(&mut self, frame: &OutputFrame<'_>) -> TalusResult<()> {
        let path = self
            .directory
            .join(format!("{}.restart", frame.context.name));
        // The frame being written owns its save index; a resumed run
        // continues with the next one.
        let context = RunContext {
            save_index: frame.context.save_index + 1,
            ..frame.context.clone()
        };
        write_restart(&path, frame.config, &context, frame.world)?;
        self.last_path = Some(path);
        Ok(())
    }

    fn name(&self) -> &str {
        "restart"
    }
}
