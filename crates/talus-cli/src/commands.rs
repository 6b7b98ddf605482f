//! CLI command implementations.

use std::path::Path;

use talus_bench::metrics::BenchmarkMetrics;
use talus_bench::runner::BenchmarkRunner;
use talus_bench::scenarios::{Scenario, ScenarioKind};
use talus_io::{build_engine, read_data_frames, read_restart, validate_input, SimulationInput, StateSnapshot};
use talus_solver::EngineConfig;
use talus_telemetry::{ConsoleSink, EventBus};

/// Run a simulation from an input file.
pub fn simulate(config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("Talus Simulation");
    println!("────────────────");
    println!("Input: {config_path}");

    let content = std::fs::read_to_string(config_path)?;
    let input = SimulationInput::from_toml(&content)?;
    let mut engine = build_engine(&input)?;
    engine.attach_bus(EventBus::new().with_sink(Box::new(ConsoleSink::new())));

    println!("Run:       {}", input.name);
    println!("Particles: {}", engine.world().particle_count());
    println!("Walls:     {}", engine.world().walls().len());
    println!("Timestep:  {:.3e} s", engine.config().dt);
    println!("Duration:  {:.4} s", engine.config().max_time);
    println!("Output:    {}", input.output.directory.display());
    println!();

    let summary = engine.run()?;

    println!();
    println!("Steps:     {}", summary.steps);
    println!("Sim time:  {:.6} s", summary.time);
    println!("Frames:    {}", summary.saves);
    println!("Particles: {}", summary.particles);
    println!("Wall time: {:.3} s", summary.wall_time);
    Ok(())
}

/// Run benchmark suite.
pub fn benchmark(
    scenario_name: &str,
    output_path: Option<&str>,
    timesteps: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Talus Benchmark Suite");
    println!("═════════════════════");
    println!();

    let scenarios: Vec<ScenarioKind> = if scenario_name == "all" {
        ScenarioKind::all().to_vec()
    } else {
        let kind = ScenarioKind::from_name(scenario_name).ok_or_else(|| {
            let available: Vec<&str> = ScenarioKind::all().iter().map(|k| k.name()).collect();
            format!(
                "Unknown scenario: '{scenario_name}'. Available: {}, all",
                available.join(", ")
            )
        })?;
        vec![kind]
    };

    let mut all_metrics = Vec::new();
    for &kind in &scenarios {
        let mut scenario = Scenario::from_kind(kind)?;
        if let Some(steps) = timesteps {
            scenario = scenario.with_timesteps(steps);
        }

        println!(
            "Running: {} ({} particles, {} walls, {} steps)",
            kind.name(),
            scenario.particles.len(),
            scenario.walls.len(),
            scenario.timesteps,
        );

        let metrics = BenchmarkRunner::run(scenario).map_err(|e| format!("Benchmark failed: {e}"))?;

        println!("  Wall time:     {:.3}s", metrics.total_wall_time);
        println!("  Avg step:      {:.3}ms", metrics.avg_step_time * 1000.0);
        println!("  Final KE:      {:.6e}", metrics.final_kinetic_energy);
        println!("  Contacts:      {:.1} mean, {} max", metrics.mean_contacts, metrics.max_contacts);
        println!("  Max overlap:   {:.3e}m", metrics.max_overlap);
        if let Some(e) = metrics.restitution {
            println!("  Restitution:   {e:.4}");
        }
        println!();

        all_metrics.push(metrics);
    }

    let csv = BenchmarkMetrics::to_csv(&all_metrics);
    if let Some(path) = output_path {
        std::fs::write(path, &csv)?;
        println!("Results written to: {path}");
    } else {
        println!("CSV Output:");
        println!("{csv}");
    }
    Ok(())
}

/// Inspect a restart, data or snapshot file, chosen by extension.
pub fn inspect(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("Talus File Inspector");
    println!("────────────────────");
    println!();

    let file = Path::new(path);
    match file.extension().and_then(|e| e.to_str()) {
        Some("restart") => inspect_restart(file),
        Some("data") => inspect_data(file),
        Some("snap") => inspect_snapshot(file),
        _ => Err(format!("Unsupported file: {path}. Use .restart, .data or .snap.").into()),
    }
}

fn inspect_restart(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let state = read_restart(path)?;
    let species: Vec<String> = state
        .world
        .species()
        .iter()
        .map(|(_, s)| s.name.clone())
        .collect();

    println!("Run:          {}", state.context.name);
    println!("Step:         {}", state.context.step);
    println!("Sim time:     {:.6}s", state.context.time);
    println!("Next frame:   {}", state.context.save_index);
    println!("Dimension:    {}", state.world.dimension());
    println!("Species:      {}", species.join(", "));
    println!("Walls:        {}", state.world.walls().len());
    println!("Particles:    {}", state.world.particle_count());

    let contacts: usize = state
        .world
        .particles()
        .iter()
        .map(|p| p.history.len())
        .sum();
    println!("History:      {contacts} records");

    let engine = state.into_engine()?;
    let energy = engine.energy_summary();
    println!("Kinetic:      {:.6e} J", energy.kinetic);
    println!("Rotational:   {:.6e} J", energy.rotational);
    println!("Elastic:      {:.6e} J", energy.elastic);
    Ok(())
}

fn inspect_data(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let frames = read_data_frames(path)?;
    println!("Frames:       {}", frames.len());
    let Some(last) = frames.last() else {
        return Ok(());
    };
    if let Some(first) = frames.first() {
        println!("Time range:   [{:.6}, {:.6}]s", first.time, last.time);
    }
    println!("Particles:    {} (last frame)", last.particles.len());
    if !last.particles.is_empty() {
        let min_z = last
            .particles
            .iter()
            .map(|p| p.position.z - p.radius)
            .fold(f64::INFINITY, f64::min);
        let max_z = last
            .particles
            .iter()
            .map(|p| p.position.z + p.radius)
            .fold(f64::NEG_INFINITY, f64::max);
        let max_speed = last
            .particles
            .iter()
            .map(|p| p.velocity.length())
            .fold(0.0, f64::max);
        println!("Z range:      [{min_z:.4}, {max_z:.4}]");
        println!("Max speed:    {max_speed:.4e} m/s");
    }
    Ok(())
}

fn inspect_snapshot(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = StateSnapshot::read_file(path)?;
    let summary = snapshot.summary();
    println!("Run:          {}", snapshot.name);
    println!("Step:         {}", snapshot.step);
    println!("Sim time:     {:.6}s", snapshot.time);
    println!("Particles:    {} ({} fixed)", summary.particles, summary.fixed);
    println!("Kinetic:      {:.6e} J", summary.kinetic_energy);
    if let Some((lo, hi)) = summary.bounding_box {
        println!("Radii:        [{:.4e}, {:.4e}]", summary.min_radius, summary.max_radius);
        println!("Bounds min:   [{:.4}, {:.4}, {:.4}]", lo.x, lo.y, lo.z);
        println!("Bounds max:   [{:.4}, {:.4}, {:.4}]", hi.x, hi.y, hi.z);
    }
    Ok(())
}

/// Validate a simulation input, or a bare engine configuration.
pub fn validate(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("Talus Validator");
    println!("───────────────");
    println!();

    let content = std::fs::read_to_string(path)?;
    let document: toml::Table = toml::from_str(&content)?;
    if !document.contains_key("species") {
        println!("Validating engine config: {path}");
        let config: EngineConfig = toml::from_str(&content)?;
        config.validate()?;
        println!("✅ Config is valid.");
        return Ok(());
    }

    println!("Validating input: {path}");
    let input = SimulationInput::from_toml(&content)?;
    let report = validate_input(&input)?;
    for warning in &report.warnings {
        println!("⚠ {warning}");
    }
    println!(
        "✅ Input is valid ({} species, {} walls, {} particles).",
        input.species.len(),
        report.walls,
        report.particles
    );
    if let Some(tc) = report.shortest_collision_time {
        println!("Shortest collision time: {tc:.4e} s");
    }
    if let Some(dt) = report.suggested_timestep() {
        println!("Suggested timestep:      {dt:.4e} s");
    }
    Ok(())
}
