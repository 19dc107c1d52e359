//! CLI command implementations.

use std::path::{Path, PathBuf};

use loom_debug::ClothSnapshot;
use loom_demo::{DemoMetrics, Scenario, ScenarioRunner, PRESET_NAMES};
use loom_fabric::{ConstraintKind, FabricCooker};

/// Arguments of `loom run`.
pub struct RunArgs {
    pub scenario: String,
    pub frames: Option<u32>,
    pub threads: usize,
    pub output: Option<PathBuf>,
    pub snapshot: Option<PathBuf>,
    pub export: Option<PathBuf>,
}

/// Resolves a preset name, `all`, or a scenario file.
fn resolve(name: &str) -> Result<Vec<Scenario>, Box<dyn std::error::Error>> {
    if name == "all" {
        return Ok(Scenario::presets());
    }
    if let Some(scenario) = Scenario::preset(name) {
        return Ok(vec![scenario]);
    }
    let path = Path::new(name);
    if path.extension().is_some_and(|ext| ext == "toml") {
        return Ok(vec![Scenario::load(path)?]);
    }
    eprintln!("Unknown scenario: {name}");
    eprintln!("Available: {}, all, or a .toml file", PRESET_NAMES.join(", "));
    Err("Unknown scenario".into())
}

/// Run one or more scenarios and report their metrics.
pub fn run(args: &RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    println!("Loom Scenario Runner");
    println!("════════════════════");
    println!();

    let scenarios = resolve(&args.scenario)?;
    if scenarios.len() > 1 && (args.snapshot.is_some() || args.export.is_some()) {
        return Err("--snapshot and --export need a single scenario".into());
    }

    let mut runner = ScenarioRunner::new(args.threads);
    if let Some(frames) = args.frames {
        runner = runner.with_frames(frames);
    }
    if let Some(path) = &args.export {
        runner = runner.with_export(path);
    }
    if let Some(path) = &args.snapshot {
        runner = runner.with_snapshot(path);
    }

    let mut all_metrics = Vec::with_capacity(scenarios.len());
    for scenario in &scenarios {
        println!(
            "Running: {} ({} instances on {} solvers, {} frames)",
            scenario.name,
            scenario.instances,
            scenario.solvers,
            args.frames.unwrap_or(scenario.frames),
        );

        let metrics = runner
            .run(scenario)
            .map_err(|e| format!("Scenario {} failed: {e}", scenario.name))?;

        println!("  Particles:     {} ({} pinned)", metrics.particles, metrics.pinned);
        println!("  Wall time:     {:.3}s", metrics.total_wall_time);
        println!("  Avg step:      {:.3}ms", metrics.avg_step_ms);
        println!("  Final KE:      {:.6e}", metrics.final_kinetic_energy);
        println!("  Max displace:  {:.4}m", metrics.max_displacement);
        if metrics.sphere_contacts > 0 || metrics.self_collision_contacts > 0 {
            println!(
                "  Contacts:      {} sphere, {} self",
                metrics.sphere_contacts, metrics.self_collision_contacts
            );
        }
        println!();

        all_metrics.push(metrics);
    }

    if let Some(path) = &args.snapshot {
        println!("Snapshot written to: {}", path.display());
    }
    if let Some(path) = &args.export {
        println!("Frames exported to: {}", path.display());
    }

    let csv = DemoMetrics::to_csv(&all_metrics);
    if let Some(path) = &args.output {
        std::fs::write(path, &csv)?;
        println!("Results written to: {}", path.display());
    } else {
        println!("CSV Output:");
        println!("{csv}");
    }

    Ok(())
}

/// List the built-in scenarios.
pub fn list() -> Result<(), Box<dyn std::error::Error>> {
    println!("Built-in Scenarios");
    println!("──────────────────");
    for scenario in Scenario::presets() {
        let mesh = scenario.build_mesh()?;
        println!(
            "  {:<14} {:>5} particles × {} instance(s), {} solver(s), {} frames",
            scenario.name,
            mesh.particle_count(),
            scenario.instances,
            scenario.solvers,
            scenario.frames,
        );
    }
    Ok(())
}

/// Inspect a cloth snapshot.
pub fn inspect(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Loom Snapshot Inspector");
    println!("───────────────────────");
    println!();

    let snapshot =
        ClothSnapshot::load(path).map_err(|e| format!("Failed to read snapshot: {e}"))?;

    println!("Frame:        {}", snapshot.frame);
    println!("Particles:    {}", snapshot.particle_count);
    println!("Pinned:       {}", snapshot.pinned_count());
    println!("Iteration dt: {:.6}s", snapshot.iteration_dt);

    if snapshot.particle_count > 0 {
        let bounds = snapshot.bounds();
        println!("Bounds min:   {}", bounds.min);
        println!("Bounds max:   {}", bounds.max);
        println!("Y range:      [{:.4}, {:.4}]", bounds.min.y, bounds.max.y);

        let max_speed = snapshot
            .velocities()
            .iter()
            .map(|v| v.length())
            .fold(0.0_f32, f32::max);
        println!("Max speed:    {max_speed:.4}m/s");
    }

    Ok(())
}

/// Validate a scenario file: parse, generate and cook it.
pub fn validate(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating: {}", path.display());

    let scenario = Scenario::load(path)?;
    let mesh = scenario.build_mesh()?;
    let fabric = FabricCooker::new(scenario.cooking.clone()).cook(&mesh.cloth_mesh_desc())?;

    println!("  Name:        {}", scenario.name);
    println!("  Particles:   {} ({} pinned)", mesh.particle_count(), mesh.pinned_indices().len());
    println!("  Triangles:   {}", fabric.triangle_count());
    println!(
        "  Constraints: {} stretch, {} shear, {} bending in {} phases",
        fabric.constraint_count(ConstraintKind::Stretch),
        fabric.constraint_count(ConstraintKind::Shear),
        fabric.constraint_count(ConstraintKind::Bending),
        fabric.phase_count(),
    );
    println!("  Tethers:     {}", fabric.tethers().len());
    println!("  Instances:   {} on {} solver(s)", scenario.instances, scenario.solvers);
    println!();
    println!("✓ Scenario is valid");

    Ok(())
}
