//! Newton's Rings Simulator - Entry point
//!
//! Prints the ring table for the configured optics, or drives the virtual
//! microscope across the rings and reports the recovered wavelength and
//! radius of curvature.
//!
//! CLI Usage:
//!   cargo run                             # Print the ring table
//!   cargo run -- --diagnose               # Automated measurement sweep
//!   cargo run -- --diagnose -w 546.1 -r 150 -s 7 --export

use anyhow::Result;
use newton_rings_sim::{
    config::Parameters,
    export,
    instrument::{Clock, Direction, ManualClock, TriangularNoise, UniformNoise},
    state::ExperimentSession,
    MAX_RINGS,
};

/// Simulated time between stage updates (s)
const TICK_SEC: f64 = 0.05;
/// Switch to precision mode inside this distance of the target (mm)
const COARSE_WINDOW_MM: f64 = 0.05;
/// Stop driving inside this distance of the target (mm)
const FINE_TOLERANCE_MM: f64 = 0.0005;
/// Zero-effort updates used to let the stage settle before reading
const SETTLE_TICKS: usize = 60;
const MAX_TICKS_PER_LEG: usize = 20_000;

/// Command-line options
#[derive(Debug, Clone)]
struct CliOptions {
    diagnose: bool,
    wavelength_nm: Option<f64>,
    radius_cm: Option<f64>,
    seed: u64,
    rings: usize,
    export: bool,
}

/// Drive the stage to `target_mm` and let it settle; returns ticks used
fn drive_to(session: &mut ExperimentSession, clock: &ManualClock, target_mm: f64) -> usize {
    let mut ticks = 0;

    let error = |s: &ExperimentSession| target_mm - s.microscope().position_mm();
    let direction = |e: f64| if e < 0.0 { Direction::Left } else { Direction::Right };

    for (window_mm, precision) in [(COARSE_WINDOW_MM, false), (FINE_TOLERANCE_MM, true)] {
        if precision {
            session.microscope_mut().toggle_precision_mode();
        }
        loop {
            let e = error(session);
            if e.abs() <= window_mm || ticks >= MAX_TICKS_PER_LEG {
                break;
            }
            clock.advance(TICK_SEC);
            session.move_microscope(direction(e), 1.0);
            ticks += 1;
        }
    }
    for _ in 0..SETTLE_TICKS {
        clock.advance(TICK_SEC);
        session.move_microscope(Direction::Right, 0.0);
        ticks += 1;
    }
    session.microscope_mut().toggle_precision_mode();

    ticks
}

/// Run an automated measurement sweep without user input
fn run_diagnostics(options: &CliOptions) -> Result<()> {
    println!("=== Newton's Rings Simulator - Measurement Diagnostics ===\n");

    let params = Parameters::load_or_default();
    let clock = ManualClock::new();
    let mut session = ExperimentSession::with_sources(
        &params,
        Box::new(clock.clone()),
        Box::new(TriangularNoise::seeded(options.seed)),
        Box::new(UniformNoise::seeded(options.seed.wrapping_add(1))),
    );
    if options.wavelength_nm.is_some() || options.radius_cm.is_some() {
        session.set_physical_parameters(options.wavelength_nm, options.radius_cm)?;
    }

    println!("Wavelength: {:.1} nm", session.optics().wavelength_nm);
    println!("Radius of curvature: {:.1} cm", session.optics().radius_of_curvature_cm);
    println!("Noise seed: {}", options.seed);
    println!("Rings to measure: {}\n", options.rings);

    let targets: Vec<(usize, f64)> = session
        .ring_table()
        .iter()
        .filter(|&(ring, _)| ring >= 1 && ring <= options.rings)
        .collect();

    let mut total_ticks = 0;
    for (ring, radius_mm) in targets {
        for edge_mm in [-radius_mm, radius_mm] {
            total_ticks += drive_to(&mut session, &clock, edge_mm);
            let record = session.take_measurement();
            log::debug!(
                "Ring {} edge {:+.4} mm: read {:+.5} mm ({})",
                ring,
                edge_mm,
                record.reading_mm,
                record.quality
            );
        }
    }
    println!(
        "Sweep finished: {} readings in {} stage updates ({:.1} s simulated)\n",
        session.microscope().measurements().len(),
        total_ticks,
        clock.now_secs()
    );

    let analysis = session.analyze();
    println!("Ring   Left (mm)   Right (mm)   D (mm)    λ (nm)    Error   Quality");
    for ring in &analysis.rings {
        println!(
            "{:>4}  {:>10.4}  {:>11.4}  {:>7.4}  {:>8.2}  {:>6.2}%   {}",
            ring.ring,
            ring.left_position_mm,
            ring.right_position_mm,
            ring.diameter_mm,
            ring.wavelength_nm,
            ring.wavelength_error_percent,
            ring.quality
        );
    }

    match &analysis.statistics {
        Some(stats) => {
            println!("\n=== Wavelength ===");
            println!(
                "Mean: {:.3} nm (σ = {:.3} nm, CV {:.3}%)",
                stats.mean_nm, stats.std_dev_nm, stats.coefficient_of_variation_percent
            );
            println!("Range: {:.3} - {:.3} nm", stats.min_nm, stats.max_nm);
            println!(
                "Weighted mean: {:.3} nm ({:.3}% error)",
                stats.weighted_mean_nm, stats.weighted_error_percent
            );
        }
        None => println!("\n⚠️  WARNING: No ring was measured on both sides"),
    }

    session.apply_best_pairs(&analysis);
    println!("\n=== Radius of Curvature ===");
    match session.regress_radius_of_curvature() {
        Ok(fit) => {
            println!("Fitted: {:.3} cm from {} rings", fit.radius_cm, fit.rings.len());
            println!("Actual: {:.3} cm", fit.actual_radius_cm);
            if fit.error_percent < 1.0 {
                println!("✓ Curvature error {:.3}%", fit.error_percent);
            } else {
                println!("⚠️  WARNING: Curvature error {:.3}%", fit.error_percent);
            }
        }
        Err(e) => println!("⚠️  WARNING: {}", e),
    }

    if options.export {
        let csv_path = export::export_measurements_csv(session.microscope().measurements().values())?;
        let json_path = export::export_session_json(&session)?;
        println!("\nExported {} and {}", csv_path.display(), json_path.display());
    }

    Ok(())
}

/// Print the ring radii for the configured optics
fn print_ring_table(options: &CliOptions) -> Result<()> {
    let params = Parameters::load_or_default();
    let mut session = ExperimentSession::new(&params);
    if options.wavelength_nm.is_some() || options.radius_cm.is_some() {
        session.set_physical_parameters(options.wavelength_nm, options.radius_cm)?;
    }

    println!(
        "λ = {:.1} nm, R = {:.1} cm, μ = {:.3}",
        session.optics().wavelength_nm,
        session.optics().radius_of_curvature_cm,
        session.optics().refractive_index
    );
    println!("Ring   Radius (mm)   Diameter (mm)");
    for (ring, radius_mm) in session.ring_table().iter().skip(1) {
        println!("{:>4}  {:>12.4}  {:>14.4}", ring, radius_mm, 2.0 * radius_mm);
    }
    Ok(())
}

/// Parse CLI arguments
fn parse_args() -> CliOptions {
    let args: Vec<String> = std::env::args().collect();
    let mut options = CliOptions {
        diagnose: false,
        wavelength_nm: None,
        radius_cm: None,
        seed: 42,
        rings: 10,
        export: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--diagnose" | "-d" => options.diagnose = true,
            "--export" | "-e" => options.export = true,
            "-w" | "--wavelength" => {
                i += 1;
                if i < args.len() {
                    options.wavelength_nm = args[i].parse().ok();
                }
            }
            "-r" | "--radius" => {
                i += 1;
                if i < args.len() {
                    options.radius_cm = args[i].parse().ok();
                }
            }
            "-s" | "--seed" => {
                i += 1;
                if i < args.len() {
                    options.seed = args[i].parse().unwrap_or(42);
                }
            }
            "-n" | "--rings" => {
                i += 1;
                if i < args.len() {
                    options.rings = args[i].parse().unwrap_or(10).clamp(2, MAX_RINGS);
                }
            }
            "--help" | "-h" => {
                println!("Newton's Rings Simulator");
                println!();
                println!("Usage: newton-rings-sim [OPTIONS]");
                println!();
                println!("Options:");
                println!("  --diagnose, -d       Run an automated measurement sweep");
                println!("  -w, --wavelength NM  Source wavelength in nm (400-700)");
                println!("  -r, --radius CM      Lens radius of curvature in cm (50-200)");
                println!("  -s, --seed N         Noise seed for the sweep (default: 42)");
                println!("  -n, --rings N        Rings to measure in the sweep (default: 10)");
                println!("  --export, -e         Write CSV and JSON exports after the sweep");
                println!("  --help, -h           Show this help");
                std::process::exit(0);
            }
            _ => {}
        }
        i += 1;
    }

    options
}

fn main() -> Result<()> {
    env_logger::init();

    let options = parse_args();
    log::info!("Newton's Rings Simulator starting...");

    if options.diagnose {
        run_diagnostics(&options)
    } else {
        print_ring_table(&options)
    }
}
