use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::info;
use mip_formulations::instances::jsp::load_jsplib;
use mip_formulations::instances::vrptw::load_vrprep;
use mip_formulations::{
    solve, CspFormulation, CspInstance, GrFormulation, GrInstance, JspFormulation,
    Outcome, SolverBackend, SolverConfig, VrptwFormulation,
};

#[derive(Parser, Debug)]
#[command(version, about = "Solve combinatorial problems through their MIP formulations")]
struct Args {
    #[command(subcommand)]
    problem: Problem,

    /// Wall-clock budget for the solver, in seconds
    #[arg(short, long)]
    time_limit: Option<f64>,

    /// Relative MIP gap at which the solver may stop
    #[arg(long)]
    gap: Option<f64>,

    #[arg(short, long, value_enum, default_value_t = SolverBackend::Auto)]
    backend: SolverBackend,

    /// Directory receiving `<problem>_model_IIS.ilp` on infeasibility
    #[arg(long, default_value = ".")]
    diagnostics_dir: PathBuf,

    /// Show solver output
    #[arg(short, long)]
    verbose: bool,

    #[arg(long, default_value = "info")]
    log_level: log::LevelFilter,
}

#[derive(Subcommand, Debug)]
enum Problem {
    /// Job-shop scheduling from a JSPLIB file
    Jsp { path: PathBuf },
    /// Vehicle routing with time windows from a VRP-REP XML file
    Vrptw { path: PathBuf },
    /// Closest string over an alphabet
    Csp {
        #[arg(short, long)]
        alphabet: String,
        #[arg(required = true)]
        strings: Vec<String>,
    },
    /// Sorting a permutation by transpositions
    Gr {
        #[arg(long, value_delimiter = ',')]
        source: Vec<usize>,
        #[arg(long, value_delimiter = ',')]
        target: Vec<usize>,
    },
}

fn setup_logger(level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
    use fern::colors::{Color, ColoredLevelConfig};
    let colors = ColoredLevelConfig::new()
        .debug(Color::White)
        .info(Color::Green)
        .warn(Color::BrightYellow)
        .error(Color::BrightRed);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} | {:5} | {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                colors.color(record.level()),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
}

/// Prints the outcome; returns whether a result was obtained.
fn report<T>(outcome: Outcome<T>, show: impl Fn(&T)) -> bool {
    match outcome {
        Outcome::Optimal(result) => {
            println!("status: optimal");
            show(&result);
            true
        }
        Outcome::TimeLimit(Some(result)) => {
            println!("status: time limit reached, best incumbent (not proven optimal)");
            show(&result);
            true
        }
        Outcome::TimeLimit(None) => {
            println!("status: time limit reached, no feasible solution found");
            false
        }
        Outcome::Infeasible(diagnostic) => {
            println!("status: infeasible");
            println!("conflicting constraints: {}", diagnostic.constraints.join(", "));
            println!("IIS written to {}", diagnostic.path.display());
            false
        }
    }
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();
    setup_logger(args.log_level)?;

    let mut config = SolverConfig::default()
        .with_backend(args.backend)
        .with_verbose(args.verbose)
        .with_diagnostics_dir(args.diagnostics_dir);
    if let Some(seconds) = args.time_limit {
        config = config.with_time_limit(seconds);
    }
    if let Some(gap) = args.gap {
        config = config.with_gap_tolerance(gap);
    }

    let solved = match args.problem {
        Problem::Jsp { path } => {
            let instance = load_jsplib(&path)?;
            info!(
                "{}: {} jobs on {} machines",
                instance.name, instance.num_jobs, instance.num_machines
            );
            report(solve::<JspFormulation>(&instance, &config)?, |result| {
                println!("makespan: {}", result.makespan);
                for (job, starts) in result.start_times.iter().enumerate() {
                    let starts: Vec<String> = starts.iter().map(u64::to_string).collect();
                    println!("job {}: {}", job, starts.join(" "));
                }
            })
        }
        Problem::Vrptw { path } => {
            let instance = load_vrprep(&path)?;
            info!(
                "{}: {} customers, {} vehicles of capacity {}",
                instance.name, instance.num_customers, instance.fleet_size, instance.vehicle_capacity
            );
            report(solve::<VrptwFormulation>(&instance, &config)?, |result| {
                println!("total distance: {}", result.total_distance);
                for (vehicle, route) in result.routes.iter().enumerate() {
                    let stops: Vec<String> = route.customers.iter().map(usize::to_string).collect();
                    println!("route {}: 0 {} 0 (load {})", vehicle, stops.join(" "), route.load);
                }
            })
        }
        Problem::Csp { alphabet, strings } => {
            let strings: Vec<&str> = strings.iter().map(String::as_str).collect();
            let instance = CspInstance::new(alphabet.chars(), &strings);
            report(solve::<CspFormulation>(&instance, &config)?, |result| {
                println!("center: {}", result.center);
                println!("radius: {}", result.radius);
            })
        }
        Problem::Gr { source, target } => {
            let instance = GrInstance::new(source, target);
            report(solve::<GrFormulation>(&instance, &config)?, |result| {
                println!("transpositions: {}", result.count());
                for (step, t) in result.transpositions.iter().enumerate() {
                    println!("{}: {}", step + 1, t);
                }
            })
        }
    };

    Ok(if solved { ExitCode::SUCCESS } else { ExitCode::from(2) })
}
