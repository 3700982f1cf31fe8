//! Infeasibility diagnostics: irreducible inconsistent subsystems and their
//! export in the .lp file format.

use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use log::{debug, info};

use super::models::{Constraint, MipModel};
use super::solver_service::{classify_feasibility, Result, SolverError, SolverService};
use super::value_objects::{OptimizationType, VariableType};
use super::SolverConfig;

/// Minimal set of constraints that is infeasible on its own.
///
/// Removing any single member makes the remaining set feasible (under the
/// variable bounds and integrality of the original model).
#[derive(Debug, Clone)]
pub struct IrreducibleSubsystem {
    /// Indices into the constraints of the analysed model
    pub constraint_indices: Vec<usize>,
    subsystem: MipModel,
}

impl IrreducibleSubsystem {
    pub fn len(&self) -> usize {
        self.constraint_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraint_indices.is_empty()
    }

    pub fn constraint_names(&self) -> Vec<String> {
        self.subsystem
            .constraints
            .iter()
            .enumerate()
            .map(|(pos, c)| lp_constraint_name(c, self.constraint_indices[pos]))
            .collect()
    }

    /// The subsystem as a standalone model
    pub fn as_model(&self) -> &MipModel {
        &self.subsystem
    }

    /// Writes the subsystem to `path` in the .lp file format.
    pub fn export(&self, path: &Path) -> Result<()> {
        let wrap = |source| SolverError::Diagnostic {
            path: path.display().to_string(),
            source,
        };
        let mut out = BufWriter::new(File::create(path).map_err(wrap)?);
        write!(
            out,
            "{}",
            DisplayedLp {
                model: &self.subsystem,
                original_indices: &self.constraint_indices,
            }
        )
        .map_err(wrap)?;
        out.flush().map_err(wrap)
    }
}

/// Deletion filter: drop constraints one at a time, keeping every drop that
/// leaves the system infeasible. What survives is irreducible.
pub fn deletion_filter<S: SolverService + ?Sized>(
    solver: &S,
    model: &MipModel,
    config: &SolverConfig,
) -> Result<IrreducibleSubsystem> {
    let start = Instant::now();
    let config = &config.without_time_limit();
    let mut kept: Vec<usize> = (0..model.num_constraints()).collect();

    if satisfiable(solver, model, &kept, config)? {
        return Err(SolverError::InvalidProblem(format!(
            "model '{}' is feasible, it has no inconsistent subsystem",
            model.name
        )));
    }

    let mut pos = 0;
    while pos < kept.len() {
        let mut candidate = kept.clone();
        let dropped = candidate.remove(pos);
        if satisfiable(solver, model, &candidate, config)? {
            debug!("IIS keeps constraint {} '{}'", dropped, model.constraints[dropped].name);
            pos += 1;
        } else {
            kept = candidate;
        }
    }

    info!(
        "IIS for '{}': {} of {} constraints in {:.1} ms",
        model.name,
        kept.len(),
        model.num_constraints(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    let mut subsystem = model.feasibility_subproblem(&kept);
    subsystem.name = format!("{}_IIS", model.name);
    Ok(IrreducibleSubsystem {
        constraint_indices: kept,
        subsystem,
    })
}

fn satisfiable<S: SolverService + ?Sized>(
    solver: &S,
    model: &MipModel,
    indices: &[usize],
    config: &SolverConfig,
) -> Result<bool> {
    let sub = model.feasibility_subproblem(indices);
    classify_feasibility(&solver.solve(&sub, config)?)
}

fn lp_constraint_name(constraint: &Constraint, index: usize) -> String {
    if constraint.name.is_empty() {
        format!("c{}", index)
    } else {
        constraint.name.clone()
    }
}

/// A model whose `Display` implementation outputs valid .lp syntax
struct DisplayedLp<'a> {
    model: &'a MipModel,
    original_indices: &'a [usize],
}

impl fmt::Display for DisplayedLp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let model = self.model;
        write!(f, "\\ {}\n\n", model.name)?;
        let sense = match model.sense {
            OptimizationType::Maximize => "Maximize",
            OptimizationType::Minimize => "Minimize",
        };
        writeln!(f, "{}\n  obj:", sense)?;

        let mut used = BTreeSet::new();
        writeln!(f, "\nSubject To")?;
        for (pos, constraint) in model.constraints.iter().enumerate() {
            write!(
                f,
                "  {}:",
                lp_constraint_name(constraint, self.original_indices[pos])
            )?;
            if constraint.expr.is_empty() {
                write!(f, " 0")?;
            }
            for (var, coefficient) in constraint.expr.terms() {
                used.insert(var.index());
                let sign = if *coefficient < 0.0 { '-' } else { '+' };
                write!(
                    f,
                    " {} {} {}",
                    sign,
                    coefficient.abs(),
                    model.variables[var.index()].name
                )?;
            }
            writeln!(
                f,
                " {} {}",
                constraint.constraint_type.lp_operator(),
                constraint.bound
            )?;
        }

        let mut generals = vec![];
        let mut binaries = vec![];
        writeln!(f, "\nBounds")?;
        for &index in &used {
            let variable = &model.variables[index];
            let low = variable.lower_bound;
            let up = variable.upper();
            write!(f, "  ")?;
            if low > f64::NEG_INFINITY {
                write!(f, "{} <= ", low)?;
            }
            write!(f, "{}", variable.name)?;
            if up < f64::INFINITY {
                write!(f, " <= {}", up)?;
            }
            if low.is_infinite() && up.is_infinite() {
                write!(f, " free")?;
            }
            writeln!(f)?;
            match variable.variable_type {
                VariableType::Binary => binaries.push(variable.name.as_str()),
                VariableType::Integer => generals.push(variable.name.as_str()),
                VariableType::Continuous => {}
            }
        }
        for (header, names) in [("Generals", &generals), ("Binaries", &binaries)] {
            if !names.is_empty() {
                writeln!(f, "\n{}", header)?;
                for name in names.iter() {
                    writeln!(f, "  {}", name)?;
                }
            }
        }
        writeln!(f, "\nEnd")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LinearExpr, Solution, SolutionStatus, Variable};

    /// Decides feasibility by enumerating every 0/1 assignment.
    struct EnumeratingSolver;

    impl SolverService for EnumeratingSolver {
        fn solve(&self, model: &MipModel, _config: &SolverConfig) -> Result<Solution> {
            let n = model.num_variables();
            for mask in 0..(1u32 << n) {
                let values: Vec<f64> = (0..n).map(|i| f64::from((mask >> i) & 1)).collect();
                if model.is_satisfied_by(&values) {
                    return Ok(Solution::optimal(model.objective_value(&values), values));
                }
            }
            Ok(Solution::new(SolutionStatus::Infeasible, "no assignment"))
        }

        fn name(&self) -> &str {
            "enumeration"
        }
    }

    fn contradictory_model() -> MipModel {
        let mut model = MipModel::new("toy");
        let x = model.add_variable(Variable::binary("x"));
        let y = model.add_variable(Variable::binary("y"));
        let z = model.add_variable(Variable::binary("z"));
        model.add_constraint(Constraint::geq(LinearExpr::sum([x, y]), 2.0).with_name("both"));
        model.add_constraint(Constraint::leq(LinearExpr::sum([z]), 1.0).with_name("harmless"));
        model.add_constraint(Constraint::leq(LinearExpr::sum([x]), 0.0).with_name("x_off"));
        model
    }

    #[test]
    fn deletion_filter_keeps_only_the_conflict() {
        let model = contradictory_model();
        let iis = deletion_filter(&EnumeratingSolver, &model, &SolverConfig::default()).unwrap();
        assert_eq!(iis.constraint_indices, vec![0, 2]);
        assert_eq!(iis.constraint_names(), vec!["both", "x_off"]);
    }

    #[test]
    fn deletion_filter_rejects_feasible_models() {
        let mut model = contradictory_model();
        model.constraints.remove(2);
        let err = deletion_filter(&EnumeratingSolver, &model, &SolverConfig::default());
        assert!(matches!(err, Err(SolverError::InvalidProblem(_))));
    }

    /// Gives up without an answer whenever a time budget is set.
    struct ImpatientSolver;

    impl SolverService for ImpatientSolver {
        fn solve(&self, model: &MipModel, config: &SolverConfig) -> Result<Solution> {
            if config.time_limit.is_some() {
                return Ok(Solution::new(SolutionStatus::TimeLimit, "out of time"));
            }
            EnumeratingSolver.solve(model, config)
        }

        fn name(&self) -> &str {
            "impatient"
        }
    }

    #[test]
    fn feasibility_checks_ignore_the_time_budget() {
        let model = contradictory_model();
        let config = SolverConfig::default().with_time_limit(0.01);
        assert!(!ImpatientSolver.is_feasible(&model, &config).unwrap());
        let iis = ImpatientSolver.compute_iis(&model, &config).unwrap();
        assert_eq!(iis.constraint_names(), vec!["both", "x_off"]);
    }

    #[test]
    fn stopped_check_with_incumbent_counts_as_feasible() {
        let stopped = Solution::incumbent(SolutionStatus::TimeLimit, 0.0, vec![1.0]);
        assert!(classify_feasibility(&stopped).unwrap());
        let empty = Solution::new(SolutionStatus::TimeLimit, "out of time");
        assert!(matches!(
            classify_feasibility(&empty),
            Err(SolverError::ExecutionFailed(_))
        ));
    }

    #[test]
    fn exported_subsystem_is_lp_text() {
        let model = contradictory_model();
        let iis = deletion_filter(&EnumeratingSolver, &model, &SolverConfig::default()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toy_IIS.ilp");
        iis.export(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("\\ toy_IIS"));
        assert!(text.contains("both: + 1 x + 1 y >= 2"));
        assert!(text.contains("x_off: + 1 x <= 0"));
        assert!(!text.contains("harmless"));
        assert!(text.contains("Binaries\n  x\n  y\n"));
        assert!(text.trim_end().ends_with("End"));
    }
}
