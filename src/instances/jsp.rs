//! Job-shop instances and the JSPLIB text loader.

use std::fs;
use std::path::Path;

use super::{is_permutation, malformed, InstanceError, Result};

/// Job shop instance from JSPLIB.
///
/// `precedences[job][step]` is the machine a job visits at `step`;
/// `durations[job][machine]` is its processing time on that machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsplibInstance {
    pub name: String,
    pub num_jobs: usize,
    pub num_machines: usize,
    pub precedences: Vec<Vec<usize>>,
    pub durations: Vec<Vec<u32>>,
}

impl JsplibInstance {
    /// Builds an instance from per-job routes of `(machine, duration)` pairs.
    pub fn from_routes(name: impl Into<String>, routes: &[Vec<(usize, u32)>]) -> Self {
        let num_jobs = routes.len();
        let num_machines = routes.first().map_or(0, Vec::len);
        let mut precedences = Vec::with_capacity(num_jobs);
        let mut durations = vec![vec![0; num_machines]; num_jobs];
        for (job, route) in routes.iter().enumerate() {
            precedences.push(route.iter().map(|&(machine, _)| machine).collect());
            for &(machine, duration) in route {
                if let Some(slot) = durations[job].get_mut(machine) {
                    *slot = duration;
                }
            }
        }
        Self {
            name: name.into(),
            num_jobs,
            num_machines,
            precedences,
            durations,
        }
    }

    /// Total processing time of one job
    pub fn job_total(&self, job: usize) -> u64 {
        self.durations[job].iter().map(|&d| u64::from(d)).sum()
    }

    /// Longest single-job total duration, a lower bound on any makespan
    pub fn makespan_lower_bound(&self) -> u64 {
        (0..self.num_jobs).map(|j| self.job_total(j)).max().unwrap_or(0)
    }

    /// Sum of all durations; no operation in a compact schedule starts later
    pub fn big_m(&self) -> u64 {
        (0..self.num_jobs).map(|j| self.job_total(j)).sum()
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_jobs == 0 || self.num_machines == 0 {
            return malformed("instance needs at least one job and one machine");
        }
        if self.precedences.len() != self.num_jobs || self.durations.len() != self.num_jobs {
            return malformed(format!(
                "expected {} job rows, found {} routes and {} duration rows",
                self.num_jobs,
                self.precedences.len(),
                self.durations.len()
            ));
        }
        for job in 0..self.num_jobs {
            if self.precedences[job].len() != self.num_machines
                || self.durations[job].len() != self.num_machines
            {
                return malformed(format!(
                    "job {} does not list exactly {} operations",
                    job, self.num_machines
                ));
            }
            if !is_permutation(&self.precedences[job]) {
                return malformed(format!(
                    "route of job {} is not a permutation of the machines: {:?}",
                    job, self.precedences[job]
                ));
            }
        }
        Ok(())
    }
}

/// Loads a JSPLIB file from disk.
pub fn load_jsplib(path: &Path) -> Result<JsplibInstance> {
    let text = fs::read_to_string(path).map_err(|source| InstanceError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mut instance = parse_jsplib(&text)?;
    if instance.name.is_empty() {
        if let Some(stem) = path.file_stem() {
            instance.name = stem.to_string_lossy().into_owned();
        }
    }
    Ok(instance)
}

/// Parses the JSPLIB text format.
///
/// `#` lines are comments; `# instance <name>` names the instance. The first
/// data line holds `jobs machines`, followed by one line per job of
/// interleaved `machine duration` pairs in visiting order.
pub fn parse_jsplib(text: &str) -> Result<JsplibInstance> {
    let mut name = String::new();
    let mut data = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if let Some(comment) = trimmed.strip_prefix('#') {
            let mut words = comment.split_whitespace();
            if name.is_empty() && words.next() == Some("instance") {
                if let Some(found) = words.next() {
                    name = found.to_string();
                }
            }
            continue;
        }
        if trimmed.is_empty() {
            continue;
        }
        data.push((idx + 1, parse_numbers(trimmed, idx + 1)?));
    }

    let mut rows = data.into_iter();
    let (header_line, header) = rows.next().ok_or(InstanceError::Parse {
        line: 0,
        message: "missing `jobs machines` line".to_string(),
    })?;
    let (num_jobs, num_machines) = match header.as_slice() {
        [jobs, machines] => (*jobs as usize, *machines as usize),
        _ => {
            return Err(InstanceError::Parse {
                line: header_line,
                message: format!("expected `jobs machines`, found {} values", header.len()),
            })
        }
    };

    let rows: Vec<(usize, Vec<u32>)> = rows.collect();
    if rows.len() < num_jobs {
        return Err(InstanceError::Parse {
            line: header_line,
            message: format!("expected {} job lines, found {}", num_jobs, rows.len()),
        });
    }

    let mut routes = Vec::new();
    for (job, (line, values)) in rows.into_iter().take(num_jobs).enumerate() {
        if values.len() != 2 * num_machines {
            return Err(InstanceError::Parse {
                line,
                message: format!(
                    "expected {} values for job {}, found {}",
                    2 * num_machines,
                    job,
                    values.len()
                ),
            });
        }
        let mut route = Vec::new();
        for pair in values.chunks(2) {
            let machine = pair[0] as usize;
            if machine >= num_machines {
                return Err(InstanceError::Parse {
                    line,
                    message: format!("machine {} out of range 0..{}", machine, num_machines),
                });
            }
            route.push((machine, pair[1]));
        }
        routes.push(route);
    }

    let mut instance = JsplibInstance::from_routes(name, &routes);
    instance.num_jobs = num_jobs;
    instance.num_machines = num_machines;
    instance.validate()?;
    Ok(instance)
}

fn parse_numbers(line: &str, line_number: usize) -> Result<Vec<u32>> {
    line.split_whitespace()
        .map(|token| {
            token.parse::<u32>().map_err(|e| InstanceError::Parse {
                line: line_number,
                message: format!("'{}': {}", token, e),
            })
        })
        .collect()
}
