//! Two-index vehicle flow model for the CVRPTW.
//!
//! The depot is split into a source (index 0) and a sink (index N+1), both
//! standing for physical node 0. Arcs run from `{source} ∪ C` to
//! `C ∪ {sink}`.
//!
//! ```text
//! x[i][j] ∈ {0,1}       a vehicle drives from i to j
//! y[i] ∈ [q_i, Q]       load after leaving i
//! w[i] ∈ [e_i, l_i]     service start at i
//!
//! min Σ d(i,j) x[i][j]
//! Σ_j x[i][j] = 1                                 i ∈ C
//! Σ_h x[h][i] = Σ_j x[i][j]                       i ∈ C
//! Σ_j x[0][j] ≤ K
//! y[j] ≥ y[i] + q_j x[i][j] − Q (1 − x[i][j])
//! w[j] ≥ w[i] + τ(i,j) − M_ij (1 − x[i][j])       τ(i,j) = s_i + d(i,j)
//! ```
//!
//! Every window is clamped to `[e_i, min(l_i, H)]`, where `H` bounds the
//! earliest schedule of any feasible route, so that
//! `M_ij = max(0, min(l_i, H) + τ(i,j) − e_j)` never cuts off a route.

use std::collections::BTreeMap;
use std::fmt;

use crate::domain::{Constraint, LinearExpr, MipModel, OptimizationType, Solution, Variable, VarId};
use crate::instances::VrptwInstance;

use super::indexing::KeyedVars;
use super::{Formulation, FormulationError, Result};

/// Node of the augmented graph in which the depot appears twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AugmentedNode {
    /// Depot as the start of every route
    Source,
    /// Customer by physical id, `1..=N`
    Customer(usize),
    /// Depot as the end of every route
    Sink,
}

impl AugmentedNode {
    /// Physical node whose data (demand, window, distances) applies
    pub fn physical(self) -> usize {
        match self {
            AugmentedNode::Source | AugmentedNode::Sink => 0,
            AugmentedNode::Customer(i) => i,
        }
    }

    /// Position in `0..=N+1`
    pub fn index(self, num_customers: usize) -> usize {
        match self {
            AugmentedNode::Source => 0,
            AugmentedNode::Customer(i) => i,
            AugmentedNode::Sink => num_customers + 1,
        }
    }

    pub fn all(num_customers: usize) -> impl Iterator<Item = AugmentedNode> {
        std::iter::once(AugmentedNode::Source)
            .chain(customers(num_customers))
            .chain(std::iter::once(AugmentedNode::Sink))
    }
}

impl fmt::Display for AugmentedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AugmentedNode::Source => write!(f, "depot"),
            AugmentedNode::Customer(i) => write!(f, "{}", i),
            AugmentedNode::Sink => write!(f, "depot'"),
        }
    }
}

fn customers(num_customers: usize) -> impl Iterator<Item = AugmentedNode> {
    (1..=num_customers).map(AugmentedNode::Customer)
}

type Arc = (AugmentedNode, AugmentedNode);

/// Arcs of the augmented graph: no self-loops and no empty source-to-sink
/// route.
fn arcs(num_customers: usize) -> Vec<Arc> {
    let tails = std::iter::once(AugmentedNode::Source).chain(customers(num_customers));
    let mut arcs = Vec::new();
    for tail in tails {
        for head in customers(num_customers).chain(std::iter::once(AugmentedNode::Sink)) {
            if tail != head && !(tail == AugmentedNode::Source && head == AugmentedNode::Sink) {
                arcs.push((tail, head));
            }
        }
    }
    arcs
}

/// Bound on every service start of the earliest schedule of any feasible
/// route: the latest window opening plus, for each node, its service time and
/// its longest outgoing leg.
fn planning_horizon(instance: &VrptwInstance) -> f64 {
    let opening = instance
        .time_windows
        .iter()
        .map(|w| w.earliest)
        .fold(0.0, f64::max);
    let legs: f64 = instance
        .distances
        .iter()
        .zip(&instance.service_times)
        .map(|(row, &service)| {
            f64::from(service) + f64::from(row.iter().copied().max().unwrap_or(0))
        })
        .sum();
    opening + legs
}

pub struct VrptwFormulation {
    num_customers: usize,
    x: KeyedVars<Arc>,
    load: KeyedVars<AugmentedNode>,
    start: KeyedVars<AugmentedNode>,
}

/// One vehicle's tour, depot excluded
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Customers in visiting order
    pub customers: Vec<usize>,
    /// Total demand delivered
    pub load: u32,
    /// Service start at each customer
    pub service_starts: Vec<f64>,
}

impl Route {
    /// Length of depot → customers → depot
    pub fn distance(&self, instance: &VrptwInstance) -> u64 {
        let mut stops = Vec::with_capacity(self.customers.len() + 2);
        stops.push(0);
        stops.extend(&self.customers);
        stops.push(0);
        stops
            .windows(2)
            .map(|leg| u64::from(instance.distance(leg[0], leg[1])))
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VrptwSolution {
    /// Selected arcs of the augmented graph
    pub arcs: Vec<(AugmentedNode, AugmentedNode)>,
    pub routes: Vec<Route>,
    pub total_distance: u64,
}

impl VrptwSolution {
    pub fn vehicles_used(&self) -> usize {
        self.routes.len()
    }
}

impl Formulation for VrptwFormulation {
    type Instance = VrptwInstance;
    type Output = VrptwSolution;

    const NAME: &'static str = "vrptw";

    fn validate(instance: &VrptwInstance) -> Result<()> {
        Ok(instance.validate()?)
    }

    fn build(instance: &VrptwInstance) -> Result<(MipModel, Self)> {
        let n = instance.num_customers;
        let capacity = f64::from(instance.vehicle_capacity);
        let horizon = planning_horizon(instance);
        let demand = |node: AugmentedNode| f64::from(instance.demands[node.physical()]);
        let window = |node: AugmentedNode| instance.time_windows[node.physical()];

        let mut model = MipModel::new("vehicle_routing_tw");
        model.set_sense(OptimizationType::Minimize);

        let arcs = arcs(n);
        let mut x = KeyedVars::new();
        for &(i, j) in &arcs {
            let cost = f64::from(instance.distance(i.physical(), j.physical()));
            let var = model.add_variable(
                Variable::binary(format!("x_{}_{}", i.index(n), j.index(n))).with_objective(cost),
            );
            x.insert((i, j), var);
        }
        let mut load = KeyedVars::new();
        let mut start = KeyedVars::new();
        for node in AugmentedNode::all(n) {
            let var = model.add_variable(
                Variable::continuous(format!("y_{}", node.index(n)))
                    .with_bounds(demand(node), Some(capacity)),
            );
            load.insert(node, var);
            let tw = window(node);
            let var = model.add_variable(
                Variable::continuous(format!("w_{}", node.index(n)))
                    .with_bounds(tw.earliest, Some(tw.latest.min(horizon))),
            );
            start.insert(node, var);
        }
        let formulation = VrptwFormulation {
            num_customers: n,
            x,
            load,
            start,
        };
        let x = &formulation.x;

        for node in customers(n) {
            let i = node.index(n);
            let out: Vec<VarId> = formulation.outgoing(node).map(|(_, var)| var).collect();
            model.add_constraint(
                Constraint::eq(LinearExpr::sum(out.iter().copied()), 1.0)
                    .with_name(format!("leave_once_{}", i)),
            );
            let mut flow = LinearExpr::sum(formulation.incoming(node).map(|(_, var)| var));
            for var in out {
                flow.add_term(var, -1.0);
            }
            model.add_constraint(Constraint::eq(flow, 0.0).with_name(format!("flow_{}", i)));
        }

        let departures = LinearExpr::sum(formulation.outgoing(AugmentedNode::Source).map(|(_, var)| var));
        model.add_constraint(
            Constraint::leq(departures, instance.fleet_size as f64).with_name("fleet"),
        );

        for &(i, j) in &arcs {
            let arc = x[&(i, j)];
            let (a, b) = (i.index(n), j.index(n));

            // y_j − y_i − (q_j + Q) x_ij ≥ −Q
            let expr = LinearExpr::new()
                .term(formulation.load[&j], 1.0)
                .term(formulation.load[&i], -1.0)
                .term(arc, -(demand(j) + capacity));
            model.add_constraint(Constraint::geq(expr, -capacity).with_name(format!("load_{}_{}", a, b)));

            // w_j − w_i − M x_ij ≥ τ − M
            let travel = instance.travel_time(i.physical(), j.physical());
            let big_m = (window(i).latest.min(horizon) + travel - window(j).earliest).max(0.0);
            let expr = LinearExpr::new()
                .term(formulation.start[&j], 1.0)
                .term(formulation.start[&i], -1.0)
                .term(arc, -big_m);
            model.add_constraint(
                Constraint::geq(expr, travel - big_m).with_name(format!("time_{}_{}", a, b)),
            );
        }

        Ok((model, formulation))
    }

    fn extract(&self, instance: &VrptwInstance, solution: &Solution) -> Result<VrptwSolution> {
        let selected: Vec<Arc> = self
            .x
            .iter()
            .filter(|&(_, var)| solution.is_set(var))
            .map(|(arc, _)| arc)
            .collect();

        let mut successor = BTreeMap::new();
        for &(i, j) in &selected {
            if i != AugmentedNode::Source && successor.insert(i, j).is_some() {
                return Err(FormulationError::InconsistentSolution(format!(
                    "node {} is left more than once",
                    i
                )));
            }
        }

        let mut routes = Vec::new();
        let mut visited = 0;
        for &(_, first) in selected.iter().filter(|(i, _)| *i == AugmentedNode::Source) {
            let mut route = Route {
                customers: Vec::new(),
                load: 0,
                service_starts: Vec::new(),
            };
            let mut node = first;
            while let AugmentedNode::Customer(c) = node {
                if route.customers.len() >= self.num_customers {
                    return Err(FormulationError::InconsistentSolution(format!(
                        "route through {} does not return to the depot",
                        c
                    )));
                }
                route.customers.push(c);
                route.load += instance.demands[c];
                route.service_starts.push(solution.value(self.start[&node]));
                node = match successor.get(&node) {
                    Some(&next) => next,
                    None => {
                        return Err(FormulationError::InconsistentSolution(format!(
                            "customer {} is never left",
                            c
                        )))
                    }
                };
            }
            visited += route.customers.len();
            routes.push(route);
        }
        if visited != self.num_customers {
            return Err(FormulationError::InconsistentSolution(format!(
                "routes visit {} of {} customers",
                visited, self.num_customers
            )));
        }

        let total_distance = selected
            .iter()
            .map(|(i, j)| u64::from(instance.distance(i.physical(), j.physical())))
            .sum();
        Ok(VrptwSolution {
            arcs: selected,
            routes,
            total_distance,
        })
    }
}

impl VrptwFormulation {
    fn outgoing(&self, node: AugmentedNode) -> impl Iterator<Item = (Arc, VarId)> + '_ {
        self.x.iter().filter(move |((i, _), _)| *i == node)
    }

    fn incoming(&self, node: AugmentedNode) -> impl Iterator<Item = (Arc, VarId)> + '_ {
        self.x.iter().filter(move |((_, j), _)| *j == node)
    }
}
