use std::collections::HashMap;
use std::time::Duration;

use grb::prelude::*;
use grb::Status;
use itertools::iproduct;
use log::{debug, info, warn};
use serde::Serialize;

use super::sets_and_parameters::{
    CommodityIndex, EdgeIndex, NodeIndex, OptimizationData, Parameters,
};
use super::solution::{EdgeUsage, Route, RoutingResult, SolutionReport, SolutionSummary};
use crate::config::{CapacityMode, RoutingConfig};
use crate::error::{Error, Result};
use crate::models::utils::{AddVars, ConvertVars};
use crate::network::{EdgeKey, NodeId};
use crate::problem::Commodity;

pub struct Variables {
    /// 1 if commodity k travels along edge e, indexed (e, k)
    pub x: HashMap<(EdgeIndex, CommodityIndex), Var>,
}

#[derive(Default)]
pub struct Constraints {
    /// Flow balance of commodity k at node n, indexed (n, k)
    pub flow: HashMap<(NodeIndex, CommodityIndex), Constr>,
    /// Aggregate speed budget of edge e
    pub capacity: HashMap<EdgeIndex, Constr>,
    /// Speed budget of edge e for commodity k alone, indexed (e, k)
    pub commodity_capacity: HashMap<(EdgeIndex, CommodityIndex), Constr>,
}

/// Size of a built routing model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelStats {
    pub variables: usize,
    pub flow_constraints: usize,
    pub capacity_constraints: usize,
}

/// How a solve ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolveOutcome {
    /// Proven optimal
    Optimal { objective: f64 },
    /// Stopped by the time limit with a feasible incumbent
    Feasible { objective: f64, gap: f64 },
    /// Proven infeasible
    Infeasible,
    /// Stopped without finding any feasible assignment
    NoIncumbent(Status),
}

impl SolveOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            SolveOutcome::Optimal { .. } | SolveOutcome::Feasible { .. }
        )
    }

    pub fn objective(&self) -> Option<f64> {
        match self {
            SolveOutcome::Optimal { objective } | SolveOutcome::Feasible { objective, .. } => {
                Some(*objective)
            }
            _ => None,
        }
    }
}

/// The multi-commodity routing MILP of one routing attempt.
///
/// Owns its solver model, variables and constraints; create a fresh one for every set of
/// emergencies. The lifecycle is `build`, then `solve`, then any of the extraction methods.
pub struct AmbulanceRoutingModel<'a> {
    data: &'a OptimizationData,
    parameters: Parameters,
    model: Model,
    variables: Variables,
    constraints: Constraints,
    solution: Option<RoutingResult>,
}

impl<'a> AmbulanceRoutingModel<'a> {
    /// builds the routing model
    pub fn build(data: &'a OptimizationData, config: &RoutingConfig) -> Result<Self> {
        let parameters = Parameters::new(data, config)?;

        info!(
            "Building ambulance routing model for {} commodities",
            data.commodities.len()
        );

        let mut model = Model::new("ambulance_routing")?;
        if !config.solver_output {
            // Disable console output
            model.set_param(param::OutputFlag, 0)?;
        }
        if let Some(threads) = config.threads {
            model.set_param(param::Threads, threads)?;
        }

        let variables = Self::add_variables(data, &mut model)?;
        model.update()?;

        let mut constraints = Constraints::default();
        constraints.flow = Self::add_flow_constraints(data, &variables, &mut model)?;
        match parameters.capacity_mode {
            CapacityMode::Aggregate => {
                constraints.capacity =
                    Self::add_capacity_constraints(data, &parameters, &variables, &mut model)?
            }
            CapacityMode::PerCommodity => {
                constraints.commodity_capacity = Self::add_commodity_capacity_constraints(
                    data,
                    &parameters,
                    &variables,
                    &mut model,
                )?
            }
        }
        Self::set_objective(data, &parameters, &variables, &mut model)?;
        model.update()?;

        let routing = AmbulanceRoutingModel {
            data,
            parameters,
            model,
            variables,
            constraints,
            solution: None,
        };
        let stats = routing.stats();
        info!(
            "Successfully built routing model: {} variables, {} flow constraints, {} capacity constraints ({})",
            stats.variables,
            stats.flow_constraints,
            stats.capacity_constraints,
            config.capacity_mode
        );

        Ok(routing)
    }

    /// one binary arc-selection variable per routable edge and commodity
    fn add_variables(data: &OptimizationData, model: &mut Model) -> grb::Result<Variables> {
        let indices: Vec<(EdgeIndex, CommodityIndex)> =
            iproduct!(data.routable_edges(), data.commodities.keys()).collect();
        let x = indices.binary(model, "x")?;

        Ok(Variables { x })
    }

    /// outflow - inflow = 1 at the origin, -1 at the commodity's destination and 0 elsewhere
    fn add_flow_constraints(
        data: &OptimizationData,
        variables: &Variables,
        model: &mut Model,
    ) -> grb::Result<HashMap<(NodeIndex, CommodityIndex), Constr>> {
        let x = &variables.x;
        let mut flow = HashMap::with_capacity(data.nodes.len() * data.commodities.len());

        for (n, k) in iproduct!(data.nodes.keys(), data.commodities.keys()) {
            let outflow = data.forward_star[n]
                .iter()
                .filter_map(|e| x.get(&(*e, k)))
                .grb_sum();
            let inflow = data.reverse_star[n]
                .iter()
                .filter_map(|e| x.get(&(*e, k)))
                .grb_sum();
            let rhs = data.supply(n, k);

            let constr = model.add_constr(&format!("flow_{n}_{k}"), c!(outflow - inflow == rhs))?;
            flow.insert((n, k), constr);
        }

        Ok(flow)
    }

    /// the required speeds of all commodities using an edge must fit within its capacity
    fn add_capacity_constraints(
        data: &OptimizationData,
        parameters: &Parameters,
        variables: &Variables,
        model: &mut Model,
    ) -> grb::Result<HashMap<EdgeIndex, Constr>> {
        let x = &variables.x;
        let mut capacity = HashMap::with_capacity(data.edges.len());

        for e in data.routable_edges() {
            let load = data
                .commodities
                .keys()
                .map(|k| parameters.required_speed[k] * x[&(e, k)])
                .grb_sum();
            let constr = model.add_constr(
                &format!("capacity_{e}"),
                c!(load <= parameters.capacity[e]),
            )?;
            capacity.insert(e, constr);
        }

        Ok(capacity)
    }

    /// each commodity on its own must fit within the capacity of the edges it uses
    fn add_commodity_capacity_constraints(
        data: &OptimizationData,
        parameters: &Parameters,
        variables: &Variables,
        model: &mut Model,
    ) -> grb::Result<HashMap<(EdgeIndex, CommodityIndex), Constr>> {
        let x = &variables.x;
        let mut capacity = HashMap::with_capacity(x.len());

        for (e, k) in iproduct!(data.routable_edges(), data.commodities.keys()) {
            let lhs = parameters.required_speed[k] * x[&(e, k)];
            let constr = model.add_constr(
                &format!("capacity_{e}_{k}"),
                c!(lhs <= parameters.capacity[e]),
            )?;
            capacity.insert((e, k), constr);
        }

        Ok(capacity)
    }

    /// minimize the severity-weighted distance travelled by all commodities
    fn set_objective(
        data: &OptimizationData,
        parameters: &Parameters,
        variables: &Variables,
        model: &mut Model,
    ) -> grb::Result<()> {
        let x = &variables.x;
        let cost = iproduct!(data.routable_edges(), data.commodities.keys())
            .map(|(e, k)| parameters.cost[k] * parameters.length_km[e] * x[&(e, k)])
            .grb_sum();

        model.set_objective(cost, Minimize)
    }

    /// Solves the model within `time_limit`.
    ///
    /// A failed solve is an outcome, not an error: `Err` is only returned when the solver itself
    /// fails. Any previously extracted solution is discarded first.
    pub fn solve(&mut self, time_limit: Duration) -> Result<SolveOutcome> {
        self.solution = None;
        self.model
            .set_param(param::TimeLimit, time_limit.as_secs_f64())?;

        info!("Solving routing model with a time limit of {:?}", time_limit);
        self.model.optimize()?;

        let status = self.model.status()?;
        let solutions = self.model.get_attr(attr::SolCount)?;
        debug!("Solver stopped with status {:?} and {} solutions", status, solutions);

        let outcome = match status {
            Status::Optimal => SolveOutcome::Optimal {
                objective: self.model.get_attr(attr::ObjVal)?,
            },
            // all variables are binary, so the model can never be unbounded
            Status::Infeasible | Status::InfOrUnbd => SolveOutcome::Infeasible,
            _ if solutions > 0 => SolveOutcome::Feasible {
                objective: self.model.get_attr(attr::ObjVal)?,
                gap: self.model.get_attr(attr::MIPGap)?,
            },
            _ => SolveOutcome::NoIncumbent(status),
        };

        match outcome.objective() {
            Some(objective) => {
                let values = self.variables.x.convert(&self.model)?;
                self.solution = Some(RoutingResult::from_values(self.data, objective, &values));
                info!("Finished solving routing model, objective = {:.2}", objective);
            }
            None => warn!("Routing model has no feasible solution: {:?}", outcome),
        }

        Ok(outcome)
    }

    pub fn stats(&self) -> ModelStats {
        ModelStats {
            variables: self.variables.x.len(),
            flow_constraints: self.constraints.flow.len(),
            capacity_constraints: self.constraints.capacity.len()
                + self.constraints.commodity_capacity.len(),
        }
    }

    pub fn data(&self) -> &OptimizationData {
        self.data
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// The arc selection of the last successful solve
    pub fn result(&self) -> Result<&RoutingResult> {
        self.solution.as_ref().ok_or(Error::NoSolution)
    }

    pub fn objective(&self) -> Result<f64> {
        Ok(self.result()?.objective)
    }

    /// Cost, travel time and distance of every route
    pub fn solution_summary(&self) -> Result<SolutionSummary> {
        Ok(self.result()?.summary(self.data, &self.parameters))
    }

    /// The node sequence of every route, from the origin to the commodity's destination
    pub fn routes_as_paths(&self) -> Result<Vec<Route>> {
        Ok(self.result()?.routes(self.data)?)
    }

    pub fn selected_arcs(&self) -> Result<Vec<(Commodity, Vec<(NodeId, NodeId, EdgeKey)>)>> {
        Ok(self.result()?.selected_arcs(self.data))
    }

    /// Capacity consumption of every edge used by at least one route
    pub fn edge_usage(&self) -> Result<Vec<EdgeUsage>> {
        Ok(self.result()?.edge_usage(self.data, &self.parameters))
    }

    pub fn report(&self) -> Result<SolutionReport> {
        Ok(self.result()?.report(self.data, &self.parameters)?)
    }
}
