//! Vehicle routing instances with capacities and time windows, and the
//! VRP-REP XML reader that produces them.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use xml::reader::{EventReader, XmlEvent};

use super::{malformed, InstanceError, Result};

/// Service must start within `[earliest, latest]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub earliest: f64,
    pub latest: f64,
}

impl TimeWindow {
    pub fn new(earliest: f64, latest: f64) -> Self {
        Self { earliest, latest }
    }

    /// Window of the depot: open from time zero on
    pub fn unbounded() -> Self {
        Self::new(0.0, f64::INFINITY)
    }

    pub fn contains(&self, time: f64) -> bool {
        time >= self.earliest && time <= self.latest
    }
}

/// CVRPTW instance.
///
/// Per-node vectors and the distance matrix are indexed by physical node:
/// 0 is the depot, `1..=num_customers` are customers.
#[derive(Debug, Clone, PartialEq)]
pub struct VrptwInstance {
    pub name: String,
    pub num_customers: usize,
    pub vehicle_capacity: u32,
    pub fleet_size: usize,
    pub distances: Vec<Vec<u32>>,
    pub demands: Vec<u32>,
    pub service_times: Vec<u32>,
    pub time_windows: Vec<TimeWindow>,
}

impl VrptwInstance {
    /// Builds an instance from planar coordinates; distances are Euclidean,
    /// rounded to the nearest integer.
    pub fn from_coordinates(
        name: impl Into<String>,
        coordinates: &[(f64, f64)],
        vehicle_capacity: u32,
        fleet_size: usize,
        demands: Vec<u32>,
        service_times: Vec<u32>,
        time_windows: Vec<TimeWindow>,
    ) -> Self {
        Self {
            name: name.into(),
            num_customers: coordinates.len().saturating_sub(1),
            vehicle_capacity,
            fleet_size,
            distances: distance_matrix(coordinates),
            demands,
            service_times,
            time_windows,
        }
    }

    /// Number of physical nodes, depot included
    pub fn num_nodes(&self) -> usize {
        self.num_customers + 1
    }

    pub fn distance(&self, from: usize, to: usize) -> u32 {
        self.distances[from][to]
    }

    /// Time between starting service at `from` and arriving at `to`:
    /// service duration at `from` plus travel distance (unit speed).
    pub fn travel_time(&self, from: usize, to: usize) -> f64 {
        f64::from(self.service_times[from]) + f64::from(self.distances[from][to])
    }

    pub fn validate(&self) -> Result<()> {
        let n = self.num_nodes();
        if self.distances.len() != n || self.distances.iter().any(|row| row.len() != n) {
            return malformed(format!("distance matrix must be {}x{}", n, n));
        }
        for i in 0..n {
            if self.distances[i][i] != 0 {
                return malformed(format!("distance from node {} to itself is not zero", i));
            }
            for j in (i + 1)..n {
                if self.distances[i][j] != self.distances[j][i] {
                    return malformed(format!("distance matrix is not symmetric at ({}, {})", i, j));
                }
            }
        }
        if self.demands.len() != n || self.service_times.len() != n || self.time_windows.len() != n
        {
            return malformed(format!(
                "expected {} demands, service times and time windows",
                n
            ));
        }
        if self.demands[0] != 0 || self.service_times[0] != 0 {
            return malformed("depot must have zero demand and zero service time");
        }
        let depot = self.time_windows[0];
        if depot.earliest != 0.0 || depot.latest != f64::INFINITY {
            return malformed("depot time window must be (0, +inf)");
        }
        for (node, window) in self.time_windows.iter().enumerate() {
            if !window.earliest.is_finite()
                || window.earliest < 0.0
                || window.earliest > window.latest
            {
                return malformed(format!("node {} has an invalid time window", node));
            }
        }
        if let Some(node) = (1..n).find(|&i| self.demands[i] > self.vehicle_capacity) {
            return malformed(format!(
                "demand {} of node {} exceeds vehicle capacity {}",
                self.demands[node], node, self.vehicle_capacity
            ));
        }
        Ok(())
    }
}

/// Symmetric matrix of rounded Euclidean distances
pub fn distance_matrix(coordinates: &[(f64, f64)]) -> Vec<Vec<u32>> {
    let n = coordinates.len();
    let mut matrix = vec![vec![0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let (dx, dy) = (
                coordinates[i].0 - coordinates[j].0,
                coordinates[i].1 - coordinates[j].1,
            );
            let d = dx.hypot(dy).round() as u32;
            matrix[i][j] = d;
            matrix[j][i] = d;
        }
    }
    matrix
}

#[derive(Debug, Clone, Default)]
struct Request {
    window: Option<(f64, f64)>,
    quantity: f64,
    service_time: f64,
}

/// Reader for datasets in the VRP-REP XML format.
///
/// Only the elements a CVRPTW instance needs are read: `info/name`,
/// `network/nodes/node` coordinates, the first `fleet/vehicle_profile`
/// (`number` attribute and `capacity`) and every `requests/request`.
#[derive(Debug, Clone, Default)]
pub struct VrpRepReader {
    dataset_name: String,
    coordinates: BTreeMap<usize, (f64, f64)>,
    fleet_size: Option<usize>,
    capacity: Option<f64>,
    requests: BTreeMap<usize, Request>,
}

impl VrpRepReader {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| InstanceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn parse(document: &str) -> Result<Self> {
        Self::from_reader(document.as_bytes())
    }

    pub fn from_reader<R: Read>(source: R) -> Result<Self> {
        let mut reader = VrpRepReader::default();
        let mut path: Vec<String> = Vec::new();
        let mut node: Option<usize> = None;
        let mut request_node: Option<usize> = None;
        let mut window = (None, None);

        for event in EventReader::new(source) {
            match event? {
                XmlEvent::StartElement {
                    name, attributes, ..
                } => {
                    let attr = |key: &str| {
                        attributes
                            .iter()
                            .find(|a| a.name.local_name == key)
                            .map(|a| a.value.clone())
                    };
                    match name.local_name.as_str() {
                        "node" => node = Some(parse_attr(attr("id"), "node@id")?),
                        "vehicle_profile" if reader.fleet_size.is_none() => {
                            reader.fleet_size = Some(parse_attr(attr("number"), "vehicle_profile@number")?);
                        }
                        "request" => {
                            request_node = Some(parse_attr(attr("node"), "request@node")?);
                            window = (None, None);
                        }
                        _ => {}
                    }
                    path.push(name.local_name);
                }
                XmlEvent::Characters(text) => {
                    let text = text.trim();
                    let tail: Vec<&str> = path.iter().rev().take(2).map(String::as_str).collect();
                    match (tail.as_slice(), node, request_node) {
                        (["name", "info"], _, _) => reader.dataset_name = text.to_string(),
                        (["cx", "node"], Some(id), _) => {
                            reader.coordinates.entry(id).or_default().0 = parse_number(text, "cx")?
                        }
                        (["cy", "node"], Some(id), _) => {
                            reader.coordinates.entry(id).or_default().1 = parse_number(text, "cy")?
                        }
                        (["capacity", "vehicle_profile"], _, _) if reader.capacity.is_none() => {
                            reader.capacity = Some(parse_number(text, "capacity")?)
                        }
                        (["start", "tw"], _, Some(_)) => window.0 = Some(parse_number(text, "tw/start")?),
                        (["end", "tw"], _, Some(_)) => window.1 = Some(parse_number(text, "tw/end")?),
                        (["quantity", "request"], _, Some(id)) => {
                            reader.requests.entry(id).or_default().quantity = parse_number(text, "quantity")?
                        }
                        (["service_time", "request"], _, Some(id)) => {
                            reader.requests.entry(id).or_default().service_time =
                                parse_number(text, "service_time")?
                        }
                        _ => {}
                    }
                }
                XmlEvent::EndElement { name } => {
                    match name.local_name.as_str() {
                        "node" => node = None,
                        "tw" => {
                            if let (Some(id), (Some(start), Some(end))) = (request_node, window) {
                                reader.requests.entry(id).or_default().window = Some((start, end));
                            }
                        }
                        "request" => request_node = None,
                        _ => {}
                    }
                    path.pop();
                }
                _ => {}
            }
        }
        Ok(reader)
    }

    pub fn dataset_name(&self) -> &str {
        &self.dataset_name
    }

    /// Number of nodes in the network, depot included
    pub fn number_of_nodes(&self) -> usize {
        self.coordinates.len()
    }

    pub fn fleet_size(&self) -> Option<usize> {
        self.fleet_size
    }

    pub fn vehicle_capacity(&self) -> Option<f64> {
        self.capacity
    }

    /// Coordinates ordered by node id
    pub fn node_coordinates(&self) -> Vec<(f64, f64)> {
        self.coordinates.values().copied().collect()
    }

    /// Demand per node id, 0 for nodes without a request
    pub fn node_demands(&self) -> Vec<f64> {
        self.per_node(|r| r.quantity, 0.0)
    }

    pub fn service_times(&self) -> Vec<f64> {
        self.per_node(|r| r.service_time, 0.0)
    }

    /// Time window per node id; nodes without one get (0, +inf)
    pub fn time_windows(&self) -> Vec<(f64, f64)> {
        self.per_node(|r| r.window.unwrap_or((0.0, f64::INFINITY)), (0.0, f64::INFINITY))
    }

    fn per_node<T: Copy>(&self, field: impl Fn(&Request) -> T, default: T) -> Vec<T> {
        self.coordinates
            .keys()
            .map(|id| self.requests.get(id).map_or(default, &field))
            .collect()
    }

    /// Converts the dataset into a validated instance. Quantities and
    /// windows are rounded to integers and the depot window is opened to
    /// (0, +inf).
    pub fn into_instance(self) -> Result<VrptwInstance> {
        let ids: Vec<usize> = self.coordinates.keys().copied().collect();
        if ids.is_empty() {
            return malformed("document has no nodes");
        }
        if ids.iter().enumerate().any(|(pos, &id)| pos != id) {
            return malformed("node ids must be 0..N with the depot at 0");
        }
        let capacity = self
            .capacity
            .ok_or_else(|| InstanceError::Malformed("missing vehicle capacity".to_string()))?;
        let fleet_size = self
            .fleet_size
            .ok_or_else(|| InstanceError::Malformed("missing fleet size".to_string()))?;

        let demands = self.node_demands().iter().map(|q| q.round() as u32).collect();
        let service_times = self.service_times().iter().map(|s| s.round() as u32).collect();
        let mut time_windows: Vec<TimeWindow> = self
            .time_windows()
            .into_iter()
            .map(|(start, end)| TimeWindow::new(start.round(), end.round()))
            .collect();
        time_windows[0] = TimeWindow::unbounded();

        let instance = VrptwInstance::from_coordinates(
            self.dataset_name.clone(),
            &self.node_coordinates(),
            capacity.round() as u32,
            fleet_size,
            demands,
            service_times,
            time_windows,
        );
        instance.validate()?;
        Ok(instance)
    }
}

/// Loads a VRP-REP XML dataset from disk.
pub fn load_vrprep(path: &Path) -> Result<VrptwInstance> {
    VrpRepReader::from_path(path)?.into_instance()
}

fn parse_attr<T: std::str::FromStr>(value: Option<String>, what: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    let value = value.ok_or_else(|| InstanceError::Malformed(format!("missing {}", what)))?;
    value
        .parse()
        .map_err(|e| InstanceError::Malformed(format!("{} '{}': {}", what, value, e)))
}

fn parse_number(text: &str, what: &str) -> Result<f64> {
    text.parse()
        .map_err(|e| InstanceError::Malformed(format!("{} '{}': {}", what, text, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<instance>
  <info><dataset>test</dataset><name>T3</name></info>
  <network>
    <nodes>
      <node id="0" type="0"><cx>0.0</cx><cy>0.0</cy></node>
      <node id="1" type="1"><cx>3.0</cx><cy>4.0</cy></node>
      <node id="2" type="1"><cx>6.0</cx><cy>8.0</cy></node>
    </nodes>
  </network>
  <fleet>
    <vehicle_profile type="0" number="2">
      <departure_node>0</departure_node>
      <arrival_node>0</arrival_node>
      <capacity>10.0</capacity>
    </vehicle_profile>
  </fleet>
  <requests>
    <request id="1" node="1">
      <tw><start>5</start><end>20</end></tw>
      <quantity>4.0</quantity>
      <service_time>2.0</service_time>
    </request>
    <request id="2" node="2">
      <tw><start>0</start><end>40</end></tw>
      <quantity>5.6</quantity>
      <service_time>1.0</service_time>
    </request>
  </requests>
</instance>"#;

    #[test]
    fn reads_dataset_fields() {
        let reader = VrpRepReader::parse(DOC).unwrap();
        assert_eq!(reader.dataset_name(), "T3");
        assert_eq!(reader.number_of_nodes(), 3);
        assert_eq!(reader.fleet_size(), Some(2));
        assert_eq!(reader.vehicle_capacity(), Some(10.0));
        assert_eq!(reader.node_coordinates()[2], (6.0, 8.0));
        assert_eq!(reader.node_demands(), vec![0.0, 4.0, 5.6]);
        assert_eq!(reader.time_windows()[1], (5.0, 20.0));
    }

    #[test]
    fn converts_to_validated_instance() {
        let instance = VrpRepReader::parse(DOC).unwrap().into_instance().unwrap();
        assert_eq!(instance.num_customers, 2);
        assert_eq!(instance.distances[0][1], 5);
        assert_eq!(instance.distances[1][2], 5);
        assert_eq!(instance.distances[0][2], 10);
        assert_eq!(instance.demands, vec![0, 4, 6]);
        assert_eq!(instance.time_windows[0], TimeWindow::unbounded());
        assert_eq!(instance.travel_time(1, 2), 7.0);
    }

    #[test]
    fn rejects_gaps_in_node_ids() {
        let doc = DOC.replace(r#"node id="2""#, r#"node id="7""#);
        let err = VrpRepReader::parse(&doc).unwrap().into_instance();
        assert!(matches!(err, Err(InstanceError::Malformed(_))));
    }

    #[test]
    fn rejects_asymmetric_distances() {
        let mut instance = VrpRepReader::parse(DOC).unwrap().into_instance().unwrap();
        instance.distances[0][1] = 9;
        assert!(instance.validate().is_err());
    }

    #[test]
    fn missing_window_is_open_but_openings_are_finite() {
        let doc = DOC.replace("<tw><start>0</start><end>40</end></tw>", "");
        let mut instance = VrpRepReader::parse(&doc).unwrap().into_instance().unwrap();
        assert_eq!(instance.time_windows[2].latest, f64::INFINITY);

        instance.time_windows[2] = TimeWindow::new(f64::INFINITY, f64::INFINITY);
        assert!(matches!(instance.validate(), Err(InstanceError::Malformed(_))));
    }

    #[test]
    fn rejects_broken_xml() {
        assert!(matches!(
            VrpRepReader::parse("<instance><network>"),
            Err(InstanceError::Xml(_))
        ));
    }
}
