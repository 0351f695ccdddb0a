use super::types::Position2D;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Separator between source and destination point in a path name.
pub const PATH_SEPARATOR: &str = " --- ";

pub fn path_resource(source: &str, destination: &str) -> String {
    format!("{}{}{}", source, PATH_SEPARATOR, destination)
}

/// Source and destination of a path name, `None` for anything else.
pub fn path_endpoints(name: &str) -> Option<(&str, &str)> {
    let mut parts = name.split(PATH_SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(source), Some(destination), None) => Some((source, destination)),
        _ => None,
    }
}

pub fn reversed_path(name: &str) -> Option<String> {
    path_endpoints(name).map(|(source, destination)| path_resource(destination, source))
}

/// A path and its reverse share one claim key.
pub fn canonical_resource(name: &str) -> String {
    match path_endpoints(name) {
        Some((source, destination)) if destination < source => {
            path_resource(destination, source)
        }
        _ => name.to_string(),
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LocationKind {
    Station,
    /// Lower number is higher priority; `None` ranks below every number.
    Parking { priority: Option<u32> },
    Charging,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub name: String,
    pub kind: LocationKind,
    pub position: Position2D,
}

impl Location {
    pub fn station(name: impl Into<String>, position: Position2D) -> Self {
        Self { name: name.into(), kind: LocationKind::Station, position }
    }

    pub fn parking(name: impl Into<String>, position: Position2D, priority: Option<u32>) -> Self {
        Self { name: name.into(), kind: LocationKind::Parking { priority }, position }
    }

    pub fn charging(name: impl Into<String>, position: Position2D) -> Self {
        Self { name: name.into(), kind: LocationKind::Charging, position }
    }

    pub fn is_parking(&self) -> bool {
        matches!(self.kind, LocationKind::Parking { .. })
    }

    pub fn is_charging(&self) -> bool {
        self.kind == LocationKind::Charging
    }

    /// Sort key for parking priority; smaller is better.
    pub fn parking_rank(&self) -> u32 {
        match self.kind {
            LocationKind::Parking { priority: Some(p) } => p,
            _ => u32::MAX,
        }
    }
}

/// Exclusive claims of vehicles on named resources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceClaims {
    holders: BTreeMap<String, String>,
}

impl ResourceClaims {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holder(&self, resource: &str) -> Option<&str> {
        self.holders.get(&canonical_resource(resource)).map(String::as_str)
    }

    pub fn is_free_for(&self, resource: &str, vehicle_id: &str) -> bool {
        self.holder(resource).map_or(true, |holder| holder == vehicle_id)
    }

    /// First resource that another vehicle holds, with its holder.
    pub fn first_conflict<'a, I>(&self, resources: I, vehicle_id: &str) -> Option<(String, String)>
    where
        I: IntoIterator<Item = &'a String>,
    {
        resources.into_iter().find_map(|resource| match self.holder(resource) {
            Some(holder) if holder != vehicle_id => Some((resource.clone(), holder.to_string())),
            _ => None,
        })
    }

    pub fn can_claim_all<'a, I>(&self, resources: I, vehicle_id: &str) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        self.first_conflict(resources, vehicle_id).is_none()
    }

    /// Claims every resource or none of them.
    pub fn claim_all<'a, I>(&mut self, resources: I, vehicle_id: &str) -> bool
    where
        I: IntoIterator<Item = &'a String> + Clone,
    {
        if !self.can_claim_all(resources.clone(), vehicle_id) {
            return false;
        }
        for resource in resources {
            self.holders
                .insert(canonical_resource(resource), vehicle_id.to_string());
        }
        true
    }

    pub fn release_all(&mut self, vehicle_id: &str) -> Vec<String> {
        let released: Vec<String> = self
            .holders
            .iter()
            .filter(|(_, holder)| holder.as_str() == vehicle_id)
            .map(|(resource, _)| resource.clone())
            .collect();
        for resource in &released {
            self.holders.remove(resource);
        }
        released
    }

    pub fn claims_of(&self, vehicle_id: &str) -> BTreeSet<String> {
        self.holders
            .iter()
            .filter(|(_, holder)| holder.as_str() == vehicle_id)
            .map(|(resource, _)| resource.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.holders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }
}
