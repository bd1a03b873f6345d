use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Courier {
    pub id: String,
    pub name: String,
    pub active: bool,
}

impl Courier {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            active: true,
        }
    }
}

/// Roster used when the couriers collection has never been written.
pub fn default_roster() -> Vec<Courier> {
    vec![
        Courier::new("d1", "Juan Repartidor"),
        Courier::new("d2", "Pedro Veloz"),
    ]
}
