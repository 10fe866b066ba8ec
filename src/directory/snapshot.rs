use std::collections::HashMap;

use tracing::{debug, warn};

use crate::domain::{normalize_city_name, City, Route, RouteId};

use super::traits::{CityDirectory, DirectoryEntry};

/// Immutable, indexed view of all routes and cities at one point in time.
#[derive(Debug, Default)]
pub struct DirectorySnapshot {
    entries: HashMap<String, DirectoryEntry>,
    route_count: usize,
    city_count: usize,
}

impl DirectorySnapshot {
    /// Index cities by normalized name, resolving their route references.
    ///
    /// When several cities share a normalized name the lowest id wins.
    pub fn build(routes: Vec<Route>, mut cities: Vec<City>) -> Self {
        let route_count = routes.len();
        let city_count = cities.len();
        let routes: HashMap<RouteId, Route> = routes.into_iter().map(|r| (r.id, r)).collect();

        cities.sort_by_key(|c| c.id);

        let mut entries = HashMap::with_capacity(cities.len());
        for city in cities {
            let key = normalize_city_name(&city.name);
            if key.is_empty() {
                warn!(city_id = %city.id, "Skipping city with blank name");
                continue;
            }
            if entries.contains_key(&key) {
                debug!(city_id = %city.id, key = %key, "Duplicate normalized city name ignored");
                continue;
            }

            let route = match city.route_id {
                Some(route_id) => {
                    let route = routes.get(&route_id).cloned();
                    if route.is_none() {
                        warn!(city_id = %city.id, route_id = %route_id, "City references missing route");
                    }
                    route
                }
                None => None,
            };

            entries.insert(
                key,
                DirectoryEntry {
                    city_id: city.id,
                    name: city.name,
                    province: city.province,
                    route,
                },
            );
        }

        DirectorySnapshot {
            entries,
            route_count,
            city_count,
        }
    }

    /// Number of routes loaded.
    pub fn route_count(&self) -> usize {
        self.route_count
    }

    /// Number of city records loaded (before de-duplication).
    pub fn city_count(&self) -> usize {
        self.city_count
    }

    /// Number of distinct lookup keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CityDirectory for DirectorySnapshot {
    fn find_by_normalized_name(&self, name: &str) -> Option<&DirectoryEntry> {
        self.entries.get(name)
    }
}
