//! The station registry. Backed by an insertion-ordered map so that
//! "registry order" (used for broadcast fan-out and as the scan tie-break)
//! is simply iteration order, with O(1) address lookup for submissions
//! and deliveries.

use indexmap::IndexMap;

use crate::address::Address;
use crate::station::Station;

#[derive(Debug, Default)]
pub struct Registry {
    stations: IndexMap<Address, Station>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            stations: IndexMap::new(),
        }
    }

    /// Inserts a station. Returns an error string if the address is
    /// already present — duplicates are a fatal config error.
    pub fn insert(&mut self, station: Station) -> Result<(), Address> {
        if self.stations.contains_key(&station.address) {
            return Err(station.address);
        }
        self.stations.insert(station.address, station);
        Ok(())
    }

    pub fn get(&self, address: &Address) -> Option<&Station> {
        self.stations.get(address)
    }

    pub fn get_mut(&mut self, address: &Address) -> Option<&mut Station> {
        self.stations.get_mut(address)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.stations.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Registry order: the order stations were inserted.
    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Station> {
        self.stations.values_mut()
    }

    /// The minimum head-of-queue expiry across every station and both
    /// access categories — the rearm target for the global timer.
    pub fn next_expiry(&self) -> Option<tokio::time::Instant> {
        self.stations
            .values()
            .filter_map(Station::earliest_expiry)
            .min()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::station::{Queue, DATA_CW_MAX, DATA_CW_MIN, MGMT_CW_MAX, MGMT_CW_MIN};

    fn mk_station(n: u8) -> Station {
        Station::new(
            Address::sequential(n),
            Queue::new(MGMT_CW_MIN, MGMT_CW_MAX),
            Queue::new(DATA_CW_MIN, DATA_CW_MAX),
        )
    }

    #[test]
    fn rejects_duplicate_addresses() {
        let mut reg = Registry::new();
        reg.insert(mk_station(1)).unwrap();
        assert!(reg.insert(mk_station(1)).is_err());
    }

    #[test]
    fn iteration_is_insertion_order() {
        let mut reg = Registry::new();
        for n in [3, 1, 2] {
            reg.insert(mk_station(n)).unwrap();
        }
        let order: Vec<_> = reg.iter().map(|s| s.address).collect();
        assert_eq!(
            order,
            vec![
                Address::sequential(3),
                Address::sequential(1),
                Address::sequential(2),
            ]
        );
    }

    #[test]
    fn next_expiry_none_when_all_empty() {
        let mut reg = Registry::new();
        reg.insert(mk_station(1)).unwrap();
        assert_eq!(reg.next_expiry(), None);
    }
}
