//! Device id assignment from PCI bus ids

use crate::normalize::UsageSample;
use std::collections::{BTreeMap, BTreeSet};

/// Mapping from bus id to a 0-based device id.
///
/// Ids follow the sorted order of the distinct bus ids, so the same set of
/// bus ids always yields the same mapping, whatever the row order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceIndex {
    bus_ids: Vec<String>,
    ids: BTreeMap<String, usize>,
}

impl DeviceIndex {
    /// Build the mapping from any collection of bus ids (duplicates allowed)
    pub fn from_bus_ids<'a, I>(bus_ids: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let distinct: BTreeSet<&str> = bus_ids.into_iter().collect();
        let bus_ids: Vec<String> = distinct.into_iter().map(str::to_string).collect();
        let ids = bus_ids
            .iter()
            .enumerate()
            .map(|(id, bus_id)| (bus_id.clone(), id))
            .collect();
        Self { bus_ids, ids }
    }

    /// Build the mapping from normalized samples
    pub fn from_samples(samples: &[UsageSample]) -> Self {
        Self::from_bus_ids(samples.iter().map(|s| s.bus_id.as_str()))
    }

    pub fn id_of(&self, bus_id: &str) -> Option<usize> {
        self.ids.get(bus_id).copied()
    }

    pub fn bus_id(&self, id: usize) -> Option<&str> {
        self.bus_ids.get(id).map(String::as_str)
    }

    /// All known device ids
    pub fn ids(&self) -> impl Iterator<Item = usize> + '_ {
        0..self.bus_ids.len()
    }

    /// `(device id, bus id)` pairs in id order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.bus_ids.iter().map(String::as_str).enumerate()
    }

    pub fn len(&self) -> usize {
        self.bus_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bus_ids.is_empty()
    }

    /// Attach device ids and x positions to samples
    pub fn attach(&self, samples: Vec<UsageSample>, times: &[f64]) -> Vec<DeviceSample> {
        samples
            .into_iter()
            .zip(times.iter().copied())
            .filter_map(|(sample, time)| {
                let device_id = self.id_of(&sample.bus_id)?;
                Some(DeviceSample {
                    device_id,
                    time,
                    sample,
                })
            })
            .collect()
    }
}

/// A normalized sample tagged with its device id and time axis position
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSample {
    pub device_id: usize,
    pub time: f64,
    pub sample: UsageSample,
}
