//! Device filtering

use crate::devices::{DeviceIndex, DeviceSample};
use crate::{PlotError, Result};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Keep only the samples of the requested devices.
///
/// `None` or an empty request keeps everything. The result must not be
/// empty, with or without a filter.
pub fn filter_devices(
    samples: Vec<DeviceSample>,
    index: &DeviceIndex,
    requested: Option<&[usize]>,
) -> Result<Vec<DeviceSample>> {
    let samples = match requested {
        Some(requested) if !requested.is_empty() => {
            let requested: BTreeSet<usize> = requested.iter().copied().collect();
            for unknown in requested.iter().filter(|id| index.bus_id(**id).is_none()) {
                warn!("Requested GPU id {} not present (known ids: {})", unknown, known_ids(index));
            }

            let to_drop: BTreeSet<usize> = index.ids().filter(|id| !requested.contains(id)).collect();
            debug!("Dropping samples of GPU ids {:?}", to_drop);

            samples
                .into_iter()
                .filter(|s| !to_drop.contains(&s.device_id))
                .collect()
        }
        _ => samples,
    };

    if samples.is_empty() {
        return Err(PlotError::NoValues);
    }
    Ok(samples)
}

fn known_ids(index: &DeviceIndex) -> String {
    match index.len() {
        0 => "none".to_string(),
        n => format!("0..={}", n - 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::UsageSample;

    fn tagged(bus_ids: &[&str]) -> (DeviceIndex, Vec<DeviceSample>) {
        let samples: Vec<UsageSample> = bus_ids
            .iter()
            .enumerate()
            .map(|(i, bus_id)| UsageSample {
                line: i as u64 + 2,
                index: i.to_string(),
                bus_id: bus_id.to_string(),
                gpu: 0.5,
                memory: 0.25,
                extra: Vec::new(),
            })
            .collect();
        let index = DeviceIndex::from_samples(&samples);
        let times: Vec<f64> = (0..samples.len()).map(|i| i as f64).collect();
        let tagged = index.attach(samples, &times);
        (index, tagged)
    }

    fn ids(samples: &[DeviceSample]) -> Vec<usize> {
        samples.iter().map(|s| s.device_id).collect()
    }

    #[test]
    fn test_no_filter_keeps_everything() {
        let (index, samples) = tagged(&["a", "b", "c", "a"]);
        let kept = filter_devices(samples.clone(), &index, None).unwrap();
        assert_eq!(kept, samples);

        let kept = filter_devices(samples.clone(), &index, Some(&[])).unwrap();
        assert_eq!(kept, samples);
    }

    #[test]
    fn test_filter_keeps_exactly_requested() {
        let (index, samples) = tagged(&["a", "b", "c", "a", "c", "b"]);
        let kept = filter_devices(samples, &index, Some(&[0, 2])).unwrap();
        assert_eq!(ids(&kept), vec![0, 2, 0, 2]);
    }

    #[test]
    fn test_duplicates_and_unknown_ids_are_harmless() {
        let (index, samples) = tagged(&["a", "b", "a"]);
        let kept = filter_devices(samples, &index, Some(&[1, 1, 7])).unwrap();
        assert_eq!(ids(&kept), vec![1]);
    }

    #[test]
    fn test_disjoint_filter_fails() {
        let (index, samples) = tagged(&["a", "b"]);
        let err = filter_devices(samples, &index, Some(&[5])).unwrap_err();
        assert!(matches!(err, PlotError::NoValues));
    }

    #[test]
    fn test_empty_input_fails_without_filter() {
        let (index, samples) = tagged(&[]);
        let err = filter_devices(samples, &index, None).unwrap_err();
        assert!(matches!(err, PlotError::NoValues));
    }

    #[test]
    fn test_known_ids_are_inclusive() {
        let (index, _) = tagged(&["a", "b", "c"]);
        assert_eq!(known_ids(&index), "0..=2");

        let (index, _) = tagged(&["a"]);
        assert_eq!(known_ids(&index), "0..=0");

        let (index, _) = tagged(&[]);
        assert_eq!(known_ids(&index), "none");
    }
}
