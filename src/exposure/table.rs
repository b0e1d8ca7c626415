// SPDX-License-Identifier: GPL-3.0-only

//! Nearest-match queries over the discrete exposure step tables
//!
//! All lookups are linear scans; the tables are read-only and under 64
//! entries, so nothing fancier is warranted.

/// Index of the table entry closest to `value`, ties broken toward the
/// lower index (first encountered minimum). `None` on an empty table.
pub fn closest_index<T>(table: &[T], value: T) -> Option<usize>
where
    T: Copy + Ord + std::ops::Sub<Output = T>,
{
    let mut best: Option<(usize, T)> = None;
    for (i, &entry) in table.iter().enumerate() {
        let diff = if entry > value {
            entry - value
        } else {
            value - entry
        };
        match best {
            Some((_, best_diff)) if diff >= best_diff => {}
            _ => best = Some((i, diff)),
        }
    }
    best.map(|(i, _)| i)
}

/// The ISO step closest to `iso`
pub fn closest_iso(table: &[i32], iso: i32) -> i32 {
    closest_index(table, iso).map_or(iso, |i| table[i])
}

/// The shutter step closest to `shutter_ns`
pub fn closest_shutter(table: &[i64], shutter_ns: i64) -> i64 {
    closest_index(table, shutter_ns).map_or(shutter_ns, |i| table[i])
}

/// ISO steps usable on a sensor reporting the given capability range
pub fn iso_in_range(table: &[i32], min: i32, max: i32) -> Vec<i32> {
    table
        .iter()
        .copied()
        .filter(|&iso| iso >= min && iso <= max)
        .collect()
}

/// Shutter steps usable on the sensor, additionally bounded by the
/// application's maximum shutter time
pub fn shutter_in_range(table: &[i64], min_ns: i64, max_ns: i64, cap_ns: i64) -> Vec<i64> {
    let max_ns = max_ns.min(cap_ns);
    table
        .iter()
        .copied()
        .filter(|&ns| ns >= min_ns && ns <= max_ns)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{ISO_TABLE, SHUTTER_TABLE_NS};

    #[test]
    fn test_closest_iso_exact_and_between() {
        assert_eq!(closest_iso(ISO_TABLE, 400), 400);
        assert_eq!(closest_iso(ISO_TABLE, 90), 100);
        assert_eq!(closest_iso(ISO_TABLE, 99999), 12800);
    }

    #[test]
    fn test_closest_iso_tie_takes_lower_index() {
        // 450 is equidistant from 400 and 500
        assert_eq!(closest_iso(ISO_TABLE, 450), 400);
    }

    #[test]
    fn test_closest_is_minimal() {
        // No table element may beat the returned one
        for probe in [0i32, 130, 449, 451, 777, 1500, 9000, 50000] {
            let chosen = closest_iso(ISO_TABLE, probe);
            assert!(ISO_TABLE.contains(&chosen));
            for &other in ISO_TABLE {
                assert!(
                    (other - probe).abs() >= (chosen - probe).abs(),
                    "{other} beats {chosen} for probe {probe}"
                );
            }
        }
    }

    #[test]
    fn test_closest_shutter() {
        assert_eq!(closest_shutter(SHUTTER_TABLE_NS, 16_666_667), 16_666_667);
        assert_eq!(closest_shutter(SHUTTER_TABLE_NS, 17_000_000), 16_666_667);
        assert_eq!(closest_shutter(SHUTTER_TABLE_NS, 0), 125_000);
        assert_eq!(
            closest_shutter(SHUTTER_TABLE_NS, 5_000_000_000),
            1_000_000_000
        );
    }

    #[test]
    fn test_closest_index_empty_table() {
        assert_eq!(closest_index::<i32>(&[], 5), None);
        // The convenience wrappers fall back to the probe value
        assert_eq!(closest_iso(&[], 640), 640);
    }

    #[test]
    fn test_find_index_for_stepping() {
        let idx = closest_index(ISO_TABLE, 800).unwrap();
        assert_eq!(ISO_TABLE[idx], 800);
        assert_eq!(ISO_TABLE[idx + 1], 1000);
        assert_eq!(ISO_TABLE[idx - 1], 640);
    }

    #[test]
    fn test_iso_in_range() {
        let usable = iso_in_range(ISO_TABLE, 100, 3200);
        assert_eq!(usable.first(), Some(&100));
        assert_eq!(usable.last(), Some(&3200));
        assert!(usable.iter().all(|&iso| iso <= 3200));
    }

    #[test]
    fn test_shutter_in_range_applies_cap() {
        // Sensor allows up to 1s but the application caps at 1/4
        let usable = shutter_in_range(SHUTTER_TABLE_NS, 125_000, 1_000_000_000, 250_000_000);
        assert_eq!(usable.last(), Some(&250_000_000));
    }
}
