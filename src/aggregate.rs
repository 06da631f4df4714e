// Group-by primitives shared by the reports.
//
// Groups come out in first-appearance order so every later stable sort
// breaks ties by source row order.
use crate::types::{MissingKeys, RankEntry, MISSING_LABEL};
use crate::util::{average, month_number};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: String,
    pub rows: Vec<usize>,
}

/// Partition row indices by key. `mask` (when given) restricts which rows
/// take part at all.
pub fn group_rows(keys: &[Option<String>], mask: Option<&[bool]>, policy: MissingKeys) -> Vec<Group> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();
    for (row, key) in keys.iter().enumerate() {
        if let Some(mask) = mask {
            if !mask.get(row).copied().unwrap_or(false) {
                continue;
            }
        }
        let key = match (key, policy) {
            (Some(k), _) => k.as_str(),
            (None, MissingKeys::Bucket) => MISSING_LABEL,
            (None, MissingKeys::Drop) => continue,
        };
        match slots.get(key) {
            Some(&slot) => groups[slot].rows.push(row),
            None => {
                slots.insert(key.to_string(), groups.len());
                groups.push(Group {
                    key: key.to_string(),
                    rows: vec![row],
                });
            }
        }
    }
    groups
}

/// Row mask for `column == wanted`, exact match.
pub fn equals_mask(keys: &[Option<String>], wanted: &str) -> Vec<bool> {
    keys.iter().map(|k| k.as_deref() == Some(wanted)).collect()
}

/// Numeric values of `rows`, skipping missing amounts.
pub fn present(rows: &[usize], amounts: &[Option<f64>]) -> Vec<f64> {
    rows.iter()
        .filter_map(|&r| amounts.get(r).copied().flatten())
        .collect()
}

pub fn sum(rows: &[usize], amounts: &[Option<f64>]) -> f64 {
    present(rows, amounts).iter().sum()
}

/// Mean of the numeric values, `None` when the group has none.
pub fn mean(rows: &[usize], amounts: &[Option<f64>]) -> Option<f64> {
    let values = present(rows, amounts);
    if values.is_empty() {
        None
    } else {
        Some(average(&values))
    }
}

pub fn distinct(rows: &[usize], keys: &[Option<String>]) -> usize {
    rows.iter()
        .filter_map(|&r| keys.get(r).and_then(|k| k.as_deref()))
        .collect::<HashSet<_>>()
        .len()
}

pub fn sums(groups: &[Group], amounts: &[Option<f64>]) -> Vec<RankEntry> {
    groups
        .iter()
        .map(|g| RankEntry {
            key: g.key.clone(),
            value: sum(&g.rows, amounts),
        })
        .collect()
}

pub fn means(groups: &[Group], amounts: &[Option<f64>]) -> Vec<RankEntry> {
    groups
        .iter()
        .map(|g| RankEntry {
            key: g.key.clone(),
            value: mean(&g.rows, amounts).unwrap_or(0.0),
        })
        .collect()
}

pub fn counts(groups: &[Group]) -> Vec<RankEntry> {
    groups
        .iter()
        .map(|g| RankEntry {
            key: g.key.clone(),
            value: g.rows.len() as f64,
        })
        .collect()
}

pub fn sort_desc(entries: &mut [RankEntry]) {
    entries.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
}

/// January..December first, anything unrecognised after in its current order.
pub fn sort_by_calendar(entries: &mut [RankEntry]) {
    entries.sort_by_key(|e| month_number(&e.key).unwrap_or(u32::MAX));
}
