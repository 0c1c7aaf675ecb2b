//! Selection of the worst-case violation.

use super::results::{SeparationResult, WorstCase};

/// Locate the worst-case violation among separation results.
///
/// Each row of `results` belongs to the performance constraint
/// `scheduled[row]`. A row is violating if any of its entries found a
/// violation; its representative is the violating entry with the largest
/// scaled violation of the row's own constraint. The representatives form
/// a matrix with entries `max(scaled, 0)`; the worst constraint is the
/// column with the largest sum and the returned row is the representative
/// with the largest entry in that column. Ties go to the first maximum.
///
/// Returns `None` when no row is violating or every column sums to zero.
pub fn worst_case(results: &[Vec<SeparationResult>], scheduled: &[usize]) -> Option<WorstCase> {
    // (row, entry) of each violating row's representative
    let representatives: Vec<(usize, usize)> = results
        .iter()
        .zip(scheduled)
        .enumerate()
        .filter_map(|(row, (entries, &constraint))| {
            representative(entries, constraint).map(|entry| (row, entry))
        })
        .collect();
    if representatives.is_empty() {
        return None;
    }

    let matrix: Vec<Vec<f64>> = representatives
        .iter()
        .map(|&(row, entry)| {
            results[row][entry]
                .list_of_scaled_violations
                .iter()
                .map(|&v| v.max(0.0))
                .collect()
        })
        .collect();

    let n_cols = matrix.iter().map(Vec::len).max().unwrap_or(0);
    let sums: Vec<f64> = (0..n_cols)
        .map(|j| matrix.iter().map(|r| r.get(j).copied().unwrap_or(0.0)).sum())
        .collect();
    let constraint = first_argmax(sums.iter().copied())?;
    if sums[constraint] <= 0.0 {
        return None;
    }

    let best = first_argmax(matrix.iter().map(|r| r.get(constraint).copied().unwrap_or(0.0)))?;
    let (row, entry) = representatives[best];
    Some(WorstCase { constraint, row, entry })
}

/// Violating entry with the largest scaled violation of `constraint`.
fn representative(entries: &[SeparationResult], constraint: usize) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, r) in entries.iter().enumerate() {
        if !r.found_violation {
            continue;
        }
        let v = r
            .list_of_scaled_violations
            .get(constraint)
            .copied()
            .unwrap_or(f64::NEG_INFINITY);
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Index of the first maximum.
fn first_argmax(values: impl Iterator<Item = f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in values.enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}
