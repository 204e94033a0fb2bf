//! Weight-to-percentage normalization.

/// Convert arbitrary non-negative weights into integer percentages that sum to exactly 100.
///
/// Rounding drift is corrected one unit at a time: when under 100 the element with the
/// largest fractional remainder gains a point, when over the element with the smallest
/// remainder loses one. Ties go to the lower index.
pub fn normalize_ratio(values: &[f64]) -> Vec<u32> {
    let len = values.len();
    match len {
        0 => return Vec::new(),
        1 => return vec![100],
        _ => {}
    }

    let sum: f64 = values.iter().sum();
    if sum <= 0.0 || !sum.is_finite() {
        return equal_distribution(len);
    }

    let raw: Vec<f64> = values.iter().map(|v| v / sum * 100.0).collect();
    let mut result: Vec<i64> = raw.iter().map(|r| r.round() as i64).collect();
    let fractions: Vec<f64> = raw.iter().map(|r| r - r.floor()).collect();

    let mut total: i64 = result.iter().sum();
    while total != 100 {
        let under = total < 100;
        let mut order: Vec<usize> = (0..len).collect();
        // Stable sort keeps index order among equal remainders.
        if under {
            order.sort_by(|&a, &b| fractions[b].total_cmp(&fractions[a]));
        } else {
            order.sort_by(|&a, &b| fractions[a].total_cmp(&fractions[b]));
        }

        let before = total;
        for idx in order {
            if total == 100 {
                break;
            }
            if under {
                result[idx] += 1;
                total += 1;
            } else if result[idx] > 0 {
                result[idx] -= 1;
                total -= 1;
            }
        }
        if total == before {
            break;
        }
    }

    result.into_iter().map(|v| v.max(0) as u32).collect()
}

fn equal_distribution(len: usize) -> Vec<u32> {
    let base = (100 / len) as u32;
    let remainder = 100 % len;
    (0..len)
        .map(|i| if i >= len - remainder { base + 1 } else { base })
        .collect()
}
