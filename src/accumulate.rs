use crate::types::{AggregateMetrics, EvaluationResult};

/// Absorbs float noise such as `0.07 * 100.0 == 7.000000000000001` so
/// rounding up does not jump a whole percent.
const ROUNDING_EPSILON: f64 = 1e-9;

/// Sum hours across every result and derive the billable percentage.
///
/// With no hours logged the percentage is reported as 0 and `has_data` is
/// false, never NaN.
pub fn accumulate<S>(results: &[EvaluationResult<S>]) -> AggregateMetrics {
    let (billable_hours, non_billable_hours) = results
        .iter()
        .flat_map(|r| r.entries.iter())
        .fold((0.0_f64, 0.0_f64), |(billable, non_billable), entry| {
            if entry.billable {
                (billable + entry.hours, non_billable)
            } else {
                (billable, non_billable + entry.hours)
            }
        });

    let total_hours = billable_hours + non_billable_hours;
    if total_hours <= 0.0 {
        return AggregateMetrics {
            total_hours,
            billable_hours,
            non_billable_hours,
            billable_percentage: 0.0,
            billable_percentage_rounded: 0,
            has_data: false,
        };
    }

    let billable_percentage = billable_hours / total_hours;
    AggregateMetrics {
        total_hours,
        billable_hours,
        non_billable_hours,
        billable_percentage,
        billable_percentage_rounded: round_up_percent(billable_percentage),
        has_data: true,
    }
}

/// Round a fraction up to a whole percent.
///
/// Unlike a plain f64 `ceil(fraction * 100)`, values within `ROUNDING_EPSILON`
/// above a whole percent round down to it, so 7 of 100 hours reports 7
/// rather than 8.
fn round_up_percent(fraction: f64) -> u32 {
    let percent = (fraction * 100.0 - ROUNDING_EPSILON).ceil();
    percent.clamp(0.0, 100.0) as u32
}
