use crate::model::{AnalysisResult, Measurement};

use super::trend::classify_trend;

/// Summarises the valid readings of a series.
///
/// Ties for min or max go to the earliest reading in input order, not in
/// date order. With no valid readings the result is all-default: zero
/// values, no dates, `Trend::Unknown`.
pub fn analyze(measurements: &[Measurement]) -> AnalysisResult {
    let mut valid = measurements.iter().filter(|m| m.is_valid());

    let Some(first) = valid.next() else {
        return AnalysisResult::default();
    };

    let mut min = first;
    let mut max = first;
    let mut sum = first.value();
    let mut count = 1usize;

    for m in valid {
        if m.value() < min.value() {
            min = m;
        }
        if m.value() > max.value() {
            max = m;
        }
        sum += m.value();
        count += 1;
    }

    AnalysisResult {
        min_value: min.value(),
        min_date: Some(min.date()),
        max_value: max.value(),
        max_date: Some(max.date()),
        avg_value: sum / count as f64,
        trend: classify_trend(measurements),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Trend;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    fn hourly(values: &[f64]) -> Vec<Measurement> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Measurement::new(3, "NO2", t0() + Duration::hours(i as i64), *v))
            .collect()
    }

    #[test]
    fn test_min_max_avg_with_dates() {
        let result = analyze(&hourly(&[25.5, 30.7, 15.2, 20.0]));

        assert!((result.avg_value - 22.85).abs() < 1e-9);
        assert_eq!(result.min_value, 15.2);
        assert_eq!(result.min_date, Some(t0() + Duration::hours(2)));
        assert_eq!(result.max_value, 30.7);
        assert_eq!(result.max_date, Some(t0() + Duration::hours(1)));
    }

    #[test]
    fn test_ties_go_to_first_in_input_order() {
        // Dates run backwards so input order and date order disagree.
        let series = vec![
            Measurement::new(3, "NO2", t0() + Duration::hours(5), 10.0),
            Measurement::new(3, "NO2", t0() + Duration::hours(4), 30.0),
            Measurement::new(3, "NO2", t0() + Duration::hours(3), 10.0),
            Measurement::new(3, "NO2", t0() + Duration::hours(2), 30.0),
        ];
        let result = analyze(&series);
        assert_eq!(result.min_date, Some(t0() + Duration::hours(5)));
        assert_eq!(result.max_date, Some(t0() + Duration::hours(4)));
    }

    #[test]
    fn test_invalid_readings_are_skipped() {
        let mut series = hourly(&[12.0, 18.0]);
        series.insert(1, Measurement::invalid(3, "NO2", t0() + Duration::minutes(30)));

        let result = analyze(&series);
        assert_eq!(result.min_value, 12.0);
        assert_eq!(result.max_value, 18.0);
        assert!((result.avg_value - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_valid_readings_gives_default() {
        assert_eq!(analyze(&[]), AnalysisResult::default());

        let only_invalid = vec![
            Measurement::invalid(3, "NO2", t0()),
            Measurement::invalid(3, "NO2", t0() + Duration::hours(1)),
        ];
        let result = analyze(&only_invalid);
        assert_eq!(result, AnalysisResult::default());
        assert_eq!(result.trend, Trend::Unknown);
        assert!(result.min_date.is_none());
    }

    #[test]
    fn test_single_reading_has_unknown_trend() {
        let result = analyze(&hourly(&[42.0]));
        assert_eq!(result.min_value, 42.0);
        assert_eq!(result.max_value, 42.0);
        assert_eq!(result.avg_value, 42.0);
        assert_eq!(result.trend, Trend::Unknown);
    }

    #[test]
    fn test_trend_is_attached() {
        let result = analyze(&hourly(&[10.0, 15.0, 20.0, 25.0, 30.0]));
        assert_eq!(result.trend, Trend::Increasing);
    }

    #[test]
    fn test_bounds_hold_for_many_series() {
        // Cheap deterministic generator; values spread over 0..200.
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for len in 1..40 {
            let values: Vec<f64> = (0..len)
                .map(|_| {
                    seed ^= seed << 13;
                    seed ^= seed >> 7;
                    seed ^= seed << 17;
                    (seed % 20_000) as f64 / 100.0
                })
                .collect();

            let result = analyze(&hourly(&values));
            for v in &values {
                assert!(result.min_value <= *v && *v <= result.max_value);
            }
            assert!(result.min_value <= result.avg_value + 1e-9);
            assert!(result.avg_value <= result.max_value + 1e-9);
        }
    }
}
