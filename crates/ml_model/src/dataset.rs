//! Dataset assembly: feature matrix construction, correlation-based feature
//! selection and chronological splitting.

use chrono::{DateTime, Utc};
use feature_engineering::FeatureRecord;

/// Chronological split fractions: earliest 70% train, next 15% validation,
/// final 15% test. Splitting is never random; shuffling hourly records would
/// leak future information into training.
pub const TRAIN_FRACTION: f64 = 0.70;
pub const VALIDATION_FRACTION: f64 = 0.15;

/// A column-named, time-ordered feature matrix with its target vector.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub feature_names: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
    pub timestamps: Vec<DateTime<Utc>>,
}

/// One side of a chronological split.
#[derive(Debug, Clone)]
pub struct Split {
    pub rows: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
}

impl Dataset {
    /// Builds a dataset from feature records, ordered by timestamp. The
    /// column set is taken from the first record; records produced by
    /// `compute_record` always share the full set, and a column absent from
    /// a later record reads as 0.0.
    pub fn from_records(records: &[FeatureRecord]) -> Self {
        let mut ordered: Vec<&FeatureRecord> = records.iter().collect();
        ordered.sort_by_key(|record| record.timestamp);

        let feature_names: Vec<String> = ordered
            .first()
            .map(|record| record.features.keys().cloned().collect())
            .unwrap_or_default();

        let rows = ordered
            .iter()
            .map(|record| {
                feature_names
                    .iter()
                    .map(|name| record.features.get(name).copied().unwrap_or(0.0))
                    .collect()
            })
            .collect();
        let targets = ordered.iter().map(|record| record.aqi).collect();
        let timestamps = ordered.iter().map(|record| record.timestamp).collect();

        Self {
            feature_names,
            rows,
            targets,
            timestamps,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keeps the `k` columns with the highest absolute Pearson correlation
    /// against the target, in descending correlation order (ties broken by
    /// column name for determinism). The surviving name list is the feature
    /// contract recorded in the trained artifact.
    pub fn select_top_features(&self, k: usize) -> Self {
        let mut scored: Vec<(usize, f64)> = (0..self.feature_names.len())
            .map(|col| {
                let column: Vec<f64> = self.rows.iter().map(|row| row[col]).collect();
                (col, pearson(&column, &self.targets).abs())
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| self.feature_names[a.0].cmp(&self.feature_names[b.0]))
        });
        scored.truncate(k);

        let keep: Vec<usize> = scored.into_iter().map(|(col, _)| col).collect();
        Self {
            feature_names: keep
                .iter()
                .map(|&col| self.feature_names[col].clone())
                .collect(),
            rows: self
                .rows
                .iter()
                .map(|row| keep.iter().map(|&col| row[col]).collect())
                .collect(),
            targets: self.targets.clone(),
            timestamps: self.timestamps.clone(),
        }
    }

    /// Splits chronologically into train/validation/test, preserving order
    /// within and across the parts.
    pub fn split_chronological(&self) -> (Split, Split, Split) {
        let n = self.len();
        let train_size = (TRAIN_FRACTION * n as f64) as usize;
        let validation_size = (VALIDATION_FRACTION * n as f64) as usize;
        let validation_end = train_size + validation_size;

        let part = |range: std::ops::Range<usize>| Split {
            rows: self.rows[range.clone()].to_vec(),
            targets: self.targets[range].to_vec(),
        };

        (
            part(0..train_size),
            part(train_size..validation_end),
            part(validation_end..n),
        )
    }
}

/// Pearson correlation coefficient; 0.0 when either side has no variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return 0.0;
    }

    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs[..n].iter().zip(&ys[..n]) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return 0.0;
    }
    cov / (var_x.sqrt() * var_y.sqrt())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{Duration, TimeZone};

    use super::*;

    fn record(hour: i64, features: &[(&str, f64)], aqi: f64) -> FeatureRecord {
        FeatureRecord {
            timestamp: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
                + Duration::hours(hour),
            aqi,
            features: features
                .iter()
                .map(|(name, value)| ((*name).to_string(), *value))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn linear_records(n: i64) -> Vec<FeatureRecord> {
        (0..n)
            .map(|i| {
                let x = i as f64;
                record(
                    i,
                    &[("signal", x), ("noise", f64::from((i % 5) as i32))],
                    2.0 * x + 1.0,
                )
            })
            .collect()
    }

    #[test]
    fn from_records_orders_by_timestamp() {
        let mut records = linear_records(10);
        records.reverse();
        let dataset = Dataset::from_records(&records);

        assert!(dataset.timestamps.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(dataset.targets[0], 1.0);
    }

    #[test]
    fn pearson_detects_perfect_correlation() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys = [2.0, 4.0, 6.0, 8.0];
        assert!((pearson(&xs, &ys) - 1.0).abs() < 1e-12);

        let inverse = [8.0, 6.0, 4.0, 2.0];
        assert!((pearson(&xs, &inverse) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_is_zero_without_variance() {
        let xs = [3.0, 3.0, 3.0];
        let ys = [1.0, 2.0, 3.0];
        assert_eq!(pearson(&xs, &ys), 0.0);
    }

    #[test]
    fn selection_keeps_the_informative_column() {
        let dataset = Dataset::from_records(&linear_records(50));
        let selected = dataset.select_top_features(1);

        assert_eq!(selected.feature_names, vec!["signal".to_string()]);
        assert_eq!(selected.rows[7], vec![7.0]);
    }

    #[test]
    fn selection_caps_at_available_columns() {
        let dataset = Dataset::from_records(&linear_records(10));
        let selected = dataset.select_top_features(40);
        assert_eq!(selected.feature_names.len(), 2);
    }

    #[test]
    fn chronological_split_sizes_and_order() {
        let dataset = Dataset::from_records(&linear_records(100));
        let (train, validation, test) = dataset.split_chronological();

        assert_eq!(train.rows.len(), 70);
        assert_eq!(validation.rows.len(), 15);
        assert_eq!(test.rows.len(), 15);

        // The earliest target lands in train, the latest in test.
        assert_eq!(train.targets[0], 1.0);
        assert_eq!(test.targets[14], 2.0 * 99.0 + 1.0);
    }
}
