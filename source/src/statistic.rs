use crate::Sample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatisticKind {
    Min,
    Max,
    Average,
    Median,
    Variance,
}

impl StatisticKind {
    pub const ALL: [StatisticKind; 5] = [
        StatisticKind::Min,
        StatisticKind::Max,
        StatisticKind::Average,
        StatisticKind::Median,
        StatisticKind::Variance,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StatisticKind::Min => "Min",
            StatisticKind::Max => "Max",
            StatisticKind::Average => "AVG",
            StatisticKind::Median => "Median",
            StatisticKind::Variance => "Var",
        }
    }
}

impl std::fmt::Display for StatisticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Computes `kind` for each of `sensor_count` sensors over `samples`.
///
/// Rows too short for a sensor are ignored for that sensor. Sensors without
/// any value yield `None`.
pub fn compute(kind: StatisticKind, samples: &[Sample], sensor_count: usize) -> Vec<Option<f64>> {
    (0..sensor_count)
        .map(|sensor| {
            let values: Vec<f64> = samples
                .iter()
                .filter_map(|s| s.value(sensor))
                .filter(|v| !v.is_nan())
                .collect();
            of(kind, values)
        })
        .collect()
}

fn of(kind: StatisticKind, mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let n = values.len() as f64;

    match kind {
        StatisticKind::Min => values.into_iter().reduce(f64::min),
        StatisticKind::Max => values.into_iter().reduce(f64::max),
        StatisticKind::Average => Some(values.iter().sum::<f64>() / n),
        StatisticKind::Median => {
            values.sort_by(f64::total_cmp);
            let mid = values.len() / 2;
            if values.len() % 2 == 0 {
                Some((values[mid - 1] + values[mid]) / 2.0)
            } else {
                Some(values[mid])
            }
        }
        StatisticKind::Variance => {
            let mean = values.iter().sum::<f64>() / n;
            Some(values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<Sample> {
        vec![
            Sample::new(0.0, [1.0, 10.0]),
            Sample::new(1.0, [4.0]),
            Sample::new(2.0, [2.0, 30.0]),
            Sample::new(3.0, [3.0, 20.0]),
        ]
    }

    #[test]
    fn per_sensor_statistics() {
        let rows = rows();

        assert_eq!(compute(StatisticKind::Min, &rows, 2), vec![Some(1.0), Some(10.0)]);
        assert_eq!(compute(StatisticKind::Max, &rows, 2), vec![Some(4.0), Some(30.0)]);
        assert_eq!(
            compute(StatisticKind::Average, &rows, 2),
            vec![Some(2.5), Some(20.0)]
        );
        assert_eq!(
            compute(StatisticKind::Median, &rows, 2),
            vec![Some(2.5), Some(20.0)]
        );
        assert_eq!(
            compute(StatisticKind::Variance, &rows, 2),
            vec![Some(1.25), Some(200.0 / 3.0)]
        );
    }

    #[test]
    fn sensor_without_values_is_none() {
        assert_eq!(compute(StatisticKind::Max, &rows(), 3)[2], None);
        assert_eq!(compute(StatisticKind::Min, &[], 1), vec![None]);
    }
}
