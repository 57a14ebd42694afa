use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::InitializationError;

/// How a table answers lookups outside its breakpoint domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtrapolationPolicy {
    /// Hold the first value below the domain and the last value above it.
    #[default]
    Clamp,
    /// Wrap time modulo the table span, so a 24 h table repeats every day.
    Periodic,
}

/// Immutable piecewise-linear time series.
///
/// Breakpoint times are strictly increasing and there are at least two of
/// them. Tables never change after construction and can be shared freely
/// between simulations.
///
/// # Examples
///
/// ```
/// use microgrid_twin::profile::TimeTable;
///
/// let table = TimeTable::new(vec![0.0, 10.0], vec![0.0, 100.0]).unwrap();
/// assert_eq!(table.at(2.5), 25.0);
/// assert_eq!(table.at(-1.0), 0.0);
/// assert_eq!(table.at(99.0), 100.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TimeTable {
    times: Vec<f64>,
    values: Vec<f64>,
}

impl TimeTable {
    /// Builds a table from parallel breakpoint time and value vectors.
    ///
    /// # Errors
    ///
    /// Returns an `InitializationError` if the vectors differ in length, hold
    /// fewer than two points, contain non-finite numbers, or the times are not
    /// strictly increasing.
    pub fn new(times: Vec<f64>, values: Vec<f64>) -> Result<Self, InitializationError> {
        if times.len() != values.len() {
            return Err(InitializationError::LengthMismatch {
                times: times.len(),
                values: values.len(),
            });
        }
        if times.len() < 2 {
            return Err(InitializationError::TooFewBreakpoints { len: times.len() });
        }
        for (index, (t, v)) in times.iter().zip(&values).enumerate() {
            if !t.is_finite() || !v.is_finite() {
                return Err(InitializationError::NonFiniteBreakpoint { index });
            }
        }
        for index in 1..times.len() {
            if times[index] <= times[index - 1] {
                return Err(InitializationError::NonMonotonicBreakpoints {
                    index,
                    previous: times[index - 1],
                    current: times[index],
                });
            }
        }
        Ok(Self { times, values })
    }

    /// Builds a table from `(time, value)` pairs.
    ///
    /// # Errors
    ///
    /// Same conditions as [`TimeTable::new`].
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Result<Self, InitializationError> {
        let (times, values) = pairs.iter().copied().unzip();
        Self::new(times, values)
    }

    /// Reads breakpoints from CSV rows of `time,value`.
    ///
    /// A header row is expected and skipped.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::ProfileCsv` for unreadable or
    /// non-numeric rows, and the usual table errors for bad breakpoints.
    pub fn from_csv_reader(reader: impl Read) -> Result<Self, InitializationError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut times = Vec::new();
        let mut values = Vec::new();

        for (row, record) in rdr.records().enumerate() {
            let record =
                record.map_err(|e| InitializationError::ProfileCsv(format!("row {row}: {e}")))?;
            if record.len() != 2 {
                return Err(InitializationError::ProfileCsv(format!(
                    "row {row}: expected 2 columns, got {}",
                    record.len()
                )));
            }
            times.push(parse_cell(&record[0], row)?);
            values.push(parse_cell(&record[1], row)?);
        }

        Self::new(times, values)
    }

    /// Reads breakpoints from a CSV file. See [`TimeTable::from_csv_reader`].
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::ProfileCsv` if the file cannot be opened.
    pub fn from_csv_path(path: &Path) -> Result<Self, InitializationError> {
        let file = File::open(path).map_err(|e| {
            InitializationError::ProfileCsv(format!("cannot open \"{}\": {e}", path.display()))
        })?;
        Self::from_csv_reader(file)
    }

    /// Table for literal data known to be well formed.
    pub(crate) fn from_static(times: &[f64], values: &[f64]) -> Self {
        debug_assert!(times.len() == values.len() && times.len() >= 2);
        debug_assert!(times.windows(2).all(|w| w[0] < w[1]));
        Self {
            times: times.to_vec(),
            values: values.to_vec(),
        }
    }

    /// Looks up the value at `time` with flat extrapolation.
    pub fn at(&self, time: f64) -> f64 {
        self.sample(time, ExtrapolationPolicy::Clamp)
    }

    /// Looks up the value at `time` using the given extrapolation policy.
    ///
    /// Inside the domain the result is exact linear interpolation between
    /// the two bracketing breakpoints. A NaN time, or an infinite time under
    /// `Periodic`, yields NaN.
    pub fn sample(&self, time: f64, policy: ExtrapolationPolicy) -> f64 {
        let first = self.times[0];
        let last = self.times[self.times.len() - 1];

        let time = match policy {
            ExtrapolationPolicy::Clamp => time,
            ExtrapolationPolicy::Periodic => first + (time - first).rem_euclid(last - first),
        };
        if time.is_nan() {
            return f64::NAN;
        }

        if time <= first {
            return self.values[0];
        }
        if time >= last {
            return self.values[self.values.len() - 1];
        }

        // First breakpoint strictly greater than `time`; 1 <= hi < len here.
        let hi = self.times.partition_point(|&t| t <= time);
        let lo = hi - 1;
        let (t0, t1) = (self.times[lo], self.times[hi]);
        let (v0, v1) = (self.values[lo], self.values[hi]);
        v0 + (v1 - v0) * (time - t0) / (t1 - t0)
    }

    /// Breakpoint times.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Breakpoint values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Width of the breakpoint domain (`last - first`).
    pub fn span(&self) -> f64 {
        self.times[self.times.len() - 1] - self.times[0]
    }
}

fn parse_cell(cell: &str, row: usize) -> Result<f64, InitializationError> {
    cell.parse::<f64>().map_err(|_| {
        InitializationError::ProfileCsv(format!("row {row}: \"{cell}\" is not a number"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solar() -> TimeTable {
        TimeTable::new(
            vec![0.0, 6.0, 7.0, 12.0, 18.0, 20.0, 24.0],
            vec![0.0, 0.0, 500.0, 4000.0, 1000.0, 0.0, 0.0],
        )
        .unwrap()
    }

    #[test]
    fn interpolates_between_breakpoints() {
        let t = solar();
        assert!((t.at(9.5) - 2250.0).abs() < 1e-9);
        assert!((t.at(15.0) - 2500.0).abs() < 1e-9);
    }

    #[test]
    fn exact_at_breakpoints() {
        let t = solar();
        assert_eq!(t.at(7.0), 500.0);
        assert_eq!(t.at(12.0), 4000.0);
        assert_eq!(t.at(0.0), 0.0);
        assert_eq!(t.at(24.0), 0.0);
    }

    #[test]
    fn clamps_outside_domain() {
        let t = TimeTable::new(vec![1.0, 2.0], vec![10.0, 20.0]).unwrap();
        assert_eq!(t.at(0.0), 10.0);
        assert_eq!(t.at(-50.0), 10.0);
        assert_eq!(t.at(3.0), 20.0);
    }

    #[test]
    fn periodic_wraps_span() {
        let t = solar();
        let p = ExtrapolationPolicy::Periodic;
        assert!((t.sample(24.0 + 9.5, p) - 2250.0).abs() < 1e-9);
        assert!((t.sample(48.0 + 12.0, p) - 4000.0).abs() < 1e-9);
        assert!((t.sample(-24.0 + 9.5, p) - 2250.0).abs() < 1e-9);
        // Clamp would have held 0.0 past midnight as well, but not mid-day.
        assert_eq!(t.sample(24.0 + 12.0, ExtrapolationPolicy::Clamp), 0.0);
    }

    #[test]
    fn non_finite_times_do_not_index() {
        let t = solar();
        assert!(t.at(f64::NAN).is_nan());
        assert!(t.sample(f64::NAN, ExtrapolationPolicy::Periodic).is_nan());
        assert!(t.sample(f64::INFINITY, ExtrapolationPolicy::Periodic).is_nan());
        assert!(t.sample(f64::NEG_INFINITY, ExtrapolationPolicy::Periodic).is_nan());
        // Clamp still holds the end values.
        assert_eq!(t.at(f64::INFINITY), 0.0);
        assert_eq!(t.at(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn rejects_non_monotonic() {
        let err = TimeTable::new(vec![0.0, 6.0, 6.0], vec![1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(
            err,
            InitializationError::NonMonotonicBreakpoints { index: 2, .. }
        ));

        let err = TimeTable::new(vec![0.0, 5.0, 3.0], vec![1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(
            err,
            InitializationError::NonMonotonicBreakpoints { index: 2, .. }
        ));
    }

    #[test]
    fn rejects_too_few_points() {
        let err = TimeTable::new(vec![0.0], vec![1.0]).unwrap_err();
        assert_eq!(err, InitializationError::TooFewBreakpoints { len: 1 });
        let err = TimeTable::new(vec![], vec![]).unwrap_err();
        assert_eq!(err, InitializationError::TooFewBreakpoints { len: 0 });
    }

    #[test]
    fn rejects_mismatched_and_non_finite() {
        assert!(matches!(
            TimeTable::new(vec![0.0, 1.0], vec![1.0]),
            Err(InitializationError::LengthMismatch { .. })
        ));
        assert!(matches!(
            TimeTable::new(vec![0.0, f64::NAN], vec![1.0, 2.0]),
            Err(InitializationError::NonFiniteBreakpoint { index: 1 })
        ));
    }

    #[test]
    fn loads_from_csv() {
        let data = "hour,watts\n0,100\n12, 300\n24,100\n";
        let t = TimeTable::from_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(t.times(), &[0.0, 12.0, 24.0]);
        assert!((t.at(6.0) - 200.0).abs() < 1e-9);
    }

    #[test]
    fn csv_rejects_garbage_cells() {
        let data = "hour,watts\n0,100\nnoon,300\n";
        let err = TimeTable::from_csv_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, InitializationError::ProfileCsv(_)));
    }

    #[test]
    fn csv_rejects_unsorted_rows() {
        let data = "hour,watts\n12,100\n6,300\n";
        let err = TimeTable::from_csv_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            InitializationError::NonMonotonicBreakpoints { .. }
        ));
    }

    #[test]
    fn loads_from_csv_path() {
        let path = std::env::temp_dir().join(format!(
            "microgrid-twin-{}-table.csv",
            std::process::id()
        ));
        std::fs::write(&path, "hour,watts\n0,100\n10,200\n").unwrap();
        let t = TimeTable::from_csv_path(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(t.at(5.0), 150.0);

        let err = TimeTable::from_csv_path(Path::new("/nonexistent/table.csv")).unwrap_err();
        assert!(matches!(err, InitializationError::ProfileCsv(_)));
    }
}
