//! Module containing miscellaneous utility functions.

use crate::imports::*;

/// Extrapolation behavior of [`interp1d`] outside the range of x-data
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum Extrapolate {
    /// linearly extrapolate from the two outermost points
    #[default]
    Yes,
    /// don't allow extrapolation but return result from nearest x-data point
    No,
    /// return an error on extrapolation
    Error,
}

/// Index of the left point of the `x_data` segment [`interp1d`] uses for `x`.
/// Points outside the data use the outermost segment. `x_data` must be ascending with at
/// least two points.
pub fn segment(x: f64, x_data: &[f64]) -> usize {
    let last = x_data.len() - 2;
    if x >= x_data[last] {
        return last;
    }
    x_data[1..]
        .iter()
        .position(|xr| x <= *xr)
        .unwrap_or(last)
}

/// interpolation algorithm from <http://www.cplusplus.com/forum/general/216928/>  
/// Arguments:
/// x : value at which to interpolate
/// x_data : ascending x values, at least two of them
/// y_data : values at `x_data`
pub fn interp1d(
    x: &f64,
    x_data: &[f64],
    y_data: &[f64],
    extrapolate: Extrapolate,
) -> anyhow::Result<f64> {
    ensure!(
        x_data.len() == y_data.len(),
        "{}\nx and y data must have the same length",
        format_dbg!((x_data.len(), y_data.len()))
    );
    ensure!(
        x_data.len() >= 2,
        "{}\nAt least two points are needed to interpolate",
        format_dbg!(x_data.len())
    );
    ensure!(
        x_data.windows(2).all(|w| w[0] < w[1]),
        "{}\nx data must be strictly ascending",
        format_dbg!()
    );
    let size = x_data.len();
    let i = segment(*x, x_data);
    let xl = &x_data[i];
    let mut yl = &y_data[i];
    let xr = &x_data[i + 1];
    let mut yr = &y_data[i + 1];
    let outside = x < xl || x > xr;
    match extrapolate {
        Extrapolate::No => {
            if x < xl {
                yr = yl;
            }
            if x > xr {
                yl = yr;
            }
        }
        Extrapolate::Error if outside => {
            bail!("{}\nAttempted extrapolation", format_dbg!(x));
        }
        _ => {
            if outside {
                log::info!(
                    "Extrapolating: point = {}, x_min = {}, x_max = {}",
                    x,
                    x_data[0],
                    x_data[size - 1]
                );
            }
        }
    }
    let dydx = (yr - yl) / (xr - xl);
    Ok(yl + dydx * (x - xl))
}

/// Fails with [`CarculatorError::FileNotFound`] unless `filepath` is an existing file
pub fn check_file(filepath: &Path) -> anyhow::Result<()> {
    if filepath.is_file() {
        Ok(())
    } else {
        Err(CarculatorError::FileNotFound(filepath.display().to_string()).into())
    }
}

/// Returns true if `val1` and `val2` are within a relative/absolute `epsilon` of each other,
/// depending on magnitude.  
pub fn almost_eq(val1: f64, val2: f64, epsilon: Option<f64>) -> bool {
    let epsilon = epsilon.unwrap_or(1e-8);
    ((val2 - val1) / (val1 + val2)).abs() < epsilon || (val2 - val1).abs() < epsilon
}

/// Rounds `val` to `decimals` decimal places
pub fn round_to(val: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (val * factor).round() / factor
}

/// Parses a table header into a calendar year, accepting float-formatted labels such as
/// `"2020.0"` that spreadsheet exports produce.
pub fn parse_year(label: &str) -> anyhow::Result<u32> {
    let trimmed = label.trim();
    if let Ok(year) = trimmed.parse::<u32>() {
        return Ok(year);
    }
    match trimmed.parse::<f64>() {
        Ok(year) if year.fract() == 0.0 && year >= 0.0 => Ok(year as u32),
        _ => Err(CarculatorError::MalformedTable(format!(
            "column header {label:?} is not a year"
        ))
        .into()),
    }
}

/// Parses a numeric table cell; empty and `NA`-like cells are read as zero
pub fn parse_cell(cell: &str) -> anyhow::Result<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() || matches!(trimmed, "NA" | "N/A" | "NaN" | "nan") {
        return Ok(0.0);
    }
    trimmed.parse::<f64>().map_err(|_| {
        CarculatorError::MalformedTable(format!("cell {cell:?} is not a number")).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_that_interpolation_works() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ys = [0.0, 10.0, 20.0, 30.0, 40.0];
        let y = interp1d(&3.2, &xs, &ys, Extrapolate::No).unwrap();
        assert!(almost_eq(y, 32.0, None));
    }

    #[test]
    fn test_interp1d_exact_value_upper() {
        let y = interp1d(&2050.0, &[2020.0, 2050.0], &[0.2, 0.5], Extrapolate::No).unwrap();
        assert_eq!(y, 0.5);
    }

    #[test]
    fn test_interp1d_extrapolates_from_outermost_points() {
        let xs = [2020.0, 2030.0, 2040.0];
        let ys = [0.1, 0.2, 0.4];
        let above = interp1d(&2050.0, &xs, &ys, Extrapolate::Yes).unwrap();
        assert!(almost_eq(above, 0.6, None));
        let below = interp1d(&2010.0, &xs, &ys, Extrapolate::Yes).unwrap();
        assert!(almost_eq(below, 0.0, Some(1e-12)));
    }

    #[test]
    fn test_interp1d_above_value_upper_without_extrapolate() {
        let y = interp1d(&2060.0, &[2020.0, 2050.0], &[0.2, 0.5], Extrapolate::No).unwrap();
        assert_eq!(y, 0.5);
    }

    #[test]
    fn test_interp1d_errors_on_extrapolation_when_asked() {
        assert!(interp1d(&2060.0, &[2020.0, 2050.0], &[0.2, 0.5], Extrapolate::Error).is_err());
        assert!(interp1d(&2030.0, &[2020.0, 2050.0], &[0.2, 0.5], Extrapolate::Error).is_ok());
    }

    #[test]
    fn test_interp1d_rejects_single_point() {
        assert!(interp1d(&2030.0, &[2020.0], &[0.2], Extrapolate::Yes).is_err());
    }

    #[test]
    fn test_segment() {
        let xs = [2005.0, 2020.0, 2030.0, 2040.0];
        assert_eq!(segment(1990.0, &xs), 0);
        assert_eq!(segment(2020.0, &xs), 0);
        assert_eq!(segment(2025.0, &xs), 1);
        assert_eq!(segment(2030.0, &xs), 2);
        assert_eq!(segment(2040.0, &xs), 2);
        assert_eq!(segment(2100.0, &xs), 2);
        assert_eq!(segment(2100.0, &[2020.0, 2050.0]), 0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 3), 1.235);
        assert_eq!(round_to(-0.0004, 3), 0.0);
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("2020").unwrap(), 2020);
        assert_eq!(parse_year(" 2030.0 ").unwrap(), 2030);
        assert!(parse_year("Unit").is_err());
    }

    #[test]
    fn test_parse_cell() {
        assert_eq!(parse_cell("").unwrap(), 0.0);
        assert_eq!(parse_cell("1.5").unwrap(), 1.5);
        assert!(parse_cell("abc").is_err());
    }
}
