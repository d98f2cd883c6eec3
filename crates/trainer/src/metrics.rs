//! Regression metrics

use crate::errors::{Result, TrainerError};

fn check_lengths(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.len() != predicted.len() {
        return Err(TrainerError::Training(format!(
            "{} actual values but {} predictions",
            actual.len(),
            predicted.len()
        )));
    }
    if actual.is_empty() {
        return Err(TrainerError::Training("no values to score".to_string()));
    }
    Ok(())
}

/// Mean of the squared residuals
pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p) * (a - p))
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Coefficient of determination, `1 - SS_res / SS_tot`.
///
/// For a constant `actual`, a perfect prediction scores 1.0 and anything
/// else scores 0.0.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean) * (a - mean)).sum();
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p) * (a - p))
        .sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mse() {
        let mse = mean_squared_error(&[1.0, 2.0, 3.0], &[1.0, 2.0, 5.0]).unwrap();
        assert!((mse - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_r2_perfect_and_mean() {
        let actual = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(r2_score(&actual, &actual).unwrap(), 1.0);
        assert_eq!(r2_score(&actual, &[2.5; 4]).unwrap(), 0.0);
    }

    #[test]
    fn test_r2_can_be_negative() {
        let r2 = r2_score(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap();
        assert!((r2 - (-3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_r2_constant_actual() {
        assert_eq!(r2_score(&[2.0, 2.0], &[2.0, 2.0]).unwrap(), 1.0);
        assert_eq!(r2_score(&[2.0, 2.0], &[2.0, 3.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(mean_squared_error(&[1.0], &[1.0, 2.0]).is_err());
        assert!(r2_score(&[], &[]).is_err());
    }
}
