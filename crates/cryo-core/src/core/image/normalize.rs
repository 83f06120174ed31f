use super::ImageError;
use ndarray::Array2;

/// Images whose variance falls below this value cannot be rescaled to unit variance.
pub const VARIANCE_FLOOR: f64 = 1e-12;

/// Mean and population variance of every pixel.
pub fn mean_and_variance(image: &Array2<f64>) -> (f64, f64) {
    let count = image.len().max(1) as f64;
    let mean = image.sum() / count;
    let variance = image.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
    (mean, variance)
}

/// Shifts and rescales `image` to zero mean and unit variance.
pub fn normalize_image(image: &Array2<f64>) -> Result<Array2<f64>, ImageError> {
    let (mean, variance) = mean_and_variance(image);
    if variance.is_nan() || variance < VARIANCE_FLOOR {
        return Err(ImageError::DegenerateVariance {
            variance,
            floor: VARIANCE_FLOOR,
        });
    }
    let inverse_std = 1.0 / variance.sqrt();
    Ok(image.mapv(|v| (v - mean) * inverse_std))
}
