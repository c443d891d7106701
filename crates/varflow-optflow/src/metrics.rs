use crate::error::FlowError;
use crate::field::FlowField;

/// Average endpoint error between two flow fields.
///
/// The mean over pixels of `sqrt((u - u_ref)^2 + (v - v_ref)^2)`, ignoring a band of
/// `margin` pixels along every border.
///
/// # Errors
///
/// Returns an error if the fields differ in size or the margin leaves no pixel.
///
/// # Examples
///
/// ```
/// use varflow_image::ImageSize;
/// use varflow_optflow::metrics::average_endpoint_error;
/// use varflow_optflow::FlowField;
///
/// let size = ImageSize { width: 8, height: 8 };
/// let estimate = FlowField::constant(size, 3.0, 0.0).unwrap();
/// let reference = FlowField::constant(size, 0.0, 4.0).unwrap();
///
/// assert_eq!(average_endpoint_error(&estimate, &reference, 0).unwrap(), 5.0);
/// ```
pub fn average_endpoint_error(
    estimate: &FlowField,
    reference: &FlowField,
    margin: usize,
) -> Result<f64, FlowError> {
    let size = estimate.size();
    if reference.size() != size {
        return Err(FlowError::InvalidParameter {
            name: "reference",
            reason: format!("size {} differs from the estimate {size}", reference.size()),
        });
    }
    if 2 * margin >= size.width || 2 * margin >= size.height {
        return Err(FlowError::InvalidParameter {
            name: "margin",
            reason: format!("a margin of {margin} leaves no pixel of a {size} field"),
        });
    }

    let (u, v) = (estimate.u().as_slice(), estimate.v().as_slice());
    let (ur, vr) = (reference.u().as_slice(), reference.v().as_slice());
    let mut total = 0.0;
    let mut count = 0usize;
    for y in margin..size.height - margin {
        for x in margin..size.width - margin {
            let o = y * size.width + x;
            total += (u[o] - ur[o]).hypot(v[o] - vr[o]);
            count += 1;
        }
    }
    Ok(total / count as f64)
}

/// Summary statistics of a flow field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowStatistics {
    /// Mean horizontal displacement.
    pub mean_u: f64,
    /// Mean vertical displacement.
    pub mean_v: f64,
    /// Population variance of the horizontal displacement.
    pub variance_u: f64,
    /// Population variance of the vertical displacement.
    pub variance_v: f64,
    /// Largest displacement magnitude.
    pub max_magnitude: f64,
}

/// Compute the [`FlowStatistics`] of a field. An empty field gives all zeros.
pub fn flow_statistics(flow: &FlowField) -> FlowStatistics {
    let (u, v) = (flow.u().as_slice(), flow.v().as_slice());
    if u.is_empty() {
        return FlowStatistics {
            mean_u: 0.0,
            mean_v: 0.0,
            variance_u: 0.0,
            variance_v: 0.0,
            max_magnitude: 0.0,
        };
    }

    let n = u.len() as f64;
    let mean_u = u.iter().sum::<f64>() / n;
    let mean_v = v.iter().sum::<f64>() / n;
    let variance_u = u.iter().map(|x| (x - mean_u).powi(2)).sum::<f64>() / n;
    let variance_v = v.iter().map(|x| (x - mean_v).powi(2)).sum::<f64>() / n;
    let max_magnitude = u
        .iter()
        .zip(v)
        .map(|(a, b)| a.hypot(*b))
        .fold(0.0, f64::max);

    FlowStatistics {
        mean_u,
        mean_v,
        variance_u,
        variance_v,
        max_magnitude,
    }
}
