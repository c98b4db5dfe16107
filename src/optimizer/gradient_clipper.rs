use ndarray::{Array1, Array2};

/// Gradient clipping applied to a full set of layer gradients before the
/// optimizer sees them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GradientClipper {
    /// Clip gradients by global norm (across all parameters)
    ClipByGlobalNorm { max_norm: f32 },

    /// No clipping
    None,
}

impl GradientClipper {
    pub fn from_max_norm(max_norm: Option<f32>) -> Self {
        match max_norm {
            Some(max_norm) => GradientClipper::ClipByGlobalNorm { max_norm },
            None => GradientClipper::None,
        }
    }

    /// Compute global norm of all gradients
    pub fn global_norm(gradients: &[(Array2<f32>, Array1<f32>)]) -> f32 {
        gradients
            .iter()
            .map(|(w, b)| w.iter().map(|&x| x * x).sum::<f32>() + b.iter().map(|&x| x * x).sum::<f32>())
            .sum::<f32>()
            .sqrt()
    }

    /// Scale `gradients` in place so their global norm does not exceed the limit.
    /// Returns the norm measured before clipping.
    pub fn clip(&self, gradients: &mut [(Array2<f32>, Array1<f32>)]) -> f32 {
        let norm = Self::global_norm(gradients);
        if let GradientClipper::ClipByGlobalNorm { max_norm } = *self {
            if norm > max_norm && norm > 0.0 {
                let scale = max_norm / norm;
                for (w, b) in gradients.iter_mut() {
                    w.mapv_inplace(|g| g * scale);
                    b.mapv_inplace(|g| g * scale);
                }
            }
        }
        norm
    }
}
