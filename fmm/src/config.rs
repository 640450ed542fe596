use crate::error::FmmError;

/// FMM configuration: check/equivalent surface radii, expansion order and
/// kernel parameters, plus `eps` and `mac_safety_factor`, which many
/// kernel-independent FMM codes hardcode but which are exposed here as
/// configuration.
#[derive(Debug, Clone)]
pub struct FmmConfig {
    /// Inner (equivalent, upward / check, downward) surface radius. Must be
    /// strictly less than 1.
    pub inner_r: f64,
    /// Outer (check, upward / equivalent, downward) surface radius. Must be
    /// strictly greater than 1.
    pub outer_r: f64,
    /// Expansion order; controls the number of points on the equivalent
    /// surface (`surrounding_surface`).
    pub order: usize,
    /// Maximum leaf occupancy used when building the obs/src trees.
    pub n_per_cell: usize,
    /// Opaque parameter vector forwarded to the kernel.
    pub params: Vec<f64>,
    /// Pseudoinverse truncation tolerance for the check-to-equivalent
    /// operators. `1e-5` is a reasonable default; double-precision kernels
    /// can often go tighter, down to around `1e-12`.
    pub eps: f64,
    /// MAC safety factor applied to the separation test (`0.98` is a common
    /// choice: strict enough to keep translations accurate, loose enough to
    /// admit most well-separated pairs).
    pub mac_safety_factor: f64,
}

impl FmmConfig {
    pub fn new(inner_r: f64, outer_r: f64, order: usize, n_per_cell: usize, params: Vec<f64>) -> Self {
        Self {
            inner_r,
            outer_r,
            order,
            n_per_cell,
            params,
            eps: 1e-5,
            mac_safety_factor: 0.98,
        }
    }

    pub fn validate(&self) -> Result<(), FmmError> {
        if self.inner_r >= self.outer_r {
            return Err(FmmError::Configuration(format!(
                "inner_r ({}) must be less than outer_r ({})",
                self.inner_r, self.outer_r
            )));
        }
        if self.order == 0 {
            return Err(FmmError::Configuration("order must be nonzero".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_r_must_be_less_than_outer_r() {
        let cfg = FmmConfig::new(1.5, 1.05, 4, 10, vec![]);
        assert!(matches!(cfg.validate(), Err(FmmError::Configuration(_))));
    }

    #[test]
    fn order_must_be_nonzero() {
        let cfg = FmmConfig::new(1.05, 1.95, 0, 10, vec![]);
        assert!(matches!(cfg.validate(), Err(FmmError::Configuration(_))));
    }

    #[test]
    fn valid_config_passes() {
        let cfg = FmmConfig::new(1.05, 1.95, 4, 10, vec![]);
        assert!(cfg.validate().is_ok());
    }
}
