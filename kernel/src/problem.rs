/// The full input to a single kernel evaluation: two point clouds (each with
/// unit normals) and an opaque parameter vector.
///
/// Observation and source clouds are independent; colocating them (same
/// points, same slices) is legal and is how self-interaction scenarios are
/// expressed.
pub struct NBodyProblem<'a, const D: usize> {
    pub obs_pts: &'a [[f64; D]],
    pub obs_ns: &'a [[f64; D]],
    pub src_pts: &'a [[f64; D]],
    pub src_ns: &'a [[f64; D]],
    pub params: &'a [f64],
}

impl<'a, const D: usize> NBodyProblem<'a, D> {
    pub fn new(
        obs_pts: &'a [[f64; D]],
        obs_ns: &'a [[f64; D]],
        src_pts: &'a [[f64; D]],
        src_ns: &'a [[f64; D]],
        params: &'a [f64],
    ) -> Self {
        Self {
            obs_pts,
            obs_ns,
            src_pts,
            src_ns,
            params,
        }
    }

    pub fn n_obs(&self) -> usize {
        self.obs_pts.len()
    }

    pub fn n_src(&self) -> usize {
        self.src_pts.len()
    }
}
