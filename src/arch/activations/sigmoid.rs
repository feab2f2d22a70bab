/// The smallest distance a probability keeps from 0 and 1.
const EDGE: f32 = 1e-6;

/// The logistic activation, clamped to the open interval (0, 1) so that saturated units still
/// yield valid Bernoulli parameters.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sigmoid;

impl Sigmoid {
    pub fn new() -> Self {
        Self
    }

    pub fn f(&self, z: f32) -> f32 {
        let s = if z >= 0. {
            1. / (1. + (-z).exp())
        } else {
            let e = z.exp();
            e / (1. + e)
        };

        s.clamp(EDGE, 1. - EDGE)
    }
}
