use ndarray::ArrayView2;

/// Measures how far a reconstruction is from its input.
pub trait LossFn {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> f32;
}
