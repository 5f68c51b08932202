use crate::error::InferenceError;
use ndarray::{Array4, ArrayD};

/// Defines the trait every inference backend must follow.
///
/// The detection pipeline treats the network as an opaque function: a normalized
/// `[1, 3, S, S]` canvas goes in, a raw `[1, N, F]` tensor comes out. Backends own model
/// loading and device selection; the pipeline only validates the shape of what comes back.
/// This keeps the pipeline testable against synthetic tensors.
pub trait InferenceSession {
    /// Short backend identifier for logs.
    fn name(&self) -> &str;

    fn run(&mut self, input: &Array4<f32>) -> Result<ArrayD<f32>, InferenceError>;
}

impl<S: InferenceSession + ?Sized> InferenceSession for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn run(&mut self, input: &Array4<f32>) -> Result<ArrayD<f32>, InferenceError> {
        (**self).run(input)
    }
}
