use crate::config::ExecutionBackend;
use crate::error::InferenceError;
use crate::object_detection::inference_session::InferenceSession;
use crate::object_detection::tensor_layout::NUM_FEATURES;
use ndarray::{Array3, Array4, ArrayD};
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use tracing::{info, warn};

/// An onnxruntime inference session.
///
/// The blade detector is a wrapper around an ONNX inference session that handles running the
/// model on hardware. Construction tries the preferred backend first and falls back to the
/// default CPU provider.
pub struct OrtInferenceSession {
    session: Session,
    output_name: String,
    backend: ExecutionBackend,
}

impl OrtInferenceSession {
    pub fn new(model_path: &Path, preferred: ExecutionBackend) -> Result<Self, InferenceError> {
        if !model_path.is_file() {
            return Err(InferenceError::ModelNotFound(model_path.to_path_buf()));
        }
        let (session, backend) = match build_session(model_path, preferred) {
            Ok(session) => (session, preferred),
            Err(err) if preferred != ExecutionBackend::Cpu => {
                warn!(backend = %preferred, error = %err, "falling back to the CPU backend");
                let session = build_session(model_path, ExecutionBackend::Cpu)
                    .map_err(|err| InferenceError::Backend(err.to_string()))?;
                (session, ExecutionBackend::Cpu)
            }
            Err(err) => return Err(InferenceError::Backend(err.to_string())),
        };
        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| InferenceError::MissingOutput("<first output>".to_string()))?;
        info!(model = %model_path.display(), %backend, output = %output_name, "model compiled");
        Ok(Self { session, output_name, backend })
    }

    pub fn backend(&self) -> ExecutionBackend {
        self.backend
    }
}

fn build_session(model_path: &Path, backend: ExecutionBackend) -> ort::Result<Session> {
    let builder = Session::builder()?;
    let builder = match backend {
        ExecutionBackend::Cuda => builder.with_execution_providers([CUDAExecutionProvider::default()
            .build()
            .error_on_failure()])?,
        ExecutionBackend::Cpu => builder,
    };
    builder.commit_from_file(model_path)
}

impl InferenceSession for OrtInferenceSession {
    fn name(&self) -> &str {
        match self.backend {
            ExecutionBackend::Cuda => "onnxruntime-cuda",
            ExecutionBackend::Cpu => "onnxruntime-cpu",
        }
    }

    fn run(&mut self, input: &Array4<f32>) -> Result<ArrayD<f32>, InferenceError> {
        let output_name = self.output_name.clone();
        let outputs = self.session.run(ort::inputs![TensorRef::from_array_view(input)?])?;
        let output = outputs
            .get(output_name.as_str())
            .ok_or_else(|| InferenceError::MissingOutput(output_name.clone()))?;
        let (shape, data) = output.try_extract_tensor::<f32>()?;
        let dims: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
        let array = ArrayD::from_shape_vec(dims.clone(), data.to_vec())
            .map_err(|err| InferenceError::Execution(err.to_string()))?;

        // Exported YOLO pose heads emit [1, F, N]; the pipeline expects [1, N, F].
        if dims.len() == 3 && dims[1] == NUM_FEATURES && dims[2] != NUM_FEATURES {
            let transposed: Array3<f32> = array
                .into_dimensionality::<ndarray::Ix3>()
                .map_err(|err| InferenceError::Execution(err.to_string()))?
                .permuted_axes([0, 2, 1])
                .as_standard_layout()
                .into_owned();
            return Ok(transposed.into_dyn());
        }
        Ok(array)
    }
}
