use std::path::Path;
use std::sync::Mutex;

use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::DynValue;

use super::InferenceError;

/// An ONNX Runtime session loaded once and shared across requests
pub struct OnnxModel {
    name: String,
    session: Mutex<Session>,
}

impl OnnxModel {
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        if !path.exists() {
            return Err(InferenceError::Load(format!(
                "model file {} does not exist",
                path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e| InferenceError::Load(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| InferenceError::Load(format!("Failed to set optimization level: {}", e)))?
            .with_intra_threads(4)
            .map_err(|e| InferenceError::Load(format!("Failed to set threads: {}", e)))?
            .commit_from_file(path)
            .map_err(|e| {
                InferenceError::Load(format!("Failed to load {}: {}", path.display(), e))
            })?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());

        tracing::info!("Loaded ONNX model {} from {}", name, path.display());

        Ok(Self {
            name,
            session: Mutex::new(session),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run `f` with exclusive access to the session
    pub fn with_session<R>(
        &self,
        f: impl FnOnce(&mut Session) -> Result<R, InferenceError>,
    ) -> Result<R, InferenceError> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| InferenceError::Runtime(format!("{} session lock poisoned", self.name)))?;
        f(&mut session)
    }
}

/// Copy a float tensor out of the session outputs
pub fn extract_f32(value: Option<&DynValue>, what: &str) -> Result<Vec<f32>, InferenceError> {
    let value = value.ok_or_else(|| InferenceError::Runtime(format!("Missing {} tensor", what)))?;
    let (_, data) = value
        .try_extract_tensor::<f32>()
        .map_err(|e| InferenceError::Runtime(format!("Failed to extract {} tensor: {}", what, e)))?;
    Ok(data.iter().copied().collect())
}
