use std::fmt;
use std::path::Path;

use anyhow::Result;
use image::DynamicImage;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

#[cfg(feature = "embeddings")]
use crate::error::AppError;
#[cfg(feature = "embeddings")]
use tch::{nn, nn::ModuleT, Device, Kind, Tensor};

/// A fixed-length vector describing one image's visual content.
///
/// Embeddings are immutable once produced and are only comparable when they
/// come from the same provider instance; mixing model versions is prevented
/// by construction, not revalidated per call.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    vector: Array1<f32>,
}

impl Embedding {
    /// Wrap a raw vector.
    pub fn new(vector: Array1<f32>) -> Self {
        Self { vector }
    }

    /// Build an embedding from a plain `Vec<f32>`.
    pub fn from_vec(values: Vec<f32>) -> Self {
        Self::new(Array1::from(values))
    }

    /// Number of components.
    pub fn dim(&self) -> usize {
        self.vector.len()
    }

    /// Borrow the underlying vector.
    pub fn vector(&self) -> &Array1<f32> {
        &self.vector
    }
}

/// Why an image was left out of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The file does not exist.
    Missing,
    /// The file exists but could not be decoded as an image.
    Undecodable,
    /// The encoder failed on the decoded image.
    Encoder(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("file does not exist"),
            Self::Undecodable => f.write_str("image could not be decoded"),
            Self::Encoder(e) => write!(f, "encoder failure: {}", e),
        }
    }
}

/// Outcome of embedding a single image file.
///
/// Per-item failures are data, not errors: a skipped image never aborts the
/// comparison it is part of.
#[derive(Debug, Clone)]
pub enum EmbedOutcome {
    /// The image was decoded and encoded successfully.
    Embedded(Embedding),
    /// The image was excluded, with the reason.
    Skipped(SkipReason),
}

/// Boundary to the pretrained image encoder.
///
/// A provider is constructed once per run and passed by reference to every
/// component that needs embeddings; it holds no mutable state after
/// construction.
pub trait EmbeddingProvider {
    /// Identifier of the underlying model; embeddings from providers with
    /// different identifiers must not be compared.
    fn model_id(&self) -> &str;

    /// Encode an already-decoded image.
    fn embed_image(&self, image: &DynamicImage) -> Result<Embedding>;

    /// Embed an image file, classifying every failure as a skip.
    fn embed_path(&self, path: &Path) -> EmbedOutcome {
        if !path.exists() {
            return EmbedOutcome::Skipped(SkipReason::Missing);
        }
        let image = match image::open(path) {
            Ok(image) => image,
            Err(e) => {
                log::warn!("cannot decode {}: {}", path.display(), e);
                return EmbedOutcome::Skipped(SkipReason::Undecodable);
            }
        };
        match self.embed_image(&image) {
            Ok(embedding) => EmbedOutcome::Embedded(embedding),
            Err(e) => {
                log::warn!("cannot embed {}: {}", path.display(), e);
                EmbedOutcome::Skipped(SkipReason::Encoder(e.to_string()))
            }
        }
    }
}

/// A torch-backed embedding provider using a pre-trained ResNet backbone
/// with the classification head removed.
#[cfg(feature = "embeddings")]
pub struct TorchEmbedder {
    device: Device,
    net: Box<dyn ModuleT>,
    // Owns the loaded weights for the lifetime of the provider.
    _vs: nn::VarStore,
}

#[cfg(feature = "embeddings")]
impl TorchEmbedder {
    /// Load the encoder weights and select a device.
    ///
    /// This is the one structural fault in the pipeline: a provider that
    /// cannot be constructed aborts the run before any comparison starts.
    pub fn new<P: AsRef<Path>>(weights: P) -> crate::error::Result<Self> {
        let weights = weights.as_ref();
        if !weights.exists() {
            return Err(AppError::NotFound(format!(
                "encoder weights not found: {}",
                weights.display()
            )));
        }

        let device = Device::cuda_if_available();
        log::info!("loading image encoder on {:?}", device);

        let mut vs = nn::VarStore::new(device);
        let net = tch::vision::resnet::resnet18_no_final_layer(&vs.root());
        vs.load(weights).map_err(|e| {
            AppError::Config(format!(
                "failed to load encoder weights from {}: {}",
                weights.display(),
                e
            ))
        })?;
        vs.freeze();

        log::info!("image encoder loaded");
        Ok(Self {
            device,
            net: Box::new(net),
            _vs: vs,
        })
    }

    /// Preprocess an image for the encoder.
    fn preprocess_image(&self, img: &DynamicImage) -> Tensor {
        // Resize to the backbone's input size
        let img = img.resize_exact(224, 224, image::imageops::FilterType::Triangle);

        // Three-channel color, regardless of the source color mode
        let rgb_img = img.to_rgb8();
        let (width, height) = rgb_img.dimensions();

        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for pixel in rgb_img.pixels() {
            data.push(pixel[0] as f32 / 255.0);
            data.push(pixel[1] as f32 / 255.0);
            data.push(pixel[2] as f32 / 255.0);
        }

        // [H, W, C] -> [C, H, W]
        let tensor = Tensor::of_slice(&data)
            .reshape(&[height as i64, width as i64, 3])
            .permute(&[2, 0, 1])
            .to_kind(Kind::Float);

        // ImageNet normalization
        let mean = Tensor::of_slice(&[0.485f32, 0.456, 0.406])
            .view([3, 1, 1])
            .to_kind(Kind::Float);
        let std = Tensor::of_slice(&[0.229f32, 0.224, 0.225])
            .view([3, 1, 1])
            .to_kind(Kind::Float);
        let normalized = (tensor - &mean) / &std;

        // Add batch dimension [1, 3, 224, 224]
        normalized.unsqueeze(0)
    }
}

#[cfg(feature = "embeddings")]
impl EmbeddingProvider for TorchEmbedder {
    fn model_id(&self) -> &str {
        "resnet18-no-final-layer"
    }

    fn embed_image(&self, image: &DynamicImage) -> Result<Embedding> {
        let input = self.preprocess_image(image).to(self.device);
        let output = tch::no_grad(|| self.net.forward_t(&input, false));
        let flat = output.view(-1);
        let values = Vec::<f32>::try_from(&flat)?;
        Ok(Embedding::from_vec(values))
    }
}

#[cfg(feature = "embeddings")]
impl fmt::Debug for TorchEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TorchEmbedder")
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}
