//! Multi-layer perceptron evaluated with Candle
//!
//! Weights come from a safetensors file with `layers.{i}.weight` (shape
//! `(out, in)`) and `layers.{i}.bias`. Hidden layers use ReLU; the output
//! layer is followed by a softmax.

use crate::classifier::CropModel;
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{Linear, Module};
use cropsense_core::{Error, FeatureVector, Result};
use std::path::Path;

pub struct Mlp {
    layers: Vec<Linear>,
    device: Device,
    n_features: usize,
    n_classes: usize,
}

fn candle_err(context: &str) -> impl Fn(candle_core::Error) -> Error + '_ {
    move |e| Error::classifier(format!("{}: {}", context, e))
}

impl Mlp {
    /// Build from `(weight, bias)` pairs, input layer first
    pub fn from_layers(layers: Vec<(Tensor, Tensor)>) -> Result<Self> {
        if layers.is_empty() {
            return Err(Error::model_unavailable("mlp has no layers"));
        }

        let device = layers[0].0.device().clone();
        let mut linears = Vec::with_capacity(layers.len());
        let mut expected_in: Option<usize> = None;
        let mut n_features = 0;
        let mut n_classes = 0;

        for (i, (weight, bias)) in layers.into_iter().enumerate() {
            let (out_dim, in_dim) = weight
                .dims2()
                .map_err(|e| Error::model_unavailable(format!("layer {} weight: {}", i, e)))?;
            let bias_dim = bias
                .dims1()
                .map_err(|e| Error::model_unavailable(format!("layer {} bias: {}", i, e)))?;

            if bias_dim != out_dim {
                return Err(Error::model_unavailable(format!(
                    "layer {} bias has {} entries for {} outputs",
                    i, bias_dim, out_dim
                )));
            }
            match expected_in {
                Some(prev) if prev != in_dim => {
                    return Err(Error::model_unavailable(format!(
                        "layer {} expects {} inputs but previous layer emits {}",
                        i, in_dim, prev
                    )));
                }
                None => n_features = in_dim,
                _ => {}
            }
            expected_in = Some(out_dim);
            n_classes = out_dim;

            let weight = weight.to_dtype(DType::F32).map_err(candle_err("weight dtype"))?;
            let bias = bias.to_dtype(DType::F32).map_err(candle_err("bias dtype"))?;
            linears.push(Linear::new(weight, Some(bias)));
        }

        Ok(Self {
            layers: linears,
            device,
            n_features,
            n_classes,
        })
    }

    /// Load weights from a safetensors file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let device = Device::Cpu;
        let mut tensors = candle_core::safetensors::load(path.as_ref(), &device).map_err(|e| {
            Error::model_unavailable(format!("Failed to load SafeTensors: {}", e))
        })?;

        let mut layers = Vec::new();
        while let Some(weight) = tensors.remove(&format!("layers.{}.weight", layers.len())) {
            let bias = tensors
                .remove(&format!("layers.{}.bias", layers.len()))
                .ok_or_else(|| {
                    Error::model_unavailable(format!("layers.{}.bias missing", layers.len()))
                })?;
            layers.push((weight, bias));
        }

        Self::from_layers(layers)
    }

    fn logits(&self, features: &FeatureVector) -> Result<Tensor> {
        let input: Vec<f32> = features.as_slice().iter().map(|v| *v as f32).collect();
        let mut x = Tensor::from_vec(input, (1, self.n_features), &self.device)
            .map_err(candle_err("input tensor"))?;

        let last = self.layers.len() - 1;
        for (i, layer) in self.layers.iter().enumerate() {
            x = layer.forward(&x).map_err(candle_err("forward"))?;
            if i < last {
                x = x.relu().map_err(candle_err("relu"))?;
            }
        }
        Ok(x)
    }
}

impl CropModel for Mlp {
    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        let logits = self.logits(features)?;
        let probs: Vec<f32> = candle_nn::ops::softmax(&logits, D::Minus1)
            .map_err(candle_err("softmax"))?
            .squeeze(0)
            .map_err(candle_err("squeeze"))?
            .to_vec1()
            .map_err(candle_err("to_vec1"))?;
        Ok(probs.into_iter().map(f64::from).collect())
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn algorithm(&self) -> &str {
        "mlp"
    }
}
