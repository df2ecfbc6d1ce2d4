use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        loss::{MseLoss, Reduction},
        pool::{MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::relu,
};
use serde::{Deserialize, Serialize};

use crate::domain::keypoints::FLAT_LEN;

/// Side length of the square grayscale input all stock variants
/// expect. The flatten widths below are derived from it.
pub const INPUT_SIZE: usize = 224;

// Flattened feature widths after the conv stacks at 224 input:
// the five-stage stack ends at 512 channels × 6 × 6, the
// four-stage stack at 256 channels × 12 × 12.
const NET_FLAT: usize = 512 * 6 * 6;
const NET2_FLAT: usize = 256 * 12 * 12;

const HIDDEN: usize = 1000;
const NET3_HIDDEN: usize = 4000;

/// Which network variant to build and train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    /// Five conv stages with a per-stage dropout schedule
    Net,
    /// Four conv+batchnorm stages, 1000-wide head
    Net2,
    /// Same conv stack as Net2 with a 4000-wide first FC layer
    Net3,
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Architecture::Net => "net",
            Architecture::Net2 => "net2",
            Architecture::Net3 => "net3",
        };
        write!(f, "{name}")
    }
}

/// Common surface of all variants, so the trainer and inferencer
/// are generic over which network they drive.
pub trait KeypointEstimator<B: Backend> {
    /// images: [batch, 1, 224, 224] → keypoints: [batch, 136]
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2>;

    /// Mean-squared error against the normalised targets,
    /// returned together with the predictions.
    fn forward_loss(
        &self,
        images: Tensor<B, 4>,
        targets: Tensor<B, 2>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let output = self.forward(images);
        let loss = MseLoss::new().forward(output.clone(), targets, Reduction::Mean);
        (loss, output)
    }
}

// ─── Shared conv stages ───────────────────────────────────────────────────────

/// Conv → ReLU → 2×2 max-pool → dropout (the KeypointNet stage).
#[derive(Module, Debug)]
pub struct ConvStage<B: Backend> {
    pub conv:    Conv2d<B>,
    pub pool:    MaxPool2d,
    pub dropout: Dropout,
}

impl<B: Backend> ConvStage<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = relu(self.conv.forward(x));
        self.dropout.forward(self.pool.forward(x))
    }
}

/// Conv → BatchNorm → ReLU → 2×2 max-pool (the KeypointNet2/3 stage).
#[derive(Module, Debug)]
pub struct ConvBnStage<B: Backend> {
    pub conv: Conv2d<B>,
    pub norm: BatchNorm<B, 2>,
    pub pool: MaxPool2d,
}

impl<B: Backend> ConvBnStage<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.pool.forward(relu(self.norm.forward(self.conv.forward(x))))
    }
}

fn conv_stage<B: Backend>(
    in_ch: usize,
    out_ch: usize,
    kernel: usize,
    dropout: f64,
    device: &B::Device,
) -> ConvStage<B> {
    ConvStage {
        conv:    Conv2dConfig::new([in_ch, out_ch], [kernel, kernel]).init(device),
        pool:    MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
        dropout: DropoutConfig::new(dropout).init(),
    }
}

fn conv_bn_stage<B: Backend>(in_ch: usize, out_ch: usize, device: &B::Device) -> ConvBnStage<B> {
    ConvBnStage {
        conv: Conv2dConfig::new([in_ch, out_ch], [3, 3]).init(device),
        norm: BatchNormConfig::new(out_ch).init(device),
        pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
    }
}

/// The four-stage 1→32→64→128→256 stack shared by Net2 and Net3.
fn conv_bn_stack<B: Backend>(device: &B::Device) -> Vec<ConvBnStage<B>> {
    let channels = [1, 32, 64, 128, 256];
    (0..channels.len() - 1)
        .map(|i| conv_bn_stage(channels[i], channels[i + 1], device))
        .collect()
}

// ─── KeypointNet ──────────────────────────────────────────────────────────────

// NOTE: #[derive(Config)] generates Clone, Display and the serde impls
// itself. Adding those derives again gives conflicting implementations.
#[derive(Config, Debug)]
pub struct KeypointNetConfig {
    /// Dropout probability of the first conv stage
    #[config(default = "0.1")]
    pub dropout_start: f64,

    /// Per-stage increment of the conv dropout probability
    #[config(default = "0.1")]
    pub dropout_step: f64,

    /// Dropout probability after the first FC layer
    #[config(default = "0.6")]
    pub fc_dropout: f64,
}

impl KeypointNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> KeypointNet<B> {
        let channels = [1, 32, 64, 128, 256, 512];
        let kernels  = [5, 3, 3, 3, 1];
        let stages = (0..kernels.len())
            .map(|i| {
                let p = self.dropout_start + self.dropout_step * i as f64;
                conv_stage(channels[i], channels[i + 1], kernels[i], p, device)
            })
            .collect();

        KeypointNet {
            stages,
            fc1:        LinearConfig::new(NET_FLAT, HIDDEN).init(device),
            fc_dropout: DropoutConfig::new(self.fc_dropout).init(),
            fc2:        LinearConfig::new(HIDDEN, FLAT_LEN).init(device),
        }
    }
}

/// Five conv stages (kernels 5,3,3,3,1; channels 1→32→64→128→256→512),
/// each ReLU + pool + dropout with the dropout probability rising per
/// stage, flattened into an 18432→1000→136 head. No batch norm.
#[derive(Module, Debug)]
pub struct KeypointNet<B: Backend> {
    pub stages:     Vec<ConvStage<B>>,
    pub fc1:        Linear<B>,
    pub fc_dropout: Dropout,
    pub fc2:        Linear<B>,
}

impl<B: Backend> KeypointEstimator<B> for KeypointNet<B> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = images;
        for stage in &self.stages {
            x = stage.forward(x);
        }
        let x = x.flatten::<2>(1, 3); // [batch, 18432]
        let x = self.fc_dropout.forward(relu(self.fc1.forward(x)));
        self.fc2.forward(x)
    }
}

// ─── KeypointNet2 ─────────────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct KeypointNet2Config {
    /// Dropout probability after each FC activation
    #[config(default = "0.2")]
    pub dropout: f64,
}

impl KeypointNet2Config {
    pub fn init<B: Backend>(&self, device: &B::Device) -> KeypointNet2<B> {
        KeypointNet2 {
            stages:   conv_bn_stack(device),
            fc1:      LinearConfig::new(NET2_FLAT, HIDDEN).init(device),
            fc1_norm: BatchNormConfig::new(HIDDEN).init(device),
            fc2:      LinearConfig::new(HIDDEN, HIDDEN).init(device),
            fc2_norm: BatchNormConfig::new(HIDDEN).init(device),
            fc3:      LinearConfig::new(HIDDEN, FLAT_LEN).init(device),
            dropout:  DropoutConfig::new(self.dropout).init(),
        }
    }
}

/// Four conv+batchnorm stages (all 3×3; channels 1→32→64→128→256)
/// flattened into a 36864→1000→1000→136 head with batch norm and
/// dropout after each hidden activation.
#[derive(Module, Debug)]
pub struct KeypointNet2<B: Backend> {
    pub stages:   Vec<ConvBnStage<B>>,
    pub fc1:      Linear<B>,
    pub fc1_norm: BatchNorm<B, 0>,
    pub fc2:      Linear<B>,
    pub fc2_norm: BatchNorm<B, 0>,
    pub fc3:      Linear<B>,
    pub dropout:  Dropout,
}

impl<B: Backend> KeypointEstimator<B> for KeypointNet2<B> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = images;
        for stage in &self.stages {
            x = stage.forward(x);
        }
        let x = x.flatten::<2>(1, 3); // [batch, 36864]
        let x = self.dropout.forward(relu(self.fc1_norm.forward(self.fc1.forward(x))));
        let x = self.dropout.forward(relu(self.fc2_norm.forward(self.fc2.forward(x))));
        self.fc3.forward(x)
    }
}

// ─── KeypointNet3 ─────────────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct KeypointNet3Config {
    /// Dropout probability after each FC activation
    #[config(default = "0.2")]
    pub dropout: f64,
}

impl KeypointNet3Config {
    pub fn init<B: Backend>(&self, device: &B::Device) -> KeypointNet3<B> {
        KeypointNet3 {
            stages:   conv_bn_stack(device),
            fc1:      LinearConfig::new(NET2_FLAT, NET3_HIDDEN).init(device),
            fc1_norm: BatchNormConfig::new(NET3_HIDDEN).init(device),
            fc2:      LinearConfig::new(NET3_HIDDEN, HIDDEN).init(device),
            fc2_norm: BatchNormConfig::new(HIDDEN).init(device),
            fc3:      LinearConfig::new(HIDDEN, FLAT_LEN).init(device),
            dropout:  DropoutConfig::new(self.dropout).init(),
        }
    }
}

/// KeypointNet2's conv stack with a wider 36864→4000→1000→136 head.
#[derive(Module, Debug)]
pub struct KeypointNet3<B: Backend> {
    pub stages:   Vec<ConvBnStage<B>>,
    pub fc1:      Linear<B>,
    pub fc1_norm: BatchNorm<B, 0>,
    pub fc2:      Linear<B>,
    pub fc2_norm: BatchNorm<B, 0>,
    pub fc3:      Linear<B>,
    pub dropout:  Dropout,
}

impl<B: Backend> KeypointEstimator<B> for KeypointNet3<B> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = images;
        for stage in &self.stages {
            x = stage.forward(x);
        }
        let x = x.flatten::<2>(1, 3); // [batch, 36864]
        let x = self.dropout.forward(relu(self.fc1_norm.forward(self.fc1.forward(x))));
        let x = self.dropout.forward(relu(self.fc2_norm.forward(self.fc2.forward(x))));
        self.fc3.forward(x)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::module::AutodiffModule;
    use burn::tensor::Distribution;

    type TestBackend = NdArray;

    fn input<B: Backend>(batch: usize, size: usize, device: &B::Device) -> Tensor<B, 4> {
        Tensor::random(
            [batch, 1, size, size],
            Distribution::Uniform(0.0, 1.0),
            device,
        )
    }

    fn assert_finite(values: &[f32]) {
        assert!(values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_net_outputs_136_per_sample() {
        let device = Default::default();
        let model = KeypointNetConfig::new().init::<TestBackend>(&device);
        let out = model.forward(input(2, INPUT_SIZE, &device));
        assert_eq!(out.dims(), [2, FLAT_LEN]);
        assert_finite(&out.into_data().to_vec::<f32>().unwrap());
    }

    #[test]
    fn test_net2_outputs_136_per_sample() {
        let device = Default::default();
        let model = KeypointNet2Config::new().init::<TestBackend>(&device);
        let out = model.forward(input(2, INPUT_SIZE, &device));
        assert_eq!(out.dims(), [2, FLAT_LEN]);
        assert_finite(&out.into_data().to_vec::<f32>().unwrap());
    }

    #[test]
    fn test_net3_outputs_136_per_sample() {
        let device = Default::default();
        let model = KeypointNet3Config::new().init::<TestBackend>(&device);
        let out = model.forward(input(1, INPUT_SIZE, &device));
        assert_eq!(out.dims(), [1, FLAT_LEN]);
        assert_finite(&out.into_data().to_vec::<f32>().unwrap());
    }

    #[test]
    #[should_panic]
    fn test_wrong_resolution_panics() {
        let device = Default::default();
        let model = KeypointNet2Config::new().init::<TestBackend>(&device);
        // 100×100 shrinks to a 4×4 map, which no longer matches
        // the first FC layer's input width
        let _ = model.forward(input(1, 100, &device));
    }

    #[test]
    fn test_forward_loss_is_finite_scalar() {
        let device = Default::default();
        let model = KeypointNet3Config::new().init::<TestBackend>(&device);
        let images = input(1, INPUT_SIZE, &device);
        let targets = Tensor::<TestBackend, 2>::zeros([1, FLAT_LEN], &device);

        let (loss, output) = model.forward_loss(images, targets);
        assert_eq!(output.dims(), [1, FLAT_LEN]);

        let loss_value = loss.into_scalar().elem::<f32>();
        assert!(loss_value.is_finite());
        assert!(loss_value >= 0.0);
    }

    #[test]
    fn test_training_and_eval_modes_differ_in_values_only() {
        type TrainB = Autodiff<NdArray>;

        let device = Default::default();
        let model = KeypointNet2Config::new().init::<TrainB>(&device);
        let images = input::<TrainB>(2, INPUT_SIZE, &device);

        // Training mode: dropout active, batch norm on batch stats
        let train_out = model.forward(images.clone());
        // Eval mode: same weights via valid()
        let eval_out = model.valid().forward(images.inner());

        assert_eq!(train_out.dims(), eval_out.dims());

        let train_values = train_out.into_data().to_vec::<f32>().unwrap();
        let eval_values = eval_out.into_data().to_vec::<f32>().unwrap();
        assert!(train_values
            .iter()
            .zip(&eval_values)
            .any(|(a, b)| (a - b).abs() > 1e-6));
    }
}
