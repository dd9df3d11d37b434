//! Feed-forward sublayers
//!
//! The encoder layer owns its feed-forward sublayer through [`FeedForwardBlock`];
//! every variant maps `d_model → d_model`.

use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig};
use burn::tensor::activation::gelu;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

/// Contract shared by all feed-forward sublayers: [batch, seq, d_model] in and out
pub trait FeedForward<B: Backend> {
    fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3>;
}

/// Which feed-forward sublayer an encoder layer is built with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FeedForwardKind {
    /// GELU-gated linear unit
    #[default]
    Geglu,
    /// Linear → GELU → Linear
    Standard,
}

/// Gated GELU unit: `gelu(x W_g) * (x W_v)`
#[derive(Module, Debug)]
pub struct GeGlu<B: Backend> {
    projection_gate: Linear<B>,
    projection_value: Linear<B>,
}

impl<B: Backend> GeGlu<B> {
    pub fn new(device: &B::Device, dim_in: usize, dim_out: usize, bias: bool) -> Self {
        GeGlu {
            projection_gate: LinearConfig::new(dim_in, dim_out)
                .with_bias(bias)
                .init(device),
            projection_value: LinearConfig::new(dim_in, dim_out)
                .with_bias(bias)
                .init(device),
        }
    }

    /// Works on any rank; projects the last dimension
    pub fn forward<const D: usize>(&self, x: Tensor<B, D>) -> Tensor<B, D> {
        let gate = gelu(self.projection_gate.forward(x.clone()));
        let value = self.projection_value.forward(x);
        gate * value
    }
}

/// GeGLU feed-forward: GeGLU(d_model → d_ff) → Dropout → Linear(d_ff → d_model)
#[derive(Module, Debug)]
pub struct GegluFeedForward<B: Backend> {
    geglu: GeGlu<B>,
    dropout: Dropout,
    output: Linear<B>,
}

impl<B: Backend> GegluFeedForward<B> {
    pub fn new(device: &B::Device, d_model: usize, d_ff: usize, dropout: f64) -> Self {
        GegluFeedForward {
            geglu: GeGlu::new(device, d_model, d_ff, true),
            dropout: DropoutConfig::new(dropout).init(),
            output: LinearConfig::new(d_ff, d_model).init(device),
        }
    }
}

impl<B: Backend> FeedForward<B> for GegluFeedForward<B> {
    fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let x = self.geglu.forward(x);
        let x = self.dropout.forward(x);
        self.output.forward(x)
    }
}

/// Conventional position-wise feed-forward: Linear → GELU → Dropout → Linear
#[derive(Module, Debug)]
pub struct StandardFeedForward<B: Backend> {
    ff1: Linear<B>,
    ff2: Linear<B>,
    dropout: Dropout,
}

impl<B: Backend> StandardFeedForward<B> {
    pub fn new(device: &B::Device, d_model: usize, d_ff: usize, dropout: f64) -> Self {
        StandardFeedForward {
            ff1: LinearConfig::new(d_model, d_ff).init(device),
            ff2: LinearConfig::new(d_ff, d_model).init(device),
            dropout: DropoutConfig::new(dropout).init(),
        }
    }
}

impl<B: Backend> FeedForward<B> for StandardFeedForward<B> {
    fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let x = gelu(self.ff1.forward(x));
        let x = self.dropout.forward(x);
        self.ff2.forward(x)
    }
}

/// Feed-forward sublayer held by an encoder layer
#[derive(Module, Debug)]
pub enum FeedForwardBlock<B: Backend> {
    Geglu(GegluFeedForward<B>),
    Standard(StandardFeedForward<B>),
}

impl<B: Backend> FeedForwardBlock<B> {
    pub fn new(
        device: &B::Device,
        kind: FeedForwardKind,
        d_model: usize,
        d_ff: usize,
        dropout: f64,
    ) -> Self {
        match kind {
            FeedForwardKind::Geglu => {
                FeedForwardBlock::Geglu(GegluFeedForward::new(device, d_model, d_ff, dropout))
            }
            FeedForwardKind::Standard => FeedForwardBlock::Standard(StandardFeedForward::new(
                device, d_model, d_ff, dropout,
            )),
        }
    }

    pub fn kind(&self) -> FeedForwardKind {
        match self {
            FeedForwardBlock::Geglu(_) => FeedForwardKind::Geglu,
            FeedForwardBlock::Standard(_) => FeedForwardKind::Standard,
        }
    }
}

impl<B: Backend> FeedForward<B> for FeedForwardBlock<B> {
    fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        match self {
            FeedForwardBlock::Geglu(ff) => ff.forward(x),
            FeedForwardBlock::Standard(ff) => ff.forward(x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_geglu_shapes() {
        let device = Default::default();
        let geglu = GeGlu::<TestBackend>::new(&device, 16, 32, true);

        let x2 = Tensor::<TestBackend, 2>::random(
            [4, 16],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );
        assert_eq!(geglu.forward(x2).dims(), [4, 32]);

        let x3 = Tensor::<TestBackend, 3>::random(
            [4, 5, 16],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );
        assert_eq!(geglu.forward(x3).dims(), [4, 5, 32]);
    }

    #[test]
    fn test_geglu_zero_input_is_zero() {
        let device = Default::default();
        let geglu = GeGlu::<TestBackend>::new(&device, 8, 8, false);

        // Without bias both branches are zero, and gelu(0) = 0
        let y = geglu.forward(Tensor::<TestBackend, 2>::zeros([2, 8], &device));
        let sum: f32 = y.abs().sum().into_scalar();
        assert_eq!(sum, 0.0);
    }

    #[test]
    fn test_blocks_preserve_model_dim() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 3>::random(
            [2, 5, 16],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );

        for kind in [FeedForwardKind::Geglu, FeedForwardKind::Standard] {
            let block = FeedForwardBlock::<TestBackend>::new(&device, kind, 16, 64, 0.0);
            assert_eq!(block.kind(), kind);
            assert_eq!(block.forward(x.clone()).dims(), [2, 5, 16]);
        }
    }
}
