//! Static-context projection and home-win fusion head

use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig};
use burn::tensor::activation::sigmoid;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::feed_forward::GeGlu;

/// Linear → GeGLU → Dropout, mapping the static vector into `d_model`
#[derive(Module, Debug)]
pub struct StaticProjection<B: Backend> {
    linear: Linear<B>,
    geglu: GeGlu<B>,
    dropout: Dropout,
}

impl<B: Backend> StaticProjection<B> {
    pub fn new(device: &B::Device, n_static: usize, d_model: usize, dropout: f64) -> Self {
        StaticProjection {
            linear: LinearConfig::new(n_static, d_model).init(device),
            geglu: GeGlu::new(device, d_model, d_model, true),
            dropout: DropoutConfig::new(dropout).init(),
        }
    }

    /// # Arguments
    /// * `x` - Static features [batch, n_static]
    ///
    /// # Returns
    /// Static context [batch, d_model]
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.linear.forward(x);
        let x = self.geglu.forward(x);
        self.dropout.forward(x)
    }
}

/// Linear(2·d_model → d_model) → GeGLU → Dropout → Linear(d_model → 1)
#[derive(Module, Debug)]
pub struct FusionHead<B: Backend> {
    fuse: Linear<B>,
    geglu: GeGlu<B>,
    dropout: Dropout,
    output: Linear<B>,
}

impl<B: Backend> FusionHead<B> {
    pub fn new(device: &B::Device, d_model: usize, dropout: f64) -> Self {
        FusionHead {
            fuse: LinearConfig::new(d_model * 2, d_model).init(device),
            geglu: GeGlu::new(device, d_model, d_model, true),
            dropout: DropoutConfig::new(dropout).init(),
            output: LinearConfig::new(d_model, 1).init(device),
        }
    }

    /// Forward pass returning the home-win logit
    ///
    /// # Arguments
    /// * `home` - Home team context [batch, d_model]
    /// * `away` - Away team context [batch, d_model]
    ///
    /// # Returns
    /// Win logit [batch, 1] (apply sigmoid for probability)
    pub fn forward(&self, home: Tensor<B, 2>, away: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = Tensor::cat(vec![home, away], 1);
        let x = self.fuse.forward(x);
        let x = self.geglu.forward(x);
        let x = self.dropout.forward(x);
        self.output.forward(x)
    }

    /// Forward pass returning the home-win probability
    pub fn forward_prob(&self, home: Tensor<B, 2>, away: Tensor<B, 2>) -> Tensor<B, 2> {
        sigmoid(self.forward(home, away))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_static_projection() {
        let device = Default::default();
        let proj = StaticProjection::<TestBackend>::new(&device, 31, 32, 0.0);

        let x = Tensor::random(
            [4, 31],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );
        assert_eq!(proj.forward(x).dims(), [4, 32]);
    }

    #[test]
    fn test_fusion_head_probability() {
        let device = Default::default();
        let head = FusionHead::<TestBackend>::new(&device, 32, 0.0);

        let home = Tensor::random(
            [4, 32],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );
        let away = Tensor::random(
            [4, 32],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );

        assert_eq!(head.forward(home.clone(), away.clone()).dims(), [4, 1]);

        let prob = head.forward_prob(home, away).to_data();
        for val in prob.as_slice::<f32>().unwrap() {
            assert!(*val >= 0.0 && *val <= 1.0);
        }
    }
}
