//! Transformer encoder for team game history
//!
//! Encodes a window of projected games into per-step representations.

use burn::module::Module;
use burn::nn::{self, Dropout, DropoutConfig, Linear, LinearConfig};
use burn::tensor::activation::softmax;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::feed_forward::{FeedForward, FeedForwardBlock, FeedForwardKind};
use crate::features::encoding::RotaryEmbedding;

/// Configuration for the sequence encoder
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Model dimension (d_model)
    pub d_model: usize,
    /// Number of attention heads
    pub n_heads: usize,
    /// Number of transformer layers
    pub n_layers: usize,
    /// Feedforward hidden dimension
    pub d_ff: usize,
    /// Dropout rate
    pub dropout: f64,
    /// Apply layer norm before each sublayer instead of after the residual
    pub norm_first: bool,
    pub feed_forward: FeedForwardKind,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            d_model: 192,
            n_heads: 8,
            n_layers: 4,
            d_ff: 768,
            dropout: 0.1,
            norm_first: false,
            feed_forward: FeedForwardKind::Geglu,
        }
    }
}

/// Multi-head self-attention layer with rotary queries and keys
#[derive(Module, Debug)]
pub struct MultiHeadAttention<B: Backend> {
    query: Linear<B>,
    key: Linear<B>,
    value: Linear<B>,
    output: Linear<B>,
    dropout: Dropout,
    n_heads: usize,
    head_dim: usize,
    scale: f32,
}

impl<B: Backend> MultiHeadAttention<B> {
    /// `d_model` must be divisible by `n_heads`
    pub fn new(device: &B::Device, d_model: usize, n_heads: usize, dropout: f64) -> Self {
        let head_dim = d_model / n_heads;

        MultiHeadAttention {
            query: LinearConfig::new(d_model, d_model).init(device),
            key: LinearConfig::new(d_model, d_model).init(device),
            value: LinearConfig::new(d_model, d_model).init(device),
            output: LinearConfig::new(d_model, d_model).init(device),
            dropout: DropoutConfig::new(dropout).init(),
            n_heads,
            head_dim,
            scale: (head_dim as f32).sqrt(),
        }
    }

    /// `rope` must satisfy `rope.supports_heads(n_heads)` for this layer's d_model
    pub fn forward(&self, x: Tensor<B, 3>, rope: &RotaryEmbedding<B>) -> Tensor<B, 3> {
        let [batch, seq_len, _] = x.dims();

        let q = self.query.forward(x.clone());
        let k = self.key.forward(x.clone());
        let v = self.value.forward(x);

        // [batch, seq, heads, head_dim] -> [batch, heads, seq, head_dim]
        let q = q
            .reshape([batch, seq_len, self.n_heads, self.head_dim])
            .swap_dims(1, 2);
        let k = k
            .reshape([batch, seq_len, self.n_heads, self.head_dim])
            .swap_dims(1, 2);
        let v = v
            .reshape([batch, seq_len, self.n_heads, self.head_dim])
            .swap_dims(1, 2);

        let q = rope.forward_heads(q);
        let k = rope.forward_heads(k);

        // [batch, heads, seq, seq]
        let scores = q.matmul(k.swap_dims(2, 3)) / self.scale;
        let attn = softmax(scores, 3);
        let attn = self.dropout.forward(attn);

        let out = attn
            .matmul(v)
            .swap_dims(1, 2)
            .reshape([batch, seq_len, self.n_heads * self.head_dim]);

        self.output.forward(out)
    }
}

/// Transformer encoder layer: self-attention plus a pluggable feed-forward sublayer
#[derive(Module, Debug)]
pub struct EncoderLayer<B: Backend> {
    self_attn: MultiHeadAttention<B>,
    feed_forward: FeedForwardBlock<B>,
    norm1: nn::LayerNorm<B>,
    norm2: nn::LayerNorm<B>,
    dropout: Dropout,
    norm_first: bool,
}

impl<B: Backend> EncoderLayer<B> {
    pub fn new(device: &B::Device, config: &EncoderConfig) -> Self {
        let feed_forward = FeedForwardBlock::new(
            device,
            config.feed_forward,
            config.d_model,
            config.d_ff,
            config.dropout,
        );
        Self::with_feed_forward(device, config, feed_forward)
    }

    /// Build a layer around an already constructed feed-forward sublayer
    pub fn with_feed_forward(
        device: &B::Device,
        config: &EncoderConfig,
        feed_forward: FeedForwardBlock<B>,
    ) -> Self {
        EncoderLayer {
            self_attn: MultiHeadAttention::new(
                device,
                config.d_model,
                config.n_heads,
                config.dropout,
            ),
            feed_forward,
            norm1: nn::LayerNormConfig::new(config.d_model).init(device),
            norm2: nn::LayerNormConfig::new(config.d_model).init(device),
            dropout: DropoutConfig::new(config.dropout).init(),
            norm_first: config.norm_first,
        }
    }

    pub fn feed_forward(&self) -> &FeedForwardBlock<B> {
        &self.feed_forward
    }

    pub fn forward(&self, x: Tensor<B, 3>, rope: &RotaryEmbedding<B>) -> Tensor<B, 3> {
        if self.norm_first {
            let attn_out = self.self_attn.forward(self.norm1.forward(x.clone()), rope);
            let x = x + self.dropout.forward(attn_out);
            let ff_out = self.feed_forward.forward(self.norm2.forward(x.clone()));
            x + self.dropout.forward(ff_out)
        } else {
            let attn_out = self.self_attn.forward(x.clone(), rope);
            let x = self.norm1.forward(x + self.dropout.forward(attn_out));
            let ff_out = self.feed_forward.forward(x.clone());
            self.norm2.forward(x + self.dropout.forward(ff_out))
        }
    }
}

/// Stack of encoder layers shared by the home and away sequences
#[derive(Module, Debug)]
pub struct SequenceEncoder<B: Backend> {
    layers: Vec<EncoderLayer<B>>,
}

impl<B: Backend> SequenceEncoder<B> {
    pub fn new(device: &B::Device, config: &EncoderConfig) -> Self {
        let layers = (0..config.n_layers)
            .map(|_| EncoderLayer::new(device, config))
            .collect();
        SequenceEncoder { layers }
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// # Arguments
    /// * `x` - Projected games [batch, seq_len, d_model]
    /// * `rope` - Position tables shared by every layer's attention
    ///
    /// # Returns
    /// Encoded games [batch, seq_len, d_model]
    pub fn forward(&self, x: Tensor<B, 3>, rope: &RotaryEmbedding<B>) -> Tensor<B, 3> {
        self.layers.iter().fold(x, |x, layer| layer.forward(x, rope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::encoding::ROTARY_BASE;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn rope(device: &<TestBackend as Backend>::Device) -> RotaryEmbedding<TestBackend> {
        RotaryEmbedding::new(device, 32, 5, ROTARY_BASE).unwrap()
    }

    fn small_config() -> EncoderConfig {
        EncoderConfig {
            d_model: 32,
            n_heads: 4,
            n_layers: 2,
            d_ff: 64,
            dropout: 0.0,
            norm_first: false,
            feed_forward: FeedForwardKind::Geglu,
        }
    }

    #[test]
    fn test_multi_head_attention() {
        let device = Default::default();
        let attn = MultiHeadAttention::<TestBackend>::new(&device, 32, 4, 0.0);

        let x = Tensor::random(
            [2, 5, 32],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );
        let out = attn.forward(x, &rope(&device));

        assert_eq!(out.dims(), [2, 5, 32]);
    }

    #[test]
    fn test_encoder_stack() {
        let device = Default::default();
        let encoder = SequenceEncoder::<TestBackend>::new(&device, &small_config());
        assert_eq!(encoder.num_layers(), 2);

        let x = Tensor::random(
            [3, 5, 32],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );
        assert_eq!(encoder.forward(x, &rope(&device)).dims(), [3, 5, 32]);
    }

    #[test]
    fn test_layers_use_configured_feed_forward() {
        let device = Default::default();
        let config = EncoderConfig {
            feed_forward: FeedForwardKind::Standard,
            norm_first: true,
            ..small_config()
        };
        let layer = EncoderLayer::<TestBackend>::new(&device, &config);
        assert_eq!(layer.feed_forward().kind(), FeedForwardKind::Standard);

        let x = Tensor::random(
            [1, 5, 32],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );
        assert_eq!(layer.forward(x, &rope(&device)).dims(), [1, 5, 32]);
    }
}
