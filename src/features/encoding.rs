//! Learned team embeddings and rotary position tables

use burn::module::Module;
use burn::nn;
use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};

use crate::{GridironError, Result};

/// Base of the geometric frequency schedule
pub const ROTARY_BASE: f32 = 10000.0;

/// Learned team embeddings
#[derive(Module, Debug)]
pub struct TeamEmbedding<B: Backend> {
    embedding: nn::Embedding<B>,
    embed_dim: usize,
}

impl<B: Backend> TeamEmbedding<B> {
    /// Create team embedding layer
    pub fn new(device: &B::Device, num_teams: usize, embed_dim: usize) -> Self {
        let config = nn::EmbeddingConfig::new(num_teams, embed_dim);
        TeamEmbedding {
            embedding: config.init(device),
            embed_dim,
        }
    }

    /// Look up team embeddings
    ///
    /// # Arguments
    /// * `team_ids` - Team indices [batch]
    ///
    /// # Returns
    /// Embeddings [batch, embed_dim]
    pub fn forward(&self, team_ids: Tensor<B, 1, Int>) -> Tensor<B, 2> {
        let [batch] = team_ids.dims();
        self.embedding
            .forward(team_ids.reshape([batch, 1]))
            .reshape([batch, self.embed_dim])
    }
}

/// Rotary position embedding over the model dimension.
///
/// The cos/sin tables are computed once, shaped `[1, 1, max_len, dim / 2]`, and
/// travel with the module as constants (they are not parameters). Attention splits
/// the `dim / 2` frequencies evenly across heads, so each head rotates its own
/// (x_i, x_{i + head_dim/2}) pairs and q·k depends only on relative position.
#[derive(Module, Debug)]
pub struct RotaryEmbedding<B: Backend> {
    freqs_cos: Tensor<B, 4>,
    freqs_sin: Tensor<B, 4>,
    max_len: usize,
    half_dim: usize,
}

impl<B: Backend> RotaryEmbedding<B> {
    /// Create rotary tables for positions `0..max_len`; `dim` must be even and non-zero
    pub fn new(device: &B::Device, dim: usize, max_len: usize, base: f32) -> Result<Self> {
        if dim == 0 || dim % 2 != 0 {
            return Err(GridironError::Config(format!(
                "rotary dimension ({}) must be a positive even number",
                dim
            )));
        }
        if max_len == 0 {
            return Err(GridironError::Config(
                "rotary max_len must be at least 1".to_string(),
            ));
        }
        let half_dim = dim / 2;

        let inv_freq: Vec<f32> = (0..half_dim)
            .map(|i| 1.0 / base.powf(i as f32 * 2.0 / dim as f32))
            .collect();

        let mut cos_data = Vec::with_capacity(max_len * half_dim);
        let mut sin_data = Vec::with_capacity(max_len * half_dim);
        for pos in 0..max_len {
            for &freq in &inv_freq {
                let angle = pos as f32 * freq;
                cos_data.push(angle.cos());
                sin_data.push(angle.sin());
            }
        }

        let freqs_cos = Tensor::<B, 1>::from_floats(cos_data.as_slice(), device)
            .reshape([1, 1, max_len, half_dim]);
        let freqs_sin = Tensor::<B, 1>::from_floats(sin_data.as_slice(), device)
            .reshape([1, 1, max_len, half_dim]);

        Ok(RotaryEmbedding {
            freqs_cos,
            freqs_sin,
            max_len,
            half_dim,
        })
    }

    /// Cosine table [1, 1, max_len, dim / 2]
    pub fn freqs_cos(&self) -> Tensor<B, 4> {
        self.freqs_cos.clone()
    }

    /// Sine table [1, 1, max_len, dim / 2]
    pub fn freqs_sin(&self) -> Tensor<B, 4> {
        self.freqs_sin.clone()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Model dimension the tables were built for
    pub fn dim(&self) -> usize {
        self.half_dim * 2
    }

    /// Whether `n_heads` heads can share the tables evenly with an even head width
    pub fn supports_heads(&self, n_heads: usize) -> bool {
        n_heads > 0 && self.half_dim % n_heads == 0
    }

    /// Rotate a single-head sequence [batch, seq_len, dim], `seq_len <= max_len`
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, seq_len, dim] = x.dims();
        self.forward_heads(x.reshape([batch, 1, seq_len, dim]))
            .reshape([batch, seq_len, dim])
    }

    /// Rotate per-head queries or keys
    ///
    /// # Arguments
    /// * `x` - [batch, n_heads, seq_len, head_dim] with `n_heads * head_dim == dim`
    ///   and `supports_heads(n_heads)`
    ///
    /// # Returns
    /// Position-rotated tensor of the same shape
    pub fn forward_heads(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let [batch, n_heads, seq_len, head_dim] = x.dims();
        let half = head_dim / 2;

        // [1, 1, seq, n_heads * half] -> [1, n_heads, seq, half]
        let table = |t: &Tensor<B, 4>| {
            t.clone()
                .slice([0..1, 0..1, 0..seq_len, 0..self.half_dim])
                .reshape([1, seq_len, n_heads, half])
                .swap_dims(1, 2)
                .expand([batch, n_heads, seq_len, half])
        };
        let cos = table(&self.freqs_cos);
        let sin = table(&self.freqs_sin);

        let x1 = x.clone().slice([0..batch, 0..n_heads, 0..seq_len, 0..half]);
        let x2 = x.slice([0..batch, 0..n_heads, 0..seq_len, half..head_dim]);

        let rotated_1 = x1.clone() * cos.clone() - x2.clone() * sin.clone();
        let rotated_2 = x1 * sin + x2 * cos;
        Tensor::cat(vec![rotated_1, rotated_2], 3)
    }
}
