// Copyright 2018 The Texar Authors.
// Copyright 2020 Guillaume Becquin
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::common::config::Config;
use crate::common::dropout::DropoutStrategy;
use crate::common::error::EmbedderError;
use crate::embedders::embedder_base::EmbedderBase;
use crate::embedders::embedder_utils::{EmbeddingInitializer, EmbeddingTableConfig};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use tch::{nn, Device, Kind, Tensor};

#[derive(Debug, Serialize, Deserialize)]
/// # Position embedder configuration
/// Defines the maximum sequence length, embedding dimension and dropout
/// behavior of a `PositionEmbedder`
pub struct PositionEmbedderConfig {
    pub max_position: i64,
    pub dim: i64,
    pub initializer: Option<EmbeddingInitializer>,
    pub dropout_rate: Option<f64>,
    pub dropout_strategy: Option<DropoutStrategy>,
    pub trainable: Option<bool>,
    pub sinusoidal: Option<bool>,
}

impl Config for PositionEmbedderConfig {}

impl PositionEmbedderConfig {
    pub fn new(max_position: i64, dim: i64) -> PositionEmbedderConfig {
        PositionEmbedderConfig {
            max_position,
            dim,
            initializer: None,
            dropout_rate: None,
            dropout_strategy: None,
            trainable: None,
            sinusoidal: None,
        }
    }
}

/// # Embedding layer for token positions
/// Looks up embeddings for positions in a sequence, from either a learned
/// table or a fixed sinusoidal one.
#[derive(Debug)]
pub struct PositionEmbedder {
    base: EmbedderBase,
    dropout_rate: f64,
    dropout_strategy: DropoutStrategy,
}

impl PositionEmbedder {
    /// Build a new `PositionEmbedder`
    ///
    /// # Arguments
    ///
    /// * `p` - Variable store path for the embedding table
    /// * `config` - `PositionEmbedderConfig` defining the maximum position, embedding dimension and dropout behavior
    ///
    /// # Example
    ///
    /// ```no_run
    /// use rust_embedders::embedders::{PositionEmbedder, PositionEmbedderConfig};
    /// use tch::{nn, Device};
    ///
    /// let device = Device::Cpu;
    /// let vs = nn::VarStore::new(device);
    /// let config = PositionEmbedderConfig::new(512, 768);
    /// let position_embedder =
    ///     PositionEmbedder::new(&vs.root() / "position_embeddings", &config).unwrap();
    /// ```
    pub fn new<'p, P>(p: P, config: &PositionEmbedderConfig) -> Result<PositionEmbedder, EmbedderError>
    where
        P: Borrow<nn::Path<'p>>,
    {
        let p = p.borrow();
        let sinusoidal = config.sinusoidal.unwrap_or(false);
        let table_config = EmbeddingTableConfig {
            dim: config.dim,
            initializer: config.initializer.unwrap_or_default(),
            trainable: if sinusoidal {
                false
            } else {
                config.trainable.unwrap_or(true)
            },
        };
        let base = if sinusoidal {
            if config.max_position < 1 {
                return Err(EmbedderError::InvalidConfigurationError(format!(
                    "max_position must be strictly positive, got {}",
                    config.max_position
                )));
            }
            if config.dim < 1 {
                return Err(EmbedderError::InvalidConfigurationError(format!(
                    "embedding dim must be strictly positive, got {}",
                    config.dim
                )));
            }
            let table = sinusoidal_table(config.max_position, config.dim, p.device());
            EmbedderBase::new(p, Some(&table), None, &table_config)?
        } else {
            EmbedderBase::new(p, None, Some(config.max_position), &table_config)?
        };
        let dropout_rate = config.dropout_rate.unwrap_or(0.);
        if dropout_rate < 0. || dropout_rate >= 1. {
            return Err(EmbedderError::InvalidConfigurationError(format!(
                "dropout rate must be in [0, 1), got {}",
                dropout_rate
            )));
        }
        Ok(PositionEmbedder {
            base,
            dropout_rate,
            dropout_strategy: config.dropout_strategy.unwrap_or(DropoutStrategy::element),
        })
    }

    /// The largest embeddable sequence length.
    pub fn max_position(&self) -> i64 {
        self.base.num_embeds()
    }

    /// Flattened width of one embedding vector.
    pub fn embedding_dim(&self) -> i64 {
        self.base.embedding_dim()
    }

    /// The underlying embedding table.
    pub fn embedding(&self) -> &Tensor {
        self.base.embedding()
    }

    /// Shared state holding the table and its shape metadata.
    pub fn base(&self) -> &EmbedderBase {
        &self.base
    }

    /// Forward pass through the embedding layer
    ///
    /// # Arguments
    ///
    /// * `positions` - Optional integer tensor of position ids, any shape. If None, `sequence_length` must be provided.
    /// * `sequence_length` - Optional length from which positions `0..sequence_length` are generated. If None, `positions` must be provided.
    /// * `train` - boolean flag to turn on/off the dropout layer. Should be set to false for inference.
    ///
    /// # Returns
    ///
    /// * `Tensor` with the position dimensions of the input followed by the embedding dimensions
    pub fn forward_t(
        &self,
        positions: Option<&Tensor>,
        sequence_length: Option<i64>,
        train: bool,
    ) -> Result<Tensor, EmbedderError> {
        let calc_positions = match (positions, sequence_length) {
            (Some(_), Some(_)) => {
                return Err(EmbedderError::ValueError(
                    "Only one of positions or sequence_length may be set".into(),
                ));
            }
            (Some(_), None) => None,
            (None, Some(sequence_length)) => {
                if sequence_length > self.base.num_embeds() {
                    return Err(EmbedderError::ValueError(format!(
                        "sequence_length ({}) exceeds the maximum number of positions ({})",
                        sequence_length,
                        self.base.num_embeds()
                    )));
                }
                Some(Tensor::arange(
                    sequence_length,
                    (Kind::Int64, self.base.embedding().device()),
                ))
            }
            (None, None) => {
                return Err(EmbedderError::ValueError(
                    "At least one of positions or sequence_length must be set".into(),
                ));
            }
        };
        let positions = positions.unwrap_or_else(|| calc_positions.as_ref().unwrap());
        let ids_rank = positions.size().len();

        let table = self
            .base
            .dropped_table(self.dropout_rate, self.dropout_strategy, train)?;
        let outputs = Tensor::embedding(&table, positions, -1, false, false);
        self.base.apply_output_dropout(
            outputs,
            self.dropout_rate,
            self.dropout_strategy,
            ids_rank,
            train,
        )
    }
}

fn sinusoidal_table(max_position: i64, dim: i64, device: Device) -> Tensor {
    let mut rows: Vec<Tensor> = Vec::with_capacity(max_position as usize);
    for pos in 0..max_position {
        let mut row: Vec<f64> = Vec::with_capacity(dim as usize);
        for j in 0..dim {
            let angle = pos as f64 / 10000_f64.powf((2 * (j / 2)) as f64 / dim as f64);
            if j % 2 == 0 {
                row.push(angle.sin());
            } else {
                row.push(angle.cos());
            }
        }
        rows.push(Tensor::from_slice(&row));
    }
    Tensor::stack(&rows, 0).to_kind(Kind::Float).to_device(device)
}
