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
use tch::{nn, Tensor};

#[derive(Debug, Serialize, Deserialize)]
/// # Word embedder configuration
/// Defines the vocabulary size, embedding dimension and dropout behavior of
/// a `WordEmbedder`
pub struct WordEmbedderConfig {
    pub vocab_size: i64,
    pub dim: i64,
    pub initializer: Option<EmbeddingInitializer>,
    pub dropout_rate: Option<f64>,
    pub dropout_strategy: Option<DropoutStrategy>,
    pub trainable: Option<bool>,
}

impl Config for WordEmbedderConfig {}

impl WordEmbedderConfig {
    pub fn new(vocab_size: i64, dim: i64) -> WordEmbedderConfig {
        WordEmbedderConfig {
            vocab_size,
            dim,
            initializer: None,
            dropout_rate: None,
            dropout_strategy: None,
            trainable: None,
        }
    }
}

/// # Embedding layer for vocabulary tokens
/// Maps token ids, or probability distributions over the vocabulary, to
/// dense vectors looked up in a trainable (or fixed) embedding table.
#[derive(Debug)]
pub struct WordEmbedder {
    base: EmbedderBase,
    dropout_rate: f64,
    dropout_strategy: DropoutStrategy,
}

impl WordEmbedder {
    /// Build a new `WordEmbedder` with a freshly initialized table.
    ///
    /// # Arguments
    ///
    /// * `p` - Variable store path for the embedding table
    /// * `config` - `WordEmbedderConfig` defining the vocabulary size, embedding dimension and dropout behavior
    ///
    /// # Example
    ///
    /// ```no_run
    /// use rust_embedders::embedders::{WordEmbedder, WordEmbedderConfig};
    /// use tch::{nn, Device};
    ///
    /// let device = Device::Cpu;
    /// let vs = nn::VarStore::new(device);
    /// let config = WordEmbedderConfig::new(30522, 768);
    /// let word_embedder = WordEmbedder::new(&vs.root() / "word_embeddings", &config).unwrap();
    /// ```
    pub fn new<'p, P>(p: P, config: &WordEmbedderConfig) -> Result<WordEmbedder, EmbedderError>
    where
        P: Borrow<nn::Path<'p>>,
    {
        let base = EmbedderBase::new(
            p,
            None,
            Some(config.vocab_size),
            &table_config(config),
        )?;
        WordEmbedder::with_base(base, config)
    }

    /// Build a `WordEmbedder` from an existing embedding matrix. The
    /// vocabulary size and embedding dimensions are read off `init_value`.
    pub fn from_init_value<'p, P>(
        p: P,
        init_value: &Tensor,
        config: &WordEmbedderConfig,
    ) -> Result<WordEmbedder, EmbedderError>
    where
        P: Borrow<nn::Path<'p>>,
    {
        let base = EmbedderBase::new(p, Some(init_value), None, &table_config(config))?;
        WordEmbedder::with_base(base, config)
    }

    fn with_base(
        base: EmbedderBase,
        config: &WordEmbedderConfig,
    ) -> Result<WordEmbedder, EmbedderError> {
        let dropout_rate = config.dropout_rate.unwrap_or(0.);
        if dropout_rate < 0. || dropout_rate >= 1. {
            return Err(EmbedderError::InvalidConfigurationError(format!(
                "dropout rate must be in [0, 1), got {}",
                dropout_rate
            )));
        }
        Ok(WordEmbedder {
            base,
            dropout_rate,
            dropout_strategy: config.dropout_strategy.unwrap_or(DropoutStrategy::element),
        })
    }

    /// The number of entries in the vocabulary.
    pub fn vocab_size(&self) -> i64 {
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
    /// * `ids` - Optional integer tensor of token ids, any shape. If None, `soft_ids` must be provided.
    /// * `soft_ids` - Optional tensor of shape (*...*, *vocab_size*) mixing table rows by the given weights. If None, `ids` must be provided.
    /// * `train` - boolean flag to turn on/off the dropout layer. Should be set to false for inference.
    ///
    /// # Returns
    ///
    /// * `Tensor` with the id dimensions of the input followed by the embedding dimensions
    pub fn forward_t(
        &self,
        ids: Option<&Tensor>,
        soft_ids: Option<&Tensor>,
        train: bool,
    ) -> Result<Tensor, EmbedderError> {
        let ids_rank = match (ids, soft_ids) {
            (Some(_), Some(_)) => {
                return Err(EmbedderError::ValueError(
                    "Only one of ids or soft_ids may be set".into(),
                ));
            }
            (Some(ids), None) => ids.size().len(),
            (None, Some(soft_ids)) => {
                let soft_size = soft_ids.size();
                let num_embeds = self.base.num_embeds();
                if soft_size.last() != Some(&num_embeds) {
                    return Err(EmbedderError::ValueError(format!(
                        "the last dimension of soft_ids {:?} must equal the vocabulary size ({})",
                        soft_size, num_embeds
                    )));
                }
                soft_size.len() - 1
            }
            (None, None) => {
                return Err(EmbedderError::ValueError(
                    "At least one of ids or soft_ids must be set".into(),
                ));
            }
        };

        let table = self
            .base
            .dropped_table(self.dropout_rate, self.dropout_strategy, train)?;
        let outputs = match ids {
            Some(ids) => Tensor::embedding(&table, ids, -1, false, false),
            None => soft_lookup(&table, soft_ids.unwrap(), self.base.dim()),
        };
        self.base.apply_output_dropout(
            outputs,
            self.dropout_rate,
            self.dropout_strategy,
            ids_rank,
            train,
        )
    }
}

fn table_config(config: &WordEmbedderConfig) -> EmbeddingTableConfig {
    EmbeddingTableConfig {
        dim: config.dim,
        initializer: config.initializer.unwrap_or_default(),
        trainable: config.trainable.unwrap_or(true),
    }
}

fn soft_lookup(table: &Tensor, soft_ids: &Tensor, dim: &[i64]) -> Tensor {
    let table_size = table.size();
    let flat_table = table.view((table_size[0], -1));
    let outputs = soft_ids.matmul(&flat_table);
    if dim.len() == 1 {
        outputs
    } else {
        let mut output_shape = soft_ids.size();
        output_shape.pop();
        output_shape.extend_from_slice(dim);
        outputs.view(output_shape.as_slice())
    }
}
