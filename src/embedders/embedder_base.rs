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

use crate::common::dropout::{DropoutStrategy, EmbeddingDropout};
use crate::common::error::EmbedderError;
use crate::embedders::embedder_utils::{get_embedding, EmbeddingTableConfig};
use std::borrow::Borrow;
use tch::nn::ModuleT;
use tch::{nn, Tensor};

/// # Shared state for embedding layers
/// Owns the embedding table and the shape metadata derived from it, and
/// builds the dropout layer matching a noise-shaping strategy. Concrete
/// layers (`WordEmbedder`, `PositionEmbedder`) hold an `EmbedderBase` and
/// drive their forward pass through it.
#[derive(Debug)]
pub struct EmbedderBase {
    embedding: Tensor,
    num_embeds: i64,
    dim: Vec<i64>,
}

impl EmbedderBase {
    /// Registers the embedding table and derives its shape metadata.
    ///
    /// `num_embeds` and the embedding dimensions are re-read from the
    /// registered table, so they reflect `init_value` when one is given.
    pub fn new<'p, P>(
        p: P,
        init_value: Option<&Tensor>,
        num_embeds: Option<i64>,
        config: &EmbeddingTableConfig,
    ) -> Result<EmbedderBase, EmbedderError>
    where
        P: Borrow<nn::Path<'p>>,
    {
        let embedding = get_embedding(p, init_value, num_embeds, config)?;
        let embedding_size = embedding.size();
        let num_embeds = embedding_size[0];
        let dim = embedding_size[1..].to_vec();
        if dim.is_empty() {
            return Err(EmbedderError::ValueError(
                "embedding table must have at least two dimensions".into(),
            ));
        }
        Ok(EmbedderBase {
            embedding,
            num_embeds,
            dim,
        })
    }

    /// The embedding table registered in the variable store.
    pub fn embedding(&self) -> &Tensor {
        &self.embedding
    }

    /// The number of embedding elements.
    pub fn num_embeds(&self) -> i64 {
        self.num_embeds
    }

    /// Dimensions of a single embedding entry, excluding the id axis.
    pub fn dim(&self) -> &[i64] {
        &self.dim
    }

    /// Rank of a single embedding entry.
    pub fn dim_rank(&self) -> usize {
        self.dim.len()
    }

    /// Flattened width of one embedding entry, equal to `dim()[0]` for the
    /// usual rank-1 case.
    pub fn embedding_dim(&self) -> i64 {
        self.dim.iter().product()
    }

    /// Builds the dropout layer for the given strategy, or `None` when the
    /// rate is zero.
    ///
    /// `item` dropout needs the tensor the mask will be broadcast against
    /// (`dropout_input`) and the number of leading id dimensions in it
    /// (`ids_rank`).
    pub fn get_dropout_layer(
        &self,
        dropout_rate: f64,
        dropout_strategy: DropoutStrategy,
        ids_rank: Option<usize>,
        dropout_input: Option<&Tensor>,
    ) -> Result<Option<EmbeddingDropout>, EmbedderError> {
        if dropout_rate < 0. || dropout_rate >= 1. {
            return Err(EmbedderError::InvalidConfigurationError(format!(
                "dropout rate must be in [0, 1), got {}",
                dropout_rate
            )));
        }
        if dropout_rate == 0. {
            return Ok(None);
        }
        let noise_shape = match dropout_strategy {
            DropoutStrategy::element => None,
            DropoutStrategy::item => {
                let ids_rank = ids_rank.ok_or_else(|| {
                    EmbedderError::ValueError("ids_rank must be provided for item dropout".into())
                })?;
                let dropout_input = dropout_input.ok_or_else(|| {
                    EmbedderError::ValueError(
                        "dropout_input must be provided for item dropout".into(),
                    )
                })?;
                let input_size = dropout_input.size();
                if ids_rank > input_size.len() {
                    return Err(EmbedderError::ValueError(format!(
                        "ids_rank ({}) exceeds the rank of dropout_input ({})",
                        ids_rank,
                        input_size.len()
                    )));
                }
                Some(item_noise_shape(&input_size, ids_rank, self.dim_rank()))
            }
            DropoutStrategy::item_type => {
                Some(item_type_noise_shape(self.num_embeds, self.dim_rank()))
            }
        };
        Ok(Some(EmbeddingDropout::new(dropout_rate, noise_shape)))
    }

    /// Embedding table with `item_type` dropout applied when that strategy
    /// is active, unchanged otherwise.
    pub(crate) fn dropped_table(
        &self,
        dropout_rate: f64,
        dropout_strategy: DropoutStrategy,
        train: bool,
    ) -> Result<Tensor, EmbedderError> {
        if let DropoutStrategy::item_type = dropout_strategy {
            if let Some(dropout) = self.get_dropout_layer(dropout_rate, dropout_strategy, None, None)?
            {
                return Ok(dropout.forward_t(&self.embedding, train));
            }
        }
        Ok(self.embedding.shallow_clone())
    }

    /// Output-side dropout for the `element` and `item` strategies.
    /// `item_type` dropout was already applied to the table, so the outputs
    /// pass through untouched.
    pub(crate) fn apply_output_dropout(
        &self,
        outputs: Tensor,
        dropout_rate: f64,
        dropout_strategy: DropoutStrategy,
        ids_rank: usize,
        train: bool,
    ) -> Result<Tensor, EmbedderError> {
        if let DropoutStrategy::item_type = dropout_strategy {
            return Ok(outputs);
        }
        match self.get_dropout_layer(
            dropout_rate,
            dropout_strategy,
            Some(ids_rank),
            Some(&outputs),
        )? {
            Some(dropout) => Ok(outputs.apply_t(&dropout, train)),
            None => Ok(outputs),
        }
    }
}

fn item_noise_shape(input_size: &[i64], ids_rank: usize, dim_rank: usize) -> Vec<i64> {
    let mut noise_shape = input_size[..ids_rank].to_vec();
    noise_shape.extend(vec![1; dim_rank]);
    noise_shape
}

fn item_type_noise_shape(num_embeds: i64, dim_rank: usize) -> Vec<i64> {
    let mut noise_shape = vec![num_embeds];
    noise_shape.extend(vec![1; dim_rank]);
    noise_shape
}

#[cfg(test)]
mod test {
    use super::{item_noise_shape, item_type_noise_shape};

    #[test]
    fn test_item_noise_shape() {
        let test_cases = [
            (vec![64i64, 128, 200], 2usize, 1usize, vec![64i64, 128, 1]),
            (vec![64, 128, 4, 200], 2, 2, vec![64, 128, 1, 1]),
            (vec![32, 200], 1, 1, vec![32, 1]),
            (vec![200], 0, 1, vec![1]),
        ];

        for (input_size, ids_rank, dim_rank, expected) in &test_cases {
            assert_eq!(
                item_noise_shape(input_size, *ids_rank, *dim_rank),
                *expected
            );
        }
    }

    #[test]
    fn test_item_type_noise_shape() {
        assert_eq!(item_type_noise_shape(1000, 1), vec![1000, 1]);
        assert_eq!(item_type_noise_shape(1000, 3), vec![1000, 1, 1, 1]);
    }
}
