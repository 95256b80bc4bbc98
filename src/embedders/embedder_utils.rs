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

use crate::common::error::EmbedderError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use tch::nn;
use tch::nn::Init;
use tch::Tensor;

#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
/// # Initializer for a freshly created embedding table
pub enum EmbeddingInitializer {
    /// Uniform sampling in `[minval, maxval]`
    uniform { minval: f64, maxval: f64 },
    /// Gaussian sampling
    normal { mean: f64, stddev: f64 },
    /// Constant fill
    constant { value: f64 },
}

impl Default for EmbeddingInitializer {
    fn default() -> Self {
        EmbeddingInitializer::uniform {
            minval: -0.1,
            maxval: 0.1,
        }
    }
}

impl EmbeddingInitializer {
    pub(crate) fn as_init(&self) -> Init {
        match *self {
            EmbeddingInitializer::uniform { minval, maxval } => Init::Uniform {
                lo: minval,
                up: maxval,
            },
            EmbeddingInitializer::normal { mean, stddev } => Init::Randn {
                mean,
                stdev: stddev,
            },
            EmbeddingInitializer::constant { value } => Init::Const(value),
        }
    }
}

#[derive(Clone, Copy, Debug)]
/// # Configuration for embedding table registration
pub struct EmbeddingTableConfig {
    /// Dimensionality of each embedding vector
    pub dim: i64,
    /// Initializer used when no initial value is supplied
    pub initializer: EmbeddingInitializer,
    /// Registers the table for gradient updates when true
    pub trainable: bool,
}

impl Default for EmbeddingTableConfig {
    fn default() -> Self {
        EmbeddingTableConfig {
            dim: 100,
            initializer: EmbeddingInitializer::default(),
            trainable: true,
        }
    }
}

/// Registers an embedding table under the given variable store path.
///
/// The table is either initialized by copying `init_value`, or freshly
/// created as a `[num_embeds, dim]` variable with the configured initializer.
/// At least one of `init_value` and `num_embeds` must be provided; when both
/// are, the leading dimension of `init_value` must equal `num_embeds`.
pub fn get_embedding<'p, P>(
    p: P,
    init_value: Option<&Tensor>,
    num_embeds: Option<i64>,
    config: &EmbeddingTableConfig,
) -> Result<Tensor, EmbedderError>
where
    P: Borrow<nn::Path<'p>>,
{
    let p = p.borrow();

    let embedding = match init_value {
        Some(init_value) => {
            let init_size = init_value.size();
            if init_size.is_empty() {
                return Err(EmbedderError::ValueError(
                    "init_value must have at least one dimension".into(),
                ));
            }
            if let Some(num_embeds) = num_embeds {
                if num_embeds != init_size[0] {
                    return Err(EmbedderError::ValueError(format!(
                        "num_embeds ({}) does not match the leading dimension of init_value ({})",
                        num_embeds, init_size[0]
                    )));
                }
            }
            p.var_copy("weight", init_value)
        }
        None => {
            let num_embeds = num_embeds.ok_or_else(|| {
                EmbedderError::ValueError(
                    "at least one of num_embeds or init_value must be provided".into(),
                )
            })?;
            if num_embeds < 1 {
                return Err(EmbedderError::InvalidConfigurationError(format!(
                    "num_embeds must be strictly positive, got {}",
                    num_embeds
                )));
            }
            if config.dim < 1 {
                return Err(EmbedderError::InvalidConfigurationError(format!(
                    "embedding dim must be strictly positive, got {}",
                    config.dim
                )));
            }
            p.var(
                "weight",
                &[num_embeds, config.dim],
                config.initializer.as_init(),
            )
        }
    };

    Ok(if config.trainable {
        embedding
    } else {
        embedding.set_requires_grad(false)
    })
}
