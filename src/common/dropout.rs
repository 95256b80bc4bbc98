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

use serde::{Deserialize, Serialize};
use tch::nn::ModuleT;
use tch::{Kind, Tensor};

#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// # Noise-shaping strategy applied when dropping embedded values
pub enum DropoutStrategy {
    /// Every tensor coordinate is masked independently
    element,
    /// Each embedded item keeps or loses its entire embedding vector
    item,
    /// Each embedding table row is masked, dropping all occurrences of an id together
    item_type,
}

/// # Dropout with an explicit broadcast shape for the random mask
/// Without a noise shape this is plain element-wise dropout. With one, a
/// keep-mask of that shape is sampled, broadcast against the input and
/// rescaled by `1 / (1 - p)`, so all coordinates sharing a mask entry drop
/// together.
#[derive(Debug)]
pub struct EmbeddingDropout {
    dropout_prob: f64,
    noise_shape: Option<Vec<i64>>,
}

impl EmbeddingDropout {
    pub fn new(p: f64, noise_shape: Option<Vec<i64>>) -> EmbeddingDropout {
        EmbeddingDropout {
            dropout_prob: p,
            noise_shape,
        }
    }

    pub fn noise_shape(&self) -> Option<&[i64]> {
        self.noise_shape.as_deref()
    }
}

impl ModuleT for EmbeddingDropout {
    fn forward_t(&self, input: &Tensor, train: bool) -> Tensor {
        if !train || self.dropout_prob == 0. {
            return input.shallow_clone();
        }
        match &self.noise_shape {
            None => input.dropout(self.dropout_prob, train),
            Some(noise_shape) => {
                let keep_mask =
                    Tensor::rand(noise_shape.as_slice(), (Kind::Float, input.device()))
                        .ge(self.dropout_prob)
                        .to_kind(input.kind());
                input * keep_mask / (1. - self.dropout_prob)
            }
        }
    }
}
