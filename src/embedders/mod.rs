//! # Embedding layers
//!
//! Building blocks turning discrete ids into dense vectors. All layers share
//! the same structure: an embedding table registered in a `tch::nn::VarStore`
//! (held by `EmbedderBase`), shape metadata derived from that table, and a
//! dropout layer configured by a `DropoutStrategy`:
//! - `element`: independent masking of every output coordinate
//! - `item`: whole embedding vectors drop together, one mask value per item
//! - `item_type`: whole table rows drop together, so every occurrence of an
//!   id in the batch is affected at once
//!
//! Two concrete layers are provided:
//! - `WordEmbedder`: vocabulary lookup for token ids, with optional
//!   probability-weighted mixing over the vocabulary (`soft_ids`)
//! - `PositionEmbedder`: learned or sinusoidal position embeddings
//!
//! ```no_run
//! use rust_embedders::embedders::{WordEmbedder, WordEmbedderConfig};
//! use tch::{nn, Device, Kind, Tensor};
//!
//! let device = Device::Cpu;
//! let vs = nn::VarStore::new(device);
//! let config = WordEmbedderConfig::new(30522, 768);
//! let word_embedder = WordEmbedder::new(&vs.root() / "word_embeddings", &config).unwrap();
//!
//! let input_tensor = Tensor::zeros(&[64, 128], (Kind::Int64, device));
//! let embedded_output = word_embedder.forward_t(Some(&input_tensor), None, false).unwrap();
//! ```

mod embedder_base;
mod embedder_utils;
mod position_embedder;
mod word_embedder;

pub use embedder_base::EmbedderBase;
pub use embedder_utils::{get_embedding, EmbeddingInitializer, EmbeddingTableConfig};
pub use position_embedder::{PositionEmbedder, PositionEmbedderConfig};
pub use word_embedder::{WordEmbedder, WordEmbedderConfig};
