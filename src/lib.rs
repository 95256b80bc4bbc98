pub mod common;
pub mod embedders;

pub use common::config::Config;
pub use common::dropout::DropoutStrategy;
pub use common::error::EmbedderError;

pub use embedders::{
    EmbedderBase, PositionEmbedder, PositionEmbedderConfig, WordEmbedder, WordEmbedderConfig,
};
