use rust_embedders::embedders::{PositionEmbedder, PositionEmbedderConfig};
use rust_embedders::{Config, EmbedderError};
use std::io::Write;
use tch::{nn, Device, Tensor};

#[test]
fn position_embedder_learned() -> anyhow::Result<()> {
    let device = Device::Cpu;
    let vs = nn::VarStore::new(device);
    let config = PositionEmbedderConfig::new(512, 16);
    let embedder = PositionEmbedder::new(&vs.root() / "position_embeddings", &config)?;

    assert_eq!(embedder.max_position(), 512);
    assert_eq!(embedder.embedding_dim(), 16);
    assert!(embedder.embedding().requires_grad());

    let output = embedder.forward_t(None, Some(7), false)?;
    assert_eq!(output.size(), vec![7, 16]);

    let positions = Tensor::from_slice(&[0i64, 1, 2, 509, 510, 511]).view((2, 3));
    let output = embedder.forward_t(Some(&positions), None, false)?;
    assert_eq!(output.size(), vec![2, 3, 16]);

    Ok(())
}

#[test]
fn position_embedder_sequence_length_bounds() -> anyhow::Result<()> {
    let device = Device::Cpu;
    let vs = nn::VarStore::new(device);
    let config = PositionEmbedderConfig::new(512, 16);
    let embedder = PositionEmbedder::new(&vs.root() / "position_embeddings", &config)?;

    let output = embedder.forward_t(None, Some(512), false)?;
    assert_eq!(output.size(), vec![512, 16]);

    let err = embedder.forward_t(None, Some(513), false).unwrap_err();
    assert!(matches!(err, EmbedderError::ValueError(_)));

    Ok(())
}

#[test]
fn position_embedder_exclusive_inputs() -> anyhow::Result<()> {
    let device = Device::Cpu;
    let vs = nn::VarStore::new(device);
    let config = PositionEmbedderConfig::new(128, 8);
    let embedder = PositionEmbedder::new(&vs.root() / "position_embeddings", &config)?;

    let positions = Tensor::from_slice(&[0i64, 1, 2]);
    let err = embedder
        .forward_t(Some(&positions), Some(3), false)
        .unwrap_err();
    assert!(matches!(err, EmbedderError::ValueError(_)));

    let err = embedder.forward_t(None, None, false).unwrap_err();
    assert!(matches!(err, EmbedderError::ValueError(_)));

    Ok(())
}

#[test]
fn position_embedder_sinusoidal() -> anyhow::Result<()> {
    let device = Device::Cpu;
    let vs = nn::VarStore::new(device);
    let mut config = PositionEmbedderConfig::new(10, 6);
    config.sinusoidal = Some(true);
    let embedder = PositionEmbedder::new(&vs.root() / "position_embeddings", &config)?;

    assert_eq!(embedder.embedding().size(), vec![10, 6]);
    assert!(!embedder.embedding().requires_grad());

    let output = embedder.forward_t(None, Some(2), false)?;
    assert_eq!(output.size(), vec![2, 6]);

    // position 0 alternates sin(0) = 0 and cos(0) = 1
    for j in 0..6 {
        let expected = if j % 2 == 0 { 0. } else { 1. };
        assert!((output.double_value(&[0, j]) - expected).abs() < 1e-4);
    }
    // position 1, first frequency
    assert!((output.double_value(&[1, 0]) - 1f64.sin()).abs() < 1e-4);
    assert!((output.double_value(&[1, 1]) - 1f64.cos()).abs() < 1e-4);

    // the fixed table embeds identically in train and eval mode
    let train_output = embedder.forward_t(None, Some(2), true)?;
    let max_diff = (&train_output - &output).abs().max().double_value(&[]);
    assert!(max_diff < 1e-6);

    Ok(())
}

#[test]
fn position_embedder_config_from_file() -> anyhow::Result<()> {
    let json = r#"{
        "max_position": 1024,
        "dim": 32,
        "sinusoidal": true
    }"#;
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(json.as_bytes())?;

    let config = PositionEmbedderConfig::from_file(file.path());
    assert_eq!(config.max_position, 1024);
    assert_eq!(config.dim, 32);
    assert_eq!(config.sinusoidal, Some(true));
    assert_eq!(config.dropout_rate, None);

    Ok(())
}
