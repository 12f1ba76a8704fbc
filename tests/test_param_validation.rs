use onlp::train::{Algorithm, HyperParameter};
use onlp::Activation;

#[test]
fn test_learning_rate_validation() {
    let mut params = HyperParameter::new(Algorithm::AdaGrad);

    // learning_rate must be positive
    let result = params.set("learning_rate", "0.0");
    assert!(result.is_err());
    assert_eq!(
        result.unwrap_err().to_string(),
        "learning_rate must be positive"
    );
    assert!(params.set("learning_rate", "-0.5").is_err());

    assert!(params.set("learning_rate", "0.05").is_ok());
    assert_eq!(params.learning_rate(), 0.05);
}

#[test]
fn test_bias_and_l1_validation() {
    let mut params = HyperParameter::default();

    let result = params.set("bias", "-1.0");
    assert!(result.is_err());
    assert_eq!(result.unwrap_err().to_string(), "bias must be non-negative");
    assert!(params.set("bias", "0.0").is_ok());
    assert!(params.set("bias", "1.0").is_ok());

    let result = params.set("l1", "-0.001");
    assert!(result.is_err());
    assert_eq!(result.unwrap_err().to_string(), "l1 must be non-negative");
    assert!(params.set("l1", "0.0").is_ok());
    assert!(params.set("l1", "1e-5").is_ok());
}

#[test]
fn test_decaying_rate_validation() {
    let mut params = HyperParameter::new(Algorithm::AdaDeltaMiniBatch);

    let result = params.set("decaying_rate", "1.0");
    assert!(result.is_err());
    assert_eq!(
        result.unwrap_err().to_string(),
        "decaying_rate must be in [0, 1)"
    );
    assert!(params.set("decaying_rate", "0.0").is_ok());
    assert!(params.set("decaying_rate", "0.9").is_ok());

    // The roll-in rate may be exactly 1
    assert!(params.set("rollin_decaying_rate", "1.0").is_ok());
    let result = params.set("rollin_decaying_rate", "1.5");
    assert_eq!(
        result.unwrap_err().to_string(),
        "rollin_decaying_rate must be in [0, 1]"
    );
}

#[test]
fn test_count_validation() {
    let mut params = HyperParameter::default();

    let result = params.set("max_epochs", "0");
    assert_eq!(
        result.unwrap_err().to_string(),
        "max_epochs must be at least 1"
    );
    assert!(params.set("max_epochs", "10").is_ok());
    assert_eq!(params.max_epochs(), 10);

    assert!(params.set("max_depth", "0").is_err());
    assert!(params.set("max_height", "0").is_err());

    // 0 flushes after every sentence
    assert!(params.set("batch_size", "0").is_ok());
    assert!(params.set("batch_size", "32").is_ok());
    assert_eq!(params.batch_size(), 32);
}

#[test]
fn test_hidden_layer_validation() {
    let mut params = HyperParameter::new(Algorithm::FeedForwardSoftmax);

    assert!(params.set("hidden_dimensions", "100, 50").is_ok());
    assert_eq!(params.hidden_dimensions(), &[100, 50]);
    let result = params.set("hidden_dimensions", "10,0");
    assert_eq!(
        result.unwrap_err().to_string(),
        "hidden_dimensions must be positive"
    );

    assert!(params.set("activations", "sigmoid,identity").is_ok());
    assert_eq!(
        params.activations(),
        &[Activation::Sigmoid, Activation::Identity]
    );
    let result = params.set("activations", "softmax");
    assert_eq!(
        result.unwrap_err().to_string(),
        "activations must be identity or sigmoid"
    );
}

#[test]
fn test_invalid_parameter_values() {
    let mut params = HyperParameter::default();

    // Invalid number format
    assert!(params.set("learning_rate", "not_a_number").is_err());
    assert!(params.set("max_epochs", "1.5").is_err());
    assert!(params.set("seed", "-1").is_err());
    assert!(params.set("hidden_dimensions", "10,x").is_err());

    // Unknown algorithm
    let result = params.set("algorithm", "lbfgs");
    assert_eq!(result.unwrap_err().to_string(), "unknown algorithm: lbfgs");
    assert!(params.set("algorithm", "AdaGrad").is_ok());
    assert_eq!(params.algorithm(), Algorithm::AdaGrad);
}

#[test]
fn test_unknown_parameter() {
    let mut params = HyperParameter::default();
    let result = params.set("c1", "1.0");
    assert!(result.is_err());
    assert_eq!(result.unwrap_err().to_string(), "unknown parameter: c1");
}

#[test]
fn test_incompatible_settings() {
    let params = HyperParameter::new(Algorithm::AdaGrad)
        .with_hidden_layers(vec![10], vec![Activation::Sigmoid])
        .unwrap();
    assert!(params.build_optimizer().is_err());

    let params = HyperParameter::new(Algorithm::FeedForwardSoftmax)
        .with_hidden_layers(vec![10], vec![Activation::Sigmoid])
        .unwrap()
        .with_l1(0.01)
        .unwrap();
    assert!(params.build_optimizer().is_err());

    // One activation per hidden layer
    let params = HyperParameter::new(Algorithm::FeedForwardSoftmax)
        .with_hidden_layers(vec![10], vec![])
        .unwrap();
    assert!(params.build_optimizer().is_err());

    let params = HyperParameter::new(Algorithm::FeedForwardSoftmax)
        .with_hidden_layers(vec![10], vec![Activation::Sigmoid])
        .unwrap();
    let optimizer = params.build_optimizer().unwrap();
    assert_eq!(optimizer.name(), "FeedForward-Softmax");
}
