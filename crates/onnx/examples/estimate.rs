use endcue_estimator::{EouEstimator, EstimatorConfig, ScoreMode};
use endcue_onnx::{HfTokenizerAdapter, OnnxEouRunner};
use std::env;
use std::sync::Arc;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 5 {
        eprintln!(
            "Usage: {} <model.onnx> <tokenizer.json> <head|logits> <utterance...>",
            args[0]
        );
        eprintln!("\nExample:");
        eprintln!(
            "  {} model.onnx tokenizer.json head what was the umm name of guy we met uh yesterday",
            args[0]
        );
        std::process::exit(1);
    }

    let model_path = &args[1];
    let tokenizer_path = &args[2];
    let mode = match args[3].as_str() {
        "head" => ScoreMode::Head,
        "logits" => ScoreMode::Logits,
        other => {
            eprintln!("Unknown mode '{}', expected head or logits", other);
            std::process::exit(1);
        }
    };
    let utterance = args[4..].join(" ");

    println!("Loading EOU model from: {}", model_path);
    let runner = match OnnxEouRunner::load(model_path) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to load model: {}", e);
            std::process::exit(1);
        }
    };

    let tokenizer = match HfTokenizerAdapter::from_file(tokenizer_path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Failed to load tokenizer: {}", e);
            std::process::exit(1);
        }
    };

    let config = EstimatorConfig {
        mode,
        ..EstimatorConfig::default()
    };
    let estimator = match EouEstimator::new(Arc::new(runner), Arc::new(tokenizer), config) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Failed to build estimator: {}", e);
            std::process::exit(1);
        }
    };

    match estimator.estimate_utterance(&utterance) {
        Ok(result) => {
            println!("\n=== End of Utterance ===");
            println!("probability: {:.4}", result.probability);
            println!("complete:    {}", result.is_complete());
            println!("inference:   {}ms", result.inference_ms);
        }
        Err(e) => {
            eprintln!("Estimation failed: {}", e);
            std::process::exit(1);
        }
    }
}
