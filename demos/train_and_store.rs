use stockcast::{make_windows, ArtifactStore, MinMaxScaler, ModelConfig, PriceModel};

fn main() {
    println!("💾 Train, Store, and Reload a Price Model");
    println!("==========================================\n");

    // A noisy upward walk stands in for real closing prices.
    let mut price = 100.0;
    let closes: Vec<f64> = (0..200)
        .map(|_| {
            price *= 1.0 + 0.001 + (rand::random::<f64>() - 0.5) * 0.02;
            price
        })
        .collect();

    let mut scaler = MinMaxScaler::new();
    let scaled = match scaler.fit_transform(&closes) {
        Ok(scaled) => scaled,
        Err(err) => {
            eprintln!("scaling failed: {}", err);
            return;
        }
    };

    let config = ModelConfig {
        lookback: 15,
        hidden_size: 12,
        num_layers: 2,
        dense_size: 6,
        epochs: 8,
        ..ModelConfig::default()
    };

    let store_dir = std::env::temp_dir().join("stockcast-demo-store");
    let result = (|| {
        let store = ArtifactStore::open(&store_dir)?;
        let set = make_windows(&scaled, config.lookback)?;
        println!("🎯 Training on {} windows...", set.len());

        let mut model = PriceModel::new(config.clone(), store.clone());
        let report = model.train(&set, "DEMO")?;
        println!("✅ Final loss: {:.6}", report.final_loss);

        let window = &scaled[scaled.len() - config.lookback..];
        let prediction = model.predict_one(window)?;

        // A second model over the same store picks up the saved artifact.
        let mut reloaded = PriceModel::new(config.clone(), store);
        reloaded.load("DEMO")?;
        let reloaded_prediction = reloaded.predict_one(window)?;

        println!("\n🔮 Next scaled close:  {:.6}", prediction);
        println!("🔁 After reload:       {:.6}", reloaded_prediction);
        println!(
            "💵 In price space:     ${:.2}",
            scaler.inverse_one(prediction)?
        );
        Ok::<(), stockcast::ForecastError>(())
    })();

    if let Err(err) = result {
        eprintln!("demo failed: {}", err);
    }
}
