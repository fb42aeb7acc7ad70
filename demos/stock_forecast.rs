use stockcast::{ForecastRequest, PredictionService, ServiceConfig, SyntheticProvider};

use chrono::{Duration, Utc};

fn main() {
    println!("🏦 Stock Closing-Price Forecast");
    println!("================================\n");

    // Smaller geometry than the production defaults so the demo trains in
    // a few seconds.
    let mut config = ServiceConfig::default();
    config.lookback = 20;
    config.hidden_size = 16;
    config.dense_size = 8;
    config.epochs = 10;
    config.artifact_dir = std::env::temp_dir().join("stockcast-demo");

    let service = match PredictionService::new(SyntheticProvider::new(), config) {
        Ok(service) => service,
        Err(err) => {
            eprintln!("failed to start service: {}", err);
            return;
        }
    };

    println!("📋 Supported tickers:");
    for info in service.tickers() {
        println!("   {:6} {}", info.symbol, info.name);
    }

    let end_date = Utc::now().date_naive();
    let request = ForecastRequest {
        ticker: "AAPL".to_string(),
        start_date: end_date - Duration::days(730),
        end_date,
        prediction_days: 5,
    };

    println!("\n🎯 Training and forecasting {}...", request.ticker);
    let response = match service.forecast(&request) {
        Ok(response) => response,
        Err(err) => {
            eprintln!("forecast failed ({}): {}", err.status_code(), err);
            return;
        }
    };

    println!("\n📈 Last 5 closes:");
    for point in response.historical.iter().rev().take(5).rev() {
        println!("   {}  ${:.2}", point.date, point.close);
    }

    println!("\n🔮 Predictions:");
    for point in &response.predictions {
        println!("   {}  ${:.2}", point.date, point.price);
    }

    println!(
        "\nCurrent ${:.2} → predicted ${:.2} ({:+.2}), confidence {:.2}",
        response.current_price, response.predicted_price, response.change, response.confidence
    );
}
