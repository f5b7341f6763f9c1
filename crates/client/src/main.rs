use std::io::{self, BufRead, Write};

use anyhow::Result;
use clap::{CommandFactory, Parser};
use rate_client::{generate_history, RateClient, Timeframe};
use usdt_bob_common::{ConversionResult, RateType};

/// BOB to USDT converter backed by Binance P2P listings.
#[derive(Parser, Debug)]
#[command(
    name = "convert-cli",
    about = "Convert bolivianos to USDT using live Binance P2P rates"
)]
struct Args {
    /// Amount in BOB to convert.
    amount: Option<f64>,

    /// Use the minimum listed price instead of the average.
    #[arg(long)]
    min: bool,

    /// Host name the proxy endpoints are resolved from.
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Print a generated demo history series (24h, 7d or 30d) and exit.
    #[arg(long)]
    history: Option<Timeframe>,

    /// Interactive mode for multiple conversions.
    #[arg(long, short)]
    interactive: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    if let Some(timeframe) = args.history {
        print_history(timeframe);
        return Ok(());
    }

    let client = RateClient::for_host(&args.host);

    if args.interactive {
        return interactive_mode(&client).await;
    }

    let Some(amount) = args.amount else {
        Args::command().print_help()?;
        return Ok(());
    };

    let rate_type = if args.min { RateType::Min } else { RateType::Avg };
    let result = client.convert_bob_to_usdt(amount, rate_type).await;
    println!("{}", format_result(&result));

    Ok(())
}

async fn interactive_mode(client: &RateClient) -> Result<()> {
    println!("=== BOB to USDT converter (interactive) ===");
    println!("Commands:");
    println!("  <amount>       convert using the average price");
    println!("  <amount> min   convert using the minimum price");
    println!("  rates          show current rates");
    println!("  quit           exit");
    println!();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("BOB> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let line = line?;
        let input = line.trim();

        if input.is_empty() {
            continue;
        }

        if matches!(input.to_lowercase().as_str(), "quit" | "exit" | "q") {
            println!("👋 Bye!");
            break;
        }

        if input.eq_ignore_ascii_case("rates") {
            let rates = client.get_rates().await;
            println!("📈 Current rates ({}):", rates.source);
            println!("   Minimum: Bs. {:.2} per USDT", rates.min_price);
            println!("   Average: Bs. {:.2} per USDT", rates.avg_price);
            println!("   Updated: {}", rates.timestamp.to_rfc3339());
            println!();
            continue;
        }

        let mut parts = input.split_whitespace();
        let Some(raw_amount) = parts.next() else {
            continue;
        };
        let Ok(amount) = raw_amount.parse::<f64>() else {
            println!("❌ Please enter a valid amount");
            println!();
            continue;
        };
        let rate_type = match parts.next() {
            Some(word) if word.eq_ignore_ascii_case("min") => RateType::Min,
            _ => RateType::Avg,
        };

        let result = client.convert_bob_to_usdt(amount, rate_type).await;
        println!("{}", format_result(&result));
        println!();
    }

    Ok(())
}

/// Render a conversion the way the prompt shows it.
fn format_result(result: &ConversionResult) -> String {
    if !result.success {
        return format!(
            "❌ Error: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
    }

    format!(
        "💰 Bs. {:.2} = {:.8} USDT\n\
         📊 Rate used: Bs. {:.2} per USDT ({})\n\
         🔄 Source: {}\n\
         ⏰ Updated: {}",
        result.bob_amount,
        result.usdt_amount,
        result.rate_used,
        result.rate_type,
        result.source,
        result.timestamp
    )
}

fn print_history(timeframe: Timeframe) {
    let series = generate_history(timeframe);
    println!(
        "📈 {} demo history, {} points ({})",
        series.timeframe, series.count, series.source
    );
    for point in &series.history {
        println!(
            "  {}  min Bs. {:.2}  avg Bs. {:.2}",
            point.timestamp, point.usdt_min_bob, point.usdt_avg_bob
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successful_result_formatting() {
        let result = ConversionResult {
            bob_amount: 100.0,
            usdt_amount: 7.60456274,
            rate_used: 13.15,
            rate_type: RateType::Min,
            source: "realtime".to_string(),
            timestamp: "2025-07-01T12:00:00+00:00".to_string(),
            success: true,
            error: None,
        };

        let text = format_result(&result);
        assert!(text.contains("Bs. 100.00 = 7.60456274 USDT"));
        assert!(text.contains("Bs. 13.15 per USDT (min)"));
        assert!(text.contains("Source: realtime"));
    }

    #[test]
    fn test_failed_result_formatting() {
        let result = ConversionResult {
            bob_amount: 100.0,
            usdt_amount: 0.0,
            rate_used: 0.0,
            rate_type: RateType::Avg,
            source: "realtime".to_string(),
            timestamp: "2025-07-01T12:00:00+00:00".to_string(),
            success: false,
            error: Some("cannot convert 100 BOB at rate 0".to_string()),
        };

        let text = format_result(&result);
        assert!(text.starts_with("❌ Error:"));
        assert!(text.contains("rate 0"));
    }
}
