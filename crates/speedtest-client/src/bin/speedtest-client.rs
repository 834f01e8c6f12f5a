use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use speedtest_client::{
    OutputMode, PingMethod, ServerAddr, SortMethod, SpeedTestClient, SpeedTestMode, TestConfig,
    TestMode, format::byte_count_iec, telemetry,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "speedtest-client",
    version,
    author,
    about = "Proxy speed test client"
)]
struct Args {
    /// Server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(long, default_value_t = 10999)]
    port: u16,

    /// Config file (JSON or YAML); replaces the test flags below
    #[arg(long)]
    config: Option<PathBuf>,

    /// Subscription URL listing the proxies to test
    #[arg(long)]
    subscription: Option<String>,

    /// Logical subscription group
    #[arg(long, default_value = "Default")]
    group_name: String,

    /// What the test measures
    #[arg(long, value_enum, default_value_t = SpeedTestMode::All)]
    mode: SpeedTestMode,

    /// Latency probe strategy
    #[arg(long, value_enum, default_value_t = PingMethod::GooglePing)]
    ping_method: PingMethod,

    /// Result ordering, applied server side
    #[arg(long, value_enum, default_value_t = SortMethod::Rspeed)]
    sort_method: SortMethod,

    /// Max parallel probes on the server
    #[arg(long, default_value_t = 2)]
    concurrency: u32,

    /// Test variant
    #[arg(long, value_enum, default_value_t = TestMode::Full)]
    test_mode: TestMode,

    /// Locale for server-generated labels
    #[arg(long, default_value = "en")]
    language: String,

    /// Renderer font size hint
    #[arg(long, default_value_t = 24)]
    font_size: u32,

    /// Renderer theme hint
    #[arg(long, default_value = "rainbow")]
    theme: String,

    /// Per-probe timeout in seconds, enforced server side
    #[arg(long, default_value_t = 10)]
    timeout: u32,

    /// Server output formatting
    #[arg(long, value_enum, default_value_t = OutputMode::PicBase64)]
    output_mode: OutputMode,

    /// Channel connect timeout in seconds
    #[arg(long, default_value_t = 10)]
    connect_timeout: u64,
}

fn build_config(args: &Args) -> Result<TestConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => TestConfig::from_path(path)?,
        None => TestConfig {
            group_name: args.group_name.clone(),
            speed_test_mode: args.mode,
            ping_method: args.ping_method,
            sort_method: args.sort_method,
            concurrency: args.concurrency,
            test_mode: args.test_mode,
            subscription: String::new(),
            language: args.language.clone(),
            font_size: args.font_size,
            theme: args.theme.clone(),
            timeout_secs: args.timeout,
            output_mode: args.output_mode,
        },
    };
    if let Some(subscription) = &args.subscription {
        config.subscription = subscription.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init();

    let args = Args::parse();
    let config = build_config(&args)?;
    let addr = ServerAddr::new(args.host.clone(), args.port);

    info!(%addr, "connecting to speed test server");
    let mut client = SpeedTestClient::connect_with_timeout(
        addr.uri(),
        Duration::from_secs(args.connect_timeout),
    )
    .await?;

    let mut run = client.start_test(&config).await?;
    while let Some(reply) = run.next_reply().await? {
        println!(
            "id: {} {} ping: {} avg: {}/s max: {}/s",
            reply.id,
            reply.remarks,
            reply.ping,
            byte_count_iec(reply.avg_speed),
            byte_count_iec(reply.max_speed)
        );
    }
    info!(received = run.received(), "test run completed");
    Ok(())
}
