mod cli;

use anyhow::Context;
use dns_client::DnsClient;
use tracing::debug;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse_args();

    // Initialize tracing subscriber for logging; stdout is for the answer
    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    debug!(?args, "Starting rust-dns");

    let client = DnsClient::builder()
        .with_dns_server(args.server)
        .with_timeout(args.timeout())
        .with_logger(tracing::dispatcher::get_default(|logger| logger.clone()))
        .build()?;

    let protocol = args.protocol();
    let response = client
        .query(&args.host, args.qtype, args.qclass, protocol)
        .await
        .with_context(|| format!("Lookup of {} {} failed", args.host, args.qtype))?;

    println!(
        "; <<>> rust-dns <<>> {} {} {}",
        args.host, args.qclass, args.qtype
    );
    println!("{response}");
    println!(";; SERVER: {} ({})", client.server(), protocol);

    Ok(())
}
