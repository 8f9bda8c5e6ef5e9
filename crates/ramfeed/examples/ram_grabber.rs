//! Run the RAM grabber against a node and both sinks.
//!
//! Usage: cargo run -p ramfeed --example ram_grabber [-- --node-url URL]
//!
//! Configuration comes from the environment; --node-url overrides
//! EOS_NODE_URL.

use ramfeed::{Grabber, GrabberConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!(
            "Usage: ram_grabber [--node-url URL]\n\
             Reads the rest of the configuration from the environment:\n\
             EOS_NODE_URL, INFLUX_URL, INFLUX_DB,\n\
             PG_EOS_HOST, PG_EOS_DBNAME, PG_EOS_USER, PG_EOS_PASSWORD,\n\
             START_BLOCK (default 1), POLL_INTERVAL_SECS (default 10)"
        );
        std::process::exit(0);
    }
    let mut node_url = None;
    let mut i = 1;
    while i < args.len() {
        if args[i] == "--node-url" {
            i += 1;
            node_url = args.get(i).cloned();
        }
        i += 1;
    }

    let mut config = match GrabberConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };
    if let Some(url) = node_url {
        config.node_url = url;
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(Grabber::new(config).run())?;
    Ok(())
}
