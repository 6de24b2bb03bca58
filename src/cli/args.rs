use clap::Parser;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "ntpdial")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Query NTP servers once and log the response as structured JSON")]
#[command(long_about = Some(
    "Query one or more NTP servers and log each response as structured JSON.\n\
     \n\
     Examples:\n\
       ntpdial time.example.org\n\
       ntpdial --network udp4 0.pool.ntp.org 1.pool.ntp.org\n\
       ntpdial -n udp6 -l 2001:db8::10 [2001:db8::123]:123\n\
     \n\
     Exit code is 0 when every server answered, 1 otherwise."
))]
pub struct Args {
    /// Servers to query: hostname, IPv4, IPv6, optionally with a port
    pub targets: Vec<String>,

    /// Network family: udp, udp4 or udp6
    #[arg(short, long, default_value = "udp6")]
    pub network: String,

    /// Local host address to send from (port is always OS-assigned)
    #[arg(short, long)]
    pub local_address: Option<String>,

    /// Timeout in seconds for each exchange
    #[arg(long, default_value_t = 5.0)]
    pub timeout: f64,

    /// Stop at the first failed server instead of querying all of them
    #[arg(long)]
    pub fail_fast: bool,

    /// Minimum log level (overrides LOG_LEVEL)
    #[arg(long)]
    pub log_level: Option<String>,
}
