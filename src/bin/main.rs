use clap::Parser;
use cl_log::{level::Level, write_options::WriteOptions, Logger};
use edge_addr::{AddressInstance, SocketType, factory};
use log::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "edge-addr")]
#[command(about = "Checks endpoint addresses the way the proxy reads them", long_about = None)]
struct Args {
    /// Addresses to check: IP literals, tcp://host:port or unix://path
    #[arg(required = true)]
    addresses: Vec<String>,

    /// Port applied to bare IP literals
    #[arg(short, long)]
    port: Option<u16>,

    /// Create a socket for each address and try to bind it
    #[arg(long)]
    bind: bool,

    /// Use datagram sockets instead of stream sockets when binding
    #[arg(long)]
    datagram: bool,
}

fn parse(text: &str, port: Option<u16>) -> Result<AddressInstance, edge_addr::AddressError> {
    if text.contains("://") {
        factory::from_url(text)
    } else {
        factory::from_text(text, port)
    }
}

fn describe(address: &AddressInstance) {
    match address.ip() {
        Some(ip) => info!(
            "{}: {} address {}, port {}{}",
            address,
            ip.version(),
            ip.address_as_string(),
            ip.port(),
            if ip.is_any_address() { " (wildcard)" } else { "" }
        ),
        None => info!("{}: local pipe", address),
    }
}

fn try_bind(address: &AddressInstance, kind: SocketType) -> edge_addr::Result<()> {
    let socket = address.socket(kind)?;
    address.bind(&socket)?;
    info!("{}: bound as {}", address, socket.local_address()?);

    // Don't leave the probe's socket file behind
    if let Some(path) = address.pipe_path() {
        let _ = std::fs::remove_file(path);
    }

    Ok(())
}

fn main() {

    let opt = Some(WriteOptions::EXPANDED);
    let err_opt = Some(WriteOptions::ALL);

    match Logger::builder()
        .with_stderr(Level::Error, err_opt)
        .with_stdout(Level::Warn, opt)
        .with_stdout(Level::Info, opt)
    .build() {
        Ok(_) => {},
        Err(err) => {
            eprintln!("Failed to initialize logger: {}", err);
            std::process::exit(1);
        }
    }

    let args = Args::parse();
    let kind = if args.datagram { SocketType::Datagram } else { SocketType::Stream };
    let mut failed = false;

    for text in &args.addresses {
        let address = match parse(text, args.port) {
            Ok(address) => address,
            Err(e) => {
                error!("{}", e);
                failed = true;
                continue;
            }
        };

        describe(&address);

        if !args.bind {
            continue;
        }

        if let Err(e) = try_bind(&address, kind) {
            match &e {
                edge_addr::Error::Socket(socket_err) if socket_err.os_error().is_transient() => {
                    warn!("{}", e);
                }
                _ => error!("{}", e),
            }
            failed = true;
        }
    }

    if failed {
        std::process::exit(1);
    }
}
