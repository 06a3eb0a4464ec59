use clap::Parser;
use std::time::Instant;

use embedded_nal::{AddrType, TcpClientStack};
use std_embedded_nal::Stack;

use netfetch::{
    connect::{connect_socket, HTTP_PORT},
    dns::{nslookup, print_addrinfo_results},
    http_client::{http_client_req, print_response, HttpRequest, Method, DEFAULT_TIMEOUT_MS, RECV_BUF_LEN},
};

use log::Level;

const DEFAULT_TEST_HOST: &str = "example.com";

#[derive(Clone, Copy, clap::ValueEnum, Debug)]
enum Family {
    Any,
    Ipv4,
    Ipv6,
}

impl From<Family> for AddrType {
    fn from(family: Family) -> Self {
        match family {
            Family::Any => AddrType::Either,
            Family::Ipv4 => AddrType::IPv4,
            Family::Ipv6 => AddrType::IPv6,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// host to resolve, connect to and send as the Host header
    #[arg(default_value = DEFAULT_TEST_HOST)]
    hostname: String,

    /// request target
    #[arg(short, long, default_value = "/")]
    url: String,

    #[arg(short, long, default_value_t = HTTP_PORT)]
    port: u16,

    /// address family to look up
    #[arg(short, long, value_enum, default_value_t = Family::Any)]
    family: Family,

    /// HTTP timeout in milliseconds
    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout: u32,

    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,
}

#[derive(Debug)]
enum LocalErrors {
    DnsError,
    ConnectError,
    HttpError,
}

fn main() -> Result<(), LocalErrors> {
    let cli = Cli::parse();

    let log_level = match cli.debug {
        1 => Level::Info,
        2 => Level::Debug,
        3 => Level::Trace,
        _ => Level::Warn,
    };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_level.to_string()),
    )
    .init();
    log::info!("Starting netfetch");

    let mut stack = Stack::default();

    let addrs = nslookup(&mut stack, &cli.hostname, cli.family.into()).map_err(|e| {
        log::error!("{}: {}", cli.hostname, e);
        LocalErrors::DnsError
    })?;
    let mut lines = String::new();
    // Writing into a String cannot fail
    let _ = print_addrinfo_results(&mut lines, &addrs);
    print!("{}", lines);

    let mut sock = connect_socket(&mut stack, &addrs, cli.port).map_err(|e| {
        log::error!("{}", e);
        LocalErrors::ConnectError
    })?;

    let started = Instant::now();
    let clock = || started.elapsed().as_millis() as u32;
    let mut recv_buf = [0u8; RECV_BUF_LEN];
    let req = HttpRequest::new(Method::Get, &cli.url, &cli.hostname, &mut recv_buf, |rsp, final_data| {
        let mut text = String::new();
        let _ = print_response(&mut text, rsp, final_data);
        print!("{}", text);
    });
    let result = http_client_req(&mut stack, &mut sock, req, Some(cli.timeout), clock);
    println!();

    if stack.close(sock).is_err() {
        log::warn!("Socket close failed");
    }
    result.map_err(|e| {
        log::error!("{}", e);
        LocalErrors::HttpError
    })?;
    Ok(())
}
