//
// main.rs - sockman-listen, a UDP listener built on sockman
//
// Purpose:
//   Binds a run of consecutive UDP ports, hands every socket to one SockMan driver and
//   prints whatever arrives from the main thread, which never runs an event loop.
//
// How it works:
//   - Each socket gets its own inbound queue; the main thread polls every queue in turn.
//   - With a single port the queue is read with a blocking timed wait; with several the
//     queues are drained round-robin, backing off briefly after an empty pass.
//   - A wait that elapses with nothing received prints "nothing".
//   - After --limit datagrams every registration is stopped and the driver shut down.
//

use anyhow::Context as _;
use clap::Parser;
use sockman::{InboundQueue, QueueError, SockMan, SockManConfig};
use std::net::{IpAddr, UdpSocket};
use std::thread;
use std::time::{Duration, Instant};

const IDLE_BACKOFF: Duration = Duration::from_millis(10);

#[derive(Parser, Debug)]
#[command(name = "sockman-listen", about = "Receive UDP datagrams on a range of ports")]
struct Args {
    /// Local address to bind every port on
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// First port to listen on
    #[arg(long, default_value_t = 9000)]
    base_port: u16,

    /// Number of consecutive ports
    #[arg(long, default_value_t = 1)]
    count: u16,

    /// Stop after this many datagrams (runs until killed if omitted)
    #[arg(long)]
    limit: Option<usize>,

    /// How long to wait before reporting that nothing arrived
    #[arg(long, default_value = "1s", value_parser = humantime::parse_duration)]
    timeout: Duration,

    /// SO_RCVBUF for every socket
    #[arg(long)]
    recv_buffer: Option<usize>,
}

fn print_datagram(port: u16, payload: &[u8]) {
    log::info!(
        "[{port}] {} bytes: {}",
        payload.len(),
        String::from_utf8_lossy(payload)
    );
}

/// Reads one pass over every queue, returns how many datagrams were printed.
fn poll_queues(queues: &mut Vec<(u16, InboundQueue)>, timeout: Duration) -> usize {
    if queues.len() == 1 {
        let port = queues[0].0;
        return match queues[0].1.get_timeout(timeout) {
            Ok(payload) => {
                print_datagram(port, &payload);
                1
            }
            Err(QueueError::Closed) => {
                queues.clear();
                0
            }
            Err(_) => 0,
        };
    }
    let mut printed = 0;
    queues.retain(|(port, queue)| match queue.try_get() {
        Ok(payload) => {
            print_datagram(*port, &payload);
            printed += 1;
            true
        }
        Err(QueueError::Closed) => false,
        Err(_) => true,
    });
    printed
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();
    let sockman = SockMan::new(Some(SockManConfig {
        recv_buffer_size: args.recv_buffer,
        ..Default::default()
    }))
    .context("failed to start the sockman driver")?;

    let mut queues = Vec::with_capacity(args.count as usize);
    let mut stops = Vec::with_capacity(args.count as usize);
    for offset in 0..args.count {
        let port = args
            .base_port
            .checked_add(offset)
            .context("port range exceeds 65535")?;
        let socket = UdpSocket::bind((args.host, port))
            .with_context(|| format!("failed to bind {}:{port}", args.host))?;
        let (queue, stop) = sockman
            .start_receiving_on(socket)
            .with_context(|| format!("failed to register port {port}"))?;
        queues.push((port, queue));
        stops.push(stop);
    }
    log::info!(
        "listening on {}:{}..={}",
        args.host,
        args.base_port,
        args.base_port + args.count.saturating_sub(1)
    );

    let mut received = 0usize;
    let mut idle_since = Instant::now();
    while args.limit.is_none_or(|limit| received < limit) {
        if queues.is_empty() {
            log::warn!("every listener has exited");
            break;
        }
        let printed = poll_queues(&mut queues, args.timeout);
        if printed > 0 {
            received += printed;
            idle_since = Instant::now();
            continue;
        }
        if queues.len() > 1 {
            thread::sleep(IDLE_BACKOFF);
        }
        if idle_since.elapsed() >= args.timeout {
            log::info!("nothing");
            idle_since = Instant::now();
        }
    }

    log::info!("stopping after {received} datagrams");
    for stop in &stops {
        stop.stop();
    }
    sockman.shutdown().context("driver did not shut down cleanly")?;
    log::info!("stopped");
    Ok(())
}
