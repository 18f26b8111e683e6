//! Simple telemetry client test
//!
//! Sends a telemetry frame to a running planner once per period and prints the response.

use comms_if::{
    net::{MonitoredSocket, NetParams, SocketOptions},
    sim::{SimResponse, Telemetry},
};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "test_telem_client", about = "Send telemetry frames to the planner")]
struct Opts {
    /// Planner endpoint to connect to, overrides `plan_client_endpoint` in net.toml
    #[structopt(short, long)]
    endpoint: Option<String>,

    /// Period between frames in milliseconds
    #[structopt(short, long, default_value = "1000")]
    period_ms: u64,

    /// Send a manual event instead of telemetry
    #[structopt(long)]
    manual: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opts = Opts::from_args();

    let endpoint = match opts.endpoint {
        Some(ref e) => e.clone(),
        None => {
            let net_params: NetParams = util::params::load("net.toml")?;
            net_params.plan_client_endpoint
        }
    };
    println!("Connecting to {}", endpoint);

    // Create the context for zmq
    let ctx = zmq::Context::new();

    // Set the socket options
    let socket_options = SocketOptions {
        connect_timeout: 1000,
        linger: 1,
        recv_timeout: 1000,
        send_timeout: 10,
        req_correlate: true,
        req_relaxed: true,
        ..Default::default()
    };

    // Create the socket
    let socket = match MonitoredSocket::new(&ctx, zmq::REQ, socket_options, &endpoint) {
        Ok(s) => s,
        Err(e) => {
            println!("Could not connect to the planner");
            return Err(e.into());
        }
    };

    // Ego in the middle lane near the start of the track, one slow car ahead in the same lane
    let telem = Telemetry {
        x: 909.48,
        y: 1128.67,
        s: 124.83,
        d: 6.16,
        yaw: 0.0,
        speed: 0.0,
        sensor_fusion: vec![[0.0, 1000.0, 1128.0, 5.0, 0.0, 150.0, 6.0]],
        ..Default::default()
    };

    let frame = match opts.manual {
        true => String::from(r#"42["manual",{}]"#),
        false => format!(
            r#"42["telemetry",{}]"#,
            serde_json::to_string(&telem)?
        ),
    };

    loop {
        // Don't build up a backlog of frames while the planner is down
        if !socket.connected() {
            println!("Waiting for connection");
            std::thread::sleep(std::time::Duration::from_millis(opts.period_ms));
            continue;
        }

        print!("Sending frame... ");
        if let Err(e) = socket.send(frame.as_str(), 0) {
            println!("could not send: {}", e);
            std::thread::sleep(std::time::Duration::from_millis(opts.period_ms));
            continue;
        }

        let msg = match socket.recv_msg(0) {
            Ok(m) => m,
            Err(e) => {
                println!("could not read from planner: {}", e);
                std::thread::sleep(std::time::Duration::from_millis(opts.period_ms));
                continue;
            }
        };

        // A zero length frame means the planner skipped the cycle
        match msg.as_str() {
            Some("") => println!("no response"),
            Some(r) if r == SimResponse::Manual.to_wire()? => println!("manual acknowledged"),
            Some(r) => println!("response: {}", r),
            None => println!("non-UTF8 response"),
        }

        std::thread::sleep(std::time::Duration::from_millis(opts.period_ms));
    }
}
