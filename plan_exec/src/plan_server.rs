//! # Planning Server Module
//!
//! This module abstracts over the networking side of the planner executable. The server accepts
//! telemetry frames from the simulator bridge over a REP socket, and must reply to every frame it
//! receives, either with a serialised [`SimResponse`] or with an empty frame meaning that no
//! response is given for that frame.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
    sim::{SimMessage, SimParseError, SimResponse},
};
use log::warn;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An abstraction over the networking part of the planner executable.
pub struct PlanServer {
    /// REP socket which receives telemetry and sends trajectories
    socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur in the [`PlanServer`]
#[derive(thiserror::Error, Debug)]
pub enum PlanServerError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not send data to the client: {0}")]
    SendError(zmq::Error),

    #[error("Could not recieve a message from the client: {0}")]
    RecvError(zmq::Error),

    #[error("Could not serialize the response: {0}")]
    SerializationError(serde_json::Error),

    #[error("The client sent a message which was not valid UTF-8")]
    NonUtf8Message,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PlanServer {
    /// Create a new instance of the planning server.
    ///
    /// This function will not wait for a connection from the client before returning.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, PlanServerError> {
        let socket_options = SocketOptions {
            bind: true,
            block_on_first_connect: false,
            recv_timeout: params.recv_timeout_ms,
            send_timeout: 10,
            linger: 0,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(ctx, zmq::REP, socket_options, &params.plan_endpoint)?;

        Ok(Self { socket })
    }

    /// Check if a client is connected
    pub fn is_connected(&self) -> bool {
        self.socket.connected()
    }

    /// Retrieve a message from the client.
    ///
    /// `Ok(None)` is returned if no message arrived within the receive timeout. Frames which could
    /// not be parsed are returned as `Ok(Some(Err(_)))`.
    ///
    /// After any `Ok(Some(_))` the user MUST call [`PlanServer::send_response`] or
    /// [`PlanServer::send_no_response`] before getting the next message. Non-UTF8 frames are
    /// answered automatically.
    pub fn get_message(&self) -> Result<Option<Result<SimMessage, SimParseError>>, PlanServerError> {
        let msg_str = match self.socket.recv_string(0) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => {
                self.send_no_response()?;
                return Err(PlanServerError::NonUtf8Message);
            }
            // No message in timeout
            Err(zmq::Error::EAGAIN) => return Ok(None),
            Err(e) => return Err(PlanServerError::RecvError(e)),
        };

        let msg = SimMessage::from_wire(&msg_str);
        if let Err(ref e) = msg {
            warn!("Could not parse message from the client: {}", e);
        }

        Ok(Some(msg))
    }

    /// Send a response to the last message.
    pub fn send_response(&self, response: &SimResponse) -> Result<(), PlanServerError> {
        let resp_str = response
            .to_wire()
            .map_err(PlanServerError::SerializationError)?;

        self.socket
            .send(resp_str.as_str(), 0)
            .map_err(PlanServerError::SendError)
    }

    /// Reply to the last message with an empty frame, meaning no response.
    pub fn send_no_response(&self) -> Result<(), PlanServerError> {
        self.socket
            .send("", 0)
            .map_err(PlanServerError::SendError)
    }
}

impl From<MonitoredSocketError> for PlanServerError {
    fn from(e: MonitoredSocketError) -> Self {
        PlanServerError::SocketError(e)
    }
}
