//! Command line client for manually exercising an arm controller.
//!
//! Sends a single request and prints every message published by the controller for a few
//! seconds afterwards.

use comms_if::{
    arm::{Client, CommandObject, Point, Signal, Topics, Trajectory},
    net::{Publish, ZmqPublisher, ZmqSubscriber},
};
use std::time::{Duration, Instant};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "arm_client", about = "Send a request to an arm controller")]
struct Opts {
    /// Endpoint the controller recieves requests on
    #[structopt(long, default_value = "tcp://localhost:5020")]
    commands_endpoint: String,

    /// Endpoint the controller publishes on
    #[structopt(long, default_value = "tcp://localhost:5021")]
    events_endpoint: String,

    #[structopt(long, default_value = "EDScorbotSim")]
    robot: String,

    /// Identifier of this client
    #[structopt(long, default_value = "arm_client")]
    client: String,

    /// How long to print incoming messages for after sending the request
    #[structopt(long, default_value = "5")]
    listen_s: u64,

    #[structopt(subcommand)]
    request: Request,
}

#[derive(Debug, StructOpt)]
enum Request {
    /// Request the meta information of the arm
    #[structopt(name = "metainfo")]
    MetaInfo,

    /// Request the error status of the arm
    #[structopt(name = "status")]
    Status,

    /// Take ownership of the arm
    #[structopt(name = "connect")]
    Connect,

    /// Move to a single point, one coordinate per joint
    #[structopt(name = "move")]
    Move {
        #[structopt(allow_hyphen_values = true)]
        coordinates: Vec<f64>,
    },

    /// Apply a trajectory, each point given as comma separated coordinates
    #[structopt(name = "traj")]
    Trajectory {
        #[structopt(allow_hyphen_values = true)]
        points: Vec<String>,
    },

    /// Cancel the executing trajectory
    #[structopt(name = "cancel")]
    Cancel,

    /// Release ownership of the arm
    #[structopt(name = "disconnect")]
    Disconnect,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opts = Opts::from_args();
    let topics = Topics::new(&opts.robot);
    let client = Client::new(opts.client.clone());

    let ctx = zmq::Context::new();

    let subscriber = ZmqSubscriber::new(
        &ctx,
        &opts.events_endpoint,
        false,
        &[
            topics.metainfo.as_str(),
            topics.commands.as_str(),
            topics.moved.as_str(),
        ],
        100,
    )?;
    let publisher = ZmqPublisher::new(&ctx, &opts.commands_endpoint, false, 1000)?;

    // Wait for the controller, then give the subscriptions time to reach it
    let connect_deadline = Instant::now() + Duration::from_secs(opts.listen_s);
    while !subscriber.is_connected() {
        if Instant::now() >= connect_deadline {
            return Err(format!("No controller found at {}", opts.events_endpoint).into());
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    std::thread::sleep(Duration::from_millis(200));

    let (topic, payload) = match opts.request {
        Request::MetaInfo => (
            &topics.metainfo,
            serde_json::json!({ "signal": i64::from(Signal::GetMetaInfo) }).to_string(),
        ),
        Request::Status => command(&topics, CommandObject::new(Signal::CheckStatus))?,
        Request::Connect => command(
            &topics,
            CommandObject::new(Signal::Connect).with_client(client),
        )?,
        Request::Move { coordinates } => command(
            &topics,
            CommandObject::new(Signal::MoveToPoint)
                .with_client(client)
                .with_point(Point::new(coordinates)),
        )?,
        Request::Trajectory { points } => command(
            &topics,
            CommandObject::new(Signal::ApplyTrajectory)
                .with_client(client)
                .with_trajectory(parse_trajectory(&points)?),
        )?,
        Request::Cancel => command(
            &topics,
            CommandObject::new(Signal::CancelTrajectory).with_client(client),
        )?,
        Request::Disconnect => command(
            &topics,
            CommandObject::new(Signal::Disconnect).with_client(client),
        )?,
    };

    publisher.publish(topic, &payload)?;
    println!("Sent on {}: {}", topic, payload);

    let deadline = Instant::now() + Duration::from_secs(opts.listen_s);
    while Instant::now() < deadline {
        if let Some(msg) = subscriber.recv()? {
            println!("Got message on {}: {}", msg.topic, msg.payload);
        }
    }

    Ok(())
}

fn command(
    topics: &Topics,
    cmd: CommandObject,
) -> Result<(&String, String), serde_json::Error> {
    Ok((&topics.commands, cmd.to_json()?))
}

fn parse_trajectory(points: &[String]) -> Result<Trajectory, std::num::ParseFloatError> {
    points
        .iter()
        .map(|p| {
            p.split(',')
                .map(|c| c.trim().parse::<f64>())
                .collect::<Result<Vec<_>, _>>()
                .map(Point::new)
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Trajectory::new)
}
