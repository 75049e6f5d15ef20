//! # Arm Control Executable
//!
//! This executable coordinates access to a single robotic arm shared between many clients:
//! - Answers meta information requests describing the arm
//! - Grants exclusive ownership of the arm to one client at a time
//! - Executes home searches, point moves and trajectories requested by the owner
//! - Publishes the result of every motion

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Result};
use log::{debug, info, warn};
use std::sync::Arc;
use structopt::StructOpt;

// Internal
use arm_lib::{
    dispatcher::CommandDispatcher,
    motion::{MotionSlot, SimulatedActuator},
    notifier::Notifier,
    params::ArmExecParams,
    router::MessageRouter,
    state::SessionState,
};
use comms_if::{
    arm::Topics,
    net::{zmq, ZmqPublisher, ZmqSubscriber},
};
use util::{
    host,
    logger::{level_from_str, logger_init},
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "arm_exec", about = "Arm control executable")]
struct Opts {
    /// Parameter file name, relative to the params directory
    #[structopt(long, default_value = "arm_exec.toml")]
    params: String,

    /// Minimum log level (info, debug or trace)
    #[structopt(long, default_value = "debug")]
    log_level: String,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("arm_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(level_from_str(&opts.log_level), &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Arm Control Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    info!("Initialising...");

    // ---- LOAD PARAMETERS ----

    let params: ArmExecParams = util::params::load(&opts.params)
        .wrap_err_with(|| format!("Failed to load parameters from {}", opts.params))?;

    info!("Parameters loaded for robot {:?}", params.robot_name);

    // ---- NETWORK INITIALISATION ----

    let topics = Topics::new(&params.robot_name);
    let zmq_ctx = zmq::Context::new();

    let publisher = ZmqPublisher::new(
        &zmq_ctx,
        &params.events_endpoint,
        true,
        params.send_timeout_ms,
    )
    .wrap_err("Failed to initialise the events publisher")?;

    let subscriber = ZmqSubscriber::new(
        &zmq_ctx,
        &params.commands_endpoint,
        true,
        &[topics.metainfo.as_str(), topics.commands.as_str()],
        params.recv_timeout_ms,
    )
    .wrap_err("Failed to initialise the commands subscriber")?;

    info!(
        "Listening on {}, publishing on {}",
        params.commands_endpoint, params.events_endpoint
    );

    // ---- CONTROLLER INITIALISATION ----

    let actuator = SimulatedActuator::new(
        params.joints.clone(),
        params.home_search_duration(),
        params.move_duration(),
    );
    let slot = Arc::new(
        MotionSlot::new(Box::new(actuator)).wrap_err("Failed to start the motion slot")?,
    );

    let notifier = Notifier::new(Arc::new(publisher), topics);
    let dispatcher = CommandDispatcher::new(SessionState::new(), slot, notifier.clone());
    let router = MessageRouter::new(dispatcher, notifier, params.metainfo());

    router.publish_metainfo();

    // ---- MAIN LOOP ----

    info!("Initialisation complete, entering main loop");

    loop {
        let msg = match subscriber.recv() {
            Ok(Some(m)) => m,
            Ok(None) => continue,
            Err(e) => {
                warn!("Could not recieve message: {}", e);
                continue;
            }
        };

        match router.route(&msg.topic, &msg.payload) {
            Ok(outcome) => debug!("{}: {:?}", msg.topic, outcome),
            Err(e) => warn!("{}", e),
        }
    }
}
