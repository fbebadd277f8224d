pub mod booking;
pub mod config;
pub mod tickets;

use std::sync::Arc;

use serde::Serialize;
use tokio::runtime::Runtime;

use tripdesk_client::{HttpBookingGateway, InMemoryBookingGateway};
use tripdesk_core::config::{AppConfig, LoadOptions};
use tripdesk_core::{ApplicationError, BookingGateway, BookingWorkflow, InterfaceError, RequestContext};

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Maps a workflow failure onto the CLI's error classes and exit codes.
    pub fn from_application_error(command: &str, error: ApplicationError, ctx: &RequestContext) -> Self {
        let error = error.into_interface(ctx.correlation_id.clone());
        let (error_class, exit_code) = match &error {
            InterfaceError::BadRequest { .. } => ("validation", 4),
            InterfaceError::Unauthorized { .. } => ("authorization", 6),
            InterfaceError::Conflict { .. } | InterfaceError::ServiceUnavailable { .. } => {
                ("backend", 5)
            }
            InterfaceError::Internal { .. } => ("internal", 3),
        };
        let message = format!(
            "{} {} (correlation_id: {})",
            error.user_message(),
            error.message(),
            ctx.correlation_id
        );
        Self::failure(command, error_class, message, exit_code)
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Which backend a command talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Backend {
    /// The configured REST API.
    #[default]
    Http,
    /// The in-memory backend seeded with the demo bookings.
    Demo,
}

pub(crate) type Workflow = BookingWorkflow<Arc<dyn BookingGateway>>;

/// Loaded config, a runtime and a workflow wired to the chosen backend.
pub(crate) struct CommandRuntime {
    pub runtime: Runtime,
    pub workflow: Workflow,
}

pub(crate) fn prepare(command: &str, backend: Backend) -> Result<CommandRuntime, CommandResult> {
    let config = AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(command, "config_validation", format!("configuration issue: {error}"), 2)
    })?;

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            3,
        )
    })?;

    let gateway: Arc<dyn BookingGateway> = match backend {
        Backend::Http => Arc::new(HttpBookingGateway::from_config(&config).map_err(|error| {
            let ctx = RequestContext::new("operator");
            let error =
                ApplicationError::Configuration(format!("failed to build backend client: {error}"));
            CommandResult::from_application_error(command, error, &ctx)
        })?),
        Backend::Demo => Arc::new(InMemoryBookingGateway::seeded()),
    };

    let workflow = BookingWorkflow::new(gateway, config.selection.policy);
    Ok(CommandRuntime { runtime, workflow })
}
