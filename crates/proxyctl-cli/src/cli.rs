//! Argument parsing and command dispatch for the `proxyctl` CLI.

use clap::{Args, Parser, Subcommand};
use reqwest::Url;
use uuid::Uuid;

use proxyctl_api_models::{MAXSCALE_PARAMS, SERVICE_PARAMS, Target};

use crate::client::{AppContext, CliDependencies, CliResult, parse_url};
use crate::commands::alter::{
    handle_alter_object, handle_alter_parameter, handle_alter_service_filters, handle_alter_user,
};
use crate::commands::state::handle_server_state;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_API_URL: &str = "http://127.0.0.1:8989";
const DEFAULT_USER: &str = "admin";
const DEFAULT_PASSWORD: &str = "mariadb";

/// Parses CLI arguments, executes the requested command, and handles
/// outcome telemetry emission. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let command_name = command_label(&cli.command);
    let trace_id = Uuid::new_v4().to_string();
    let deps = match CliDependencies::from_env(&cli, &trace_id) {
        Ok(deps) => deps,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            return err.exit_code();
        }
    };
    let telemetry = deps.telemetry.clone();

    let result = dispatch(cli, &deps).await;

    let (exit_code, message, outcome) = match result {
        Ok(()) => (0, None, "success"),
        Err(err) => {
            let exit_code = err.exit_code();
            let message = err.display_message();
            eprintln!("error: {message}");
            (exit_code, Some(message), "error")
        }
    };

    if let Some(emitter) = &telemetry {
        emitter
            .emit(
                &trace_id,
                command_name,
                outcome,
                exit_code,
                message.as_deref(),
            )
            .await;
    }

    exit_code
}

async fn dispatch(cli: Cli, deps: &CliDependencies) -> CliResult<()> {
    let ctx = AppContext {
        client: deps.client.clone(),
        base_url: cli.api_url,
        user: cli.user,
        password: cli.password,
    };

    match cli.command {
        Command::Alter(alter) => match alter {
            AlterCommand::Server(args) => handle_alter_object(&ctx, TargetKind::Server, args).await,
            AlterCommand::Monitor(args) => {
                handle_alter_object(&ctx, TargetKind::Monitor, args).await
            }
            AlterCommand::Service(args) => {
                handle_alter_object(&ctx, TargetKind::Service, args).await
            }
            AlterCommand::ServiceFilters(args) => handle_alter_service_filters(&ctx, args).await,
            AlterCommand::Logging(args) => {
                handle_alter_parameter(&ctx, &Target::Logs, &args.key, &args.value).await
            }
            AlterCommand::Maxscale(args) => {
                handle_alter_parameter(&ctx, &Target::Maxscale, &args.key, &args.value).await
            }
            AlterCommand::User(args) => handle_alter_user(&ctx, args).await,
        },
        Command::Set(SetCommand::Server(args)) => {
            handle_server_state(&ctx, StateVerb::Set, args).await
        }
        Command::Clear(ClearCommand::Server(args)) => {
            handle_server_state(&ctx, StateVerb::Clear, args).await
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "proxyctl",
    about = "Administrative CLI for a database proxy's runtime configuration API"
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "PROXYCTL_API_URL",
        value_parser = parse_url,
        default_value = DEFAULT_API_URL
    )]
    pub(crate) api_url: Url,
    #[arg(
        short = 'u',
        long,
        global = true,
        env = "PROXYCTL_USER",
        default_value = DEFAULT_USER
    )]
    pub(crate) user: String,
    #[arg(
        short = 'p',
        long,
        global = true,
        env = "PROXYCTL_PASSWORD",
        default_value = DEFAULT_PASSWORD
    )]
    pub(crate) password: String,
    #[arg(
        long,
        global = true,
        env = "PROXYCTL_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub(crate) timeout: u64,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Alter runtime parameters and relationships of objects.
    #[command(subcommand)]
    Alter(AlterCommand),
    /// Set a state on an object.
    #[command(subcommand)]
    Set(SetCommand),
    /// Clear a state from an object.
    #[command(subcommand)]
    Clear(ClearCommand),
}

#[derive(Debug, Subcommand)]
pub(crate) enum AlterCommand {
    /// Alter server parameters.
    Server(AlterObjectArgs),
    /// Alter monitor parameters.
    Monitor(AlterObjectArgs),
    /// Alter service parameters.
    #[command(after_help = runtime_params_help("service", SERVICE_PARAMS))]
    Service(AlterObjectArgs),
    /// Alter the filter chain of a service.
    #[command(after_help = FILTER_ORDER_HELP)]
    ServiceFilters(ServiceFiltersArgs),
    /// Alter logging parameters.
    Logging(AlterKeyValueArgs),
    /// Alter process parameters.
    #[command(after_help = runtime_params_help("process", MAXSCALE_PARAMS))]
    Maxscale(AlterKeyValueArgs),
    /// Change the password of an admin user.
    #[command(after_help = "Changes the password for a user. To change the user type, \
destroy the user and then create it again.")]
    User(AlterUserArgs),
}

#[derive(Debug, Subcommand)]
pub(crate) enum SetCommand {
    /// Set a server state (e.g. maintenance).
    Server(ServerStateArgs),
}

#[derive(Debug, Subcommand)]
pub(crate) enum ClearCommand {
    /// Clear a server state.
    Server(ServerStateArgs),
}

/// `<name> <key> <value>` triple for the named-object alter commands.
#[derive(Debug, Args)]
pub(crate) struct AlterObjectArgs {
    /// Object name.
    pub(crate) name: String,
    /// Parameter name.
    pub(crate) key: String,
    /// New value, passed through to the server as given.
    pub(crate) value: String,
}

/// `<key> <value>` pair for the singleton alter commands.
#[derive(Debug, Args)]
pub(crate) struct AlterKeyValueArgs {
    /// Parameter name.
    pub(crate) key: String,
    /// New value, passed through to the server as given.
    pub(crate) value: String,
}

#[derive(Debug, Args)]
pub(crate) struct ServiceFiltersArgs {
    /// Service name.
    pub(crate) service: String,
    /// Filters in execution order; none removes all filters.
    pub(crate) filters: Vec<String>,
}

#[derive(Debug, Args)]
pub(crate) struct AlterUserArgs {
    /// User name.
    pub(crate) name: String,
    /// New password; prompted for when omitted on a terminal.
    pub(crate) password: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct ServerStateArgs {
    /// Server name.
    pub(crate) server: String,
    /// State name; the server validates it, unknown states are rejected
    /// remotely.
    pub(crate) state: String,
}

/// Named-object categories addressable by the `<name> <key> <value>`
/// alter commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TargetKind {
    Server,
    Monitor,
    Service,
}

/// Which direction a server state change goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StateVerb {
    Set,
    Clear,
}

impl StateVerb {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::Clear => "clear",
        }
    }
}

const FILTER_ORDER_HELP: &str = "The order of the filters is the order in which queries pass \
through the filter chain. If no filters are given, all existing filters are removed from the \
service.";

/// Help epilogue enumerating the advisory runtime-parameter allow-list.
/// The list is documentation only and may lag behind the server's
/// actual vocabulary; the server remains the authority on what it
/// accepts.
fn runtime_params_help(label: &str, params: &[&str]) -> String {
    format!(
        "The following common {label} parameters can be altered at runtime:\n  {}",
        params.join("\n  ")
    )
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Alter(alter) => match alter {
            AlterCommand::Server(_) => "alter_server",
            AlterCommand::Monitor(_) => "alter_monitor",
            AlterCommand::Service(_) => "alter_service",
            AlterCommand::ServiceFilters(_) => "alter_service_filters",
            AlterCommand::Logging(_) => "alter_logging",
            AlterCommand::Maxscale(_) => "alter_maxscale",
            AlterCommand::User(_) => "alter_user",
        },
        Command::Set(SetCommand::Server(_)) => "set_server",
        Command::Clear(ClearCommand::Server(_)) => "clear_server",
    }
}
