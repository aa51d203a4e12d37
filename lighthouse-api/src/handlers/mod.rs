//! Built-in action handlers and the catalog built from configuration.
//!
//! Without a `handlers` section the catalog holds the cluster's standard
//! operations: `nodes`, `user_list`, `power_on`, `shutdown` and
//! `remove_user`.

pub mod command;
pub mod nodes;

use lighthouse_core::{ActionHandler, HandlerCatalog};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{CommandOutput, HandlerConfig};
use crate::constants::{DEFAULT_NODE_COUNT, DEFAULT_NODE_PREFIX};

pub use command::CommandHandler;
pub use nodes::NodeListHandler;

const POWER_CONTROL_SCRIPT: &str = "/nfs/scripts/automation/lisa_scripts/power_control.py";
const SHUTDOWN_PLAYBOOK: &str = "/nfs/scripts/automation/playbooks/shutdown.yml";
const REMOVE_USER_SCRIPT: &str = "/nfs/scripts/automation/remove_user.bash";
const GET_USERS_SCRIPT: &str = "/nfs/scripts/automation/get_users.bash";

fn command(program: &str, args: &[&str], output: CommandOutput) -> HandlerConfig {
    HandlerConfig::Command {
        program: program.to_string(),
        args: args.iter().map(|s| s.to_string()).collect(),
        output,
        action: None,
        arity: None,
        timeout_secs: None,
    }
}

/// Handler catalog used when the configuration has no `handlers` section.
pub fn default_handler_configs() -> BTreeMap<String, HandlerConfig> {
    let remote = ["-u", "pjamaadmin", "ssh", "bobby"];

    let mut shutdown_args = remote.to_vec();
    shutdown_args.extend([
        "ansible-playbook",
        SHUTDOWN_PLAYBOOK,
        "--extra-vars",
        "target=johnny0{0}",
    ]);

    let mut remove_user_args = remote.to_vec();
    remove_user_args.extend(["sudo", REMOVE_USER_SCRIPT, "{0}"]);

    BTreeMap::from([
        (
            "nodes".to_string(),
            HandlerConfig::NodeList {
                prefix: DEFAULT_NODE_PREFIX.to_string(),
                count: DEFAULT_NODE_COUNT,
            },
        ),
        (
            "user_list".to_string(),
            HandlerConfig::Command {
                program: GET_USERS_SCRIPT.to_string(),
                args: vec![],
                output: CommandOutput::Lines {
                    field: "users".to_string(),
                },
                action: Some("get_users".to_string()),
                arity: None,
                timeout_secs: None,
            },
        ),
        (
            "power_on".to_string(),
            command(
                "python3",
                &[POWER_CONTROL_SCRIPT, "power", "{0}", "noprint"],
                CommandOutput::Status,
            ),
        ),
        (
            "shutdown".to_string(),
            command("sudo", &shutdown_args, CommandOutput::Status),
        ),
        (
            "remove_user".to_string(),
            command("sudo", &remove_user_args, CommandOutput::Status),
        ),
    ])
}

/// Instantiate one handler.
pub fn build_handler(name: &str, config: &HandlerConfig) -> Arc<dyn ActionHandler> {
    match config {
        HandlerConfig::Command {
            program,
            args,
            output,
            action,
            arity,
            timeout_secs,
        } => {
            let mut handler = CommandHandler::new(
                action.clone().unwrap_or_else(|| name.to_string()),
                program.clone(),
                args.clone(),
            )
            .with_output(output.clone());
            if let Some(arity) = arity {
                handler = handler.with_arity(*arity);
            }
            if let Some(secs) = timeout_secs {
                handler = handler.with_timeout(Duration::from_secs(*secs));
            }
            Arc::new(handler)
        }
        HandlerConfig::NodeList { prefix, count } => {
            Arc::new(NodeListHandler::new(prefix.clone(), *count))
        }
    }
}

/// Build the static catalog once at startup.
pub fn build_catalog(configs: &BTreeMap<String, HandlerConfig>) -> HandlerCatalog {
    let mut catalog = HandlerCatalog::new();
    for (name, config) in configs {
        catalog.insert(name.clone(), build_handler(name, config));
    }
    tracing::debug!(handlers = ?catalog.names(), "Handler catalog built");
    catalog
}
