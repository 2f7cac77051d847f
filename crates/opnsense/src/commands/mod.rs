//! Command dispatch: bridges CLI args -> controller calls -> output formatting.

pub mod aliases;
pub mod config_cmd;
pub mod resource;
pub mod templates;
pub mod util;

use opnsense_core::{
    Category, Controller, FilterRule, InterfaceGroup, NptRule, OneToOneRule, SourceNatRule,
};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;
use crate::output::col;

use self::resource::View;

const RULES: View = View {
    list_command: "rules list",
    columns: &[
        col("Seq", "sequence"),
        col("On", "enabled"),
        col("Action", "action"),
        col("Interface", "interface"),
        col("Dir", "direction"),
        col("Proto", "protocol"),
        col("Source", "source_net"),
        col("Destination", "destination_net"),
        col("Description", "description"),
    ],
};

const SNAT: View = View {
    list_command: "snat list",
    columns: &[
        col("Seq", "sequence"),
        col("On", "enabled"),
        col("Interface", "interface"),
        col("Source", "source_net"),
        col("Destination", "destination_net"),
        col("Target", "target"),
        col("Description", "description"),
    ],
};

const ONE_TO_ONE: View = View {
    list_command: "one-to-one list",
    columns: &[
        col("On", "enabled"),
        col("Interface", "interface"),
        col("Type", "type"),
        col("External", "external"),
        col("Source", "source_net"),
        col("Description", "description"),
    ],
};

const NPT: View = View {
    list_command: "npt list",
    columns: &[
        col("On", "enabled"),
        col("Interface", "interface"),
        col("Internal", "source_net"),
        col("External", "destination_net"),
        col("Description", "description"),
    ],
};

const CATEGORIES: View = View {
    list_command: "categories list",
    columns: &[col("Name", "name"), col("Auto", "auto"), col("Color", "color")],
};

const GROUPS: View = View {
    list_command: "groups list",
    columns: &[
        col("Name", "ifname"),
        col("Members", "members"),
        col("Description", "descr"),
    ],
};

/// Dispatch a firewall-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Aliases(args) => aliases::handle(controller, args, global).await,
        Command::Rules(args) => {
            resource::handle::<FilterRule>(controller, args, global, &RULES).await
        }
        Command::Snat(args) => {
            resource::handle::<SourceNatRule>(controller, args, global, &SNAT).await
        }
        Command::OneToOne(args) => {
            resource::handle::<OneToOneRule>(controller, args, global, &ONE_TO_ONE).await
        }
        Command::Npt(args) => resource::handle::<NptRule>(controller, args, global, &NPT).await,
        Command::Categories(args) => {
            resource::handle::<Category>(controller, args, global, &CATEGORIES).await
        }
        Command::Groups(args) => {
            resource::handle::<InterfaceGroup>(controller, args, global, &GROUPS).await
        }
        Command::Templates(args) => templates::handle(controller, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
