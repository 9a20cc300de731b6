//! Built-in command table

use super::handlers;
use super::{Access, CommandDescriptor};

/// Verbs understood by the console, in lookup order
pub static COMMANDS: [CommandDescriptor; 7] = [
    CommandDescriptor {
        name: "GET",
        access: Access::Read,
        on_none: Some(handlers::print_all_definitions),
        on_param: Some(handlers::print_definition),
        on_value: None,
        help: "Get Parameter/Variable",
    },
    CommandDescriptor {
        name: "HELP",
        access: Access::Read,
        on_none: Some(handlers::print_all_help),
        on_param: Some(handlers::print_param_help),
        on_value: None,
        help: "Command/Parameter/Variable Help",
    },
    CommandDescriptor {
        name: "WATCH",
        access: Access::Read,
        on_none: None,
        on_param: Some(handlers::toggle_watch),
        on_value: None,
        help: "Toggle Parameter/Variable Watch",
    },
    CommandDescriptor {
        name: "SET",
        access: Access::Write,
        on_none: None,
        on_param: None,
        on_value: Some(handlers::set_value),
        help: "Set Parameter",
    },
    CommandDescriptor {
        name: "INIT",
        access: Access::Write,
        on_none: None,
        on_param: Some(handlers::init_value),
        on_value: None,
        help: "Init Parameter from EEPROM or defaults",
    },
    CommandDescriptor {
        name: "SAVE",
        access: Access::Write,
        on_none: Some(handlers::save_all),
        on_param: None,
        on_value: None,
        help: "Save Parameters to EEPROM",
    },
    CommandDescriptor {
        name: "INCR",
        access: Access::Write,
        on_none: None,
        on_param: Some(handlers::increment_value),
        on_value: None,
        help: "Increment Parameter, wrapping to min",
    },
];
