// Kiosk Print Infrastructure - System Adapters
// Implements: PrintSubsystem (helper command driving the OS spooler)

pub mod command_print_subsystem;

pub use command_print_subsystem::{CommandPrintSubsystem, CommandTimeouts};
