use crate::app::cli::{help_text, parse_cli_verb, split_global_options, CliVerb};
use crate::app::command_support::CliContext;

pub mod deps;
pub mod doctor;
pub mod functions;
pub mod init;
pub mod tasks;
pub mod workflows;

pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    let (options, args) = split_global_options(args)?;
    let context = CliContext::from_options(&options);
    if args.is_empty() {
        return Ok(help_text());
    }

    match parse_cli_verb(args[0].as_str()) {
        CliVerb::Init => init::cmd_init(&context),
        CliVerb::Workflow => workflows::cmd_workflow(&context, &args[1..]),
        CliVerb::Subagent => workflows::cmd_subagent(&context, &args[1..]),
        CliVerb::Task => tasks::cmd_task(&context, &args[1..]),
        CliVerb::Deps => deps::cmd_deps(&context, &args[1..]),
        CliVerb::Doctor => doctor::cmd_doctor(&context),
        CliVerb::Call => functions::cmd_call(&context, &args[1..]),
        CliVerb::Help => Ok(help_text()),
        CliVerb::Unknown => Err(format!("unknown command `{}`", args[0])),
    }
}
