use crate::app::command_catalog::FUNCTIONS;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerb {
    Init,
    Workflow,
    Subagent,
    Task,
    Deps,
    Doctor,
    Call,
    Help,
    Unknown,
}

pub fn parse_cli_verb(input: &str) -> CliVerb {
    match input {
        "init" => CliVerb::Init,
        "workflow" => CliVerb::Workflow,
        "subagent" => CliVerb::Subagent,
        "task" => CliVerb::Task,
        "deps" => CliVerb::Deps,
        "doctor" => CliVerb::Doctor,
        "call" => CliVerb::Call,
        "help" | "--help" | "-h" => CliVerb::Help,
        _ => CliVerb::Unknown,
    }
}

/// Flags accepted before or after the verb.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalOptions {
    pub config_path: Option<PathBuf>,
    pub verbose: bool,
}

/// Splits `--config <path>`, `--config=<path>` and `-v`/`--verbose` out of
/// the argument list.
pub fn split_global_options(args: Vec<String>) -> Result<(GlobalOptions, Vec<String>), String> {
    let mut options = GlobalOptions::default();
    let mut rest = Vec::with_capacity(args.len());
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter
                    .next()
                    .ok_or_else(|| "usage: --config <path>".to_string())?;
                options.config_path = Some(PathBuf::from(path));
            }
            "-v" | "--verbose" => options.verbose = true,
            other => match other.strip_prefix("--config=") {
                Some(path) if !path.is_empty() => {
                    options.config_path = Some(PathBuf::from(path));
                }
                Some(_) => return Err("usage: --config <path>".to_string()),
                None => rest.push(arg),
            },
        }
    }
    Ok((options, rest))
}

pub fn cli_help_lines() -> Vec<String> {
    vec![
        "Usage: workstate [--config <path>] [-v] <command> ...".to_string(),
        String::new(),
        "Commands:".to_string(),
        "  init                                 Write default config, workflows and subagents"
            .to_string(),
        "  workflow list|show <id>              Inspect workflow definitions".to_string(),
        "  subagent list|show <id>              Inspect subagent profiles".to_string(),
        "  task assign <task> <workflow>        Assign a workflow to a task".to_string(),
        "  task reassign <task> <workflow>      Switch a task to another workflow".to_string(),
        "  task next <task>                     Show the next actionable phase".to_string(),
        "  task save <task> <phase> <content>   Record context (--status, --metadata)"
            .to_string(),
        "  task context <task> [phase]          Print recorded context".to_string(),
        "  task progress <task>                 Show per-phase progress".to_string(),
        "  task show <task>                     Print the stored state record".to_string(),
        "  task list                            List tasks with recorded state".to_string(),
        "  deps link <blocker> <blocked> [type] Add a relationship (default BLOCKS)".to_string(),
        "  deps unlink <a> <b> [type]           Remove a relationship".to_string(),
        "  deps show <task>                     Show a task's relationships".to_string(),
        "  deps list                            List every relationship".to_string(),
        "  doctor                               Check configuration and stores".to_string(),
        "  call <function_id> [json_args]       Invoke a catalog function".to_string(),
    ]
}

pub fn function_help_lines() -> Vec<String> {
    let mut defs: Vec<_> = FUNCTIONS.iter().collect();
    defs.sort_by(|a, b| a.function_id.cmp(b.function_id));
    defs.into_iter()
        .map(|def| format!("  {0:36} {1}", def.function_id, def.description))
        .collect()
}

pub(crate) fn help_text() -> String {
    let mut lines = cli_help_lines();
    lines.push(String::new());
    lines.push("Callable functions:".to_string());
    lines.extend(function_help_lines());
    lines.join("\n")
}
