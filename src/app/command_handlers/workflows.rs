use crate::app::command_support::{map_engine_err, open_workspace, render_yaml, CliContext};

pub fn cmd_workflow(context: &CliContext, args: &[String]) -> Result<String, String> {
    if args.is_empty() {
        return Err("usage: workflow <list|show> ...".to_string());
    }

    match args[0].as_str() {
        "list" => {
            if args.len() != 1 {
                return Err("usage: workflow list".to_string());
            }
            let workspace = open_workspace(context)?;
            let workflows = workspace
                .engine()
                .list_workflows()
                .map_err(map_engine_err)?;
            Ok(workflows
                .values()
                .map(|workflow| {
                    format!(
                        "{}\t{}\tphases={}",
                        workflow.id,
                        workflow.name,
                        workflow.phase_names().collect::<Vec<_>>().join(",")
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"))
        }
        "show" => {
            if args.len() != 2 {
                return Err("usage: workflow show <workflow_id>".to_string());
            }
            let workspace = open_workspace(context)?;
            let workflow = workspace
                .engine()
                .get_workflow(&args[1])
                .map_err(map_engine_err)?;
            render_yaml(workflow, "workflow")
        }
        other => Err(format!("unknown workflow subcommand `{other}`")),
    }
}

pub fn cmd_subagent(context: &CliContext, args: &[String]) -> Result<String, String> {
    if args.is_empty() {
        return Err("usage: subagent <list|show> ...".to_string());
    }

    match args[0].as_str() {
        "list" => {
            if args.len() != 1 {
                return Err("usage: subagent list".to_string());
            }
            let workspace = open_workspace(context)?;
            Ok(workspace
                .engine()
                .definitions()
                .list_subagents()
                .map(|subagent| format!("{}\t{}", subagent.id, subagent.description))
                .collect::<Vec<_>>()
                .join("\n"))
        }
        "show" => {
            if args.len() != 2 {
                return Err("usage: subagent show <subagent_id>".to_string());
            }
            let workspace = open_workspace(context)?;
            let subagent = workspace
                .engine()
                .get_subagents([args[1].as_str()])
                .into_iter()
                .next()
                .ok_or_else(|| format!("unknown subagent `{}`", args[1]))?;
            render_yaml(subagent, "subagent")
        }
        other => Err(format!("unknown subagent subcommand `{other}`")),
    }
}
