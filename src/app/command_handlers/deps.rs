use crate::app::command_support::{map_engine_err, open_workspace, render_fields, CliContext};
use crate::graph::UnlinkOutcome;

pub fn cmd_deps(context: &CliContext, args: &[String]) -> Result<String, String> {
    if args.is_empty() {
        return Err("usage: deps <link|unlink|show|list> ...".to_string());
    }

    match args[0].as_str() {
        "link" => {
            if !(3..=4).contains(&args.len()) {
                return Err(
                    "usage: deps link <blocker_id> <blocked_id> [BLOCKS|RELATES|DUPLICATES]"
                        .to_string(),
                );
            }
            let relation_type = args.get(3).map(String::as_str).unwrap_or("BLOCKS");
            let workspace = open_workspace(context)?;
            let edge = workspace
                .dependencies()
                .link(&args[1], &args[2], relation_type, None)
                .map_err(map_engine_err)?;
            Ok(render_fields(&[
                ("linked", "true".to_string()),
                ("from_task", edge.from_task.to_string()),
                ("to_task", edge.to_task.to_string()),
                ("relation_type", edge.relation_type.to_string()),
            ]))
        }
        "unlink" => {
            if !(3..=4).contains(&args.len()) {
                return Err("usage: deps unlink <task_a> <task_b> [relation_type]".to_string());
            }
            let workspace = open_workspace(context)?;
            let outcome = workspace
                .dependencies()
                .unlink(&args[1], &args[2], args.get(3).map(String::as_str))
                .map_err(map_engine_err)?;
            Ok(match outcome {
                UnlinkOutcome::Removed { edge } => render_fields(&[
                    ("unlinked", "true".to_string()),
                    ("from_task", edge.from_task.to_string()),
                    ("to_task", edge.to_task.to_string()),
                    ("relation_type", edge.relation_type.to_string()),
                ]),
                UnlinkOutcome::NoRelationship { task_a, task_b } => render_fields(&[
                    ("unlinked", "false".to_string()),
                    ("reason", format!("no relationship between {task_a} and {task_b}")),
                ]),
            })
        }
        "show" => {
            if args.len() != 2 {
                return Err("usage: deps show <task_id>".to_string());
            }
            let workspace = open_workspace(context)?;
            let rel = workspace
                .dependencies()
                .relationships(&args[1])
                .map_err(map_engine_err)?;
            Ok(render_fields(&[
                ("task_id", rel.task_id),
                ("blocks", rel.blocks.join(",")),
                ("blocked_by", rel.blocked_by.join(",")),
                ("relates", rel.relates.join(",")),
                ("duplicates", rel.duplicates.join(",")),
            ]))
        }
        "list" => {
            if args.len() != 1 {
                return Err("usage: deps list".to_string());
            }
            let workspace = open_workspace(context)?;
            let graph = workspace.dependencies().graph().map_err(map_engine_err)?;
            Ok(graph
                .edges()
                .iter()
                .map(|edge| format!("{} {} {}", edge.from_task, edge.relation_type, edge.to_task))
                .collect::<Vec<_>>()
                .join("\n"))
        }
        other => Err(format!("unknown deps subcommand `{other}`")),
    }
}
