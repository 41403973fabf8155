use crate::app::command_support::{
    map_engine_err, open_workspace, render_fields, render_json, CliContext,
};
use crate::engine::NextPhase;

pub fn cmd_task(context: &CliContext, args: &[String]) -> Result<String, String> {
    if args.is_empty() {
        return Err(
            "usage: task <assign|reassign|next|save|context|progress|show|list> ...".to_string(),
        );
    }

    match args[0].as_str() {
        "assign" => {
            if args.len() != 3 {
                return Err("usage: task assign <task_id> <workflow_id>".to_string());
            }
            let workspace = open_workspace(context)?;
            let outcome = workspace
                .engine()
                .assign_workflow(&args[1], &args[2])
                .map_err(map_engine_err)?;
            Ok(render_fields(&[
                ("task_id", outcome.state.task_id.to_string()),
                ("workflow_id", args[2].clone()),
                ("newly_assigned", outcome.newly_assigned.to_string()),
            ]))
        }
        "reassign" => {
            if args.len() != 3 {
                return Err("usage: task reassign <task_id> <workflow_id>".to_string());
            }
            let workspace = open_workspace(context)?;
            let state = workspace
                .engine()
                .reassign_workflow(&args[1], &args[2])
                .map_err(map_engine_err)?;
            Ok(render_fields(&[
                ("task_id", state.task_id.to_string()),
                ("workflow_id", args[2].clone()),
                ("progress_reset", "true".to_string()),
            ]))
        }
        "next" => {
            if args.len() != 2 {
                return Err("usage: task next <task_id>".to_string());
            }
            let workspace = open_workspace(context)?;
            let next = workspace
                .engine()
                .get_next_phase(&args[1])
                .map_err(map_engine_err)?;
            Ok(render_next_phase(&next))
        }
        "save" => cmd_task_save(context, &args[1..]),
        "context" => {
            if !(2..=3).contains(&args.len()) {
                return Err("usage: task context <task_id> [phase]".to_string());
            }
            let workspace = open_workspace(context)?;
            let entries = workspace
                .engine()
                .load_context(&args[1], args.get(2).map(String::as_str))
                .map_err(map_engine_err)?;
            Ok(entries
                .iter()
                .map(|item| {
                    format!(
                        "[{}] {} {} {}: {}",
                        item.entry.sequence,
                        item.entry.timestamp.to_rfc3339(),
                        item.phase,
                        item.entry.status.as_deref().unwrap_or("-"),
                        item.entry.content
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"))
        }
        "progress" => {
            if args.len() != 2 {
                return Err("usage: task progress <task_id>".to_string());
            }
            let workspace = open_workspace(context)?;
            let report = workspace
                .engine()
                .get_progress(&args[1])
                .map_err(map_engine_err)?;
            let mut lines = vec![
                format!("task_id={}", report.task_id),
                format!("workflow_id={}", report.workflow_id),
                format!("completed={}/{}", report.completed, report.total),
                format!("ratio={:.2}", report.ratio),
                format!("workflow_complete={}", report.workflow_complete),
            ];
            for phase in &report.phases {
                lines.push(format!("phase:{}={}", phase.name, phase.state));
                lines.push(format!("phase:{}.entries={}", phase.name, phase.entries));
            }
            Ok(lines.join("\n"))
        }
        "show" => {
            if args.len() != 2 {
                return Err("usage: task show <task_id>".to_string());
            }
            let workspace = open_workspace(context)?;
            let state = workspace
                .engine()
                .get_state(&args[1])
                .map_err(map_engine_err)?;
            render_json(&state, "workflow state")
        }
        "list" => {
            if args.len() != 1 {
                return Err("usage: task list".to_string());
            }
            let workspace = open_workspace(context)?;
            let ids = workspace.engine().list_tasks().map_err(map_engine_err)?;
            Ok(ids
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n"))
        }
        other => Err(format!("unknown task subcommand `{other}`")),
    }
}

const SAVE_USAGE: &str =
    "usage: task save <task_id> <phase> <content> [--status <status>] [--metadata <json>]";

fn cmd_task_save(context: &CliContext, args: &[String]) -> Result<String, String> {
    let mut positional = Vec::new();
    let mut status = None;
    let mut metadata = None;
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--status" => {
                status = Some(args.get(index + 1).ok_or(SAVE_USAGE)?.as_str());
                index += 2;
            }
            "--metadata" => {
                metadata = Some(args.get(index + 1).ok_or(SAVE_USAGE)?.as_str());
                index += 2;
            }
            value => {
                positional.push(value);
                index += 1;
            }
        }
    }
    let [task_id, phase, content] = positional.as_slice() else {
        return Err(SAVE_USAGE.to_string());
    };

    let workspace = open_workspace(context)?;
    let outcome = workspace
        .engine()
        .save_context(task_id, phase, content, status, metadata)
        .map_err(map_engine_err)?;
    let mut fields = vec![
        ("task_id", outcome.state.task_id.to_string()),
        ("phase", outcome.phase.clone()),
        ("state", outcome.phase_state().to_string()),
        (
            "transition",
            outcome
                .transition
                .map(|t| format!("{}->{}", t.from, t.to))
                .unwrap_or_else(|| "none".to_string()),
        ),
        ("entries", outcome.state.entry_count(&outcome.phase).to_string()),
    ];
    if let Some(workflow_id) = &outcome.inferred_workflow {
        fields.push(("inferred_workflow", workflow_id.to_string()));
    }
    if let Some(note) = &outcome.note {
        fields.push(("note", note.clone()));
    }
    Ok(render_fields(&fields))
}

fn render_next_phase(next: &NextPhase) -> String {
    match next {
        NextPhase::AssignmentRequired { task_id } => render_fields(&[
            ("status", "assignment_required".to_string()),
            ("task_id", task_id.clone()),
        ]),
        NextPhase::WorkflowComplete { workflow_id } => render_fields(&[
            ("status", "workflow_complete".to_string()),
            ("workflow_id", workflow_id.clone()),
        ]),
        NextPhase::Pending(pending) => {
            let mut fields = vec![
                ("status", "pending".to_string()),
                ("workflow_id", pending.workflow_id.clone()),
                ("phase", pending.phase.name.clone()),
                ("position", format!("{}/{}", pending.index + 1, pending.total)),
                ("state", pending.state.to_string()),
                ("requires_review", pending.phase.requires_review.to_string()),
            ];
            if !pending.phase.goal.is_empty() {
                fields.push(("goal", pending.phase.goal.clone()));
            }
            if let Some(subagent) = &pending.subagent {
                fields.push(("subagent", subagent.claude_subagent.clone()));
            }
            render_fields(&fields)
        }
    }
}
