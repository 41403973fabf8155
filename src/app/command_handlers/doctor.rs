use crate::app::command_support::{load_settings, CliContext};
use crate::definitions::WarningSeverity;
use crate::workspace::Workspace;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
struct DoctorFinding {
    id: String,
    ok: bool,
    detail: String,
    remediation: String,
}

fn doctor_finding(
    id: impl Into<String>,
    ok: bool,
    detail: impl Into<String>,
    remediation: impl Into<String>,
) -> DoctorFinding {
    DoctorFinding {
        id: id.into(),
        ok,
        detail: detail.into(),
        remediation: remediation.into(),
    }
}

fn can_write_directory(path: &Path) -> Result<(), String> {
    fs::create_dir_all(path).map_err(|e| format!("failed to create {}: {e}", path.display()))?;
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let probe = path.join(format!(".workstate-doctor-{nanos}"));
    fs::write(&probe, b"ok").map_err(|e| format!("failed to write {}: {e}", probe.display()))?;
    fs::remove_file(&probe).map_err(|e| format!("failed to remove {}: {e}", probe.display()))
}

pub fn cmd_doctor(context: &CliContext) -> Result<String, String> {
    let mut findings = Vec::new();
    let config_path = context.config_path()?;
    findings.push(doctor_finding(
        "config.path",
        config_path.exists(),
        format!("config={}", config_path.display()),
        "run `workstate init` to create default config",
    ));

    let settings = match load_settings(context) {
        Ok(settings) => {
            findings.push(doctor_finding(
                "config.parse",
                true,
                "settings parsed and validated",
                "none",
            ));
            Some(settings)
        }
        Err(err) => {
            findings.push(doctor_finding(
                "config.parse",
                false,
                format!("settings load failed: {err}"),
                "fix the config file and retry `workstate doctor`",
            ));
            None
        }
    };

    if let Some(settings) = settings {
        let state_root = settings.resolve_state_root();
        findings.push(match can_write_directory(&state_root) {
            Ok(()) => doctor_finding(
                "state.root",
                true,
                format!("writable={}", state_root.display()),
                "none",
            ),
            Err(err) => doctor_finding(
                "state.root",
                false,
                err,
                "grant write permission to state_root or point it elsewhere",
            ),
        });

        match Workspace::open(settings) {
            Ok(workspace) => {
                let fatal = workspace
                    .warnings()
                    .iter()
                    .find(|warning| warning.severity == WarningSeverity::Fatal);
                findings.push(match fatal {
                    None => doctor_finding(
                        "definitions.workflows",
                        true,
                        format!(
                            "workflows={}",
                            workspace
                                .engine()
                                .list_workflows()
                                .map(|workflows| workflows.len())
                                .unwrap_or(0)
                        ),
                        "none",
                    ),
                    Some(warning) => doctor_finding(
                        "definitions.workflows",
                        false,
                        warning.to_string(),
                        "fix workflows_path or run `workstate init`",
                    ),
                });
                for (index, warning) in workspace
                    .warnings()
                    .iter()
                    .filter(|warning| warning.severity == WarningSeverity::Degraded)
                    .enumerate()
                {
                    findings.push(doctor_finding(
                        format!("definitions.subagents.{index}"),
                        false,
                        warning.to_string(),
                        "fix subagents_path; phases run without subagent profiles meanwhile",
                    ));
                }
                findings.push(match workspace.engine().list_tasks() {
                    Ok(ids) => doctor_finding(
                        "store.states",
                        true,
                        format!("tasks={}", ids.len()),
                        "none",
                    ),
                    Err(err) => doctor_finding(
                        "store.states",
                        false,
                        err.to_string(),
                        "inspect the state store for unreadable records",
                    ),
                });
                findings.push(match workspace.dependencies().graph() {
                    Ok(graph) => doctor_finding(
                        "store.dependencies",
                        true,
                        format!("edges={}", graph.len()),
                        "none",
                    ),
                    Err(err) => doctor_finding(
                        "store.dependencies",
                        false,
                        err.to_string(),
                        "inspect the dependency graph record",
                    ),
                });
            }
            Err(err) => findings.push(doctor_finding(
                "store.open",
                false,
                err.to_string(),
                "check the `store` setting and state_root permissions",
            )),
        }
    }

    let failed = findings.iter().filter(|f| !f.ok).count();
    let summary = if failed == 0 { "healthy" } else { "unhealthy" };
    let mut lines = vec![
        format!("summary={summary}"),
        format!("checks_total={}", findings.len()),
        format!("checks_failed={failed}"),
    ];
    for finding in findings {
        lines.push(format!(
            "check:{}={}",
            finding.id,
            if finding.ok { "ok" } else { "fail" }
        ));
        lines.push(format!("check:{}.detail={}", finding.id, finding.detail));
        if !finding.ok {
            lines.push(format!(
                "check:{}.remediation={}",
                finding.id, finding.remediation
            ));
        }
    }
    Ok(lines.join("\n"))
}
