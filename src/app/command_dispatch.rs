use crate::app::command_catalog::{function_def, function_ids, FunctionDef};
use crate::shared::errors::{EngineError, ErrorKind};
use crate::shared::metadata::Metadata;
use crate::workspace::Workspace;
use serde::Serialize;
use serde_json::{json, Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("unknown function id `{0}`")]
    UnknownFunction(String),
    #[error("missing required function argument `{0}`")]
    MissingArg(String),
    #[error("unknown argument `{arg}` for `{function_id}`")]
    UnknownArg { function_id: String, arg: String },
    #[error("argument `{arg}` must be {expected}")]
    InvalidArgType { arg: String, expected: &'static str },
    #[error("failed to encode result: {0}")]
    Encode(#[source] serde_json::Error),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl DispatchError {
    /// Argument problems are validation failures of the call itself.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownFunction(_) => ErrorKind::NotFound,
            Self::MissingArg(_) | Self::UnknownArg { .. } | Self::InvalidArgType { .. } => {
                ErrorKind::Validation
            }
            Self::Encode(_) => ErrorKind::Storage,
            Self::Engine(err) => err.kind(),
        }
    }
}

/// Validates `args` against the catalog entry and runs the function.
pub fn execute_function(
    workspace: &Workspace,
    function_id: &str,
    args: &Map<String, Value>,
) -> Result<Value, DispatchError> {
    let def = function_def(function_id)
        .ok_or_else(|| DispatchError::UnknownFunction(function_id.to_string()))?;
    validate_args(def, args)?;
    tracing::debug!(function_id, "executing function");

    let engine = workspace.engine();
    let deps = workspace.dependencies();
    match function_id {
        function_ids::WORKFLOW_ASSIGN => {
            let outcome = engine.assign_workflow(
                required_string_arg(args, "taskId")?,
                required_string_arg(args, "workflowId")?,
            )?;
            to_value(&outcome)
        }
        function_ids::WORKFLOW_REASSIGN => {
            let state = engine.reassign_workflow(
                required_string_arg(args, "taskId")?,
                required_string_arg(args, "workflowId")?,
            )?;
            to_value(&state)
        }
        function_ids::WORKFLOW_NEXT_PHASE => {
            to_value(&engine.get_next_phase(required_string_arg(args, "taskId")?)?)
        }
        function_ids::WORKFLOW_PROGRESS => {
            to_value(&engine.get_progress(required_string_arg(args, "taskId")?)?)
        }
        function_ids::WORKFLOW_LIST => {
            let workflows = engine.list_workflows()?.values().collect::<Vec<_>>();
            to_value(&workflows)
        }
        function_ids::WORKFLOW_SHOW => {
            to_value(engine.get_workflow(required_string_arg(args, "workflowId")?)?)
        }
        function_ids::CONTEXT_SAVE => {
            let outcome = engine.save_context_with_metadata(
                required_string_arg(args, "taskId")?,
                required_string_arg(args, "phase")?,
                required_string_arg(args, "content")?,
                optional_string_arg(args, "status")?,
                metadata_arg(args)?,
            )?;
            to_value(&outcome)
        }
        function_ids::CONTEXT_LOAD => {
            let entries = engine.load_context(
                required_string_arg(args, "taskId")?,
                optional_string_arg(args, "phase")?,
            )?;
            to_value(&entries)
        }
        function_ids::TASK_STATE => {
            to_value(&engine.get_state(required_string_arg(args, "taskId")?)?)
        }
        function_ids::TASK_LIST => to_value(&engine.list_tasks()?),
        function_ids::SUBAGENT_LIST => {
            let subagents = match args.get("ids").and_then(Value::as_array) {
                Some(ids) => engine.get_subagents(ids.iter().filter_map(Value::as_str)),
                None => engine.definitions().list_subagents().collect(),
            };
            to_value(&subagents)
        }
        function_ids::DEPS_LINK => {
            let edge = deps.link(
                required_string_arg(args, "blocker")?,
                required_string_arg(args, "blocked")?,
                optional_string_arg(args, "relationType")?.unwrap_or("BLOCKS"),
                Some(metadata_arg(args)?),
            )?;
            to_value(&edge)
        }
        function_ids::DEPS_UNLINK => {
            let outcome = deps.unlink(
                required_string_arg(args, "taskA")?,
                required_string_arg(args, "taskB")?,
                optional_string_arg(args, "relationType")?,
            )?;
            to_value(&outcome)
        }
        function_ids::DEPS_SHOW => {
            to_value(&deps.relationships(required_string_arg(args, "taskId")?)?)
        }
        _ => Err(DispatchError::UnknownFunction(function_id.to_string())),
    }
}

/// Error payload for callers that want a JSON result either way.
pub fn error_value(err: &DispatchError) -> Value {
    json!({
        "error": {
            "kind": err.kind(),
            "recoverable": err.kind().is_recoverable(),
            "message": err.to_string(),
        }
    })
}

fn validate_args(def: &FunctionDef, args: &Map<String, Value>) -> Result<(), DispatchError> {
    for key in args.keys() {
        if !def.args.iter().any(|arg| arg.name == key.as_str()) {
            return Err(DispatchError::UnknownArg {
                function_id: def.function_id.to_string(),
                arg: key.clone(),
            });
        }
    }
    for arg in def.args {
        match args.get(arg.name) {
            Some(Value::Null) | None if arg.required => {
                return Err(DispatchError::MissingArg(arg.name.to_string()))
            }
            Some(Value::Null) | None => {}
            Some(value) if !arg.arg_type.matches(value) => {
                return Err(DispatchError::InvalidArgType {
                    arg: arg.name.to_string(),
                    expected: arg.arg_type.as_str(),
                })
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, DispatchError> {
    serde_json::to_value(value).map_err(DispatchError::Encode)
}

fn required_string_arg<'a>(args: &'a Map<String, Value>, arg: &str) -> Result<&'a str, DispatchError> {
    match args.get(arg) {
        Some(Value::String(v)) if !v.trim().is_empty() => Ok(v.as_str()),
        Some(Value::String(_)) | None => Err(DispatchError::MissingArg(arg.to_string())),
        Some(_) => Err(DispatchError::InvalidArgType {
            arg: arg.to_string(),
            expected: "string",
        }),
    }
}

fn optional_string_arg<'a>(
    args: &'a Map<String, Value>,
    arg: &str,
) -> Result<Option<&'a str>, DispatchError> {
    match args.get(arg) {
        Some(Value::String(v)) if !v.trim().is_empty() => Ok(Some(v.as_str())),
        Some(Value::String(_)) | Some(Value::Null) | None => Ok(None),
        Some(_) => Err(DispatchError::InvalidArgType {
            arg: arg.to_string(),
            expected: "string",
        }),
    }
}

fn metadata_arg(args: &Map<String, Value>) -> Result<Metadata, DispatchError> {
    match args.get("metadata") {
        Some(Value::String(raw)) => Ok(Metadata::parse(raw)?),
        Some(Value::Null) | None => Ok(Metadata::default()),
        Some(value) => Ok(Metadata::from_value(value.clone())?),
    }
}
