use crate::app::command_dispatch::execute_function;
use crate::app::command_support::{open_workspace, render_json, CliContext};
use serde_json::{Map, Value};

/// `call <function_id> [json_args]`: runs a catalog function and prints the
/// JSON result.
pub fn cmd_call(context: &CliContext, args: &[String]) -> Result<String, String> {
    if args.is_empty() || args.len() > 2 {
        return Err("usage: call <function_id> [json_args]".to_string());
    }
    let call_args = match args.get(1) {
        Some(raw) => parse_call_args(raw)?,
        None => Map::new(),
    };
    let workspace = open_workspace(context)?;
    let result = execute_function(&workspace, &args[0], &call_args)
        .map_err(|err| format!("{}: {err}", err.kind()))?;
    render_json(&result, "function result")
}

fn parse_call_args(raw: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("function arguments must be a JSON object".to_string()),
        Err(err) => Err(format!("invalid function arguments: {err}")),
    }
}
