use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionArgType {
    String,
    StringList,
    Object,
    /// A JSON object, or the same object encoded as a string.
    ObjectOrString,
}

impl FunctionArgType {
    pub(crate) fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            Self::Object => value.is_object(),
            Self::ObjectOrString => value.is_object() || value.is_string(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::StringList => "array of strings",
            Self::Object => "object",
            Self::ObjectOrString => "object or string",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionArgDef {
    pub name: &'static str,
    pub arg_type: FunctionArgType,
    pub required: bool,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionDef {
    pub function_id: &'static str,
    pub description: &'static str,
    pub args: &'static [FunctionArgDef],
    pub read_only: bool,
}

pub mod function_ids {
    pub const WORKFLOW_ASSIGN: &str = "workflow.assign";
    pub const WORKFLOW_REASSIGN: &str = "workflow.reassign";
    pub const WORKFLOW_NEXT_PHASE: &str = "workflow.next_phase";
    pub const WORKFLOW_PROGRESS: &str = "workflow.progress";
    pub const WORKFLOW_LIST: &str = "workflow.list";
    pub const WORKFLOW_SHOW: &str = "workflow.show";
    pub const CONTEXT_SAVE: &str = "context.save";
    pub const CONTEXT_LOAD: &str = "context.load";
    pub const TASK_STATE: &str = "task.state";
    pub const TASK_LIST: &str = "task.list";
    pub const SUBAGENT_LIST: &str = "subagent.list";
    pub const DEPS_LINK: &str = "deps.link";
    pub const DEPS_UNLINK: &str = "deps.unlink";
    pub const DEPS_SHOW: &str = "deps.show";
}

const TASK_ID_ARG: FunctionArgDef = FunctionArgDef {
    name: "taskId",
    arg_type: FunctionArgType::String,
    required: true,
    description: "External task id, e.g. ENG-42",
};

const WORKFLOW_ID_ARG: FunctionArgDef = FunctionArgDef {
    name: "workflowId",
    arg_type: FunctionArgType::String,
    required: true,
    description: "Workflow definition id",
};

const TASK_ONLY_ARGS: &[FunctionArgDef] = &[TASK_ID_ARG];

const ASSIGN_ARGS: &[FunctionArgDef] = &[TASK_ID_ARG, WORKFLOW_ID_ARG];

const WORKFLOW_SHOW_ARGS: &[FunctionArgDef] = &[WORKFLOW_ID_ARG];

const CONTEXT_SAVE_ARGS: &[FunctionArgDef] = &[
    TASK_ID_ARG,
    FunctionArgDef {
        name: "phase",
        arg_type: FunctionArgType::String,
        required: true,
        description: "Phase name within the task's workflow",
    },
    FunctionArgDef {
        name: "content",
        arg_type: FunctionArgType::String,
        required: true,
        description: "Context note to append",
    },
    FunctionArgDef {
        name: "status",
        arg_type: FunctionArgType::String,
        required: false,
        description: "IN_PROGRESS (default), REVIEW or COMPLETED",
    },
    FunctionArgDef {
        name: "metadata",
        arg_type: FunctionArgType::ObjectOrString,
        required: false,
        description: "Metadata object; reserved keys: author, source, tags, artifacts",
    },
];

const CONTEXT_LOAD_ARGS: &[FunctionArgDef] = &[
    TASK_ID_ARG,
    FunctionArgDef {
        name: "phase",
        arg_type: FunctionArgType::String,
        required: false,
        description: "Limit entries to one phase",
    },
];

const SUBAGENT_LIST_ARGS: &[FunctionArgDef] = &[FunctionArgDef {
    name: "ids",
    arg_type: FunctionArgType::StringList,
    required: false,
    description: "Subagent ids to resolve; all profiles when omitted",
}];

const DEPS_LINK_ARGS: &[FunctionArgDef] = &[
    FunctionArgDef {
        name: "blocker",
        arg_type: FunctionArgType::String,
        required: true,
        description: "Source task (the blocker for BLOCKS)",
    },
    FunctionArgDef {
        name: "blocked",
        arg_type: FunctionArgType::String,
        required: true,
        description: "Target task (the blocked task for BLOCKS)",
    },
    FunctionArgDef {
        name: "relationType",
        arg_type: FunctionArgType::String,
        required: false,
        description: "BLOCKS (default), RELATES or DUPLICATES",
    },
    FunctionArgDef {
        name: "metadata",
        arg_type: FunctionArgType::ObjectOrString,
        required: false,
        description: "Metadata object for the edge",
    },
];

const DEPS_UNLINK_ARGS: &[FunctionArgDef] = &[
    FunctionArgDef {
        name: "taskA",
        arg_type: FunctionArgType::String,
        required: true,
        description: "One end of the relationship",
    },
    FunctionArgDef {
        name: "taskB",
        arg_type: FunctionArgType::String,
        required: true,
        description: "Other end of the relationship",
    },
    FunctionArgDef {
        name: "relationType",
        arg_type: FunctionArgType::String,
        required: false,
        description: "Only remove a relationship of this type",
    },
];

pub const FUNCTIONS: &[FunctionDef] = &[
    FunctionDef {
        function_id: function_ids::WORKFLOW_ASSIGN,
        description: "Assign a workflow to a task",
        args: ASSIGN_ARGS,
        read_only: false,
    },
    FunctionDef {
        function_id: function_ids::WORKFLOW_REASSIGN,
        description: "Switch a task to another workflow, resetting phase progress",
        args: ASSIGN_ARGS,
        read_only: false,
    },
    FunctionDef {
        function_id: function_ids::WORKFLOW_NEXT_PHASE,
        description: "Next actionable phase for a task",
        args: TASK_ONLY_ARGS,
        read_only: true,
    },
    FunctionDef {
        function_id: function_ids::WORKFLOW_PROGRESS,
        description: "Completion ratio and per-phase state",
        args: TASK_ONLY_ARGS,
        read_only: true,
    },
    FunctionDef {
        function_id: function_ids::WORKFLOW_LIST,
        description: "List workflow definitions",
        args: &[],
        read_only: true,
    },
    FunctionDef {
        function_id: function_ids::WORKFLOW_SHOW,
        description: "Show one workflow definition",
        args: WORKFLOW_SHOW_ARGS,
        read_only: true,
    },
    FunctionDef {
        function_id: function_ids::CONTEXT_SAVE,
        description: "Append a context entry and apply the phase transition",
        args: CONTEXT_SAVE_ARGS,
        read_only: false,
    },
    FunctionDef {
        function_id: function_ids::CONTEXT_LOAD,
        description: "Load context entries in recorded order",
        args: CONTEXT_LOAD_ARGS,
        read_only: true,
    },
    FunctionDef {
        function_id: function_ids::TASK_STATE,
        description: "Stored workflow state for a task",
        args: TASK_ONLY_ARGS,
        read_only: true,
    },
    FunctionDef {
        function_id: function_ids::TASK_LIST,
        description: "Tasks with recorded state",
        args: &[],
        read_only: true,
    },
    FunctionDef {
        function_id: function_ids::SUBAGENT_LIST,
        description: "Resolve subagent profiles",
        args: SUBAGENT_LIST_ARGS,
        read_only: true,
    },
    FunctionDef {
        function_id: function_ids::DEPS_LINK,
        description: "Add a relationship between two tasks",
        args: DEPS_LINK_ARGS,
        read_only: false,
    },
    FunctionDef {
        function_id: function_ids::DEPS_UNLINK,
        description: "Remove a relationship between two tasks",
        args: DEPS_UNLINK_ARGS,
        read_only: false,
    },
    FunctionDef {
        function_id: function_ids::DEPS_SHOW,
        description: "Relationships of one task",
        args: TASK_ONLY_ARGS,
        read_only: true,
    },
];

pub fn function_def(function_id: &str) -> Option<&'static FunctionDef> {
    FUNCTIONS.iter().find(|def| def.function_id == function_id)
}
