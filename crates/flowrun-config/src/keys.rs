//! Reserved input and output keys understood by the engine and its built-in
//! node types.

/// Input of `variable_update` nodes holding the list of [`crate::UpdateItem`]s.
pub const UPDATE_LIST: &str = "updateList";

/// Branching output of `tools` nodes: the ids of the tool nodes chosen to run.
pub const SELECTED_TOOLS: &str = "selectedTools";

/// Chat input exposed by `workflow_start` nodes.
pub const USER_CHAT_INPUT: &str = "userChatInput";

/// Text emitted by `answer` nodes.
pub const ANSWER_TEXT: &str = "answerText";

/// Chat history input of model-calling nodes.
pub const HISTORY: &str = "history";
