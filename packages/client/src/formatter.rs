//! クライアント表示用のメッセージ整形

use kokuban_server::infrastructure::dto::websocket::VariableDto;
use kokuban_shared::time::timestamp_to_rfc3339;

const RULE: &str = "============================================================";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format a `room_state` / `sync_response` snapshot
    pub fn format_variables(title: &str, variables: &[VariableDto]) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n\n{RULE}\n{title}:\n"));

        if variables.is_empty() {
            output.push_str("(No variables)\n");
        } else {
            for variable in variables {
                output.push_str(&Self::format_variable_line(variable));
                output.push('\n');
            }
        }

        output.push_str(RULE);
        output.push('\n');
        output
    }

    /// One variable as `symbol = value unit  {clock}  (by user N, source)`
    pub fn format_variable_line(variable: &VariableDto) -> String {
        let unit = variable
            .unit
            .as_deref()
            .map(|unit| format!(" {unit}"))
            .unwrap_or_default();
        let clock = variable
            .vector_clock
            .iter()
            .map(|(participant, counter)| format!("{participant}:{counter}"))
            .collect::<Vec<_>>()
            .join(", ");
        let verified = if variable.verified { ", verified" } else { "" };
        format!(
            "{} = {}{}  {{{}}}  (by user {}, {}{})",
            variable.symbol, variable.value, unit, clock, variable.updated_by, variable.source, verified
        )
    }

    /// Format a broadcast `variable_update`
    pub fn format_variable_update(variable: &VariableDto, timestamp: i64) -> String {
        format!(
            "\n* {}\n  at {}\n",
            Self::format_variable_line(variable),
            timestamp_to_rfc3339(timestamp)
        )
    }

    pub fn format_user_joined(user_id: i64, timestamp: i64) -> String {
        format!(
            "\n+ user {} joined at {}\n",
            user_id,
            timestamp_to_rfc3339(timestamp)
        )
    }

    pub fn format_user_left(user_id: i64, timestamp: i64) -> String {
        format!(
            "\n- user {} left at {}\n",
            user_id,
            timestamp_to_rfc3339(timestamp)
        )
    }

    pub fn format_error(error: &str) -> String {
        format!("\n! {}\n", error)
    }

    pub fn format_raw_message(text: &str) -> String {
        format!("\n? {}\n", text)
    }

    pub fn format_help() -> String {
        [
            "",
            "Commands:",
            "  /set <symbol> <value> [unit]  update a shared variable",
            "  /sync                         fetch every variable from the server",
            "  /vars                         show the variables known locally",
            "  /quit                         leave the room",
            "",
        ]
        .join("\n")
    }
}
