//! External process execution.

use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, Stdio};

use super::error::{MediaError, MediaResult};

/// Lines of stderr kept in a `CommandFailed` message.
const MESSAGE_LINES: usize = 3;

/// Captured output of a finished tool run.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run `program` with `args`, blocking until it exits.
///
/// `tool` is the short name used in errors. A program that cannot be found
/// maps to [`MediaError::ToolNotFound`]; a non-zero exit maps to
/// [`MediaError::CommandFailed`] carrying the captured stderr.
pub fn run_tool(tool: &str, program: &Path, args: &[String]) -> MediaResult<ToolOutput> {
    tracing::debug!("Running {}: {}", tool, format_command(program, args));

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => MediaError::ToolNotFound(tool.to_string()),
            _ => MediaError::Spawn {
                tool: tool.to_string(),
                source: e,
            },
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if !output.status.success() {
        return Err(MediaError::CommandFailed {
            tool: tool.to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            message: last_lines(&stderr, MESSAGE_LINES),
            stderr,
        });
    }

    Ok(ToolOutput { stdout, stderr })
}

/// Render a command line for logs, quoting arguments that need it.
pub fn format_command(program: &Path, args: &[String]) -> String {
    let mut parts = vec![program.display().to_string()];
    for arg in args {
        if arg.is_empty() || arg.contains(|c: char| c.is_whitespace() || c == '\'' || c == '"')
        {
            parts.push(format!("\"{}\"", arg.replace('"', "\\\"")));
        } else {
            parts.push(arg.clone());
        }
    }
    parts.join(" ")
}

fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        return "no error output".to_string();
    }
    lines[lines.len().saturating_sub(n)..].join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn format_command_quotes_spaces() {
        let cmd = format_command(
            &PathBuf::from("ffmpeg"),
            &["-i".to_string(), "my clip.wav".to_string(), "-y".to_string()],
        );
        assert_eq!(cmd, "ffmpeg -i \"my clip.wav\" -y");
    }

    #[test]
    fn last_lines_keeps_tail() {
        let text = "a\n\nb\nc\nd\n";
        assert_eq!(last_lines(text, 2), "c | d");
        assert_eq!(last_lines("", 2), "no error output");
    }

    #[test]
    fn missing_program_is_tool_not_found() {
        let result = run_tool(
            "nonexistent-tool",
            &PathBuf::from("/nonexistent/bin/nonexistent-tool"),
            &[],
        );
        assert!(matches!(result, Err(MediaError::ToolNotFound(t)) if t == "nonexistent-tool"));
    }
}
