//! Terminal detection

use is_terminal::IsTerminal;
use std::env;
use std::io::stdout;

/// Check if stdout is an interactive terminal
pub fn is_interactive() -> bool {
    stdout().is_terminal() && !is_ci_environment()
}

/// Check if colored output should be used
pub fn supports_color() -> bool {
    if env::var_os("NO_COLOR").is_some() || !is_interactive() {
        return false;
    }
    !matches!(env::var("TERM").as_deref(), Ok("dumb") | Ok(""))
}

/// Check for common CI environment variables
fn is_ci_environment() -> bool {
    ["CI", "GITHUB_ACTIONS", "GITLAB_CI", "JENKINS_URL", "BUILDKITE"]
        .iter()
        .any(|var| env::var_os(var).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_color_without_terminal() {
        // Test runners capture stdout
        if !stdout().is_terminal() {
            assert!(!supports_color());
        }
    }
}
