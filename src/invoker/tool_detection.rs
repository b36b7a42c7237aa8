//! External tool detection and availability checking.

use std::path::PathBuf;

/// Resolve `program` on `PATH`.
///
/// Falls back to the bare name when the tool cannot be found, so the spawn
/// still happens and its failure is reported as a command outcome.
pub fn resolve_tool(program: &str) -> PathBuf {
    match which::which(program) {
        Ok(path) => {
            log::debug!("Found {} at: {}", program, path.display());
            path
        }
        Err(e) => {
            log::debug!("{} not found in PATH: {}", program, e);
            PathBuf::from(program)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tool_keeps_its_name() {
        assert_eq!(
            resolve_tool("definitely-not-a-real-tool-4f1c"),
            PathBuf::from("definitely-not-a-real-tool-4f1c")
        );
    }
}
