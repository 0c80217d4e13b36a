// ABOUTME: Startup checks for the external PostgreSQL client tools
// ABOUTME: Fails early with install hints when a tool is missing from PATH

use anyhow::{bail, Result};
use which::which;

/// Client tools the pipeline shells out to
pub const REQUIRED_TOOLS: [&str; 3] = ["pg_isready", "pg_dump", "psql"];

/// Check that required PostgreSQL client tools are available
///
/// Verifies that the following tools are installed and in PATH:
/// - `pg_isready` - For probing whether a database accepts connections
/// - `pg_dump` - For dumping the source database
/// - `psql` - For loading the dump into the destination
///
/// # Errors
///
/// Returns an error with installation instructions if any tools are missing.
///
/// # Examples
///
/// ```
/// # use postgres_elt::utils::check_required_tools;
/// # use anyhow::Result;
/// # fn example() -> Result<()> {
/// check_required_tools()?;
/// # Ok(())
/// # }
/// ```
pub fn check_required_tools() -> Result<()> {
    let missing = missing_tools(&REQUIRED_TOOLS, |tool| which(tool).is_ok());

    if !missing.is_empty() {
        bail!(
            "Missing required PostgreSQL client tools: {}\n\
             \n\
             Please install PostgreSQL client tools:\n\
             - Ubuntu/Debian: sudo apt-get install postgresql-client\n\
             - macOS: brew install postgresql\n\
             - RHEL/CentOS: sudo yum install postgresql",
            missing.join(", ")
        );
    }

    Ok(())
}

fn missing_tools<'a, F>(tools: &[&'a str], is_installed: F) -> Vec<&'a str>
where
    F: Fn(&str) -> bool,
{
    tools
        .iter()
        .copied()
        .filter(|tool| !is_installed(*tool))
        .collect()
}
