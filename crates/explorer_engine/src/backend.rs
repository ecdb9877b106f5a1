use std::path::PathBuf;
use std::process::{Output, Stdio};

use engine_logging::{engine_debug, engine_info};
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::{EngineError, PoolingTable};

/// Fits the random-effects model over a table read from stdin and prints
/// estimate, lower and upper bound, one per line.
const POOL_SCRIPT: &str = r#"
input <- paste(readLines(file("stdin"), warn = FALSE), collapse = "\n")
data <- as.data.frame(jsonlite::fromJSON(input))
V <- metafor::vcalc(
  vi = effect_size_var,
  cluster = paper_study,
  subgroup = outcome,
  data = data,
  grp1 = group_1,
  grp2 = group_2
)
res <- metafor::rma.mv(effect_size_value, V, random = ~ 1 | paper_study/outcome, data = data)
cat(sprintf("%.17g", c(res$beta, res$ci.lb, res$ci.ub)), sep = "\n")
"#;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RscriptSettings {
    /// Interpreter to run; looked up on `PATH` when not absolute.
    pub rscript: PathBuf,
    /// Packages that must load before the engine is ready.
    pub packages: Vec<String>,
    /// CRAN mirror used to install missing packages.
    pub repository: String,
}

impl Default for RscriptSettings {
    fn default() -> Self {
        Self {
            rscript: PathBuf::from("Rscript"),
            packages: vec!["metafor".to_string(), "jsonlite".to_string()],
            repository: "https://cloud.r-project.org".to_string(),
        }
    }
}

/// The external statistical engine: boots once, then pools tables on request.
#[async_trait::async_trait]
pub trait PoolingBackend: Send + Sync {
    /// Makes the engine usable (interpreter check, package install).
    async fn provision(&self) -> Result<(), EngineError>;

    /// Returns `[estimate, ci_lower, ci_upper]`.
    async fn pool(&self, table: &PoolingTable) -> Result<[f64; 3], EngineError>;
}

/// Runs R as a child process for every call.
#[derive(Debug, Clone)]
pub struct RscriptBackend {
    settings: RscriptSettings,
}

impl RscriptBackend {
    pub fn new(settings: RscriptSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RscriptSettings {
        &self.settings
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.settings.rscript);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }

    fn install_script(&self) -> String {
        let packages = self
            .settings
            .packages
            .iter()
            .map(|p| r_string(p))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "pkgs <- c({packages})\n\
             loaded <- function(p) requireNamespace(p, quietly = TRUE)\n\
             missing <- pkgs[!vapply(pkgs, loaded, logical(1))]\n\
             if (length(missing) > 0) install.packages(missing, repos = {repo})\n\
             still <- pkgs[!vapply(pkgs, loaded, logical(1))]\n\
             if (length(still) > 0) stop(paste(\"missing packages:\", paste(still, collapse = \", \")))\n",
            repo = r_string(&self.settings.repository),
        )
    }
}

#[async_trait::async_trait]
impl PoolingBackend for RscriptBackend {
    async fn provision(&self) -> Result<(), EngineError> {
        let version = self
            .command()
            .arg("--version")
            .output()
            .await
            .map_err(|err| {
                EngineError::provisioning(format!(
                    "could not start {:?}: {err}",
                    self.settings.rscript
                ))
            })?;
        check_status(&version).map_err(EngineError::Provisioning)?;

        if self.settings.packages.is_empty() {
            return Ok(());
        }
        engine_info!(
            "Ensuring R packages are installed: {}",
            self.settings.packages.join(", ")
        );
        let install = self
            .command()
            .arg("-e")
            .arg(self.install_script())
            .output()
            .await
            .map_err(|err| EngineError::provisioning(err.to_string()))?;
        check_status(&install).map_err(EngineError::Provisioning)
    }

    async fn pool(&self, table: &PoolingTable) -> Result<[f64; 3], EngineError> {
        let input = table
            .to_json()
            .map_err(|err| EngineError::invocation(err.to_string()))?;

        let mut child = self
            .command()
            .stdin(Stdio::piped())
            .arg("-e")
            .arg(POOL_SCRIPT)
            .spawn()
            .map_err(|err| {
                EngineError::invocation(format!(
                    "could not start {:?}: {err}",
                    self.settings.rscript
                ))
            })?;

        // A write error usually means R exited early; its stderr says why.
        let mut write_error = None;
        if let Some(mut stdin) = child.stdin.take() {
            if let Err(err) = stdin.write_all(input.as_bytes()).await {
                engine_debug!("Writing the table to Rscript failed: {}", err);
                write_error = Some(err);
            }
            // Closing stdin lets the script see end of input.
            drop(stdin);
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|err| EngineError::invocation(err.to_string()))?;
        check_status(&output).map_err(EngineError::Invocation)?;
        if let Some(err) = write_error {
            return Err(EngineError::invocation(format!(
                "could not send the table to Rscript: {err}"
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        engine_debug!("Rscript printed {:?}", stdout.trim());
        parse_triple(&stdout)
    }
}

fn check_status(output: &Output) -> Result<(), String> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let detail = last_lines(&stderr, 3);
    if detail.is_empty() {
        Err(format!("exited with {}", output.status))
    } else {
        Err(format!("exited with {}: {detail}", output.status))
    }
}

fn last_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join(" | ")
}

fn parse_triple(stdout: &str) -> Result<[f64; 3], EngineError> {
    let values = stdout
        .split_whitespace()
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|_| EngineError::InvalidResult(format!("not a number: {token:?}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    match values.as_slice() {
        [estimate, lower, upper] => Ok([*estimate, *lower, *upper]),
        other => Err(EngineError::InvalidResult(format!(
            "expected 3 values, got {}",
            other.len()
        ))),
    }
}

/// Quotes a value as an R string literal.
fn r_string(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_numbers() {
        assert_eq!(
            parse_triple("0.25\n0.1\n0.4\n").unwrap(),
            [0.25, 0.1, 0.4]
        );
    }

    #[test]
    fn rejects_wrong_arity_and_garbage() {
        assert!(matches!(
            parse_triple("0.25\n0.1\n"),
            Err(EngineError::InvalidResult(_))
        ));
        assert!(matches!(
            parse_triple("0.25 NA 0.4"),
            Err(EngineError::InvalidResult(_))
        ));
    }

    #[test]
    fn install_script_quotes_package_names() {
        let backend = RscriptBackend::new(RscriptSettings {
            packages: vec!["metafor".to_string(), "we\"ird".to_string()],
            ..RscriptSettings::default()
        });
        let script = backend.install_script();
        assert!(script.contains(r#"pkgs <- c("metafor", "we\"ird")"#));
        assert!(script.contains(r#"repos = "https://cloud.r-project.org""#));
    }

    #[test]
    fn stderr_tail_is_kept_short() {
        assert_eq!(last_lines("a\n\nb\nc\nd\n", 3), "b | c | d");
    }
}
