use std::{
    io::Write,
    process::{Command, Stdio},
};

use log::{debug, info};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KubectlError {
    #[error("Couldn't run kubectl!")]
    Spawn(#[source] std::io::Error),
    #[error("Resource already exists ({})", .0.trim())]
    AlreadyExists(String),
    #[error("kubectl failed: {}", .0.trim())]
    Failed(String),
}

/// Thin wrapper around the `kubectl` binary, honoring the same kubeconfig
/// and context the API client uses.
#[derive(Debug, Clone, Default)]
pub struct Kubectl {
    kubeconfig: Option<String>,
    context: Option<String>,
}

impl Kubectl {
    pub fn new(kubeconfig: &Option<String>, context: &Option<String>) -> Self {
        Self {
            kubeconfig: kubeconfig.to_owned(),
            context: context.to_owned(),
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new("kubectl");

        if let Some(kubeconfig) = &self.kubeconfig {
            command.arg("--kubeconfig").arg(kubeconfig);
        }
        if let Some(context) = &self.context {
            command.arg("--context").arg(context);
        }

        command
    }

    /// Pipes the manifest into `kubectl apply -n <namespace> -f -`.
    pub fn apply_manifest(&self, yaml: &str, namespace: &str) -> Result<String, KubectlError> {
        debug!("Applying manifest to namespace '{namespace}':\n{yaml}");

        let mut child = self
            .command()
            .args(["apply", "-n", namespace, "-f", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(KubectlError::Spawn)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(yaml.as_bytes())
                .map_err(KubectlError::Spawn)?;
        }

        let output = child.wait_with_output().map_err(KubectlError::Spawn)?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

        if output.status.success() {
            info!("{}", stdout.trim());
            return Ok(stdout);
        }

        Err(classify_failure(String::from_utf8_lossy(&output.stderr).into_owned()))
    }
}

fn classify_failure(stderr: String) -> KubectlError {
    if stderr.contains("AlreadyExists") {
        KubectlError::AlreadyExists(stderr)
    } else {
        KubectlError::Failed(stderr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_exists_failures_are_recognized() {
        let error = classify_failure(
            "Error from server (AlreadyExists): artifacts \"clab-srlinux-24.10.1\" already exists\n"
                .to_owned(),
        );
        assert!(matches!(error, KubectlError::AlreadyExists(_)));

        let error = classify_failure("error: the server doesn't have a resource type\n".to_owned());
        assert!(matches!(error, KubectlError::Failed(_)));
        assert_eq!(
            error.to_string(),
            "kubectl failed: error: the server doesn't have a resource type"
        );
    }

    #[test]
    fn kubeconfig_and_context_are_forwarded() {
        let kubectl = Kubectl::new(&Some("/tmp/kubeconfig".into()), &Some("kind-eda".into()));
        let command = kubectl.command();
        let args = command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>();

        assert_eq!(
            args,
            vec!["--kubeconfig", "/tmp/kubeconfig", "--context", "kind-eda"]
        );
    }
}
