//! # Rules Deployment
//!
//! Pushes the document store's access-control rules through the vendor CLI.
//!
//! ## Steps
//! 1. `<cli> --version`: the CLI has to be installed
//! 2. `<cli> projects:list`: the CLI has to be logged in
//! 3. `<cli> deploy --only <target>`: push, output goes straight to the terminal
//!
//! Any failing step stops the run. Nothing here touches the running server.
use std::{
    process::{Command, Stdio},
    time::Duration,
};

use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeployError {
    #[error("{cli} CLI is not installed. Please install it with: npm install -g {cli}-tools")]
    NotInstalled { cli: String },

    #[error("You are not logged in to the {cli} CLI. Please run: {cli} login")]
    NotLoggedIn { cli: String },

    #[error("Failed to deploy {target}: {reason}")]
    DeployFailed { target: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deploy {
    pub cli: String,
    pub only: String,
    pub project: Option<String>,
}

impl Deploy {
    pub fn version_args(&self) -> Vec<String> {
        vec!["--version".to_string()]
    }

    pub fn login_args(&self) -> Vec<String> {
        vec!["projects:list".to_string()]
    }

    pub fn deploy_args(&self) -> Vec<String> {
        let mut args = vec![
            "deploy".to_string(),
            "--only".to_string(),
            self.only.clone(),
        ];

        if let Some(project) = &self.project {
            args.push("--project".to_string());
            args.push(project.clone());
        }

        args
    }
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();

    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }

    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));

    pb
}

/// Runs quietly, only the exit status matters.
fn succeeds(cli: &str, args: &[String]) -> bool {
    Command::new(cli)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

pub fn run(deploy: &Deploy) -> Result<(), DeployError> {
    let pb = spinner(&format!("Checking {} CLI", deploy.cli));
    if !succeeds(&deploy.cli, &deploy.version_args()) {
        pb.abandon_with_message("CLI missing");
        return Err(DeployError::NotInstalled {
            cli: deploy.cli.clone(),
        });
    }
    pb.finish_with_message(format!("{} CLI is installed, proceeding...", deploy.cli));

    let pb = spinner("Checking login");
    if !succeeds(&deploy.cli, &deploy.login_args()) {
        pb.abandon_with_message("Not logged in");
        return Err(DeployError::NotLoggedIn {
            cli: deploy.cli.clone(),
        });
    }
    pb.finish_with_message(format!("You are logged in to the {} CLI", deploy.cli));

    println!("Deploying {}...", deploy.only);

    let status = Command::new(&deploy.cli)
        .args(deploy.deploy_args())
        .status()
        .map_err(|e| DeployError::DeployFailed {
            target: deploy.only.clone(),
            reason: e.to_string(),
        })?;

    if !status.success() {
        return Err(DeployError::DeployFailed {
            target: deploy.only.clone(),
            reason: status.to_string(),
        });
    }

    println!("{} deployed successfully", deploy.only);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deploy(project: Option<&str>) -> Deploy {
        Deploy {
            cli: "firebase".to_string(),
            only: "firestore:rules".to_string(),
            project: project.map(str::to_string),
        }
    }

    #[test]
    fn test_deploy_args() {
        assert_eq!(deploy(None).deploy_args(), ["deploy", "--only", "firestore:rules"]);
        assert_eq!(
            deploy(Some("clinic-prod")).deploy_args(),
            ["deploy", "--only", "firestore:rules", "--project", "clinic-prod"]
        );
    }

    #[test]
    fn test_missing_cli() {
        let deploy = Deploy {
            cli: "clinic-cli-that-does-not-exist".to_string(),
            ..deploy(None)
        };

        let error = run(&deploy).unwrap_err();
        assert!(matches!(error, DeployError::NotInstalled { .. }));
        assert!(error.to_string().contains("npm install -g"));
    }

    #[test]
    fn test_messages() {
        let error = DeployError::NotLoggedIn {
            cli: "firebase".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "You are not logged in to the firebase CLI. Please run: firebase login"
        );
    }
}
