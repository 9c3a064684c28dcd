//! Artifact installation and upload.
//!
//! Hard-links the compiled addon into the package's `build/<config>/`
//! directory and, when upload credentials are available, PUTs it to the
//! artifact server. Upload problems are logged and never fail the run.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::{Body, StatusCode};
use thiserror::Error;
use tracing::{info, warn};

use crate::consts::ARTIFACT_NAME;
use crate::env::BuildEnvironment;
use crate::layout::ProjectLayout;
use crate::settings::Settings;
use crate::target::BuildTarget;

/// Pause before reporting completion when nothing is uploaded.
const LOCAL_SETTLE_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Error)]
pub enum InstallError {
  #[error("built artifact not found at '{0}'")]
  MissingArtifact(PathBuf),

  #[error("failed to {action} '{path}': {source}")]
  Io {
    action: &'static str,
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Where the artifact comes from and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDescriptor {
  /// e.g. `http://host/webrtc/webrtc-1.4.0-linux-x64-v6.2.x.node`
  pub remote_url: String,
  /// `<root>/build/<config>/webrtc.node`
  pub local_output_path: PathBuf,
  /// `<out dir>/webrtc.node`
  pub built_path: PathBuf,
}

impl ArtifactDescriptor {
  pub fn new(settings: &Settings, package_version: &str, target: &BuildTarget, layout: &ProjectLayout) -> Self {
    let remote_url = format!(
      "{}webrtc-{}-{}-{}-{}.node",
      settings.upload_base_url,
      package_version,
      target.platform,
      target.arch,
      target.runtime_version.wildcard()
    );

    Self {
      remote_url,
      local_output_path: layout
        .root
        .join("build")
        .join(target.configuration.as_str())
        .join(ARTIFACT_NAME),
      built_path: layout.built_artifact(),
    }
  }
}

/// What happened to the upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
  Uploaded,
  Failed(String),
  /// No credentials were configured.
  Skipped,
}

/// Install the artifact locally, then upload it if credentials are set.
pub async fn install(
  artifact: &ArtifactDescriptor,
  settings: &Settings,
  env: &BuildEnvironment,
) -> Result<UploadOutcome, InstallError> {
  link_artifact(artifact)?;

  let password = env.get(&settings.credentials_var).filter(|p| !p.is_empty());
  let outcome = match password {
    Some(password) => upload(artifact, &settings.upload_user, password).await,
    None => {
      tokio::time::sleep(LOCAL_SETTLE_DELAY).await;
      UploadOutcome::Skipped
    }
  };

  match &outcome {
    UploadOutcome::Uploaded => info!(url = %artifact.remote_url, "upload complete"),
    UploadOutcome::Failed(reason) => warn!(url = %artifact.remote_url, %reason, "upload failed"),
    UploadOutcome::Skipped => info!(path = %artifact.local_output_path.display(), "install complete"),
  }

  Ok(outcome)
}

fn link_artifact(artifact: &ArtifactDescriptor) -> Result<(), InstallError> {
  let built = &artifact.built_path;
  let dest = &artifact.local_output_path;

  if !built.is_file() {
    return Err(InstallError::MissingArtifact(built.clone()));
  }

  if let Some(parent) = dest.parent() {
    fs::create_dir_all(parent).map_err(|source| InstallError::Io {
      action: "create",
      path: parent.to_path_buf(),
      source,
    })?;
  }

  match fs::remove_file(dest) {
    Ok(()) => {}
    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
    Err(source) => {
      return Err(InstallError::Io {
        action: "remove",
        path: dest.clone(),
        source,
      });
    }
  }

  fs::hard_link(built, dest).map_err(|source| InstallError::Io {
    action: "link",
    path: dest.clone(),
    source,
  })?;

  info!(path = %dest.display(), "installed artifact");
  Ok(())
}

async fn upload(artifact: &ArtifactDescriptor, user: &str, password: &str) -> UploadOutcome {
  info!(url = %artifact.remote_url, "uploading artifact");

  let file = match tokio::fs::File::open(&artifact.local_output_path).await {
    Ok(file) => file,
    Err(e) => return UploadOutcome::Failed(e.to_string()),
  };

  let response = reqwest::Client::new()
    .put(&artifact.remote_url)
    .basic_auth(user, Some(password))
    .body(Body::from(file))
    .send()
    .await;

  match response {
    Ok(response) if response.status() == StatusCode::OK => UploadOutcome::Uploaded,
    Ok(response) => UploadOutcome::Failed(format!("HTTP {}", response.status())),
    Err(e) => UploadOutcome::Failed(e.to_string()),
  }
}
