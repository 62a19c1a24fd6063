//! ProfilerController implementation
//!
//! Drives the in-browser gecko profiler through one iteration: detect the
//! start-function shape, start sampling, dump the profile to a file, stop,
//! and pull the file off the device for remote targets.

use browser_bridge::{RemoteDevice, ScriptChannel};
use serde_json::Value;
use std::path::{Path, PathBuf};
use telemetry_types::{ChannelError, CollectionError};
use tracing::{debug, info, warn};

use crate::types::{ApiVariant, GeckoProfilerParams, ProfilerSession};

/// Directory on a remote device the profile is dumped to
pub const DEVICE_PROFILE_DIR: &str = "/sdcard";

pub const PROFILER_ARITY_LABEL: &str = "Get profiler start parameter length";
pub const START_PROFILER_LABEL: &str = "Start gecko profiler";
pub const DUMP_PROFILE_LABEL: &str = "Collect gecko profile";
pub const STOP_PROFILER_LABEL: &str = "Stop gecko profiler";

const PROFILER_ARITY_SCRIPT: &str = "return Services.profiler.StartProfiler.length;";
const STOP_PROFILER_SCRIPT: &str = "Services.profiler.StopProfiler();";

/// File name of the profile of iteration `index`
pub fn profile_file_name(index: usize) -> String {
    format!("geckoProfile-{}.json", index)
}

/// Drives the gecko profiler lifecycle
#[derive(Debug)]
pub struct ProfilerController {
    /// Whether profiling was requested for the run
    enabled: bool,
    /// Configured parameters
    params: GeckoProfilerParams,
    /// Whether the browser runs on a remote device
    remote_target: bool,
    /// Session of the current iteration
    session: Option<ProfilerSession>,
    /// Set once the profiler API turned out to be unsupported
    skipped_for_run: bool,
}

impl ProfilerController {
    /// Create a controller
    pub fn new(enabled: bool, params: GeckoProfilerParams, remote_target: bool) -> Self {
        Self {
            enabled,
            params,
            remote_target,
            session: None,
            skipped_for_run: false,
        }
    }

    /// Whether the next iteration will attempt to profile
    pub fn is_active(&self) -> bool {
        self.enabled && !self.skipped_for_run
    }

    /// Session of the running iteration
    pub fn session(&self) -> Option<&ProfilerSession> {
        self.session.as_ref()
    }

    /// Whether the browser runs on a remote device
    pub fn is_remote_target(&self) -> bool {
        self.remote_target
    }

    /// Forget the session and the unsupported-API verdict for a new run
    pub fn reset(&mut self) {
        self.session = None;
        self.skipped_for_run = false;
    }

    /// Start the profiler unless profiling is disabled
    ///
    /// Queries the arity of `StartProfiler` first and builds the matching
    /// start command. An unrecognized arity yields
    /// [`CollectionError::UnsupportedProfilerApi`] and disables profiling
    /// until [`reset`](Self::reset).
    pub async fn start_if_enabled(
        &mut self,
        channel: &dyn ScriptChannel,
    ) -> Result<Option<&ProfilerSession>, CollectionError> {
        if !self.enabled {
            return Ok(None);
        }
        if self.skipped_for_run {
            debug!("Profiler API unsupported by this browser, not starting");
            return Ok(None);
        }
        if self.session.take().is_some() {
            warn!("Previous profiler session was never collected, discarding it");
        }

        let arity = channel
            .run_privileged_script(PROFILER_ARITY_SCRIPT, PROFILER_ARITY_LABEL)
            .await?;
        let variant = ApiVariant::from_arity(&arity);

        let session = ProfilerSession::new(&self.params, self.remote_target, variant);
        let command = match session.start_command() {
            Some(command) => command,
            None => {
                self.skipped_for_run = true;
                return Err(CollectionError::UnsupportedProfilerApi {
                    found: arity.to_string(),
                });
            }
        };

        channel
            .run_privileged_script(&command, START_PROFILER_LABEL)
            .await?;
        info!(
            "Gecko profiler started ({:?}, interval {} ms, buffer {})",
            variant, session.interval, session.buffer_size
        );

        self.session = Some(session);
        Ok(self.session.as_ref())
    }

    /// Dump the profile to `destination`, stop the profiler, and fetch the
    /// file from the device for remote targets
    ///
    /// The stop command runs even when the dump failed. Returns `Ok(None)`
    /// when no session is running.
    pub async fn stop_and_collect(
        &mut self,
        channel: &dyn ScriptChannel,
        device: Option<&dyn RemoteDevice>,
        destination: &Path,
    ) -> Result<Option<PathBuf>, CollectionError> {
        let session = match self.session.take() {
            Some(session) => session,
            None => {
                debug!("No profiler session to collect");
                return Ok(None);
            }
        };

        let dump_path = if self.remote_target {
            device_profile_path(destination)
        } else {
            destination.display().to_string()
        };

        let dumped = dump_profile(channel, &dump_path).await;
        if let Err(e) = &dumped {
            warn!("Dumping the gecko profile to {} failed: {}", dump_path, e);
        }

        if let Err(e) = channel
            .run_privileged_script(STOP_PROFILER_SCRIPT, STOP_PROFILER_LABEL)
            .await
        {
            warn!("Stopping the gecko profiler failed: {}", e);
        }
        debug!("Profiler session ended ({:?})", session.api_variant);

        dumped?;

        if self.remote_target {
            fetch_from_device(device, &dump_path, destination).await?;
        }

        info!("Gecko profile stored at {}", destination.display());
        Ok(Some(destination.to_path_buf()))
    }

    /// Stop the profiler without dumping, discarding the session
    pub async fn abort(&mut self, channel: &dyn ScriptChannel) {
        if self.session.take().is_none() {
            return;
        }
        if let Err(e) = channel
            .run_privileged_script(STOP_PROFILER_SCRIPT, STOP_PROFILER_LABEL)
            .await
        {
            warn!("Stopping the gecko profiler failed: {}", e);
        }
        debug!("Profiler session aborted");
    }
}

/// Path on the device mirroring the file name of `destination`
pub fn device_profile_path(destination: &Path) -> String {
    let file_name = destination
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "geckoProfile.json".to_string());
    format!("{}/{}", DEVICE_PROFILE_DIR, file_name)
}

async fn dump_profile(channel: &dyn ScriptChannel, path: &str) -> Result<(), CollectionError> {
    let script = format!(
        r#"const callback = arguments[arguments.length - 1];
Services.profiler.dumpProfileToFileAsync({})
  .then(() => callback({{}}))
  .catch((e) => callback({{error: String(e)}}));"#,
        Value::from(path)
    );

    let reply = channel
        .run_privileged_async_script(&script, DUMP_PROFILE_LABEL)
        .await?;

    match reply.get("error") {
        None | Some(Value::Null) => Ok(()),
        Some(Value::String(message)) => Err(CollectionError::ProfileDump(message.clone())),
        Some(other) => Err(CollectionError::ProfileDump(other.to_string())),
    }
}

async fn fetch_from_device(
    device: Option<&dyn RemoteDevice>,
    remote: &str,
    local: &Path,
) -> Result<(), CollectionError> {
    let transfer_error = |source: ChannelError| CollectionError::Transfer {
        remote: remote.to_string(),
        local: local.to_path_buf(),
        source,
    };

    let device = device.ok_or_else(|| {
        transfer_error(ChannelError::Connection(
            "no remote device configured".to_string(),
        ))
    })?;

    device.init_connection().await.map_err(transfer_error)?;
    device
        .download_file(remote, local)
        .await
        .map_err(transfer_error)?;
    debug!("Pulled {} from device to {}", remote, local.display());
    Ok(())
}
