//! Loaded-trace artifacts and validation.
//!
//! A trace is either a capture directory produced by the collector or a raw
//! capture file. Parsing the packet data is an external concern; this module
//! only performs the validation the session core needs: existence checks,
//! missing-artifact detection, and network-type classification.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::TraceError;
use crate::model::NetworkType;

/// Artifacts a capture directory is expected to contain. The missing-file
/// report preserves this order.
const EXPECTED_ARTIFACTS: &[&str] = &[
    "traffic.cap",
    "device_details",
    "device_info",
    "appname",
    "time",
];

/// A loaded trace's raw artifacts. Immutable once constructed; owned
/// exclusively by the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceHandle {
    pub source_path: PathBuf,
    pub network_type: NetworkType,
    /// Expected artifacts absent from the capture directory, in the order
    /// they were checked. Non-empty is a warning, not a failure.
    pub missing_files: Vec<String>,
}

/// Contract of the trace-loading collaborator. The controller treats it as
/// opaque and does not retry on failure.
pub trait TraceLoader: Send + Sync {
    fn load(&self, dir: &Path) -> Result<TraceHandle, TraceError>;
    fn load_capture(&self, file: &Path) -> Result<TraceHandle, TraceError>;
}

impl<L: TraceLoader + ?Sized> TraceLoader for std::sync::Arc<L> {
    fn load(&self, dir: &Path) -> Result<TraceHandle, TraceError> {
        (**self).load(dir)
    }

    fn load_capture(&self, file: &Path) -> Result<TraceHandle, TraceError> {
        (**self).load_capture(file)
    }
}

/// Directory-based loader for collector output.
#[derive(Debug, Default)]
pub struct DirTraceLoader;

impl DirTraceLoader {
    pub fn new() -> Self {
        Self
    }
}

impl TraceLoader for DirTraceLoader {
    fn load(&self, dir: &Path) -> Result<TraceHandle, TraceError> {
        if !dir.exists() {
            return Err(TraceError::NotFound(dir.to_path_buf()));
        }
        if !dir.is_dir() {
            return Err(TraceError::LoadFailure(format!(
                "{} is not a trace directory",
                dir.display()
            )));
        }

        let missing_files: Vec<String> = EXPECTED_ARTIFACTS
            .iter()
            .filter(|name| !dir.join(name).is_file())
            .map(|name| (*name).to_string())
            .collect();
        let network_type = classify_network_type(&dir.join("device_details"));

        Ok(TraceHandle {
            source_path: dir.to_path_buf(),
            network_type,
            missing_files,
        })
    }

    fn load_capture(&self, file: &Path) -> Result<TraceHandle, TraceError> {
        if !file.exists() {
            return Err(TraceError::NotFound(file.to_path_buf()));
        }
        let is_capture = file.is_file()
            && matches!(
                file.extension().and_then(|e| e.to_str()),
                Some("cap") | Some("pcap")
            );
        if !is_capture {
            return Err(TraceError::LoadFailure(format!(
                "{} is not a .cap/.pcap capture file",
                file.display()
            )));
        }

        // Capture files carry no network-type metadata.
        Ok(TraceHandle {
            source_path: file.to_path_buf(),
            network_type: NetworkType::Unknown,
            missing_files: Vec::new(),
        })
    }
}

/// Classify from the recorded device metadata. The collector writes the radio
/// technology on its own line of `device_details`.
fn classify_network_type(device_details: &Path) -> NetworkType {
    let Ok(contents) = std::fs::read_to_string(device_details) else {
        return NetworkType::Unknown;
    };
    for line in contents.lines() {
        match line.trim().to_ascii_uppercase().as_str() {
            "LTE" => return NetworkType::Lte,
            "3G" | "UMTS" | "WCDMA" | "HSPA" | "HSDPA" | "HSPAP" => return NetworkType::ThreeG,
            _ => {}
        }
    }
    NetworkType::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_trace_dir(dir: &Path, network_line: &str, skip: &[&str]) {
        for name in EXPECTED_ARTIFACTS {
            if skip.contains(name) {
                continue;
            }
            let contents = if *name == "device_details" {
                format!("device-model\nandroid\n{network_line}\n")
            } else {
                String::new()
            };
            fs::write(dir.join(name), contents).unwrap();
        }
    }

    #[test]
    fn loads_complete_lte_trace_directory() {
        let tmp = tempfile::tempdir().unwrap();
        write_trace_dir(tmp.path(), "LTE", &[]);

        let handle = DirTraceLoader::new().load(tmp.path()).unwrap();
        assert_eq!(handle.network_type, NetworkType::Lte);
        assert!(handle.missing_files.is_empty());
        assert_eq!(handle.source_path, tmp.path());
    }

    #[test]
    fn classifies_umts_as_three_g() {
        let tmp = tempfile::tempdir().unwrap();
        write_trace_dir(tmp.path(), "umts", &[]);

        let handle = DirTraceLoader::new().load(tmp.path()).unwrap();
        assert_eq!(handle.network_type, NetworkType::ThreeG);
    }

    #[test]
    fn reports_missing_artifacts_in_check_order() {
        let tmp = tempfile::tempdir().unwrap();
        write_trace_dir(tmp.path(), "LTE", &["traffic.cap", "time"]);

        let handle = DirTraceLoader::new().load(tmp.path()).unwrap();
        assert_eq!(handle.missing_files, vec!["traffic.cap", "time"]);
    }

    #[test]
    fn unreadable_device_details_classifies_as_unknown() {
        let tmp = tempfile::tempdir().unwrap();
        write_trace_dir(tmp.path(), "LTE", &["device_details"]);

        let handle = DirTraceLoader::new().load(tmp.path()).unwrap();
        assert_eq!(handle.network_type, NetworkType::Unknown);
        assert!(handle
            .missing_files
            .contains(&"device_details".to_string()));
    }

    #[test]
    fn nonexistent_trace_path_is_not_found() {
        let err = DirTraceLoader::new()
            .load(Path::new("/definitely/not/here"))
            .unwrap_err();
        assert!(matches!(err, TraceError::NotFound(_)));
    }

    #[test]
    fn plain_file_is_a_load_failure_not_a_trace() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("not-a-dir");
        fs::write(&file, "x").unwrap();

        let err = DirTraceLoader::new().load(&file).unwrap_err();
        assert!(matches!(err, TraceError::LoadFailure(_)));
    }

    #[test]
    fn capture_file_loads_with_unknown_network_type() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("session.pcap");
        fs::write(&file, "pcap").unwrap();

        let handle = DirTraceLoader::new().load_capture(&file).unwrap();
        assert_eq!(handle.network_type, NetworkType::Unknown);
        assert!(handle.missing_files.is_empty());
    }

    #[test]
    fn capture_with_wrong_extension_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("notes.txt");
        fs::write(&file, "x").unwrap();

        let err = DirTraceLoader::new().load_capture(&file).unwrap_err();
        assert!(matches!(err, TraceError::LoadFailure(_)));
    }

    #[test]
    fn missing_capture_file_is_not_found() {
        let err = DirTraceLoader::new()
            .load_capture(Path::new("/nope/session.cap"))
            .unwrap_err();
        assert!(matches!(err, TraceError::NotFound(_)));
    }
}
