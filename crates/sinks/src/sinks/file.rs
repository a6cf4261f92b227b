//! FileSink - JSON lines, one response per line

use contracts::{ContractError, ResponseSink, RssResponse};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, instrument};

/// FileSink configuration
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output file
    pub path: PathBuf,
    /// Append to an existing file instead of truncating it
    pub append: bool,
}

impl FileSinkConfig {
    /// Config from sink params (`path`, `append`)
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let path = params
            .get("path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./output/rss_responses.jsonl"));
        let append = params
            .get("append")
            .is_some_and(|value| value.eq_ignore_ascii_case("true"));

        Self { path, append }
    }
}

/// Sink that appends responses to a JSON lines file
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    writer: Option<BufWriter<File>>,
    lines: u64,
}

impl FileSink {
    /// Open (or create) the output file
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(config.append)
            .truncate(!config.append)
            .open(&config.path)?;

        Ok(Self {
            name: name.into(),
            config,
            writer: Some(BufWriter::new(file)),
            lines: 0,
        })
    }

    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        Self::new(name, FileSinkConfig::from_params(params))
    }

    pub fn path(&self) -> &PathBuf {
        &self.config.path
    }

    fn append_line(&mut self, response: &RssResponse) -> std::io::Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| std::io::Error::other("sink already closed"))?;
        serde_json::to_writer(&mut *writer, response)?;
        writer.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }

    fn sink_error(&self, e: std::io::Error) -> ContractError {
        ContractError::sink_write(&self.name, e.to_string())
    }
}

impl ResponseSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, response),
        fields(sink = %self.name, frame = response.frame)
    )]
    async fn write(&mut self, response: &RssResponse) -> Result<(), ContractError> {
        self.append_line(response).map_err(|e| self.sink_error(e))
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush().map_err(|e| self.sink_error(e)),
            None => Ok(()),
        }
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| self.sink_error(e))?;
        }
        debug!(sink = %self.name, lines = self.lines, path = %self.config.path.display(), "FileSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        AccelerationRestriction, EgoVelocity, LateralResponse, LongitudinalResponse, Transform,
    };
    use tempfile::tempdir;

    fn response(frame: u64, lon: LongitudinalResponse) -> RssResponse {
        RssResponse {
            frame,
            elapsed_seconds: frame as f64 * 0.05,
            pose: Transform::at(1.0, 2.0, 0.0),
            success: true,
            longitudinal_response: lon,
            lateral_response_right: LateralResponse::None,
            lateral_response_left: LateralResponse::BrakeMin,
            acceleration_restriction: AccelerationRestriction::default(),
            ego_velocity: EgoVelocity {
                speed_lon: 12.5,
                speed_lat: 0.0,
            },
        }
    }

    #[tokio::test]
    async fn test_writes_one_json_object_per_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("rss.jsonl");
        let params = HashMap::from([("path".to_string(), path.display().to_string())]);

        let mut sink = FileSink::from_params("file", &params).unwrap();
        sink.write(&response(1, LongitudinalResponse::None)).await.unwrap();
        sink.write(&response(2, LongitudinalResponse::BrakeMin)).await.unwrap();
        sink.close().await.unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let second: RssResponse = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second, response(2, LongitudinalResponse::BrakeMin));
        assert!(lines[1].contains("\"longitudinal_response\":\"brake_min\""));
    }

    #[tokio::test]
    async fn test_write_after_close_fails() {
        let dir = tempdir().unwrap();
        let config = FileSinkConfig {
            path: dir.path().join("rss.jsonl"),
            append: false,
        };
        let mut sink = FileSink::new("file", config).unwrap();
        sink.close().await.unwrap();

        let err = sink
            .write(&response(1, LongitudinalResponse::None))
            .await
            .unwrap_err();
        assert!(matches!(err, ContractError::SinkWrite { .. }));
    }

    #[tokio::test]
    async fn test_append_mode_keeps_existing_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rss.jsonl");
        fs::write(&path, "{\"previous\":true}\n").unwrap();

        let params = HashMap::from([
            ("path".to_string(), path.display().to_string()),
            ("append".to_string(), "true".to_string()),
        ]);
        let mut sink = FileSink::from_params("file", &params).unwrap();
        sink.write(&response(5, LongitudinalResponse::None)).await.unwrap();
        sink.flush().await.unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
    }
}
