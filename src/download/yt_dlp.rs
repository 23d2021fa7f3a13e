use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, instrument, trace};

use super::extractor::{ExtractorError, Extractor, FetchOptions};

/// Runs the `yt-dlp` executable
#[derive(Debug, Clone)]
pub struct YtDlp {
    path: PathBuf,
    params: Vec<String>,
}

impl YtDlp {
    /// `params` are passed before the arguments every fetch uses
    pub fn new(path: impl Into<PathBuf>, params: Vec<String>) -> Self {
        Self {
            path: path.into(),
            params,
        }
    }

    fn command(&self, url: &str, destination: &Path, options: &FetchOptions) -> Command {
        let mut cmd = Command::new(&self.path);
        cmd.args(&self.params)
            .args([
                // Force new lines
                "--newline",
                // Get all available variables using: yt-dlp --progress-template '%(progress)#j'
                "--progress-template",
                "%(progress)#j",
                // Disable colors for easier parsing
                "--color",
                "no_color",
            ])
            .arg("-f")
            .arg(&options.format);
        if options.restrict_filenames {
            cmd.arg("--restrict-filenames");
        }
        // Everything after `--` is a url, even if it starts with a dash
        cmd.arg("-o").arg(destination).arg("--").arg(url);
        cmd
    }
}

#[async_trait]
impl Extractor for YtDlp {
    /// Downloads `url` into `destination` and waits for yt-dlp to exit.
    #[instrument(skip(self, options))]
    async fn fetch(
        &self,
        url: &str,
        destination: &Path,
        options: &FetchOptions,
    ) -> Result<(), ExtractorError> {
        let mut cmd = self.command(url, destination, options);
        debug!("yt-dlp params: {:?}", cmd);

        // Spawn the process
        let mut child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ExtractorError::Spawn {
                program: self.path.display().to_string(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Process yt-dlp's stdout line by line while collecting stderr.
        let progress = async {
            let mut percent_extractor = PercentStrExtractor::default();
            if let Some(stdout) = stdout {
                let mut lines = BufReader::new(stdout).lines();
                while let Some(line) = lines.next_line().await? {
                    if percent_extractor.push_new_line(line) {
                        trace!(percent = percent_extractor.percentage, "yt-dlp progress");
                    }
                }
            }
            Ok::<_, std::io::Error>(())
        };
        let diagnostic = async {
            let mut buffer = String::new();
            if let Some(mut stderr) = stderr {
                stderr.read_to_string(&mut buffer).await?;
            }
            Ok::<_, std::io::Error>(buffer)
        };
        let (progress, diagnostic) = tokio::join!(progress, diagnostic);
        progress?;
        let diagnostic = diagnostic?;

        // Wait for yt-dlp to finish
        let status = child.wait().await?;
        if !status.success() {
            let diagnostic = match diagnostic.trim() {
                "" => format!("yt-dlp exited with status: {}", status),
                message => message.to_string(),
            };
            return Err(ExtractorError::Failed(diagnostic));
        }

        Ok(())
    }
}

/// Helper to extract the percentage from the yt-dlp output
#[derive(Debug, Default)]
struct PercentStrExtractor {
    pub percentage: f32,
    current_string: String,
}
impl PercentStrExtractor {
    /// Returns true once a complete progress object updated the percentage
    fn push_new_line(&mut self, line: String) -> bool {
        if line == "{" {
            self.current_string = line;
            false
        } else if line == "}" {
            self.current_string.push_str(&line);

            let value: Value = match serde_json::from_str(&self.current_string) {
                Ok(val) => val,
                Err(_) => return false,
            };
            let mut percent_string: String = match value.get("_percent_str") {
                Some(val) => val.to_string(),
                None => return false,
            }
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '"')
            .collect();
            // Trailing '%'
            percent_string.pop();

            match percent_string.parse() {
                Ok(val) => {
                    self.percentage = val;
                    true
                }
                Err(_) => false,
            }
        } else {
            self.current_string.push_str(&line);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_percentage_from_progress_template() {
        let mut extractor = PercentStrExtractor::default();
        let lines = ["{", "\"status\": \"downloading\",", "\"_percent_str\": \" 42.5%\"", "}"];
        let updates: Vec<bool> = lines
            .iter()
            .map(|l| extractor.push_new_line(l.to_string()))
            .collect();
        assert_eq!(updates, vec![false, false, false, true]);
        assert_eq!(extractor.percentage, 42.5);
    }

    #[test]
    fn ignores_noise() {
        let mut extractor = PercentStrExtractor::default();
        assert!(!extractor.push_new_line("[youtube] abc: Downloading webpage".into()));
        assert!(!extractor.push_new_line("}".into()));
        assert_eq!(extractor.percentage, 0.0);
    }

    #[test]
    fn builds_expected_arguments() {
        let yt = YtDlp::new("yt-dlp", vec!["--no-playlist".into()]);
        let cmd = yt.command(
            "-https://example.com/v",
            Path::new("/tmp/out.mp4"),
            &FetchOptions::default(),
        );
        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args[0], "--no-playlist");
        assert_eq!(
            args[args.len() - 7..],
            [
                "-f",
                "best",
                "--restrict-filenames",
                "-o",
                "/tmp/out.mp4",
                "--",
                "-https://example.com/v",
            ]
        );
    }

    #[cfg(unix)]
    mod process {
        use super::*;

        /// A stand-in for yt-dlp, run through `sh` so the script itself is never exec'd
        fn fake(dir: &Path, body: &str) -> YtDlp {
            let script = dir.join("fake-yt-dlp.sh");
            std::fs::write(&script, body).unwrap();
            YtDlp::new("sh", vec![script.to_string_lossy().into_owned()])
        }

        const WRITES_OUTPUT: &str = r#"
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; shift; fi
  shift
done
echo "{"
echo "\"_percent_str\": \"100.0%\""
echo "}"
printf 'video-bytes' > "$out"
"#;

        #[tokio::test]
        async fn successful_run_writes_destination() {
            let dir = tempfile::tempdir().unwrap();
            let yt = fake(dir.path(), WRITES_OUTPUT);
            let destination = dir.path().join("kintaro_other_1.mp4");

            yt.fetch("https://example.com/v", &destination, &FetchOptions::default())
                .await
                .unwrap();

            assert_eq!(std::fs::read(&destination).unwrap(), b"video-bytes");
        }

        #[tokio::test]
        async fn failure_surfaces_stderr_unmodified() {
            let dir = tempfile::tempdir().unwrap();
            let yt = fake(
                dir.path(),
                "echo 'ERROR: [generic] Unsupported URL: https://example.com/v' >&2\nexit 1\n",
            );

            let err = yt
                .fetch(
                    "https://example.com/v",
                    &dir.path().join("out.mp4"),
                    &FetchOptions::default(),
                )
                .await
                .unwrap_err();

            match err {
                ExtractorError::Failed(diagnostic) => assert_eq!(
                    diagnostic,
                    "ERROR: [generic] Unsupported URL: https://example.com/v"
                ),
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[tokio::test]
        async fn silent_failure_reports_exit_status() {
            let dir = tempfile::tempdir().unwrap();
            let yt = fake(dir.path(), "exit 3\n");

            let err = yt
                .fetch("https://x", &dir.path().join("out.mp4"), &FetchOptions::default())
                .await
                .unwrap_err();

            assert!(err.to_string().starts_with("yt-dlp exited with status"));
        }

        #[tokio::test]
        async fn missing_executable_is_a_spawn_error() {
            let yt = YtDlp::new("/nonexistent/yt-dlp", Vec::new());
            let err = yt
                .fetch("https://x", Path::new("/tmp/never.mp4"), &FetchOptions::default())
                .await
                .unwrap_err();
            assert!(matches!(err, ExtractorError::Spawn { .. }));
        }
    }
}
