//! Scripted stand-ins for ffprobe and ffmpeg.
//!
//! [`ScriptedTransform`] never spawns a process. A cut writes the marker
//! `[start+length]` to its output file and a join concatenates the bytes of
//! the files named in the manifest, so tests can check both what was cut and
//! in which order it was joined.

use crate::command::ToolOutput;
use crate::cut::SEGMENT_PREFIX;
use crate::probe::{DurationProbe, MediaDuration};
use crate::transform::MediaTransform;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Probe that always reports the same duration.
#[derive(Debug, Clone, Copy)]
pub struct FixedProbe(pub f64);

impl DurationProbe for FixedProbe {
    fn probe(&self, _path: &Path) -> Result<MediaDuration> {
        MediaDuration::from_secs(self.0)
    }
}

/// Probe that always fails with the given message.
#[derive(Debug, Clone)]
pub struct FailingProbe(pub String);

impl DurationProbe for FailingProbe {
    fn probe(&self, _path: &Path) -> Result<MediaDuration> {
        Err(Error::probe(self.0.clone()))
    }
}

type CutHook = Box<dyn Fn(usize) + Send + Sync>;

/// Transform that fakes ffmpeg's cut and concat invocations.
#[derive(Default)]
pub struct ScriptedTransform {
    calls: Mutex<Vec<Vec<String>>>,
    cuts: AtomicUsize,
    concats: AtomicUsize,
    fail_on_cut: Option<usize>,
    fail_concat: bool,
    on_cut: Option<CutHook>,
}

impl ScriptedTransform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the cut of the window with this plan index.
    pub fn fail_on_cut(mut self, index: usize) -> Self {
        self.fail_on_cut = Some(index);
        self
    }

    /// Fail every join after writing a partial output file.
    pub fn fail_concat(mut self) -> Self {
        self.fail_concat = true;
        self
    }

    /// Run `hook` with the window index after each successful cut.
    pub fn on_cut(mut self, hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.on_cut = Some(Box::new(hook));
        self
    }

    /// Every argument list this transform was run with.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of cut invocations, including failed ones.
    pub fn cut_calls(&self) -> usize {
        self.cuts.load(Ordering::SeqCst)
    }

    /// Number of join invocations, including failed ones.
    pub fn concat_calls(&self) -> usize {
        self.concats.load(Ordering::SeqCst)
    }

    /// Window indices that were cut, in call order.
    pub fn cut_indices(&self) -> Vec<usize> {
        self.calls()
            .iter()
            .filter(|args| !is_concat(args))
            .filter_map(|args| args.last().and_then(|out| window_index(Path::new(out))))
            .collect()
    }

    fn cut(&self, args: &[String], output: &Path) -> Result<()> {
        self.cuts.fetch_add(1, Ordering::SeqCst);
        let index = window_index(output);
        if index.is_some() && index == self.fail_on_cut {
            std::fs::write(output, b"partial")?;
            return Err(Error::tool_failed("ffmpeg", "Conversion failed!"));
        }

        let start = value_after(args, "-ss").unwrap_or("?");
        let length = value_after(args, "-t").unwrap_or("?");
        std::fs::write(output, format!("[{start}+{length}]"))?;

        if let (Some(hook), Some(index)) = (&self.on_cut, index) {
            hook(index);
        }
        Ok(())
    }

    fn concat(&self, args: &[String], output: &Path) -> Result<()> {
        self.concats.fetch_add(1, Ordering::SeqCst);
        let manifest = value_after(args, "-i")
            .map(PathBuf::from)
            .ok_or_else(|| Error::tool_failed("ffmpeg", "missing -i"))?;

        let mut joined = Vec::new();
        for line in std::fs::read_to_string(manifest)?.lines() {
            let Some(quoted) = line.strip_prefix("file '").and_then(|l| l.strip_suffix('\'')) else {
                continue;
            };
            let path = quoted.replace(r"'\''", "'");
            joined.extend(std::fs::read(path)?);
        }

        if self.fail_concat {
            std::fs::write(output, &joined[..joined.len() / 2])?;
            return Err(Error::tool_failed("ffmpeg", "Error writing trailer"));
        }
        std::fs::write(output, joined)?;
        Ok(())
    }
}

impl MediaTransform for ScriptedTransform {
    fn run(&self, args: &[String]) -> Result<ToolOutput> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(args.to_vec());

        let output = args
            .last()
            .map(PathBuf::from)
            .ok_or_else(|| Error::tool_failed("ffmpeg", "no output path"))?;

        if is_concat(args) {
            self.concat(args, &output)?;
        } else {
            self.cut(args, &output)?;
        }

        Ok(ToolOutput {
            status: success(),
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

fn is_concat(args: &[String]) -> bool {
    args.windows(2).any(|w| w[0] == "-f" && w[1] == "concat")
}

fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn window_index(output: &Path) -> Option<usize> {
    let name = output.file_name()?.to_str()?;
    let rest = name.strip_prefix(SEGMENT_PREFIX)?;
    rest.split('-').next()?.parse().ok()
}

#[cfg(unix)]
fn success() -> std::process::ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    std::process::ExitStatus::from_raw(0)
}

#[cfg(windows)]
fn success() -> std::process::ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    std::process::ExitStatus::from_raw(0)
}
