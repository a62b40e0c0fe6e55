//! Runs every VM on the same programs and records how long each one takes.
//!
//! Results are written as one JSON file per program:
//!
//! ```json
//! { "title": "hello", "data": [{ "implementation": "opjit", "milliseconds": 0.02 }] }
//! ```

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info};
use serde::Serialize;
use util::{BfError, BfResult};

pub type RunFn = fn(&str, &mut dyn Read, &mut dyn Write) -> BfResult<()>;

pub struct Implementation {
    pub name: &'static str,
    pub run: RunFn,
}

pub static IMPLEMENTATIONS: [Implementation; 6] = [
    Implementation {
        name: "simpleinterp",
        run: simpleinterp::run,
    },
    Implementation {
        name: "opinterp",
        run: opinterp::run,
    },
    Implementation {
        name: "opinterp2",
        run: opinterp2::run,
    },
    Implementation {
        name: "opinterp3",
        run: opinterp3::run,
    },
    Implementation {
        name: "simplejit",
        run: simplejit::run,
    },
    Implementation {
        name: "opjit",
        run: opjit::run,
    },
];

/// Picks the implementations named in `only`, or all of them if it is empty.
pub fn select(only: &[String]) -> BfResult<Vec<&'static Implementation>> {
    if only.is_empty() {
        return Ok(IMPLEMENTATIONS.iter().collect());
    }

    only.iter()
        .map(|name| {
            IMPLEMENTATIONS
                .iter()
                .find(|implementation| implementation.name == name.as_str())
                .ok_or_else(|| BfError::Bf(format!("unknown implementation {name}")))
        })
        .collect()
}

/// Result titles for `programs`, one per file stem. Two programs with the
/// same stem would write the same JSON file, so that is an error.
pub fn titles(programs: &[PathBuf]) -> BfResult<Vec<String>> {
    let mut seen: HashMap<String, &Path> = HashMap::new();

    programs
        .iter()
        .map(|program| {
            let title = program
                .file_stem()
                .map_or_else(|| "program".to_owned(), |stem| stem.to_string_lossy().into_owned());

            if let Some(previous) = seen.insert(title.clone(), program) {
                return Err(BfError::Bf(format!(
                    "{} and {} would both write {title}.json",
                    previous.display(),
                    program.display()
                )));
            }

            Ok(title)
        })
        .collect()
}

/// Average wall-clock milliseconds of one run. Output is discarded.
pub fn benchmark(
    implementation: &Implementation,
    source_code: &str,
    input: &[u8],
    iterations: u32,
) -> BfResult<f64> {
    let iterations = iterations.max(1);

    let start = Instant::now();
    for _ in 0..iterations {
        (implementation.run)(source_code, &mut &input[..], &mut io::sink())?;
    }
    let elapsed = start.elapsed();

    Ok(elapsed.as_secs_f64() * 1000.0 / f64::from(iterations))
}

#[derive(Debug, Serialize)]
pub struct Sample {
    pub implementation: String,
    pub milliseconds: f64,
}

#[derive(Debug, Serialize)]
pub struct BenchRun {
    pub title: String,
    pub data: Vec<Sample>,
}

impl BenchRun {
    /// Benchmarks `source_code` on each implementation in turn.
    pub fn measure(
        title: &str,
        source_code: &str,
        input: &[u8],
        iterations: u32,
        implementations: &[&Implementation],
    ) -> BfResult<BenchRun> {
        let mut data = vec![];

        for implementation in implementations {
            let milliseconds = benchmark(implementation, source_code, input, iterations)?;
            info!("{title}: {} took {milliseconds:.3} ms", implementation.name);

            data.push(Sample {
                implementation: implementation.name.to_owned(),
                milliseconds,
            });
        }

        Ok(BenchRun {
            title: title.to_owned(),
            data,
        })
    }

    /// Writes `<output_dir>/<title>.json` and returns its path.
    pub fn write_json(&self, output_dir: &Path) -> BfResult<PathBuf> {
        fs::create_dir_all(output_dir)?;

        let path = output_dir.join(format!("{}.json", self.title));
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, self).map_err(io::Error::from)?;
        writer.flush()?;
        debug!("wrote {}", path.display());

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::{benchmark, select, titles, BenchRun, IMPLEMENTATIONS};
    use std::fs;
    use std::path::PathBuf;
    use std::process;
    use util::BfError;

    const HELLO: &str = include_str!("../programs/hello.bf");
    const NESTED_LOOPS: &str = include_str!("../programs/nested_loops.bf");
    const TRANSFERS: &str = include_str!("../programs/transfers.bf");

    fn outputs(source_code: &str, input: &[u8]) -> Vec<(&'static str, Result<Vec<u8>, BfError>)> {
        IMPLEMENTATIONS
            .iter()
            .map(|implementation| {
                let mut stdout = vec![];
                let result = (implementation.run)(source_code, &mut &input[..], &mut stdout);
                (implementation.name, result.map(|()| stdout))
            })
            .collect()
    }

    #[test]
    fn test_implementations_agree_on_programs() {
        for (source_code, expected) in [
            (HELLO, &b"Hello World!\n"[..]),
            (NESTED_LOOPS, &[1, 1][..]),
            (TRANSFERS, &[255, 1][..]),
        ] {
            for (name, output) in outputs(source_code, b"") {
                assert_eq!(output.as_deref(), Ok(expected), "{name}");
            }
        }
    }

    #[test]
    fn test_implementations_agree_on_deep_nesting() {
        let depth = 100_000;
        let source_code = format!("+{}-{}.", "[".repeat(depth), "]".repeat(depth));
        for (name, output) in outputs(&source_code, b"") {
            assert_eq!(output.as_deref(), Ok(&[0][..]), "{name}");
        }
    }

    #[test]
    fn test_implementations_agree_on_input() {
        for (name, output) in outputs(",[.-]", &[3]) {
            assert_eq!(output.as_deref(), Ok(&[3, 2, 1][..]), "{name}");
        }
    }

    #[test]
    fn test_implementations_reject_bad_programs() {
        for source_code in ["<", "+[<+]", "+[-<+>]", ","] {
            for (name, output) in outputs(source_code, b"") {
                assert!(output.is_err(), "{name} accepted {source_code}");
            }
        }
        // Only simpleinterp matches brackets lazily, when a jump is taken.
        for (name, output) in outputs("+[-", b"") {
            assert_eq!(output.is_ok(), name == "simpleinterp", "{name}");
        }
    }

    #[test]
    fn test_select_by_name() {
        assert_eq!(select(&[]).unwrap().len(), IMPLEMENTATIONS.len());

        let selected = select(&["opjit".to_owned(), "opinterp".to_owned()]).unwrap();
        let names: Vec<_> = selected.iter().map(|implementation| implementation.name).collect();
        assert_eq!(names, ["opjit", "opinterp"]);

        assert_eq!(
            select(&["fastjit".to_owned()]).err(),
            Some(BfError::Bf("unknown implementation fastjit".to_owned()))
        );
    }

    #[test]
    fn test_benchmark_reports_errors() {
        assert!(benchmark(&IMPLEMENTATIONS[0], HELLO, b"", 2).unwrap() >= 0.0);
        assert!(benchmark(&IMPLEMENTATIONS[0], "<", b"", 2).is_err());
    }

    #[test]
    fn test_bench_run_json_shape() {
        let implementations = select(&["opinterp3".to_owned()]).unwrap();
        let run = BenchRun::measure("hello", HELLO, b"", 1, &implementations).unwrap();

        let json = serde_json::to_value(&run).unwrap();
        assert_eq!(json["title"], "hello");
        assert_eq!(json["data"][0]["implementation"], "opinterp3");
        assert!(json["data"][0]["milliseconds"].is_f64());
    }

    #[test]
    fn test_write_json_creates_output_dir() {
        let output_dir = std::env::temp_dir()
            .join(format!("bench-write-json-{}", process::id()))
            .join("nested");
        let _ = fs::remove_dir_all(&output_dir);

        let implementations = select(&["opinterp".to_owned(), "opjit".to_owned()]).unwrap();
        let run = BenchRun::measure("hello", HELLO, b"", 1, &implementations).unwrap();
        let path = run.write_json(&output_dir).unwrap();
        assert_eq!(path, output_dir.join("hello.json"));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["title"], "hello");

        let data = json["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        for (sample, name) in data.iter().zip(["opinterp", "opjit"]) {
            assert_eq!(sample["implementation"], name);
            assert!(sample["milliseconds"].as_f64().unwrap() >= 0.0);
        }

        fs::remove_dir_all(output_dir.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_titles_reject_duplicate_stems() {
        let programs = [PathBuf::from("a/hello.bf"), PathBuf::from("b/loops.bf")];
        assert_eq!(titles(&programs).unwrap(), ["hello", "loops"]);

        let programs = [PathBuf::from("a/hello.bf"), PathBuf::from("b/hello.b")];
        assert_eq!(
            titles(&programs).unwrap_err(),
            BfError::Bf("a/hello.bf and b/hello.b would both write hello.json".to_owned())
        );
    }
}
