//! JSON file helpers for configuration input and the run log.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::Path,
};

use anyhow::Context as _;
use serde::{Serialize, de::DeserializeOwned};

/// Reads and parses a JSON file. `what` names the file in error messages.
pub(crate) fn load_json<T>(what: &str, path: &Path) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let file = File::open(path)
        .with_context(|| format!("Failed to open {what} file: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {what} file: {}", path.display()))
}

/// Pretty-prints `value` to `path`, or to stdout when no path is given.
pub(crate) fn write_json<T>(value: &T, path: Option<&Path>) -> anyhow::Result<()>
where
    T: Serialize + ?Sized,
{
    let target = path.map_or_else(|| "stdout".to_owned(), |p| p.display().to_string());
    let mut writer: Box<dyn Write> = match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {target}"))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::stdout().lock()),
    };
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Failed to write JSON to {target}"))?;
    writeln!(writer)
        .and_then(|()| writer.flush())
        .with_context(|| format!("Failed to flush {target}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{env, fs, process};

    use super::*;

    #[test]
    fn test_written_json_loads_back() {
        let path = env::temp_dir().join(format!("popevo-util-{}.json", process::id()));
        write_json(&[1, 2, 3], Some(path.as_path())).unwrap();
        let value: Vec<u32> = load_json("test", &path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(value, vec![1, 2, 3]);
    }

    #[test]
    fn test_missing_file_names_the_kind() {
        let err = load_json::<Vec<u32>>("training config", Path::new("/nonexistent/popevo.json"))
            .unwrap_err();
        assert!(err.to_string().contains("training config"), "{err}");
    }
}
