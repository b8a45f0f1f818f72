//! Locating FAST5 files and pulling the best basecall out of each
//!
//! A FAST5 file is an HDF5 container holding one read. Basecallers store each
//! basecall as a whole FASTQ record in a string dataset whose path ends in `Fastq`.
//! File discovery and candidate assembly work on plain paths and names. Reading
//! the container itself needs the `hdf5` feature.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::basecall::{is_basecall_location, BasecallCandidate};

/// Every `*.fast5` file under `dir`, searched recursively, in sorted order
pub fn find_fast5_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_fast5_files(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_fast5_files(dir: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_fast5_files(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "fast5") {
            files.push(path);
        }
    }
    Ok(())
}

/// Build a candidate for every basecall location among `names`
///
/// `fetch` returns the FASTQ record stored at a location. Names that are not
/// basecall locations are never fetched. The first fetch error is returned.
pub fn candidates_from_names<I, S, F, E>(names: I, mut fetch: F) -> Result<Vec<BasecallCandidate>, E>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    F: FnMut(&str) -> Result<Vec<u8>, E>,
{
    names
        .into_iter()
        .filter(|name| is_basecall_location(name.as_ref()))
        .map(|name| {
            let location = name.as_ref();
            let record = fetch(location)?;
            Ok(BasecallCandidate::from_location(location, &record))
        })
        .collect()
}

#[cfg(feature = "hdf5")]
pub use self::container::{best_read, check_file, object_names, read_record};

#[cfg(feature = "hdf5")]
mod container {
    use std::path::Path;

    use hdf5::types::{FixedAscii, VarLenAscii, VarLenUnicode};
    use hdf5::{Dataset, File, Group};

    use super::candidates_from_names;
    use crate::basecall::resolve_basecall;
    use crate::shared::Read;

    /// Largest fixed-length string record read from a container
    const MAX_RECORD_LEN: usize = 1 << 20;

    fn visit(group: &Group, names: &mut Vec<String>) -> hdf5::Result<()> {
        for child in group.groups()? {
            names.push(relative_name(&child.name()));
            visit(&child, names)?;
        }
        for dataset in group.datasets()? {
            names.push(relative_name(&dataset.name()));
        }
        Ok(())
    }

    fn relative_name(name: &str) -> String {
        name.trim_start_matches('/').to_string()
    }

    /// Path of every group and dataset in the file, without the leading `/`
    pub fn object_names(file: &File) -> hdf5::Result<Vec<String>> {
        let mut names = Vec::new();
        visit(file, &mut names)?;
        Ok(names)
    }

    fn read_string(dataset: &Dataset) -> hdf5::Result<Vec<u8>> {
        if let Ok(value) = dataset.read_scalar::<VarLenUnicode>() {
            return Ok(value.as_bytes().to_vec());
        }
        if let Ok(value) = dataset.read_scalar::<VarLenAscii>() {
            return Ok(value.as_bytes().to_vec());
        }
        let values = dataset.read_raw::<FixedAscii<MAX_RECORD_LEN>>()?;
        Ok(values
            .first()
            .map(|value| value.as_bytes().to_vec())
            .unwrap_or_default())
    }

    /// The FASTQ record stored at `location`
    pub fn read_record(file: &File, location: &str) -> hdf5::Result<Vec<u8>> {
        read_string(&file.dataset(location)?)
    }

    /// Open `path` and resolve its best basecall
    ///
    /// Ok(None) means the file opened but holds no basecall at all.
    pub fn best_read(path: &Path) -> hdf5::Result<Option<Read>> {
        let file = File::open(path)?;
        let names = object_names(&file)?;
        let candidates = candidates_from_names(&names, |location| read_record(&file, location))?;
        Ok(resolve_basecall(candidates))
    }

    /// Open `path` and list its contents, returning how many objects it holds
    pub fn check_file(path: &Path) -> hdf5::Result<usize> {
        let file = File::open(path)?;
        Ok(object_names(&file)?.len())
    }
}
